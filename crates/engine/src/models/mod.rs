//! Domain models owned by the engine.
//!
//! These are validated domain objects, separate from the wire payload
//! types in [`crate::api::types`]. Wire payloads are mapped onto these at
//! the API boundary and never stored directly.

pub mod identity;
pub mod snapshot;

pub use identity::Identity;
pub use snapshot::{
    ACTIVITY_LABELS, ActivityBucket, BillingSlice, DashboardSnapshot, MAX_NOTIFICATIONS,
    MAX_RECENT_ORDERS, MAX_TRANSACTIONS, MONTH_LABELS, Notification, Order, RevenueBucket,
    Transaction, push_front_bounded,
};
