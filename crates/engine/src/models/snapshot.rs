//! The per-account dashboard snapshot.
//!
//! One snapshot exists per account, keyed by email. It starts all-zero the
//! first time an identity is seen, is mutated incrementally by optimistic
//! updates, and has its slices replaced wholesale by reconciliation.
//! Bounded sequences always evict the oldest entries beyond their bound.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use upgrow_core::{CurrencyCode, NotificationKind, OrderStatus, TransactionKind};

/// Most-recent-first order list bound.
pub const MAX_RECENT_ORDERS: usize = 10;
/// Billing transaction list bound.
pub const MAX_TRANSACTIONS: usize = 20;
/// Notification list bound.
pub const MAX_NOTIFICATIONS: usize = 20;

/// Month labels for the revenue series, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Fixed four-hour time-of-day buckets for the activity series.
pub const ACTIVITY_LABELS: [&str; 6] = ["00-04", "04-08", "08-12", "12-16", "16-20", "20-24"];

/// One order as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub service_name: String,
    pub created_at: DateTime<Utc>,
    /// Pre-formatted quantity ("10,000").
    pub quantity_label: String,
    /// Authoritative from the backend once reconciled; locally created
    /// orders stay `Pending` until then.
    pub status: OrderStatus,
    pub cost: Decimal,
    pub profit: Decimal,
}

/// One billing history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>,
    pub description: String,
    /// Signed, currency-formatted display amount.
    pub amount_display: String,
    pub status: String,
    pub kind: TransactionKind,
}

/// One dashboard notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub relative_time: String,
    pub kind: NotificationKind,
    pub unread: bool,
}

/// One monthly bucket of the revenue series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueBucket {
    pub month: String,
    /// Cost-tracking field: order totals land here.
    pub revenue: Decimal,
    pub profit: Decimal,
}

/// One time-of-day bucket of the activity series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityBucket {
    pub label: String,
    pub orders: u32,
}

/// Billing slice of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSlice {
    pub balance_display: String,
    pub transactions: Vec<Transaction>,
}

/// The cached, per-account dashboard bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub balance_display: String,
    pub order_count: u32,
    pub completed_count: u32,
    pub cancelled_count: u32,
    pub open_support_tickets: u32,
    /// Most-recent-first, bounded to [`MAX_RECENT_ORDERS`].
    pub orders: Vec<Order>,
    pub billing: BillingSlice,
    /// Twelve monthly buckets, January first.
    pub revenue_series: Vec<RevenueBucket>,
    /// Fixed time-of-day buckets.
    pub activity_series: Vec<ActivityBucket>,
    /// Bounded to [`MAX_NOTIFICATIONS`].
    pub notifications: Vec<Notification>,
}

impl DashboardSnapshot {
    /// All-zero snapshot with balances formatted for the given currency.
    #[must_use]
    pub fn empty(currency: CurrencyCode) -> Self {
        let zero = currency.format(Decimal::ZERO);
        Self {
            balance_display: zero.clone(),
            order_count: 0,
            completed_count: 0,
            cancelled_count: 0,
            open_support_tickets: 0,
            orders: Vec::new(),
            billing: BillingSlice {
                balance_display: zero,
                transactions: Vec::new(),
            },
            revenue_series: zero_revenue_series(),
            activity_series: zero_activity_series(),
            notifications: Vec::new(),
        }
    }

    /// Whether the snapshot carries no data beyond its zero defaults.
    ///
    /// Reconciliation uses this to decide whether a fresh account's empty
    /// remote state should overwrite locally created content.
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.order_count == 0
            && self.completed_count == 0
            && self.cancelled_count == 0
            && self.orders.is_empty()
            && self.billing.transactions.is_empty()
            && self.notifications.is_empty()
            && self
                .revenue_series
                .iter()
                .all(|bucket| bucket.revenue.is_zero() && bucket.profit.is_zero())
    }
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self::empty(CurrencyCode::default())
    }
}

/// Twelve zeroed monthly buckets.
#[must_use]
pub fn zero_revenue_series() -> Vec<RevenueBucket> {
    MONTH_LABELS
        .iter()
        .map(|month| RevenueBucket {
            month: (*month).to_owned(),
            revenue: Decimal::ZERO,
            profit: Decimal::ZERO,
        })
        .collect()
}

/// Zeroed time-of-day buckets.
#[must_use]
pub fn zero_activity_series() -> Vec<ActivityBucket> {
    ACTIVITY_LABELS
        .iter()
        .map(|label| ActivityBucket {
            label: (*label).to_owned(),
            orders: 0,
        })
        .collect()
}

/// Prepend an item to a most-recent-first sequence, evicting beyond the
/// bound.
pub fn push_front_bounded<T>(items: &mut Vec<T>, item: T, bound: usize) {
    items.insert(0, item);
    items.truncate(bound);
}
