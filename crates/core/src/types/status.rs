//! Status enums for orders, transactions, and notifications.
//!
//! The backend reports statuses as free-form strings; everything is mapped
//! onto these enums once, at the API boundary. Locally created orders start
//! as [`OrderStatus::Pending`] and are only ever advanced by reconciliation.

use serde::{Deserialize, Serialize};

/// Order status.
///
/// Maps the backend's order state strings onto the four states the panel
/// distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Map a backend status string onto an [`OrderStatus`].
    ///
    /// Unrecognized strings (and the backend's own "pending") stay
    /// [`OrderStatus::Pending`].
    #[must_use]
    pub fn from_backend(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "completed" | "complete" | "done" => Self::Completed,
            "cancelled" | "canceled" | "refunded" | "failed" => Self::Cancelled,
            "processing" | "in_progress" | "in progress" | "partial" | "active" => Self::Processing,
            _ => Self::Pending,
        }
    }

    /// Short display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Transaction kind as shown in the billing history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Funds added to the account balance.
    Deposit,
    /// Funds spent on an order.
    #[default]
    Purchase,
}

impl TransactionKind {
    /// Map a backend kind string onto a [`TransactionKind`].
    #[must_use]
    pub fn from_backend(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "deposit" | "credit" | "topup" | "top_up" => Self::Deposit,
            _ => Self::Purchase,
        }
    }
}

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Order,
    Payment,
    System,
    #[default]
    Info,
}
