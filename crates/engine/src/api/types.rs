//! Wire payload schemas for the panel backend.
//!
//! The backend's JSON is loosely typed; it is validated here once, at the
//! boundary. Every incoming field is optional with a default, so a missing
//! or null field fails closed (the mapping layer keeps the prior value or a
//! zero) instead of propagating into the snapshot. Timestamps arrive as
//! strings in more than one format and are parsed leniently by the
//! synchronization engine.

use serde::{Deserialize, Serialize};

use upgrow_core::ServiceId;

// =============================================================================
// Incoming payloads
// =============================================================================

/// Response to `POST /auth/login` and `POST /auth/google`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthResponse {
    /// Bearer credential for subsequent authenticated calls.
    pub access_token: Option<String>,
    /// Profile of the authenticated account.
    pub user: Option<UserPayload>,
}

/// Response to `GET /auth/me`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileResponse {
    pub user: Option<UserPayload>,
}

/// Backend profile record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserPayload {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub agency_name: Option<String>,
    /// Free-form role string; mapped through `Role::derive`.
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub onboarding_complete: Option<bool>,
    pub currency: Option<String>,
    pub language: Option<String>,
}

/// Response to `GET /billing/me`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BillingSummaryPayload {
    /// Account balance in the backend's stored currency (USD).
    pub balance: Option<f64>,
    pub transactions: Vec<TransactionPayload>,
}

/// One billing history entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionPayload {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub description: Option<String>,
    /// Signed amount; purchases are negative.
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub kind: Option<String>,
}

/// One entry of `GET /orders/me`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderPayload {
    pub service_name: Option<String>,
    pub created_at: Option<String>,
    pub quantity: Option<u64>,
    pub status: Option<String>,
    pub total_price: Option<f64>,
    pub profit: Option<f64>,
}

// =============================================================================
// Outgoing payloads
// =============================================================================

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/signup`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/google`.
#[derive(Debug, Clone, Serialize)]
pub struct GoogleAuthRequest {
    pub token: String,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub service_id: ServiceId,
    pub quantity: u64,
    pub link: String,
    pub total_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Body of `POST /onboarding`.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingRequest {
    pub full_name: String,
    pub phone: String,
    pub country: String,
    pub agency_name: String,
}
