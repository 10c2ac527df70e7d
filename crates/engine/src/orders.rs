//! Order intent handling.
//!
//! Validates a create-order action and forwards it to the backend. A
//! session without a bearer credential still accepts the intent as a
//! local-only simulation (demo and offline creation flows); with a
//! credential, the backend must confirm before the snapshot is touched.
//! The handler never retries.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, instrument};

use upgrow_core::ServiceId;

use crate::api::ApiClient;
use crate::api::types::CreateOrderRequest;
use crate::error::EngineError;
use crate::sync::DashboardEngine;

/// A user's intent to create an order, before backend confirmation.
#[derive(Debug, Clone)]
pub struct OrderIntent {
    pub service_id: ServiceId,
    pub service_name: String,
    pub quantity: u64,
    /// Target link the service is delivered to.
    pub link: String,
    /// Total charged to the account, in the backend's stored currency.
    pub cost: Decimal,
    /// Reseller margin on this order.
    pub profit: Decimal,
    pub proof_url: Option<String>,
    pub customer_name: Option<String>,
    pub payment_method: Option<String>,
}

impl OrderIntent {
    fn validate(&self) -> Result<(), EngineError> {
        if self.quantity == 0 {
            return Err(EngineError::InvalidIntent(
                "quantity must be at least 1".to_owned(),
            ));
        }
        if self.link.trim().is_empty() {
            return Err(EngineError::InvalidIntent(
                "target link is required".to_owned(),
            ));
        }
        if self.cost.is_sign_negative() {
            return Err(EngineError::InvalidIntent(
                "cost cannot be negative".to_owned(),
            ));
        }
        Ok(())
    }

    fn to_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            service_id: self.service_id,
            quantity: self.quantity,
            link: self.link.clone(),
            total_price: self.cost.to_f64().unwrap_or(0.0),
            proof_url: self.proof_url.clone(),
            customer_name: self.customer_name.clone(),
            payment_method: self.payment_method.clone(),
        }
    }
}

/// Order intent handler.
#[derive(Clone)]
pub struct OrderIntentHandler {
    api: ApiClient,
    sync: DashboardEngine,
}

impl OrderIntentHandler {
    #[must_use]
    pub const fn new(api: ApiClient, sync: DashboardEngine) -> Self {
        Self { api, sync }
    }

    /// Validate and submit an order intent.
    ///
    /// Without a bearer credential the order is created locally only - no
    /// backend call is made. With one, the backend must accept the order
    /// first; a rejection surfaces its `detail` message verbatim and
    /// leaves the snapshot untouched. Never retries.
    ///
    /// # Errors
    ///
    /// Local validation failures, backend rejections, and transport
    /// failures; in every error case the snapshot is unchanged.
    #[instrument(skip(self, intent), fields(service = %intent.service_name, quantity = intent.quantity))]
    pub async fn submit(&self, intent: OrderIntent) -> Result<(), EngineError> {
        intent.validate()?;

        if !self.api.has_token() {
            debug!("no bearer credential, creating order locally only");
            return self.sync.apply_optimistic_order(&intent);
        }

        self.api.post_unit("/orders", &intent.to_request()).await?;
        self.sync.apply_optimistic_order(&intent)
    }
}
