//! Dashboard synchronization engine.
//!
//! Owns the mutable [`DashboardSnapshot`]: optimistic local mutation when
//! the user creates an order, periodic full reconciliation against the
//! backend, and persistence back to the session store after every
//! mutation. Reconciliation replaces the affected snapshot slices
//! wholesale - the backend is authoritative once fetched - while each
//! fetch fails independently and leaves its slice's cached value in place.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Timelike, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, instrument};
use uuid::Uuid;

use upgrow_core::currency::group_digits;
use upgrow_core::{CurrencyCode, NotificationKind, OrderStatus, TransactionKind};

use crate::api::ApiClient;
use crate::api::types::{BillingSummaryPayload, OrderPayload, ProfileResponse, TransactionPayload, UserPayload};
use crate::error::EngineError;
use crate::models::snapshot::zero_activity_series;
use crate::models::{
    BillingSlice, DashboardSnapshot, Identity, MAX_NOTIFICATIONS, MAX_RECENT_ORDERS,
    MAX_TRANSACTIONS, Notification, Order, Transaction, push_front_bounded,
};
use crate::orders::OrderIntent;
use crate::session::SessionHandle;
use crate::store::SessionStore;

/// Dashboard synchronization engine.
///
/// Cheap to clone; all clones share one snapshot. The engine only ever
/// operates on the snapshot belonging to the active identity - switching
/// identities goes through [`DashboardEngine::prime`].
#[derive(Clone)]
pub struct DashboardEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    api: ApiClient,
    store: SessionStore,
    session: SessionHandle,
    snapshot: RwLock<DashboardSnapshot>,
}

impl DashboardEngine {
    #[must_use]
    pub fn new(api: ApiClient, store: SessionStore, session: SessionHandle) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                api,
                store,
                session,
                snapshot: RwLock::new(DashboardSnapshot::default()),
            }),
        }
    }

    /// Load the cached snapshot for an identity into memory.
    ///
    /// An account seen for the first time starts from the all-zero
    /// snapshot in its currency.
    pub(crate) fn prime(&self, identity: &Identity) {
        let snapshot = self
            .inner
            .store
            .load_snapshot(&identity.email)
            .unwrap_or_else(|| DashboardSnapshot::empty(identity.currency));
        *self.inner.snapshot.write() = snapshot;
    }

    /// Current snapshot, cloned for rendering.
    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.inner.snapshot.read().clone()
    }

    /// Apply a freshly created order to the snapshot ahead of backend
    /// confirmation.
    ///
    /// Prepends a `Pending` order, a signed purchase transaction, and an
    /// unread notification (each within its bound), bumps the order count,
    /// and adds the order's cost and profit to the *current wall-clock
    /// month's* revenue bucket - not the bucket of the order's own date.
    /// Persists the snapshot immediately.
    ///
    /// # Errors
    ///
    /// Requires an active identity; the engine never mutates a snapshot it
    /// cannot attribute to an account.
    pub fn apply_optimistic_order(&self, intent: &OrderIntent) -> Result<(), EngineError> {
        let Some(identity) = self.inner.session.identity() else {
            return Err(EngineError::NotAuthenticated);
        };
        let currency = identity.currency;
        let now = Utc::now();
        let quantity_label = group_digits(&intent.quantity.to_string());

        {
            let mut snapshot = self.inner.snapshot.write();

            push_front_bounded(
                &mut snapshot.orders,
                Order {
                    service_name: intent.service_name.clone(),
                    created_at: now,
                    quantity_label: quantity_label.clone(),
                    status: OrderStatus::Pending,
                    cost: intent.cost,
                    profit: intent.profit,
                },
                MAX_RECENT_ORDERS,
            );
            snapshot.order_count += 1;

            push_front_bounded(
                &mut snapshot.billing.transactions,
                Transaction {
                    id: Uuid::new_v4().to_string(),
                    date: now,
                    description: format!("Order: {}", intent.service_name),
                    amount_display: currency.format(-intent.cost),
                    status: "completed".to_owned(),
                    kind: TransactionKind::Purchase,
                },
                MAX_TRANSACTIONS,
            );

            push_front_bounded(
                &mut snapshot.notifications,
                Notification {
                    id: Uuid::new_v4().to_string(),
                    title: "Order placed".to_owned(),
                    message: format!("{} × {quantity_label}", intent.service_name),
                    relative_time: "just now".to_owned(),
                    kind: NotificationKind::Order,
                    unread: true,
                },
                MAX_NOTIFICATIONS,
            );

            // Profit lands on "now", not on the order's own date; backfill
            // is reconciliation's job.
            let month = usize::try_from(Local::now().month0()).unwrap_or(0);
            if let Some(bucket) = snapshot.revenue_series.get_mut(month) {
                bucket.revenue += intent.cost;
                bucket.profit += intent.profit;
            }
        }

        self.persist(&identity);
        Ok(())
    }

    /// Reconcile the snapshot against the backend.
    ///
    /// Fetches, in sequence, the billing summary, the order list, and the
    /// profile. Each fetch failure is independent: a failed slice keeps
    /// its cached value and the others still apply. Background callers do
    /// not see errors at all - stale data is preferred over an intrusive
    /// failure.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) {
        let Some(identity) = self.inner.session.identity() else {
            return;
        };
        let currency = identity.currency;

        let billing = match self
            .inner
            .api
            .get::<BillingSummaryPayload>("/billing/me")
            .await
        {
            Ok(payload) => Some(payload),
            Err(e) => {
                debug!(error = %e, "billing fetch failed, keeping cached slice");
                None
            }
        };

        let orders = match self.inner.api.get::<Vec<OrderPayload>>("/orders/me").await {
            Ok(payload) => Some(payload),
            Err(e) => {
                debug!(error = %e, "orders fetch failed, keeping cached slice");
                None
            }
        };

        {
            let mut snapshot = self.inner.snapshot.write();
            // A fresh account's all-zero remote state must not wipe
            // locally created content; any real remote data replaces its
            // slices wholesale.
            let keep_local =
                remote_is_all_zero(billing.as_ref(), orders.as_deref()) && !snapshot.is_all_zero();
            if !keep_local {
                if let Some(billing) = &billing {
                    apply_billing(&mut snapshot, billing, currency);
                }
                if let Some(orders) = &orders {
                    apply_orders(&mut snapshot, orders);
                }
            }
        }
        self.persist(&identity);

        match self.inner.api.get::<ProfileResponse>("/auth/me").await {
            Ok(profile) => {
                if let Some(user) = profile.user {
                    self.apply_profile(&user);
                }
            }
            Err(e) => debug!(error = %e, "profile fetch failed, keeping cached identity"),
        }
    }

    /// Fold a reconciled profile into the active identity.
    ///
    /// May flip `onboarding_complete` to true, which retroactively
    /// suppresses the Onboarding view on the next routing decision.
    fn apply_profile(&self, payload: &UserPayload) {
        let updated = self
            .inner
            .session
            .update_identity(|identity| identity.apply_profile(payload));

        if let Some(identity) = updated {
            if identity.onboarding_complete {
                self.inner.store.mark_onboarding_complete(&identity.email);
            }
            self.inner.store.save_identity(&identity);
        }
    }

    fn persist(&self, identity: &Identity) {
        let snapshot = self.inner.snapshot.read().clone();
        self.inner.store.save_snapshot(&identity.email, &snapshot);
    }
}

// =============================================================================
// Slice mapping
// =============================================================================

/// Replace the billing slice with reconciled backend data.
fn apply_billing(
    snapshot: &mut DashboardSnapshot,
    payload: &BillingSummaryPayload,
    currency: CurrencyCode,
) {
    let balance = decimal_from(payload.balance);
    let balance_display = currency.format(balance);

    snapshot.balance_display = balance_display.clone();
    snapshot.billing = BillingSlice {
        balance_display,
        transactions: payload
            .transactions
            .iter()
            .take(MAX_TRANSACTIONS)
            .map(|transaction| map_transaction(transaction, currency))
            .collect(),
    };
}

/// Replace the order slices (list, counts, activity series) with
/// reconciled backend data.
fn apply_orders(snapshot: &mut DashboardSnapshot, payloads: &[OrderPayload]) {
    let mut orders: Vec<Order> = payloads.iter().map(map_order).collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    snapshot.order_count = u32::try_from(orders.len()).unwrap_or(u32::MAX);
    snapshot.completed_count = count_status(&orders, OrderStatus::Completed);
    snapshot.cancelled_count = count_status(&orders, OrderStatus::Cancelled);

    // Activity is order-derived analytics, so it reconciles with the order
    // list it is computed from.
    let mut activity = zero_activity_series();
    for order in &orders {
        let bucket = usize::try_from(order.created_at.hour() / 4).unwrap_or(0);
        if let Some(bucket) = activity.get_mut(bucket) {
            bucket.orders += 1;
        }
    }
    snapshot.activity_series = activity;

    orders.truncate(MAX_RECENT_ORDERS);
    snapshot.orders = orders;
}

fn count_status(orders: &[Order], status: OrderStatus) -> u32 {
    u32::try_from(orders.iter().filter(|order| order.status == status).count()).unwrap_or(u32::MAX)
}

fn map_order(payload: &OrderPayload) -> Order {
    Order {
        service_name: payload
            .service_name
            .clone()
            .unwrap_or_else(|| "Unknown service".to_owned()),
        created_at: parse_timestamp(payload.created_at.as_deref()),
        quantity_label: group_digits(&payload.quantity.unwrap_or(0).to_string()),
        status: payload
            .status
            .as_deref()
            .map(OrderStatus::from_backend)
            .unwrap_or_default(),
        cost: decimal_from(payload.total_price),
        profit: decimal_from(payload.profit),
    }
}

fn map_transaction(payload: &TransactionPayload, currency: CurrencyCode) -> Transaction {
    let amount = decimal_from(payload.amount);
    let kind = payload.kind.as_deref().map_or_else(
        || {
            if amount.is_sign_negative() {
                TransactionKind::Purchase
            } else {
                TransactionKind::Deposit
            }
        },
        TransactionKind::from_backend,
    );

    Transaction {
        id: payload
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        date: parse_timestamp(payload.created_at.as_deref()),
        description: payload.description.clone().unwrap_or_default(),
        amount_display: currency.format(amount),
        status: payload
            .status
            .clone()
            .unwrap_or_else(|| "completed".to_owned()),
        kind,
    }
}

/// Whether the reconciled remote state carries no data at all.
fn remote_is_all_zero(
    billing: Option<&BillingSummaryPayload>,
    orders: Option<&[OrderPayload]>,
) -> bool {
    let billing_zero = billing
        .is_none_or(|payload| payload.transactions.is_empty() && decimal_from(payload.balance).is_zero());
    let orders_zero = orders.is_none_or(<[OrderPayload]>::is_empty);
    billing_zero && orders_zero && (billing.is_some() || orders.is_some())
}

fn decimal_from(value: Option<f64>) -> Decimal {
    value.and_then(Decimal::from_f64_retain).unwrap_or_default()
}

/// Parse the backend's timestamp strings leniently.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, and bare dates; anything else
/// falls back to "now" rather than failing the slice.
fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| {
        let s = s.trim();
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            })
    })
    .unwrap_or_else(Utc::now)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use upgrow_core::{Email, ServiceId};

    use crate::config::PanelConfig;
    use crate::store::MemoryStore;

    fn engine_with_identity(currency: &str) -> (DashboardEngine, SessionHandle, SessionStore) {
        let config = PanelConfig::new("http://127.0.0.1:9");
        let api = ApiClient::new(&config).unwrap();
        let store = SessionStore::new(Arc::new(MemoryStore::default()));
        let session = SessionHandle::default();
        let engine = DashboardEngine::new(api, store.clone(), session.clone());

        let identity = Identity::from_payload(
            Email::parse("sara@agency.ma").unwrap(),
            &UserPayload {
                currency: Some(currency.to_owned()),
                ..UserPayload::default()
            },
        );
        engine.prime(&identity);
        session.set_identity(identity);
        (engine, session, store)
    }

    fn intent(cost: Decimal, profit: Decimal) -> OrderIntent {
        OrderIntent {
            service_id: ServiceId::new(1),
            service_name: "Instagram Followers".to_owned(),
            quantity: 1000,
            link: "https://instagram.com/upgrow".to_owned(),
            cost,
            profit,
            proof_url: None,
            customer_name: None,
            payment_method: None,
        }
    }

    #[test]
    fn test_apply_optimistic_order_requires_identity() {
        let config = PanelConfig::new("http://127.0.0.1:9");
        let api = ApiClient::new(&config).unwrap();
        let store = SessionStore::new(Arc::new(MemoryStore::default()));
        let engine = DashboardEngine::new(api, store, SessionHandle::default());

        let result = engine.apply_optimistic_order(&intent(Decimal::ONE, Decimal::ONE));
        assert!(matches!(result, Err(EngineError::NotAuthenticated)));
    }

    #[test]
    fn test_apply_optimistic_order_mutations() {
        let (engine, _session, store) = engine_with_identity("USD");

        engine
            .apply_optimistic_order(&intent(Decimal::new(100, 0), Decimal::new(20, 0)))
            .unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.order_count, 1);
        assert_eq!(snapshot.orders.len(), 1);

        let order = snapshot.orders.first().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.quantity_label, "1,000");

        let transaction = snapshot.billing.transactions.first().unwrap();
        assert_eq!(transaction.kind, TransactionKind::Purchase);
        assert_eq!(transaction.amount_display, "-$100.00");

        let notification = snapshot.notifications.first().unwrap();
        assert_eq!(notification.kind, NotificationKind::Order);
        assert!(notification.unread);

        // The profit lands in the current wall-clock month's bucket.
        let month = usize::try_from(Local::now().month0()).unwrap();
        for (index, bucket) in snapshot.revenue_series.iter().enumerate() {
            if index == month {
                assert_eq!(bucket.revenue, Decimal::new(100, 0));
                assert_eq!(bucket.profit, Decimal::new(20, 0));
            } else {
                assert!(bucket.revenue.is_zero());
                assert!(bucket.profit.is_zero());
            }
        }

        // Persisted immediately.
        let persisted = store
            .load_snapshot(&Email::parse("sara@agency.ma").unwrap())
            .unwrap();
        assert_eq!(persisted, snapshot);
    }

    #[test]
    fn test_apply_optimistic_order_respects_bounds() {
        let (engine, _session, _store) = engine_with_identity("USD");

        for _ in 0..35 {
            engine
                .apply_optimistic_order(&intent(Decimal::ONE, Decimal::ZERO))
                .unwrap();
        }

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.order_count, 35);
        assert_eq!(snapshot.orders.len(), MAX_RECENT_ORDERS);
        assert_eq!(snapshot.billing.transactions.len(), MAX_TRANSACTIONS);
        assert_eq!(snapshot.notifications.len(), MAX_NOTIFICATIONS);
    }

    #[test]
    fn test_optimistic_amounts_use_identity_currency() {
        let (engine, _session, _store) = engine_with_identity("MAD");

        engine
            .apply_optimistic_order(&intent(Decimal::new(10, 0), Decimal::ONE))
            .unwrap();

        let snapshot = engine.snapshot();
        let transaction = snapshot.billing.transactions.first().unwrap();
        assert_eq!(transaction.amount_display, "-100.00 MAD");
    }

    #[tokio::test]
    async fn test_reconcile_with_unreachable_backend_keeps_snapshot() {
        let (engine, _session, _store) = engine_with_identity("USD");
        engine
            .apply_optimistic_order(&intent(Decimal::new(5, 0), Decimal::ONE))
            .unwrap();
        let before = engine.snapshot();

        engine.reconcile().await;

        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_apply_billing_replaces_wholesale() {
        let mut snapshot = DashboardSnapshot::default();
        snapshot.billing.transactions.push(Transaction {
            id: "stale".to_owned(),
            date: Utc::now(),
            description: "old".to_owned(),
            amount_display: "$1.00".to_owned(),
            status: "completed".to_owned(),
            kind: TransactionKind::Deposit,
        });

        let payload = BillingSummaryPayload {
            balance: Some(42.5),
            transactions: vec![TransactionPayload {
                id: Some("t1".to_owned()),
                created_at: Some("2026-03-04T10:00:00Z".to_owned()),
                description: Some("Deposit".to_owned()),
                amount: Some(50.0),
                status: Some("completed".to_owned()),
                kind: Some("deposit".to_owned()),
            }],
        };
        apply_billing(&mut snapshot, &payload, CurrencyCode::Usd);

        assert_eq!(snapshot.balance_display, "$42.50");
        assert_eq!(snapshot.billing.balance_display, "$42.50");
        assert_eq!(snapshot.billing.transactions.len(), 1);
        let transaction = snapshot.billing.transactions.first().unwrap();
        assert_eq!(transaction.id, "t1");
        assert_eq!(transaction.amount_display, "$50.00");
        assert_eq!(transaction.kind, TransactionKind::Deposit);
    }

    #[test]
    fn test_apply_billing_is_idempotent() {
        let payload = BillingSummaryPayload {
            balance: Some(10.0),
            transactions: vec![TransactionPayload {
                id: Some("t1".to_owned()),
                created_at: Some("2026-03-04T10:00:00Z".to_owned()),
                description: Some("Deposit".to_owned()),
                amount: Some(10.0),
                status: Some("completed".to_owned()),
                kind: Some("deposit".to_owned()),
            }],
        };

        let mut first = DashboardSnapshot::default();
        apply_billing(&mut first, &payload, CurrencyCode::Usd);
        let mut second = first.clone();
        apply_billing(&mut second, &payload, CurrencyCode::Usd);

        assert_eq!(first, second);
    }

    #[test]
    fn test_apply_orders_counts_and_truncates() {
        let mut snapshot = DashboardSnapshot::default();
        let payloads: Vec<OrderPayload> = (0..15)
            .map(|i| OrderPayload {
                service_name: Some(format!("Service {i}")),
                created_at: Some(format!("2026-03-{:02}T08:30:00Z", i + 1)),
                quantity: Some(100),
                status: Some(if i % 3 == 0 {
                    "completed".to_owned()
                } else if i % 3 == 1 {
                    "canceled".to_owned()
                } else {
                    "in_progress".to_owned()
                }),
                total_price: Some(1.0),
                profit: Some(0.2),
            })
            .collect();

        apply_orders(&mut snapshot, &payloads);

        assert_eq!(snapshot.order_count, 15);
        assert_eq!(snapshot.completed_count, 5);
        assert_eq!(snapshot.cancelled_count, 5);
        assert_eq!(snapshot.orders.len(), MAX_RECENT_ORDERS);
        // Most recent first.
        assert_eq!(snapshot.orders.first().unwrap().service_name, "Service 14");
        // All fifteen orders land in the 08-12 activity bucket.
        let bucket = snapshot.activity_series.get(2).unwrap();
        assert_eq!(bucket.label, "08-12");
        assert_eq!(bucket.orders, 15);
    }

    #[test]
    fn test_remote_is_all_zero() {
        let empty_billing = BillingSummaryPayload::default();
        let empty_orders: Vec<OrderPayload> = Vec::new();
        assert!(remote_is_all_zero(
            Some(&empty_billing),
            Some(&empty_orders)
        ));

        let funded = BillingSummaryPayload {
            balance: Some(5.0),
            transactions: Vec::new(),
        };
        assert!(!remote_is_all_zero(Some(&funded), Some(&empty_orders)));

        // Both fetches failed: nothing to decide.
        assert!(!remote_is_all_zero(None, None));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp(Some("2026-03-04T10:30:00Z"));
        assert_eq!(rfc.month0(), 2);
        assert_eq!(rfc.hour(), 10);

        let spaced = parse_timestamp(Some("2026-03-04 10:30:00"));
        assert_eq!(spaced, rfc.with_timezone(&Utc));

        let date_only = parse_timestamp(Some("2026-03-04"));
        assert_eq!(date_only.hour(), 0);
    }

    #[test]
    fn test_parse_timestamp_garbage_falls_back_to_now() {
        let before = Utc::now();
        let parsed = parse_timestamp(Some("not a date"));
        assert!(parsed >= before);
    }

    #[test]
    fn test_map_transaction_infers_kind_from_sign() {
        let payload = TransactionPayload {
            amount: Some(-4.5),
            ..TransactionPayload::default()
        };
        let transaction = map_transaction(&payload, CurrencyCode::Usd);
        assert_eq!(transaction.kind, TransactionKind::Purchase);
        assert_eq!(transaction.amount_display, "-$4.50");

        let payload = TransactionPayload {
            amount: Some(25.0),
            ..TransactionPayload::default()
        };
        let transaction = map_transaction(&payload, CurrencyCode::Usd);
        assert_eq!(transaction.kind, TransactionKind::Deposit);
    }
}
