//! Maintenance gate.
//!
//! Periodically probes a lightweight backend endpoint from process start,
//! independent of login state. HTTP 503 means the panel is in maintenance;
//! the flag is suppressed for administrators only - every other role,
//! including unauthenticated visitors, is routed to the maintenance page
//! while it is set. Probe transport failures keep the prior flag value
//! (fail open, not closed).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use upgrow_core::Role;

use crate::api::ApiClient;
use crate::session::SessionHandle;

/// Path probed by the gate. The services catalog is the cheapest endpoint
/// the backend serves, and it returns 503 while in maintenance.
const PROBE_PATH: &str = "/services";

/// Maintenance mode: HTTP status the backend answers with.
const MAINTENANCE_STATUS: u16 = 503;

/// Global "system unavailable" flag, shared across clones.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceGate {
    inner: Arc<GateState>,
}

#[derive(Debug, Default)]
struct GateState {
    unavailable: AtomicBool,
}

impl MaintenanceGate {
    /// Whether the panel is currently flagged unavailable.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.inner.unavailable.load(Ordering::Relaxed)
    }

    /// Run one probe cycle and update the flag.
    ///
    /// Transport failures are logged and otherwise ignored - the prior
    /// flag value is retained.
    pub async fn poll(&self, api: &ApiClient, session: &SessionHandle) {
        match api.probe(PROBE_PATH).await {
            Ok(status) => {
                let next = interpret(status, session.role());
                let prior = self.inner.unavailable.swap(next, Ordering::Relaxed);
                if prior != next {
                    info!(unavailable = next, "maintenance state changed");
                }
            }
            Err(e) => {
                warn!(error = %e, "maintenance probe failed, keeping prior state");
            }
        }
    }
}

/// Pure probe decision.
///
/// A 503 flags the system unavailable unless the active role is
/// privileged; any other status clears the flag.
fn interpret(status: u16, role: Option<Role>) -> bool {
    status == MAINTENANCE_STATUS && !role.is_some_and(|role| role.is_privileged())
}
