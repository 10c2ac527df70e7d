//! Integration tests for the Upgrow panel engine.
//!
//! # Running Tests
//!
//! ```bash
//! # Offline engine flows (no backend required)
//! cargo test -p upgrow-integration-tests
//!
//! # Flows against a live backend
//! UPGROW_API_BASE_URL=http://localhost:8000 \
//!     cargo test -p upgrow-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `engine_flows` - Offline session/dashboard flows against in-memory
//!   storage; these run unconditionally.
//! - `live_backend` - Flows that need a running panel backend; marked
//!   `#[ignore]` with the reason.

use std::sync::Arc;

use upgrow_engine::PanelEngine;
use upgrow_engine::config::PanelConfig;
use upgrow_engine::store::{KvStore, MemoryStore};

/// Base URL for the live backend (configurable via environment).
#[must_use]
pub fn live_base_url() -> String {
    std::env::var("UPGROW_API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Engine over in-memory storage and an unroutable backend.
///
/// Network attempts fail fast, which is exactly what the offline flows
/// exercise: the engine must degrade to cached state, never error out.
#[must_use]
pub fn offline_engine() -> PanelEngine {
    offline_engine_with(Arc::new(MemoryStore::default()))
}

/// Offline engine over a caller-supplied medium (to simulate restarts
/// against shared storage).
#[must_use]
pub fn offline_engine_with(medium: Arc<dyn KvStore>) -> PanelEngine {
    let config = PanelConfig::new("http://127.0.0.1:9");
    PanelEngine::new(config, medium).expect("engine construction cannot fail with a valid config")
}

/// Engine pointed at the live backend.
#[must_use]
pub fn live_engine() -> PanelEngine {
    let config = PanelConfig::new(live_base_url());
    PanelEngine::new(config, Arc::new(MemoryStore::default()))
        .expect("engine construction cannot fail with a valid config")
}

/// Initialize test logging once; safe to call from every test.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
