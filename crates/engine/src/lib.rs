//! Upgrow Engine - session and dashboard synchronization.
//!
//! This crate is the state layer of the Upgrow panel. It owns the
//! authenticated session and the per-account dashboard snapshot, and keeps
//! the snapshot synchronized between a local persisted store and the panel
//! backend, which stays the source of truth.
//!
//! # Architecture
//!
//! - The backend is reached only through [`api::ApiClient`]; payloads are
//!   validated once at that boundary and mapped to typed models.
//! - [`store::SessionStore`] wraps a key-value persistence medium supplied
//!   by the embedder (browser storage, a JSON file, memory in tests).
//! - [`session::SessionManager`] owns the identity lifecycle and the
//!   reconciliation interval; [`sync::DashboardEngine`] owns the snapshot.
//! - [`router`] is a pure decision function from session flags to exactly
//!   one top-level view; [`maintenance::MaintenanceGate`] overlays it.
//! - Local mutations are optimistic; periodic reconciliation replaces
//!   snapshot slices wholesale with backend data.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use upgrow_engine::{PanelEngine, config::PanelConfig, store::JsonFileStore};
//!
//! let config = PanelConfig::new("https://api.upgrow.example");
//! let engine = PanelEngine::new(config, Arc::new(JsonFileStore::open("panel.json")))?;
//! engine.start();
//!
//! if !engine.sessions().restore() {
//!     engine.sessions().login("user@example.com", "hunter2").await?;
//! }
//! let view = engine.current_view();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod models;
pub mod orders;
pub mod router;
pub mod session;
pub mod state;
pub mod store;
pub mod sync;
pub mod tasks;

pub use error::EngineError;
pub use state::PanelEngine;
