//! Upgrow Core - Shared types library.
//!
//! This crate provides common types used across all Upgrow components:
//! - `engine` - the session and dashboard synchronization engine
//! - embedding view layers - they render the engine's state, never own it
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be
//! used anywhere, including inside view code.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails and ids, role derivation,
//!   status enums, and currency-aware amount formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
