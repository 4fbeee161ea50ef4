//! HTTP API module.
//!
//! This module provides the HTTP server and API types for the cheque backend.

pub mod server;
pub mod types;

pub use server::{build_router, serve, start_server, AppState};
pub use types::*;
