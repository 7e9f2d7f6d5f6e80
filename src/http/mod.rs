//! HTTP surface
//!
//! Thin axum layer over [`crate::task::DiscoveryCoordinator`]; every handler
//! maps [`crate::error::EngineError`] to a structured error body.

pub mod handler;
pub mod server;

pub use handler::AppState;
pub use server::{router, HttpServer};
