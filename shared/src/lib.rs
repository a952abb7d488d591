//! Shared types for the family check-in service
//!
//! Error taxonomy, domain models and DTOs, and small utilities used by the
//! server and its tests.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
