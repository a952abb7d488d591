//! Data models
//!
//! Shared between checkin-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes, all timestamps Unix milliseconds.

pub mod alert;
pub mod group;
pub mod quiz;
pub mod request;
pub mod user;

// Re-exports
pub use alert::*;
pub use group::*;
pub use quiz::*;
pub use request::*;
pub use user::*;
