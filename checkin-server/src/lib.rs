//! checkin-server: family check-in service
//!
//! Grandparents post quizzes about their memories, family members answer
//! them, and a scheduled batch alerts the family when the quizzes stop.
//!
//! - [`api`]: axum routes
//! - [`services`]: business rules
//! - [`db`]: repository traits and their Postgres implementations
//! - [`line`]: LINE Messaging API and LINE Login clients
//! - [`jobs`]: background tasks, including the alert scheduler

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod line;
pub mod services;
pub mod state;
pub mod util;

#[cfg(test)]
mod testing;
