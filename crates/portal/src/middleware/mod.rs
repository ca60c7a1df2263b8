//! Axum middleware for the portal.

pub mod guard;

pub use guard::{GuardDecision, session_guard};
