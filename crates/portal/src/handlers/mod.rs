//! HTTP request handlers.
//!
//! - [`login`] - login page data
//! - [`auth`] - sign-in redirect, session callback and sign-out
//! - [`dashboard`] - association picker
//! - [`tenant`] - association home and section pages
//! - [`health`] - health check endpoint

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod login;
pub mod tenant;

pub use auth::{callback_handler, sign_in_handler, sign_out_handler};
pub use dashboard::dashboard_handler;
pub use health::health_handler;
pub use login::login_handler;
pub use tenant::tenant_page_handler;

use axum::http::Uri;

use crate::error::PortalError;

/// Fallback for unknown paths.
pub async fn not_found_handler(uri: Uri) -> PortalError {
    PortalError::NotFound {
        path: uri.path().to_string(),
    }
}
