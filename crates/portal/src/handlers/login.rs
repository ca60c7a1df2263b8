//! Login page.

use axum::{Json, extract::State};
use serde::Serialize;
use softget_backend::core::Backend;

use crate::state::AppState;

/// Data for the login page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginView {
    /// Configured sign-in provider.
    pub provider: String,
    /// Path that starts the provider sign-in.
    pub sign_in_url: String,
}

/// Handler for the login page.
///
/// Only reached without a session; the guard sends signed-in callers to
/// the dashboard.
///
/// # HTTP Request
///
/// `GET /`
pub async fn login_handler<B>(State(state): State<AppState<B>>) -> Json<LoginView>
where
    B: Backend + 'static,
{
    let provider = state.config().sign_in_provider.clone();
    Json(LoginView {
        sign_in_url: format!("/auth/sign-in/{}", provider),
        provider,
    })
}
