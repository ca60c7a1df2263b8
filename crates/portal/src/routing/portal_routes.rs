//! Portal route configuration.

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use softget_backend::core::Backend;

use crate::handlers;
use crate::middleware::session_guard;
use crate::state::AppState;

/// Creates all portal routes behind the session guard.
///
/// # Routes
///
/// ## Guarded
/// - `GET /` - Login page
/// - `GET /dashboard` - Association picker
///
/// ## Auth
/// - `GET /auth/sign-in/{provider}` - Provider sign-in redirect
/// - `POST /api/auth/callback` - Session callback
/// - `POST /api/auth/sign-out` - Sign out
///
/// ## Tenant
/// - `GET /associacao/{id}` - Association home
/// - `GET /associacao/{id}/{section}` - Section page
///
/// ## System
/// - `GET /health` - Health check
///
/// Unknown paths get a 404, after the guard has run.
pub fn create_routes<B>(state: AppState<B>) -> Router
where
    B: Backend + 'static,
{
    Router::new()
        // Guarded routes
        .route("/", get(handlers::login_handler::<B>))
        .route("/dashboard", get(handlers::dashboard_handler::<B>))
        // Auth routes
        .route("/auth/sign-in/{provider}", get(handlers::sign_in_handler::<B>))
        .route("/api/auth/callback", post(handlers::callback_handler::<B>))
        .route("/api/auth/sign-out", post(handlers::sign_out_handler::<B>))
        // Tenant routes
        .route("/associacao/{id}", get(handlers::tenant_page_handler::<B>))
        .route(
            "/associacao/{id}/{section}",
            get(handlers::tenant_page_handler::<B>),
        )
        // System routes
        .route("/health", get(handlers::health_handler::<B>))
        .fallback(handlers::not_found_handler)
        // Session guard
        .layer(from_fn_with_state(state.clone(), session_guard::<B>))
        .with_state(state)
}
