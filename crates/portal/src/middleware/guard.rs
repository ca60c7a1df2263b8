//! Edge router guard.
//!
//! Runs ahead of every handler but only acts on the login path (`/`) and
//! the dashboard subtree (`/dashboard`, `/dashboard/...`). It looks at one
//! fact, whether the request carries a valid session, and never at tenant
//! roles:
//!
//! | Session | Login path | Action |
//! |---------|------------|--------|
//! | no | no | redirect to `/` |
//! | no | yes | pass through |
//! | yes | yes | redirect to `/dashboard` |
//! | yes | no | pass through |
//!
//! The session is resolved with a read-write cookie store, so an expiring
//! session is refreshed here. Cookie writes are applied to whichever
//! response is returned, and on pass-through the request `Cookie` header is
//! rewritten so the handler sees the refreshed session.

use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use softget_backend::core::Backend;
use tracing::debug;

use crate::error::{DASHBOARD_PATH, LOGIN_PATH};
use crate::session::ResponseCookies;
use crate::state::AppState;

/// What the guard does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Serve the requested path.
    PassThrough,
    /// Send the caller to the login page.
    RedirectToLogin,
    /// Send the caller to the tenant list.
    RedirectToDashboard,
}

/// Returns true for paths the guard applies to.
pub fn is_guarded_path(path: &str) -> bool {
    path == LOGIN_PATH || path == DASHBOARD_PATH || path.starts_with("/dashboard/")
}

/// Returns true for the login path.
pub fn is_login_path(path: &str) -> bool {
    path == LOGIN_PATH
}

/// Applies the transition table.
pub fn decide(has_session: bool, is_login_path: bool) -> GuardDecision {
    match (has_session, is_login_path) {
        (false, false) => GuardDecision::RedirectToLogin,
        (false, true) => GuardDecision::PassThrough,
        (true, true) => GuardDecision::RedirectToDashboard,
        (true, false) => GuardDecision::PassThrough,
    }
}

/// Middleware function for the session guard.
///
/// Use with `axum::middleware::from_fn_with_state`. A validated user is
/// stored in the request extensions for the downstream handler.
pub async fn session_guard<B>(
    State(state): State<AppState<B>>,
    mut request: Request,
    next: Next,
) -> Response
where
    B: Backend + 'static,
{
    let path = request.uri().path().to_string();
    if !is_guarded_path(&path) {
        return next.run(request).await;
    }

    let mut identity = state.identity(ResponseCookies::from_headers(request.headers()));
    let authenticated = identity.authenticate().await;
    let cookies = identity.into_store();

    let decision = decide(authenticated.is_some(), is_login_path(&path));
    debug!(path = %path, decision = ?decision, "Session guard");

    let mut response = match decision {
        GuardDecision::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
        GuardDecision::RedirectToDashboard => Redirect::to(DASHBOARD_PATH).into_response(),
        GuardDecision::PassThrough => {
            if cookies.has_pending() {
                match cookies.request_cookie_header() {
                    Some(header) => {
                        request.headers_mut().insert(COOKIE, header);
                    }
                    None => {
                        request.headers_mut().remove(COOKIE);
                    }
                }
            }
            if let Some(auth) = authenticated {
                request.extensions_mut().insert(auth);
            }
            next.run(request).await
        }
    };

    cookies.apply(&mut response);
    response
}
