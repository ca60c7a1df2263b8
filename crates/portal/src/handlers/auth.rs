//! Sign-in, session callback and sign-out.
//!
//! Sign-in happens at the identity provider. The browser client reports the
//! outcome to the session callback, which writes (or clears) the session
//! cookies on its response.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use softget_backend::core::Backend;
use tracing::{debug, info};

use crate::error::{LOGIN_PATH, PortalError, PortalResult};
use crate::session::{RequestCookies, ResponseCookies};
use crate::state::AppState;

/// Auth state change reported by the browser client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    /// The user signed in.
    SignedIn,
    /// The user signed out.
    SignedOut,
    /// Any other event; acknowledged without effect.
    #[serde(other)]
    Other,
}

/// Tokens delivered with a sign-in event.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackSession {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
}

/// Body of the session callback.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackPayload {
    /// Reported event.
    pub event: AuthEvent,
    /// Session, when the event carries one.
    #[serde(default)]
    pub session: Option<CallbackSession>,
}

/// Handler that starts a provider sign-in.
///
/// # HTTP Request
///
/// `GET /auth/sign-in/{provider}`
///
/// # Response
///
/// - `303 See Other` - to the provider's authorize URL
pub async fn sign_in_handler<B>(
    State(state): State<AppState<B>>,
    Path(provider): Path<String>,
) -> Redirect
where
    B: Backend + 'static,
{
    let identity = state.identity(RequestCookies::default());
    let url = identity.sign_in_redirect(&provider, &state.config().sign_in_return_url());
    debug!(provider = %provider, "Redirecting to sign-in provider");
    Redirect::to(&url)
}

/// Handler for the session callback.
///
/// # HTTP Request
///
/// `POST /api/auth/callback` with `{"event": "...", "session": {...}}`
///
/// # Response
///
/// - `200 OK` - `{"success": true}`, with the session cookies set or cleared
/// - `400 Bad Request` - malformed body
/// - `303 See Other` - to `/` when the sign-in tokens are not accepted
pub async fn callback_handler<B>(
    State(state): State<AppState<B>>,
    headers: HeaderMap,
    body: Bytes,
) -> PortalResult<Response>
where
    B: Backend + 'static,
{
    let payload: CallbackPayload = serde_json::from_slice(&body)
        .map_err(|e| PortalError::bad_request(format!("invalid callback body: {}", e)))?;

    let mut identity = state.identity(ResponseCookies::from_headers(&headers));
    match (payload.event, payload.session) {
        (AuthEvent::SignedIn, Some(session)) => {
            let user = identity
                .establish_session(&session.access_token, &session.refresh_token)
                .await?;
            info!(user_id = %user.id, "User signed in");
        }
        (AuthEvent::SignedOut, _) => {
            identity.sign_out().await;
            info!("User signed out");
        }
        (event, _) => debug!(event = ?event, "Auth callback acknowledged without effect"),
    }

    let mut response = Json(serde_json::json!({ "success": true })).into_response();
    identity.into_store().apply(&mut response);
    Ok(response)
}

/// Handler for the sign-out action.
///
/// # HTTP Request
///
/// `POST /api/auth/sign-out`
///
/// # Response
///
/// - `303 See Other` - to `/`, with the session cookies cleared
pub async fn sign_out_handler<B>(State(state): State<AppState<B>>, headers: HeaderMap) -> Response
where
    B: Backend + 'static,
{
    let mut identity = state.identity(ResponseCookies::from_headers(&headers));
    identity.sign_out().await;

    let mut response = Redirect::to(LOGIN_PATH).into_response();
    identity.into_store().apply(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_events() {
        let signed_in: CallbackPayload = serde_json::from_str(
            r#"{"event":"SIGNED_IN","session":{"access_token":"a","refresh_token":"r"}}"#,
        )
        .unwrap();
        assert_eq!(signed_in.event, AuthEvent::SignedIn);
        assert_eq!(signed_in.session.unwrap().refresh_token, "r");

        let signed_out: CallbackPayload = serde_json::from_str(r#"{"event":"SIGNED_OUT"}"#).unwrap();
        assert_eq!(signed_out.event, AuthEvent::SignedOut);
        assert!(signed_out.session.is_none());

        let other: CallbackPayload =
            serde_json::from_str(r#"{"event":"TOKEN_REFRESHED","session":null}"#).unwrap();
        assert_eq!(other.event, AuthEvent::Other);
    }

    #[test]
    fn test_payload_requires_event() {
        assert!(serde_json::from_str::<CallbackPayload>(r#"{"session":null}"#).is_err());
        assert!(serde_json::from_str::<CallbackPayload>("not json").is_err());
    }
}
