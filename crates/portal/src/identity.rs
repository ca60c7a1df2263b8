//! Identity client.
//!
//! Binds an [`IdentityProvider`] to one request's [`SessionStore`]. Every
//! mutating call writes through the store; callers holding a
//! [`ResponseCookies`](crate::session::ResponseCookies) apply the
//! accumulated writes to their response.
//!
//! The caller's identity is always re-validated against the provider; the
//! cookie alone is never trusted.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use serde::Deserialize;
use softget_backend::core::IdentityProvider;
use softget_backend::types::{SessionTokens, User};
use tracing::{debug, error, warn};

use crate::error::{PortalError, PortalResult};
use crate::session::{SessionCookie, SessionStore};

/// Sessions expiring within this many seconds are refreshed.
pub const REFRESH_MARGIN_SECS: i64 = 10;

/// A validated user together with the session that proved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// The provider's user record.
    pub user: User,
    /// The session tokens in use.
    pub tokens: SessionTokens,
}

impl Authenticated {
    /// Returns the access token for data queries on the user's behalf.
    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }
}

/// Identity operations over one request's cookies.
pub struct IdentityClient<'a, P: ?Sized, S> {
    provider: &'a P,
    cookie: &'a SessionCookie,
    store: S,
}

impl<'a, P, S> IdentityClient<'a, P, S>
where
    P: IdentityProvider + ?Sized,
    S: SessionStore,
{
    /// Creates a client over `store`.
    pub fn new(provider: &'a P, cookie: &'a SessionCookie, store: S) -> Self {
        Self {
            provider,
            cookie,
            store,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the client and returns the store with its writes.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Returns the current session, refreshing it when it is about to
    /// expire and the store can persist the rotated tokens.
    ///
    /// A rejected refresh clears the session. When the provider is
    /// unreachable the session is absent for this call only and the cookies
    /// are left untouched.
    pub async fn session(&mut self) -> Option<SessionTokens> {
        let tokens = self.cookie.read(&self.store)?;

        let expiring = tokens.expires_within(Utc::now(), Duration::seconds(REFRESH_MARGIN_SECS));
        if !expiring || !self.store.is_writable() {
            return Some(tokens);
        }

        match self.provider.refresh_session(&tokens.refresh_token).await {
            Ok(refreshed) => {
                debug!("Session refreshed");
                self.cookie.write(&mut self.store, &refreshed);
                Some(refreshed)
            }
            Err(e) if e.is_transient() => {
                warn!(error = %e, "Session refresh unavailable, keeping session");
                None
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed, clearing session");
                self.cookie.clear(&mut self.store);
                None
            }
        }
    }

    /// Resolves the session and validates it with the provider.
    pub async fn authenticate(&mut self) -> Option<Authenticated> {
        let tokens = self.session().await?;
        match self.provider.get_user(&tokens.access_token).await {
            Ok(Some(user)) => Some(Authenticated { user, tokens }),
            Ok(None) => {
                debug!("Session token rejected by identity provider");
                None
            }
            Err(e) => {
                error!(error = %e, "Identity provider lookup failed");
                None
            }
        }
    }

    /// Returns the signed-in user, if any.
    pub async fn current_user(&mut self) -> Option<User> {
        self.authenticate().await.map(|auth| auth.user)
    }

    /// Persists a session from tokens obtained by a client-side sign-in.
    ///
    /// The access token is validated first; if the provider rejects it the
    /// refresh token is traded for a new pair.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Unauthenticated`] when neither token yields a
    /// user.
    pub async fn establish_session(
        &mut self,
        access_token: &str,
        refresh_token: &str,
    ) -> PortalResult<User> {
        let (user, tokens) = match self.provider.get_user(access_token).await {
            Ok(Some(user)) => {
                let mut tokens = SessionTokens::new(access_token, refresh_token);
                tokens.expires_at = unverified_expiry(access_token);
                (user, tokens)
            }
            Ok(None) => self.establish_by_refresh(refresh_token).await?,
            Err(e) => {
                error!(error = %e, "Identity provider lookup failed during sign-in");
                return Err(PortalError::Unauthenticated);
            }
        };

        self.cookie.write(&mut self.store, &tokens);
        debug!(user_id = %user.id, "Session established");
        Ok(user)
    }

    async fn establish_by_refresh(&self, refresh_token: &str) -> PortalResult<(User, SessionTokens)> {
        let mut tokens = self
            .provider
            .refresh_session(refresh_token)
            .await
            .map_err(|e| {
                warn!(error = %e, "Sign-in tokens rejected");
                PortalError::Unauthenticated
            })?;
        if tokens.expires_at.is_none() {
            tokens.expires_at = unverified_expiry(&tokens.access_token);
        }

        match self.provider.get_user(&tokens.access_token).await {
            Ok(Some(user)) => Ok((user, tokens)),
            _ => Err(PortalError::Unauthenticated),
        }
    }

    /// Ends the session at the provider and clears the cookies.
    ///
    /// Safe to call without a session and safe to call twice.
    pub async fn sign_out(&mut self) {
        if let Some(tokens) = self.cookie.read(&self.store) {
            if let Err(e) = self.provider.sign_out(&tokens.access_token).await {
                warn!(error = %e, "Provider sign-out failed");
            }
        }
        self.cookie.clear(&mut self.store);
    }

    /// Returns the provider-hosted sign-in URL.
    pub fn sign_in_redirect(&self, provider: &str, redirect_to: &str) -> String {
        self.provider.authorize_url(provider, redirect_to)
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Reads the `exp` claim of a JWT without verifying it.
///
/// Only used to schedule refreshes; the provider still validates the token.
fn unverified_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()?.exp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CookieOptions, RequestCookies, ResponseCookies};
    use softget_backend::backends::memory::InMemoryBackend;

    fn cookie() -> SessionCookie {
        SessionCookie::new("sb-auth-token", CookieOptions::default())
    }

    fn backend(ttl: i64) -> InMemoryBackend {
        let backend = InMemoryBackend::with_access_ttl(ttl);
        backend.add_user(User::new("u-1", "ana@example.org"));
        backend
    }

    fn store_with(tokens: &SessionTokens) -> ResponseCookies {
        let mut store = ResponseCookies::default();
        cookie().write(&mut store, tokens);
        store
    }

    #[tokio::test]
    async fn test_no_cookie_is_absent() {
        let backend = backend(3600);
        let cookie = cookie();
        let mut client = IdentityClient::new(&backend, &cookie, RequestCookies::default());
        assert!(client.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_current_user_validates_with_provider() {
        let backend = backend(3600);
        let tokens = backend.issue_session("u-1").unwrap();
        let cookie = cookie();

        let mut client = IdentityClient::new(&backend, &cookie, store_with(&tokens));
        assert_eq!(client.current_user().await.unwrap().id, "u-1");

        backend.expire_access_token(&tokens.access_token);
        let mut client = IdentityClient::new(&backend, &cookie, store_with(&tokens));
        assert!(client.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_forged_cookie_is_rejected() {
        let backend = backend(3600);
        let cookie = cookie();
        let forged = SessionTokens::new("at-forged", "rt-forged");
        let mut client = IdentityClient::new(&backend, &cookie, store_with(&forged));
        assert!(client.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_is_absent() {
        let backend = backend(3600);
        let tokens = backend.issue_session("u-1").unwrap();
        backend.set_identity_unavailable(true);
        let cookie = cookie();

        let mut client = IdentityClient::new(&backend, &cookie, store_with(&tokens));
        assert!(client.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_expiring_session_is_refreshed_on_writable_store() {
        let backend = backend(5);
        let tokens = backend.issue_session("u-1").unwrap();
        let cookie = cookie();

        let mut client = IdentityClient::new(&backend, &cookie, store_with(&tokens));
        let auth = client.authenticate().await.unwrap();
        assert_ne!(auth.tokens.refresh_token, tokens.refresh_token);

        let store = client.into_store();
        assert_eq!(cookie.read(&store), Some(auth.tokens));
    }

    #[tokio::test]
    async fn test_read_only_store_never_refreshes() {
        let backend = backend(5);
        let tokens = backend.issue_session("u-1").unwrap();
        let cookie = cookie();

        let mut headers = axum::http::HeaderMap::new();
        let value = format!("sb-auth-token={}", crate::session::codec::encode(&tokens));
        headers.insert(axum::http::header::COOKIE, value.parse().unwrap());

        let mut client = IdentityClient::new(&backend, &cookie, RequestCookies::from_headers(&headers));
        let session = client.session().await.unwrap();
        assert_eq!(session.refresh_token, tokens.refresh_token);

        // the refresh token is still usable
        assert!(backend.refresh_session(&tokens.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let backend = backend(5);
        let tokens = backend.issue_session("u-1").unwrap();
        backend.refresh_session(&tokens.refresh_token).await.unwrap();
        let cookie = cookie();

        let mut client = IdentityClient::new(&backend, &cookie, store_with(&tokens));
        assert!(client.session().await.is_none());
        let store = client.into_store();
        assert!(cookie.read(&store).is_none());
        assert!(store.pending().any(|v| v.starts_with("sb-auth-token=;")));
    }

    #[tokio::test]
    async fn test_refresh_outage_keeps_session() {
        let backend = backend(5);
        let tokens = backend.issue_session("u-1").unwrap();
        backend.set_identity_unavailable(true);
        let cookie = cookie();

        let mut client = IdentityClient::new(&backend, &cookie, store_with(&tokens));
        assert!(client.session().await.is_none());
        let store = client.into_store();
        assert_eq!(cookie.read(&store), Some(tokens.clone()));
        assert!(store.pending().all(|v| !v.contains("Max-Age=0")));

        backend.set_identity_unavailable(false);
        assert!(backend.refresh_session(&tokens.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_establish_then_current_user() {
        let backend = backend(3600);
        let tokens = backend.issue_session("u-1").unwrap();
        let cookie = cookie();

        let mut client = IdentityClient::new(&backend, &cookie, ResponseCookies::default());
        let user = client
            .establish_session(&tokens.access_token, &tokens.refresh_token)
            .await
            .unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(client.current_user().await, Some(user));
        assert!(client.store().has_pending());
    }

    #[tokio::test]
    async fn test_establish_falls_back_to_refresh() {
        let backend = backend(3600);
        let tokens = backend.issue_session("u-1").unwrap();
        backend.expire_access_token(&tokens.access_token);
        let cookie = cookie();

        let mut client = IdentityClient::new(&backend, &cookie, ResponseCookies::default());
        client
            .establish_session(&tokens.access_token, &tokens.refresh_token)
            .await
            .unwrap();
        let stored = cookie.read(client.store()).unwrap();
        assert_ne!(stored.access_token, tokens.access_token);
    }

    #[tokio::test]
    async fn test_establish_with_bad_tokens_fails() {
        let backend = backend(3600);
        let cookie = cookie();
        let mut client = IdentityClient::new(&backend, &cookie, ResponseCookies::default());
        let result = client.establish_session("at-bad", "rt-bad").await;
        assert!(matches!(result, Err(PortalError::Unauthenticated)));
        assert!(!client.store().has_pending());
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent() {
        let backend = backend(3600);
        let tokens = backend.issue_session("u-1").unwrap();
        let cookie = cookie();

        let mut client = IdentityClient::new(&backend, &cookie, store_with(&tokens));
        client.sign_out().await;
        assert!(client.current_user().await.is_none());
        assert!(!backend.is_live(&tokens.access_token));

        client.sign_out().await;
        assert!(cookie.read(client.store()).is_none());
        assert_eq!(backend.sign_out_count(), 1);
    }

    #[test]
    fn test_unverified_expiry() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"u-1","exp":1700000000}"#);
        let token = format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", payload);
        assert_eq!(unverified_expiry(&token), Some(1_700_000_000));
        assert_eq!(unverified_expiry("opaque-token"), None);
    }
}
