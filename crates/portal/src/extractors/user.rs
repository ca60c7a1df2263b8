//! Signed-in user extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use softget_backend::core::Backend;

use crate::error::PortalError;
use crate::identity::Authenticated;
use crate::session::RequestCookies;
use crate::state::AppState;

/// Axum extractor for the signed-in user.
///
/// Reuses the user validated by the session guard when present, otherwise
/// validates the request cookies itself. Rejects with
/// [`PortalError::Unauthenticated`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Authenticated);

impl CurrentUser {
    /// Returns the validated user and session.
    pub fn authenticated(&self) -> &Authenticated {
        &self.0
    }
}

impl<B> FromRequestParts<AppState<B>> for CurrentUser
where
    B: Backend + 'static,
{
    type Rejection = PortalError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<B>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<Authenticated>() {
            return Ok(CurrentUser(auth.clone()));
        }

        let mut identity = state.identity(RequestCookies::from_headers(&parts.headers));
        identity
            .authenticate()
            .await
            .map(CurrentUser)
            .ok_or(PortalError::Unauthenticated)
    }
}
