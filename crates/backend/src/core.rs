//! Collaborator contracts.
//!
//! The portal sees the hosted backend through two traits:
//!
//! - [`IdentityProvider`] - `getUser(token)`, refresh, `signOut(token)` and the
//!   provider-hosted sign-in redirect
//! - [`DataApi`] - `query(table, filters, joins) -> rows | error`
//!
//! [`Backend`] ties both together for backends that serve both roles.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendResult;
use crate::types::{Query, SessionTokens, User};

/// Identity provider contract.
///
/// Implementations must validate tokens against the provider itself rather
/// than trusting anything the client supplied.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the user behind an access token.
    ///
    /// Returns `Ok(None)` when the provider rejects the token (expired,
    /// revoked, unknown) and `Err` only when the provider could not answer.
    async fn get_user(&self, access_token: &str) -> BackendResult<Option<User>>;

    /// Trades a refresh token for a new token pair.
    ///
    /// Refresh tokens are single use; the returned pair replaces the old one.
    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<SessionTokens>;

    /// Revokes the session behind an access token.
    ///
    /// Revoking an already revoked or unknown session succeeds.
    async fn sign_out(&self, access_token: &str) -> BackendResult<()>;

    /// Builds the provider-hosted OAuth sign-in URL.
    fn authorize_url(&self, provider: &str, redirect_to: &str) -> String;
}

/// Tenant data API contract.
#[async_trait]
pub trait DataApi: Send + Sync {
    /// Runs a tabular lookup and returns the matching rows.
    ///
    /// `access_token` is the caller's token so row-level security applies;
    /// `None` runs the query anonymously.
    async fn query(&self, access_token: Option<&str>, query: &Query) -> BackendResult<Vec<Value>>;
}

/// A backend serving both identity and data.
pub trait Backend: IdentityProvider + DataApi {
    /// Returns a human-readable name for this backend.
    fn backend_name(&self) -> &'static str;
}
