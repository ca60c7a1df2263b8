//! Session token pair.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An opaque access/refresh token pair.
///
/// Created on sign-in, rotated by the identity provider on refresh and
/// destroyed on sign-out. `expires_at` is the access token expiry in unix
/// seconds when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Single-use token that trades for a new pair.
    pub refresh_token: String,
    /// Access token expiry (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl SessionTokens {
    /// Creates a token pair with unknown expiry.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: None,
        }
    }

    /// Sets the access token expiry.
    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns true if the access token expires within `margin` of `now`.
    ///
    /// A pair with unknown expiry never counts as expiring.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - margin.num_seconds() <= now.timestamp(),
            None => false,
        }
    }
}
