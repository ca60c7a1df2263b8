//! Identity-provider-issued user record.

use serde::{Deserialize, Serialize};

/// A user as issued by the identity provider.
///
/// Immutable from the portal's perspective. The provider returns many more
/// fields; only the ones the portal uses are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider-assigned user id.
    pub id: String,
    /// Primary email, when the provider knows one.
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Creates a user with an email address.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
        }
    }

    /// Returns the email or an empty string.
    pub fn email_or_empty(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }
}
