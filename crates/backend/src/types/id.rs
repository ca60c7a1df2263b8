//! Association (tenant) identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An opaque association identifier.
///
/// Every tenant-scoped query is filtered by this id. The value is never
/// interpreted, only compared and forwarded.
///
/// # Examples
///
/// ```
/// use softget_backend::types::AssociationId;
///
/// let id = AssociationId::new("7f9c");
/// assert_eq!(id.as_str(), "7f9c");
/// assert_eq!(id.to_string(), "7f9c");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssociationId(String);

impl AssociationId {
    /// Creates a new association id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path of the association home page.
    pub fn home_path(&self) -> String {
        format!("/associacao/{}", self.0)
    }
}

impl fmt::Debug for AssociationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssociationId({:?})", self.0)
    }
}

impl fmt::Display for AssociationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AssociationId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for AssociationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AssociationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for AssociationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
