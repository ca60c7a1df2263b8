//! Tenant roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A user's role within one association.
///
/// Stored as the upper-case Portuguese role name in the grant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// President.
    Presidente,
    /// Treasurer.
    Tesoureiro,
    /// Secretary.
    Secretario,
    /// Accountant.
    Contador,
    /// Plain member.
    Associado,
}

impl Role {
    /// All roles.
    pub const ALL: [Role; 5] = [
        Role::Presidente,
        Role::Tesoureiro,
        Role::Secretario,
        Role::Contador,
        Role::Associado,
    ];

    /// Returns the stored role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Presidente => "PRESIDENTE",
            Role::Tesoureiro => "TESOUREIRO",
            Role::Secretario => "SECRETARIO",
            Role::Contador => "CONTADOR",
            Role::Associado => "ASSOCIADO",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a role name outside the enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
