//! Authorization gate.
//!
//! Decides, per request, which role a user holds in an association. The
//! decision is never cached: grants can change between requests.
//!
//! Every failure collapses into [`Authorization::Denied`]. A missing grant,
//! a failed lookup, a duplicated grant and an unrecognised role all deny.

use serde::Serialize;
use serde_json::Value;
use softget_backend::core::DataApi;
use softget_backend::types::{AssociationId, Embed, Query, User};
use tracing::{debug, warn};

use super::role::Role;

/// Grant table.
pub const GRANTS_TABLE: &str = "Permissoes_Usuarios";

/// Association table.
pub const ASSOCIATIONS_TABLE: &str = "Associacoes";

/// Display name used when the association row is not readable.
pub const DEFAULT_ASSOCIATION_NAME: &str = "Associação";

/// A resolved permission grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    /// The caller's role.
    pub role: Role,
    /// The association the role applies to.
    pub association_id: AssociationId,
    /// Association display name.
    pub association_name: String,
}

/// Why access was denied. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// No grant row.
    NoGrant,
    /// More than one grant row for the pair.
    DuplicateGrants(usize),
    /// The lookup itself failed.
    LookupFailed(String),
    /// The grant names a role outside the enumeration.
    UnknownRole(String),
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// The caller holds a grant.
    Granted(Grant),
    /// The caller may not see this association.
    Denied(Denial),
}

impl Authorization {
    /// Returns the grant, if any.
    pub fn grant(self) -> Option<Grant> {
        match self {
            Authorization::Granted(grant) => Some(grant),
            Authorization::Denied(_) => None,
        }
    }
}

/// Builds the grant lookup for a (user, association) pair.
pub fn grant_query(user_id: &str, association_id: &AssociationId) -> Query {
    Query::from(GRANTS_TABLE)
        .select(&["papel"])
        .embed(Embed::new(ASSOCIATIONS_TABLE, "associacao_id").columns(&["nome_associacao"]))
        .eq("user_id", user_id)
        .eq("associacao_id", association_id.as_str())
}

/// Resolves the caller's role in an association.
///
/// The lookup runs with the caller's access token so the data API applies
/// its row-level policies.
pub async fn authorize<D>(
    data: &D,
    access_token: &str,
    user: &User,
    association_id: &AssociationId,
) -> Authorization
where
    D: DataApi + ?Sized,
{
    let query = grant_query(&user.id, association_id);
    let outcome = match data.query(Some(access_token), &query).await {
        Ok(rows) => evaluate(rows, association_id),
        Err(e) => Authorization::Denied(Denial::LookupFailed(e.to_string())),
    };

    match &outcome {
        Authorization::Granted(grant) => debug!(
            user_id = %user.id,
            association_id = %association_id,
            role = %grant.role,
            "Access granted"
        ),
        Authorization::Denied(reason) => warn!(
            user_id = %user.id,
            association_id = %association_id,
            reason = ?reason,
            "Access denied"
        ),
    }
    outcome
}

fn evaluate(rows: Vec<Value>, association_id: &AssociationId) -> Authorization {
    let row = match rows.as_slice() {
        [] => return Authorization::Denied(Denial::NoGrant),
        [row] => row,
        many => return Authorization::Denied(Denial::DuplicateGrants(many.len())),
    };

    let papel = row.get("papel").and_then(Value::as_str).unwrap_or_default();
    let role = match papel.parse::<Role>() {
        Ok(role) => role,
        Err(_) => return Authorization::Denied(Denial::UnknownRole(papel.to_string())),
    };

    Authorization::Granted(Grant {
        role,
        association_id: association_id.clone(),
        association_name: association_name(row.get(ASSOCIATIONS_TABLE)),
    })
}

/// The embed arrives as an object, a one-element array or null.
fn association_name(embedded: Option<&Value>) -> String {
    let row = match embedded {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };
    row.and_then(|r| r.get("nome_associacao"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_ASSOCIATION_NAME.to_string())
}
