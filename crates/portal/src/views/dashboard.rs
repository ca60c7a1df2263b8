//! Association picker shown at `/dashboard`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use softget_backend::core::DataApi;
use softget_backend::types::{AssociationId, Query, User};

use super::rows::fetch;
use crate::authz::gate::{ASSOCIATIONS_TABLE, DEFAULT_ASSOCIATION_NAME, GRANTS_TABLE};

#[derive(Debug, Deserialize)]
struct GrantRow {
    associacao_id: Value,
}

#[derive(Debug, Deserialize)]
struct AssociationRow {
    id: Value,
    #[serde(default)]
    nome_associacao: Option<String>,
}

/// An association the user may open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationLink {
    /// Association id.
    pub id: AssociationId,
    /// Display name.
    pub name: String,
    /// Association home path.
    pub href: String,
}

/// Picker page data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    /// Signed-in user's email, empty if unknown.
    pub user_email: String,
    /// Associations the user holds a grant for.
    pub associations: Vec<AssociationLink>,
}

/// Loads the associations `user` holds a grant for.
///
/// Lookup failures degrade to an empty list.
pub async fn load<D>(data: &D, access_token: &str, user: &User) -> DashboardView
where
    D: DataApi + ?Sized,
{
    let grants: Vec<GrantRow> = fetch(
        data,
        access_token,
        Query::from(GRANTS_TABLE)
            .select(&["associacao_id"])
            .eq("user_id", user.id.as_str()),
    )
    .await;

    let ids: Vec<Value> = grants.into_iter().map(|g| g.associacao_id).collect();
    let associations: Vec<AssociationRow> = if ids.is_empty() {
        Vec::new()
    } else {
        fetch(
            data,
            access_token,
            Query::from(ASSOCIATIONS_TABLE)
                .select(&["id", "nome_associacao"])
                .is_in("id", ids),
        )
        .await
    };

    DashboardView {
        user_email: user.email_or_empty().to_string(),
        associations: associations.into_iter().map(link).collect(),
    }
}

fn link(row: AssociationRow) -> AssociationLink {
    let id = AssociationId::new(match row.id {
        Value::String(s) => s,
        other => other.to_string(),
    });
    AssociationLink {
        href: id.home_path(),
        name: row
            .nome_associacao
            .unwrap_or_else(|| DEFAULT_ASSOCIATION_NAME.to_string()),
        id,
    }
}
