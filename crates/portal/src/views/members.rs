//! Member register.

use serde::Serialize;
use serde_json::Value;
use softget_backend::core::DataApi;
use softget_backend::types::{Embed, Query};

use super::home::{MemberTotals, expected_dues};
use super::rows::{MEMBERS_TABLE, MemberRow, PEOPLE_TABLE, fetch, is, joined};
use crate::extractors::TenantAccess;

/// A row of the member table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberEntry {
    /// Member id.
    pub id: Value,
    /// Full name.
    pub name: Option<String>,
    /// Taxpayer number.
    pub cpf: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// `Fundador`, `Efetivo` or `Contribuinte`.
    pub category: Option<String>,
    /// Member status.
    pub status: Option<String>,
    /// Base monthly dues.
    pub monthly_dues: Option<f64>,
    /// Admission date.
    pub admitted_on: Option<String>,
}

impl From<&MemberRow> for MemberEntry {
    fn from(row: &MemberRow) -> Self {
        let person = joined(&row.pessoa).cloned().unwrap_or_default();
        Self {
            id: row.id.clone(),
            name: person.nome_completo,
            cpf: person.cpf,
            email: person.email,
            phone: person.telefone,
            address: person.endereco,
            category: row.categoria.clone(),
            status: row.situacao.clone(),
            monthly_dues: row.valor_mensalidade_base,
            admitted_on: row.data_admissao.clone(),
        }
    }
}

/// Member counts by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    /// Founding members.
    pub founders: usize,
    /// Full members.
    pub effective: usize,
    /// Contributing members.
    pub contributors: usize,
}

/// Member register page data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembersView {
    /// Counts by status.
    pub totals: MemberTotals,
    /// Counts by category.
    pub categories: CategoryTotals,
    /// Monthly dues expected from active members.
    pub expected_dues: f64,
    /// Every member, in data API order.
    pub members: Vec<MemberEntry>,
}

/// Loads the member register.
pub async fn load<D>(data: &D, access: &TenantAccess) -> MembersView
where
    D: DataApi + ?Sized,
{
    let query = Query::from(MEMBERS_TABLE)
        .select(&[
            "id",
            "categoria",
            "situacao",
            "valor_mensalidade_base",
            "data_admissao",
        ])
        .embed(Embed::new(PEOPLE_TABLE, "pessoa_id").columns(&[
            "nome_completo",
            "cpf",
            "endereco",
            "telefone",
            "email",
        ]))
        .eq("associacao_id", access.association_id().as_str());

    let members: Vec<MemberRow> = fetch(data, access.access_token(), query).await;
    summarize(&members)
}

/// Builds the register from fetched rows.
pub fn summarize(members: &[MemberRow]) -> MembersView {
    let in_category = |c| members.iter().filter(|m| is(&m.categoria, c)).count();
    MembersView {
        totals: MemberTotals::count(members),
        categories: CategoryTotals {
            founders: in_category("Fundador"),
            effective: in_category("Efetivo"),
            contributors: in_category("Contribuinte"),
        },
        expected_dues: expected_dues(members),
        members: members.iter().map(MemberEntry::from).collect(),
    }
}
