//! Board of directors for the current term.

use serde::Serialize;
use serde_json::Value;
use softget_backend::core::DataApi;
use softget_backend::types::{Embed, Query};

use super::rows::{MANDATES_TABLE, MandateRow, PEOPLE_TABLE, fetch, is, joined};
use crate::extractors::TenantAccess;

/// Term description used when no mandate carries one.
pub const DEFAULT_TERM_DESCRIPTION: &str = "Mandato Atual";

/// A seat on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSeat {
    /// Mandate id.
    pub id: Value,
    /// Office, e.g. `Presidente`.
    pub office: Option<String>,
    /// Holder's name.
    pub name: Option<String>,
    /// Holder's email.
    pub email: Option<String>,
    /// Holder's phone.
    pub phone: Option<String>,
    /// Term start.
    pub starts_on: Option<String>,
    /// Term end.
    pub ends_on: Option<String>,
}

impl From<&MandateRow> for BoardSeat {
    fn from(row: &MandateRow) -> Self {
        let person = joined(&row.pessoa).cloned().unwrap_or_default();
        Self {
            id: row.id.clone(),
            office: row.cargo.clone(),
            name: person.nome_completo,
            email: person.email,
            phone: person.telefone,
            starts_on: row.data_inicio.clone(),
            ends_on: row.data_fim.clone(),
        }
    }
}

/// Board page data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    /// Description of the current term.
    pub term: String,
    /// Executive board.
    pub executive: Vec<BoardSeat>,
    /// Finance board.
    pub financial: Vec<BoardSeat>,
    /// Fiscal council.
    pub fiscal_council: Vec<BoardSeat>,
}

/// Loads the active mandates.
pub async fn load<D>(data: &D, access: &TenantAccess) -> BoardView
where
    D: DataApi + ?Sized,
{
    let query = Query::from(MANDATES_TABLE)
        .select(&[
            "id",
            "cargo",
            "categoria",
            "data_inicio",
            "data_fim",
            "descricao_mandato",
        ])
        .embed(Embed::new(PEOPLE_TABLE, "pessoa_id").columns(&[
            "nome_completo",
            "cpf",
            "email",
            "telefone",
            "endereco",
        ]))
        .eq("associacao_id", access.association_id().as_str())
        .eq("ativo", true);

    let mandates: Vec<MandateRow> = fetch(data, access.access_token(), query).await;
    summarize(&mandates)
}

/// Groups mandates by board.
pub fn summarize(mandates: &[MandateRow]) -> BoardView {
    let seats = |board| -> Vec<BoardSeat> {
        mandates
            .iter()
            .filter(|m| is(&m.categoria, board))
            .map(BoardSeat::from)
            .collect()
    };

    BoardView {
        term: mandates
            .first()
            .and_then(|m| m.descricao_mandato.clone())
            .unwrap_or_else(|| DEFAULT_TERM_DESCRIPTION.to_string()),
        executive: seats("Executivo"),
        financial: seats("Financeiro"),
        fiscal_council: seats("Conselho Fiscal"),
    }
}
