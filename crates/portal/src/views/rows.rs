//! Typed rows of the tenant data tables, and the fetch helper.
//!
//! Rows keep the data API's column names. Every column is optional: a view
//! renders whatever is there and never fails on a sparse row.

#![allow(missing_docs)]

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use softget_backend::core::DataApi;
use softget_backend::types::Query;
use tracing::{error, warn};

/// Member table.
pub const MEMBERS_TABLE: &str = "Membros";
/// People table.
pub const PEOPLE_TABLE: &str = "Pessoas";
/// Financial entries table.
pub const ENTRIES_TABLE: &str = "Lancamentos_Financeiros";
/// Assets table.
pub const ASSETS_TABLE: &str = "Patrimonio";
/// Asset usage schedule table.
pub const ASSET_USAGE_TABLE: &str = "Uso_Patrimonio";
/// Legal obligations table.
pub const OBLIGATIONS_TABLE: &str = "Obrigacoes";
/// Board mandates table.
pub const MANDATES_TABLE: &str = "Mandatos";

/// An embedded row; the data API returns either an object or an array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Joined<T> {
    /// To-one embed.
    One(T),
    /// To-many embed.
    Many(Vec<T>),
}

impl<T> Joined<T> {
    /// Returns the first embedded row.
    pub fn first(&self) -> Option<&T> {
        match self {
            Joined::One(row) => Some(row),
            Joined::Many(rows) => rows.first(),
        }
    }
}

/// Returns the first row of an optional embed.
pub fn joined<T>(embed: &Option<Joined<T>>) -> Option<&T> {
    embed.as_ref().and_then(Joined::first)
}

/// A person.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PersonRow {
    pub nome_completo: Option<String>,
    pub cpf: Option<String>,
    pub endereco: Option<String>,
    pub telefone: Option<String>,
    pub email: Option<String>,
}

/// A member of the association.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemberRow {
    pub id: Value,
    pub categoria: Option<String>,
    pub situacao: Option<String>,
    pub valor_mensalidade_base: Option<f64>,
    pub data_admissao: Option<String>,
    #[serde(rename = "Pessoas")]
    pub pessoa: Option<Joined<PersonRow>>,
}

/// The member embedded into a financial entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntryMemberRow {
    #[serde(rename = "Pessoas")]
    pub pessoa: Option<Joined<PersonRow>>,
}

/// A financial entry. Income is positive, expenses negative.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntryRow {
    pub valor: f64,
    pub categoria: Option<String>,
    pub tipo: Option<String>,
    pub data_lancamento: Option<String>,
    #[serde(rename = "Membros")]
    pub membro: Option<Joined<EntryMemberRow>>,
}

impl EntryRow {
    /// Returns the entry date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.data_lancamento.as_deref().and_then(parse_date)
    }

    /// Returns the paying member's name.
    pub fn payer_name(&self) -> Option<&str> {
        joined(&self.membro)
            .and_then(|m| joined(&m.pessoa))
            .and_then(|p| p.nome_completo.as_deref())
    }
}

/// An asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetRow {
    pub id: Value,
    pub nome_item: Option<String>,
    pub tipo: Option<String>,
    pub data_aquisicao: Option<String>,
    pub valor_aquisicao: Option<f64>,
    pub status: Option<String>,
    pub origem: Option<String>,
}

/// The asset embedded into a usage record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetNameRow {
    pub nome_item: Option<String>,
}

/// A scheduled asset usage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UsageRow {
    pub id: Value,
    pub data_retirada: Option<String>,
    pub data_devolucao: Option<String>,
    pub finalidade: Option<String>,
    #[serde(rename = "Patrimonio")]
    pub item: Option<Joined<AssetNameRow>>,
    #[serde(rename = "Pessoas")]
    pub pessoa: Option<Joined<PersonRow>>,
}

/// A legal obligation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObligationRow {
    pub id: Value,
    pub tipo: Option<String>,
    pub categoria: Option<String>,
    pub data_referencia: Option<String>,
    pub data_entrega: Option<String>,
    pub status: Option<String>,
}

/// A board mandate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MandateRow {
    pub id: Value,
    pub cargo: Option<String>,
    pub categoria: Option<String>,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
    pub descricao_mandato: Option<String>,
    #[serde(rename = "Pessoas")]
    pub pessoa: Option<Joined<PersonRow>>,
}

/// Parses `YYYY-MM-DD`, ignoring any time part.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let day = value.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Returns true if `field` equals `expected`.
pub fn is(field: &Option<String>, expected: &str) -> bool {
    field.as_deref() == Some(expected)
}

/// Runs a tenant data query.
///
/// A failed query is logged and yields no rows; a row that does not match
/// `T` is logged and skipped.
pub async fn fetch<T, D>(data: &D, access_token: &str, query: Query) -> Vec<T>
where
    T: DeserializeOwned,
    D: DataApi + ?Sized,
{
    match data.query(Some(access_token), &query).await {
        Ok(rows) => decode_rows(query.table(), rows),
        Err(e) => {
            error!(table = %query.table(), error = %e, "Data fetch failed");
            Vec::new()
        }
    }
}

fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(table = %table, error = %e, "Skipping malformed row");
                None
            }
        })
        .collect()
}
