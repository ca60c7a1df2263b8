//! Asset register and usage schedule.

use serde::Serialize;
use serde_json::Value;
use softget_backend::core::DataApi;
use softget_backend::types::{Embed, Query};

use super::rows::{
    ASSET_USAGE_TABLE, ASSETS_TABLE, AssetRow, PEOPLE_TABLE, UsageRow, fetch, is, joined,
};
use crate::extractors::TenantAccess;

/// Asset status: available.
pub const STATUS_AVAILABLE: &str = "Disponível";
/// Asset status: lent out.
pub const STATUS_IN_USE: &str = "Em uso";
/// Asset status: under repair.
pub const STATUS_IN_MAINTENANCE: &str = "Em manutenção";

/// A scheduled withdrawal of an asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEntry {
    /// Usage id.
    pub id: Value,
    /// Asset name.
    pub item: Option<String>,
    /// Borrower's name.
    pub borrower: Option<String>,
    /// Withdrawal date.
    pub taken_on: Option<String>,
    /// Return date.
    pub returned_on: Option<String>,
    /// Stated purpose.
    pub purpose: Option<String>,
}

impl From<&UsageRow> for UsageEntry {
    fn from(row: &UsageRow) -> Self {
        Self {
            id: row.id.clone(),
            item: joined(&row.item).and_then(|i| i.nome_item.clone()),
            borrower: joined(&row.pessoa).and_then(|p| p.nome_completo.clone()),
            taken_on: row.data_retirada.clone(),
            returned_on: row.data_devolucao.clone(),
            purpose: row.finalidade.clone(),
        }
    }
}

/// Asset counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetTotals {
    /// All assets.
    pub total: usize,
    /// Available.
    pub available: usize,
    /// Lent out.
    pub in_use: usize,
    /// Under repair.
    pub in_maintenance: usize,
}

/// Asset page data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetsView {
    /// Counts by status.
    pub totals: AssetTotals,
    /// Sum of acquisition values.
    pub total_value: f64,
    /// Every asset, by name.
    pub items: Vec<AssetRow>,
    /// Tractors.
    pub tractors: Vec<AssetRow>,
    /// Implements.
    pub implements: Vec<AssetRow>,
    /// Usage schedule, most recent first.
    pub schedule: Vec<UsageEntry>,
}

/// Loads the asset register and schedule.
pub async fn load<D>(data: &D, access: &TenantAccess) -> AssetsView
where
    D: DataApi + ?Sized,
{
    let id = access.association_id().as_str();
    let token = access.access_token();

    let (items, usage) = tokio::join!(
        fetch::<AssetRow, _>(
            data,
            token,
            Query::from(ASSETS_TABLE)
                .eq("associacao_id", id)
                .order("nome_item", true),
        ),
        fetch::<UsageRow, _>(
            data,
            token,
            Query::from(ASSET_USAGE_TABLE)
                .select(&["id", "data_retirada", "data_devolucao", "finalidade"])
                .embed(Embed::new(ASSETS_TABLE, "patrimonio_id").columns(&["nome_item"]))
                .embed(Embed::new(PEOPLE_TABLE, "pessoa_id").columns(&["nome_completo"]))
                .eq("associacao_id", id)
                .order("data_retirada", false),
        ),
    );

    summarize(items, &usage)
}

/// Builds the asset page from fetched rows.
pub fn summarize(items: Vec<AssetRow>, usage: &[UsageRow]) -> AssetsView {
    let with = |status| items.iter().filter(|a| is(&a.status, status)).count();
    let of_type = |kind| -> Vec<AssetRow> {
        items.iter().filter(|a| is(&a.tipo, kind)).cloned().collect()
    };

    AssetsView {
        totals: AssetTotals {
            total: items.len(),
            available: with(STATUS_AVAILABLE),
            in_use: with(STATUS_IN_USE),
            in_maintenance: with(STATUS_IN_MAINTENANCE),
        },
        total_value: items.iter().filter_map(|a| a.valor_aquisicao).sum(),
        tractors: of_type("Trator"),
        implements: of_type("Implemento"),
        schedule: usage.iter().map(UsageEntry::from).collect(),
        items,
    }
}
