//! Legal and fiscal obligations.

use serde::Serialize;
use softget_backend::core::DataApi;
use softget_backend::types::Query;

use super::rows::{OBLIGATIONS_TABLE, ObligationRow, fetch, is};
use crate::extractors::TenantAccess;

/// Obligation counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObligationTotals {
    /// All obligations.
    pub total: usize,
    /// `Entregue`.
    pub delivered: usize,
    /// `Pendente`.
    pub pending: usize,
    /// `Retificada`.
    pub rectified: usize,
}

/// Obligations page data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObligationsView {
    /// Counts by status.
    pub totals: ObligationTotals,
    /// Fiscal obligations, most recent first.
    pub fiscal: Vec<ObligationRow>,
    /// Accountability reports, most recent first.
    pub accountability: Vec<ObligationRow>,
    /// Every obligation, most recent first.
    pub items: Vec<ObligationRow>,
}

/// Loads the obligations.
pub async fn load<D>(data: &D, access: &TenantAccess) -> ObligationsView
where
    D: DataApi + ?Sized,
{
    let query = Query::from(OBLIGATIONS_TABLE)
        .eq("associacao_id", access.association_id().as_str())
        .order("data_referencia", false);

    summarize(fetch(data, access.access_token(), query).await)
}

/// Builds the obligations page from fetched rows.
pub fn summarize(items: Vec<ObligationRow>) -> ObligationsView {
    let with = |status| items.iter().filter(|o| is(&o.status, status)).count();
    let in_category = |category| -> Vec<ObligationRow> {
        items
            .iter()
            .filter(|o| is(&o.categoria, category))
            .cloned()
            .collect()
    };

    ObligationsView {
        totals: ObligationTotals {
            total: items.len(),
            delivered: with("Entregue"),
            pending: with("Pendente"),
            rectified: with("Retificada"),
        },
        fiscal: in_category("Fiscal"),
        accountability: in_category("Prestação de Contas"),
        items,
    }
}
