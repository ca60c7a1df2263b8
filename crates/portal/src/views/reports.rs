//! Management report indicators.

use serde::Serialize;
use softget_backend::core::DataApi;
use softget_backend::types::Query;

use super::assets::STATUS_AVAILABLE;
use super::home::{MemberTotals, expected_dues, income_and_expenses};
use super::percentage;
use super::rows::{
    ASSETS_TABLE, AssetRow, ENTRIES_TABLE, EntryRow, MEMBERS_TABLE, MemberRow, fetch, is,
};
use crate::extractors::TenantAccess;

/// Report page data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportsView {
    /// Member counts.
    pub members: MemberTotals,
    /// Share of active members, in percent; 100 with no members.
    pub compliance_rate: f64,
    /// Monthly dues expected from active members.
    pub expected_dues: f64,
    /// All-time income.
    pub income: f64,
    /// All-time expenses, absolute.
    pub expenses: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// Sum of asset acquisition values.
    pub asset_total: f64,
    /// Assets currently available.
    pub available_assets: usize,
}

/// Loads the report indicators.
pub async fn load<D>(data: &D, access: &TenantAccess) -> ReportsView
where
    D: DataApi + ?Sized,
{
    let id = access.association_id().as_str();
    let token = access.access_token();

    let (members, entries, assets) = tokio::join!(
        fetch::<MemberRow, _>(
            data,
            token,
            Query::from(MEMBERS_TABLE)
                .select(&["situacao", "valor_mensalidade_base"])
                .eq("associacao_id", id),
        ),
        fetch::<EntryRow, _>(
            data,
            token,
            Query::from(ENTRIES_TABLE)
                .select(&["valor"])
                .eq("associacao_id", id),
        ),
        fetch::<AssetRow, _>(
            data,
            token,
            Query::from(ASSETS_TABLE)
                .select(&["valor_aquisicao", "status"])
                .eq("associacao_id", id),
        ),
    );

    summarize(&members, &entries, &assets)
}

/// Builds the indicators from fetched rows.
pub fn summarize(members: &[MemberRow], entries: &[EntryRow], assets: &[AssetRow]) -> ReportsView {
    let totals = MemberTotals::count(members);
    let (income, expenses) = income_and_expenses(entries);

    ReportsView {
        compliance_rate: percentage(totals.active, totals.total, 100.0),
        expected_dues: expected_dues(members),
        income,
        expenses,
        balance: income - expenses,
        asset_total: assets.iter().filter_map(|a| a.valor_aquisicao).sum(),
        available_assets: assets
            .iter()
            .filter(|a| is(&a.status, STATUS_AVAILABLE))
            .count(),
        members: totals,
    }
}
