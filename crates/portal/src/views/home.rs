//! Association home: headline totals, member status chart and cash flow.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use softget_backend::core::DataApi;
use softget_backend::types::Query;

use super::rows::{
    ASSETS_TABLE, AssetRow, ENTRIES_TABLE, EntryRow, MEMBERS_TABLE, MemberRow, fetch, is,
};
use super::{STATUS_ACTIVE, STATUS_DELINQUENT, STATUS_INACTIVE, Slice, percentage};
use crate::extractors::TenantAccess;

/// Months covered by the cash flow chart.
pub const CASH_FLOW_MONTHS: u32 = 6;

/// Short month labels, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Member counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberTotals {
    /// All members.
    pub total: usize,
    /// `Ativo` members.
    pub active: usize,
    /// `Inadimplente` members.
    pub delinquent: usize,
    /// `Inativo` members.
    pub inactive: usize,
}

impl MemberTotals {
    /// Counts `members` by status.
    pub fn count(members: &[MemberRow]) -> Self {
        let with = |status| members.iter().filter(|m| is(&m.situacao, status)).count();
        Self {
            total: members.len(),
            active: with(STATUS_ACTIVE),
            delinquent: with(STATUS_DELINQUENT),
            inactive: with(STATUS_INACTIVE),
        }
    }
}

/// Income and expenses of one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthFlow {
    /// Short month label.
    pub month: &'static str,
    /// Calendar year.
    pub year: i32,
    /// Sum of positive entries.
    pub income: f64,
    /// Absolute value of the month's expenses.
    pub expenses: f64,
}

/// Home page data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    /// Member counts.
    pub members: MemberTotals,
    /// Monthly dues expected from active members.
    pub expected_dues: f64,
    /// Share of delinquent members, in percent.
    pub delinquency_rate: f64,
    /// All-time income.
    pub income: f64,
    /// All-time expenses, absolute.
    pub expenses: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// Sum of asset acquisition values.
    pub asset_total: f64,
    /// Members by status, for the pie chart.
    pub status_chart: Vec<Slice>,
    /// Recent months, oldest first.
    pub cash_flow: Vec<MonthFlow>,
}

/// Loads the home page.
pub async fn load<D>(data: &D, access: &TenantAccess, today: NaiveDate) -> HomeView
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
                .select(&["valor", "data_lancamento"])
                .eq("associacao_id", id),
        ),
        fetch::<AssetRow, _>(
            data,
            token,
            Query::from(ASSETS_TABLE)
                .select(&["valor_aquisicao"])
                .eq("associacao_id", id),
        ),
    );

    summarize(&members, &entries, &assets, today)
}

/// Builds the home page from fetched rows.
pub fn summarize(
    members: &[MemberRow],
    entries: &[EntryRow],
    assets: &[AssetRow],
    today: NaiveDate,
) -> HomeView {
    let totals = MemberTotals::count(members);
    let (income, expenses) = income_and_expenses(entries);

    HomeView {
        expected_dues: expected_dues(members),
        delinquency_rate: percentage(totals.delinquent, totals.total, 0.0),
        income,
        expenses,
        balance: income - expenses,
        asset_total: assets.iter().filter_map(|a| a.valor_aquisicao).sum(),
        status_chart: vec![
            Slice::new("Ativos", totals.active as f64),
            Slice::new("Inadimplentes", totals.delinquent as f64),
            Slice::new("Inativos", totals.inactive as f64),
        ],
        cash_flow: cash_flow(entries, today),
        members: totals,
    }
}

/// Sums the base dues of active members.
pub fn expected_dues(members: &[MemberRow]) -> f64 {
    members
        .iter()
        .filter(|m| is(&m.situacao, STATUS_ACTIVE))
        .filter_map(|m| m.valor_mensalidade_base)
        .sum()
}

/// Splits entries by sign into income and absolute expenses.
pub fn income_and_expenses(entries: &[EntryRow]) -> (f64, f64) {
    entries.iter().fold((0.0, 0.0), |(income, expenses), e| {
        if e.valor > 0.0 {
            (income + e.valor, expenses)
        } else {
            (income, expenses - e.valor)
        }
    })
}

/// Buckets entries into the months ending with `today`'s, oldest first.
pub fn cash_flow(entries: &[EntryRow], today: NaiveDate) -> Vec<MonthFlow> {
    let Some(current) = today.with_day(1) else {
        return Vec::new();
    };

    (0..CASH_FLOW_MONTHS)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .map(|start| {
            let in_month: Vec<EntryRow> = entries
                .iter()
                .filter(|e| {
                    e.date()
                        .is_some_and(|d| d.year() == start.year() && d.month() == start.month())
                })
                .cloned()
                .collect();
            let (income, expenses) = income_and_expenses(&in_month);
            MonthFlow {
                month: MONTH_LABELS[start.month0() as usize],
                year: start.year(),
                income,
                expenses,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(status: &str, dues: f64) -> MemberRow {
        MemberRow {
            situacao: Some(status.to_string()),
            valor_mensalidade_base: Some(dues),
            ..Default::default()
        }
    }

    fn entry(valor: f64, date: &str) -> EntryRow {
        EntryRow {
            valor,
            data_lancamento: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_summary_totals() {
        let members = vec![
            member("Ativo", 50.0),
            member("Ativo", 30.0),
            member("Inadimplente", 50.0),
            member("Inativo", 50.0),
        ];
        let entries = vec![entry(200.0, "2025-03-02"), entry(-80.0, "2025-03-10")];
        let assets = vec![AssetRow {
            valor_aquisicao: Some(1500.0),
            ..Default::default()
        }];

        let view = summarize(&members, &entries, &assets, day(2025, 3, 20));

        assert_eq!(view.members.total, 4);
        assert_eq!(view.members.active, 2);
        assert_eq!(view.expected_dues, 80.0);
        assert_eq!(view.delinquency_rate, 25.0);
        assert_eq!(view.income, 200.0);
        assert_eq!(view.expenses, 80.0);
        assert_eq!(view.balance, 120.0);
        assert_eq!(view.asset_total, 1500.0);
        assert_eq!(view.status_chart[1], Slice::new("Inadimplentes", 1.0));
    }

    #[test]
    fn test_no_members_means_zero_delinquency() {
        let view = summarize(&[], &[], &[], day(2025, 3, 20));
        assert_eq!(view.delinquency_rate, 0.0);
        assert_eq!(view.balance, 0.0);
    }

    #[test]
    fn test_cash_flow_spans_year_boundary() {
        let entries = vec![
            entry(100.0, "2024-11-05"),
            entry(-40.0, "2024-11-06"),
            entry(70.0, "2025-02-01"),
            entry(999.0, "2024-09-30"),
        ];

        let flow = cash_flow(&entries, day(2025, 3, 31));

        let labels: Vec<&str> = flow.iter().map(|m| m.month).collect();
        assert_eq!(labels, vec!["Out", "Nov", "Dez", "Jan", "Fev", "Mar"]);
        assert_eq!(flow[1].year, 2024);
        assert_eq!(flow[1].income, 100.0);
        assert_eq!(flow[1].expenses, 40.0);
        assert_eq!(flow[4].income, 70.0);
        assert!(flow.iter().all(|m| m.income != 999.0));
    }
}
