//! Monthly finance statement.
//!
//! The page covers one calendar month, selected with `?periodo=YYYY-MM`.
//! Without a selection it shows the most recent month that has entries, or
//! the current month when there are none.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use softget_backend::core::DataApi;
use softget_backend::types::{Embed, Query};

use super::home::income_and_expenses;
use super::rows::{
    ENTRIES_TABLE, EntryRow, MEMBERS_TABLE, MemberRow, PEOPLE_TABLE, fetch, is,
};
use super::{STATUS_ACTIVE, Slice};
use crate::error::{PortalError, PortalResult};
use crate::extractors::TenantAccess;

/// Category of membership dues.
pub const DUES_CATEGORY: &str = "Mensalidades";
/// Category of government grants.
pub const GRANTS_CATEGORY: &str = "Verbas Governamentais";
/// Category of donations.
pub const DONATIONS_CATEGORY: &str = "Doações";
/// Label for entries without a category.
pub const UNCATEGORIZED: &str = "Outros";
/// Payer label for dues not linked to a member.
pub const ANONYMOUS_PAYER: &str = "Pagamento Avulso";
/// Payment method shown for dues.
pub const DUES_PAYMENT_METHOD: &str = "PIX";

const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period; `month` is 1-based.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Returns the period containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Returns the first day of the period.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Returns the first day of the following period.
    pub fn next_first_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Returns the Portuguese label, e.g. `março de 2025`.
    pub fn label(&self) -> String {
        format!("{} de {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PortalError::bad_request(format!("invalid period '{}', expected YYYY-MM", s));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An entry of the period selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodOption {
    /// `YYYY-MM`.
    pub value: Period,
    /// Display label.
    pub label: String,
}

impl From<Period> for PeriodOption {
    fn from(period: Period) -> Self {
        Self {
            value: period,
            label: period.label(),
        }
    }
}

/// A dues payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuesPayment {
    /// Payer's name.
    pub name: String,
    /// Payment date.
    pub date: Option<String>,
    /// Amount paid.
    pub amount: f64,
    /// Payment method.
    pub method: &'static str,
}

/// Income by source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceTotals {
    /// Membership dues.
    pub dues: f64,
    /// Government grants.
    pub government_grants: f64,
    /// Donations.
    pub donations: f64,
}

/// Finance page data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinanceView {
    /// Period shown.
    pub period: PeriodOption,
    /// Periods with entries, most recent first.
    pub periods: Vec<PeriodOption>,
    /// Income of the period.
    pub income: f64,
    /// Expenses of the period, absolute.
    pub expenses: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// Dues payments received in the period.
    pub dues_paid: usize,
    /// Members currently active.
    pub active_members: usize,
    /// Income grouped by category, in order of first appearance.
    pub income_by_category: Vec<Slice>,
    /// Expenses grouped by category, absolute, in order of first appearance.
    pub expenses_by_category: Vec<Slice>,
    /// Dues received in the period.
    pub dues: Vec<DuesPayment>,
    /// Income by source.
    pub sources: SourceTotals,
}

/// Loads the statement for the requested period.
///
/// A malformed `requested` period is rejected before any data is read.
pub async fn load<D>(
    data: &D,
    access: &TenantAccess,
    requested: Option<&str>,
    today: NaiveDate,
) -> PortalResult<FinanceView>
where
    D: DataApi + ?Sized,
{
    let requested = requested
        .filter(|s| !s.is_empty())
        .map(Period::from_str)
        .transpose()?;

    let id = access.association_id().as_str();
    let token = access.access_token();

    let (dated, active) = tokio::join!(
        fetch::<EntryRow, _>(
            data,
            token,
            Query::from(ENTRIES_TABLE)
                .select(&["data_lancamento"])
                .eq("associacao_id", id),
        ),
        fetch::<MemberRow, _>(
            data,
            token,
            Query::from(MEMBERS_TABLE)
                .select(&["id"])
                .eq("associacao_id", id)
                .eq("situacao", STATUS_ACTIVE),
        ),
    );

    let periods = available_periods(&dated);
    let period = requested
        .or_else(|| periods.first().copied())
        .unwrap_or_else(|| Period::containing(today));

    let entries: Vec<EntryRow> = fetch(
        data,
        token,
        Query::from(ENTRIES_TABLE)
            .select(&["valor", "categoria", "tipo", "data_lancamento"])
            .embed(
                Embed::new(MEMBERS_TABLE, "membro_id")
                    .columns(&["id"])
                    .embed(Embed::new(PEOPLE_TABLE, "pessoa_id").columns(&["nome_completo"])),
            )
            .eq("associacao_id", id)
            .gte("data_lancamento", period.first_day().to_string())
            .lt("data_lancamento", period.next_first_day().to_string()),
    )
    .await;

    Ok(summarize(period, periods, &entries, active.len()))
}

/// Returns the distinct months of `entries`, most recent first.
pub fn available_periods(entries: &[EntryRow]) -> Vec<Period> {
    let distinct: BTreeSet<Period> = entries
        .iter()
        .filter_map(EntryRow::date)
        .map(Period::containing)
        .collect();
    distinct.into_iter().rev().collect()
}

/// Builds the statement from the period's entries.
pub fn summarize(
    period: Period,
    periods: Vec<Period>,
    entries: &[EntryRow],
    active_members: usize,
) -> FinanceView {
    let (income, expenses) = income_and_expenses(entries);
    let dues_entries = || entries.iter().filter(|e| is(&e.categoria, DUES_CATEGORY));
    let income_from = |category| -> f64 {
        entries
            .iter()
            .filter(|e| is(&e.categoria, category))
            .map(|e| e.valor)
            .sum()
    };

    let mut periods: Vec<PeriodOption> = periods.into_iter().map(PeriodOption::from).collect();
    if periods.is_empty() {
        periods.push(period.into());
    }

    FinanceView {
        period: period.into(),
        periods,
        income,
        expenses,
        balance: income - expenses,
        dues_paid: dues_entries().count(),
        active_members,
        income_by_category: by_category(entries, "Receita", false),
        expenses_by_category: by_category(entries, "Despesa", true),
        dues: dues_entries()
            .map(|e| DuesPayment {
                name: e.payer_name().unwrap_or(ANONYMOUS_PAYER).to_string(),
                date: e.data_lancamento.clone(),
                amount: e.valor,
                method: DUES_PAYMENT_METHOD,
            })
            .collect(),
        sources: SourceTotals {
            dues: income_from(DUES_CATEGORY),
            government_grants: income_from(GRANTS_CATEGORY),
            donations: income_from(DONATIONS_CATEGORY),
        },
    }
}

fn by_category(entries: &[EntryRow], kind: &str, absolute: bool) -> Vec<Slice> {
    let mut slices: Vec<Slice> = Vec::new();
    for entry in entries.iter().filter(|e| is(&e.tipo, kind)) {
        let name = entry
            .categoria
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORIZED);
        let value = if absolute { entry.valor.abs() } else { entry.valor };
        match slices.iter_mut().find(|s| s.name == name) {
            Some(slice) => slice.value += value,
            None => slices.push(Slice::new(name, value)),
        }
    }
    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries() -> Vec<EntryRow> {
        serde_json::from_value(json!([
            {"valor": 50, "categoria": "Mensalidades", "tipo": "Receita", "data_lancamento": "2025-03-05",
             "Membros": {"id": 1, "Pessoas": {"nome_completo": "Ana"}}},
            {"valor": 50, "categoria": "Mensalidades", "tipo": "Receita", "data_lancamento": "2025-03-06",
             "Membros": null},
            {"valor": 1000, "categoria": "Verbas Governamentais", "tipo": "Receita", "data_lancamento": "2025-03-10"},
            {"valor": 20, "categoria": "", "tipo": "Receita", "data_lancamento": "2025-03-11"},
            {"valor": -300, "categoria": "Manutenção", "tipo": "Despesa", "data_lancamento": "2025-03-12"},
            {"valor": -100, "categoria": "Manutenção", "tipo": "Despesa", "data_lancamento": "2025-03-20"}
        ]))
        .unwrap()
    }

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    #[test]
    fn test_period_parse_and_bounds() {
        let p = period("2024-12");
        assert_eq!(p.to_string(), "2024-12");
        assert_eq!(p.first_day().to_string(), "2024-12-01");
        assert_eq!(p.next_first_day().to_string(), "2025-01-01");
        assert_eq!(p.label(), "dezembro de 2024");
    }

    #[test]
    fn test_malformed_periods_are_bad_requests() {
        for bad in ["2025-13", "2025-3", "25-03", "março", "2025-00", "2025/03"] {
            let err = bad.parse::<Period>().unwrap_err();
            assert!(
                matches!(err, PortalError::BadRequest { .. }),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_available_periods_descending_and_distinct() {
        let rows: Vec<EntryRow> = serde_json::from_value(json!([
            {"data_lancamento": "2025-01-10"},
            {"data_lancamento": "2025-03-01"},
            {"data_lancamento": "2025-01-31"},
            {"data_lancamento": "2024-12-24"},
            {"data_lancamento": null}
        ]))
        .unwrap();

        let periods: Vec<String> = available_periods(&rows)
            .into_iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(periods, vec!["2025-03", "2025-01", "2024-12"]);
    }

    #[test]
    fn test_statement_totals() {
        let view = summarize(period("2025-03"), vec![period("2025-03")], &entries(), 12);

        assert_eq!(view.income, 1120.0);
        assert_eq!(view.expenses, 400.0);
        assert_eq!(view.balance, 720.0);
        assert_eq!(view.dues_paid, 2);
        assert_eq!(view.active_members, 12);
        assert_eq!(view.sources.dues, 100.0);
        assert_eq!(view.sources.government_grants, 1000.0);
        assert_eq!(view.sources.donations, 0.0);
    }

    #[test]
    fn test_categories_keep_first_appearance_order() {
        let view = summarize(period("2025-03"), Vec::new(), &entries(), 0);

        let income: Vec<(&str, f64)> = view
            .income_by_category
            .iter()
            .map(|s| (s.name.as_str(), s.value))
            .collect();
        assert_eq!(
            income,
            vec![
                ("Mensalidades", 100.0),
                ("Verbas Governamentais", 1000.0),
                ("Outros", 20.0)
            ]
        );
        assert_eq!(
            view.expenses_by_category,
            vec![Slice::new("Manutenção", 400.0)]
        );
    }

    #[test]
    fn test_dues_table_names_payers() {
        let view = summarize(period("2025-03"), Vec::new(), &entries(), 0);

        assert_eq!(view.dues.len(), 2);
        assert_eq!(view.dues[0].name, "Ana");
        assert_eq!(view.dues[1].name, ANONYMOUS_PAYER);
        assert_eq!(view.dues[1].method, "PIX");
    }

    #[test]
    fn test_empty_period_list_offers_selected_period() {
        let view = summarize(period("2025-03"), Vec::new(), &[], 0);
        assert_eq!(view.periods.len(), 1);
        assert_eq!(view.periods[0].value, period("2025-03"));
        assert_eq!(view.period.label, "março de 2025");
    }
}
