//! Tabular lookup description.
//!
//! A [`Query`] names a table, the columns to return, row filters, embedded
//! (joined) tables and an optional ordering. Backends either evaluate it
//! in-process or render it to the data API's query-string form with
//! [`Query::to_params`].

use std::cmp::Ordering;

use serde_json::Value;

/// Comparison operator of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// Column equals value.
    Eq,
    /// Column equals any value of an array.
    In,
    /// Column is greater than or equal to value.
    Gte,
    /// Column is strictly less than value.
    Lt,
    /// Column is less than or equal to value.
    Lte,
}

impl FilterOp {
    /// Returns the operator keyword used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::In => "in",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
        }
    }
}

/// A single row predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Column the predicate reads.
    pub column: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Right-hand side; an array for [`FilterOp::In`].
    pub value: Value,
}

impl Filter {
    /// Returns true if `row` satisfies this predicate.
    ///
    /// A row without the column never matches.
    pub fn matches(&self, row: &Value) -> bool {
        let Some(actual) = row.get(&self.column) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => values_equal(actual, &self.value),
            FilterOp::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|v| values_equal(actual, v))),
            FilterOp::Gte => compare(actual, &self.value).is_some_and(|o| o != Ordering::Less),
            FilterOp::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            FilterOp::Lte => compare(actual, &self.value).is_some_and(|o| o != Ordering::Greater),
        }
    }

    /// Renders the predicate as a `(column, "op.value")` query pair.
    pub fn to_param(&self) -> (String, String) {
        let value = match (self.op, &self.value) {
            (FilterOp::In, Value::Array(items)) => {
                let rendered: Vec<String> = items.iter().map(quote_list_item).collect();
                format!("({})", rendered.join(","))
            }
            _ => render_scalar(&self.value),
        };
        (self.column.clone(), format!("{}.{}", self.op.as_str(), value))
    }
}

/// Ordering applied to the result rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column to sort by.
    pub column: String,
    /// Ascending when true.
    pub ascending: bool,
}

/// A table embedded into each row through a foreign key column.
///
/// The embedded row appears under the table name as a nested object
/// (or `null` when the key does not resolve).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    /// Embedded table name.
    pub table: String,
    /// Column of the parent row holding the embedded row's `id`.
    pub foreign_key: String,
    /// Columns of the embedded row; empty means all.
    pub columns: Vec<String>,
    /// Further tables embedded into the embedded row.
    pub embeds: Vec<Embed>,
}

impl Embed {
    /// Creates an embed of `table` joined through `foreign_key`.
    pub fn new(table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            foreign_key: foreign_key.into(),
            columns: Vec::new(),
            embeds: Vec::new(),
        }
    }

    /// Restricts the embedded columns.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Embeds another table into this one.
    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Renders `Table(col,col,Nested(col))`.
    pub fn select_clause(&self) -> String {
        format!("{}({})", self.table, select_list(&self.columns, &self.embeds))
    }
}

/// A tabular lookup.
///
/// # Examples
///
/// ```
/// use softget_backend::types::{Embed, Query};
///
/// let query = Query::from("Permissoes_Usuarios")
///     .select(&["papel"])
///     .embed(Embed::new("Associacoes", "associacao_id").columns(&["nome_associacao"]))
///     .eq("user_id", "u-1")
///     .eq("associacao_id", "a-1");
///
/// assert_eq!(query.select_clause(), "papel,Associacoes(nome_associacao)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    columns: Vec<String>,
    filters: Vec<Filter>,
    embeds: Vec<Embed>,
    order: Option<Order>,
}

impl Query {
    /// Starts a query on `table` selecting all columns.
    #[allow(clippy::should_implement_trait)]
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            embeds: Vec::new(),
            order: None,
        }
    }

    /// Restricts the returned columns.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Adds an equality filter.
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Eq, value.into())
    }

    /// Adds a membership filter.
    pub fn is_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(column, FilterOp::In, Value::Array(values))
    }

    /// Adds a lower bound (inclusive).
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gte, value.into())
    }

    /// Adds an upper bound (exclusive).
    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lt, value.into())
    }

    /// Adds an upper bound (inclusive).
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lte, value.into())
    }

    /// Embeds a related table into every row.
    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Orders the result by `column`.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    fn filter(mut self, column: &str, op: FilterOp, value: Value) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op,
            value,
        });
        self
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the selected columns; empty means all.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the row filters.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Returns the embedded tables.
    pub fn embeds(&self) -> &[Embed] {
        &self.embeds
    }

    /// Returns the ordering, if any.
    pub fn order_by(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Returns true if `row` satisfies every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Renders the `select` clause, e.g. `papel,Associacoes(nome_associacao)`.
    pub fn select_clause(&self) -> String {
        select_list(&self.columns, &self.embeds)
    }

    /// Renders the query-string pairs of the data API.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select_clause())];
        params.extend(self.filters.iter().map(Filter::to_param));
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        params
    }
}

fn select_list(columns: &[String], embeds: &[Embed]) -> String {
    let mut parts: Vec<String> = if columns.is_empty() {
        vec!["*".to_string()]
    } else {
        columns.to_vec()
    };
    parts.extend(embeds.iter().map(Embed::select_clause));
    parts.join(",")
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn quote_list_item(value: &Value) -> String {
    let rendered = render_scalar(value);
    if rendered.contains([',', '(', ')', '"']) {
        format!("\"{}\"", rendered.replace('"', "\\\""))
    } else {
        rendered
    }
}

/// Loose scalar equality: ids may arrive as numbers or strings.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    let scalar = |v: &Value| matches!(v, Value::String(_) | Value::Number(_) | Value::Bool(_));
    scalar(a) && scalar(b) && render_scalar(a) == render_scalar(b)
}

/// Numbers compare numerically, strings lexically (ISO dates sort correctly).
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => match (a.as_str(), b.as_str()) {
            (Some(x), Some(y)) => Some(x.cmp(y)),
            _ => None,
        },
    }
}
