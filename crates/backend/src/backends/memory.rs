//! In-memory backend.
//!
//! Serves both contracts from process memory: users and issued tokens for the
//! identity side, seeded JSON rows for the data side. Failures can be injected
//! per table or for the whole identity provider, which is how the fail-closed
//! paths of the portal are exercised.
//!
//! Token semantics follow the hosted provider closely enough for the portal:
//! access tokens expire after a configurable TTL, refresh tokens are single
//! use, and sign-out revokes every token of the user.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::core::{Backend, DataApi, IdentityProvider};
use crate::error::{AuthError, BackendResult, QueryError};
use crate::types::query::{compare, values_equal};
use crate::types::{Embed, Query, SessionTokens, User};

/// Default access token lifetime in seconds.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct IssuedToken {
    user_id: String,
    expires_at: i64,
    revoked: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, User>,
    access_tokens: HashMap<String, IssuedToken>,
    refresh_tokens: HashMap<String, String>,
    tables: HashMap<String, Vec<Value>>,
    failing_tables: HashSet<String>,
    identity_unavailable: bool,
    sign_outs: usize,
    queries: Vec<String>,
}

/// In-memory backend for tests.
pub struct InMemoryBackend {
    state: RwLock<MemoryState>,
    access_ttl_secs: i64,
}

impl Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("InMemoryBackend")
            .field("users", &state.users.len())
            .field("tables", &state.tables.len())
            .field("access_ttl_secs", &self.access_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates an empty backend with the default token lifetime.
    pub fn new() -> Self {
        Self::with_access_ttl(DEFAULT_ACCESS_TTL_SECS)
    }

    /// Creates an empty backend issuing access tokens valid for `secs`.
    pub fn with_access_ttl(secs: i64) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            access_ttl_secs: secs,
        }
    }

    /// Registers a user.
    pub fn add_user(&self, user: User) {
        self.state.write().users.insert(user.id.clone(), user);
    }

    /// Issues a fresh session for a registered user, as a completed
    /// provider-hosted sign-in would.
    ///
    /// Returns `None` for unknown users.
    pub fn issue_session(&self, user_id: &str) -> Option<SessionTokens> {
        let mut state = self.state.write();
        if !state.users.contains_key(user_id) {
            return None;
        }
        Some(self.issue_locked(&mut state, user_id))
    }

    fn issue_locked(&self, state: &mut MemoryState, user_id: &str) -> SessionTokens {
        let access_token = format!("at-{}", Uuid::new_v4());
        let refresh_token = format!("rt-{}", Uuid::new_v4());
        let expires_at = Utc::now().timestamp() + self.access_ttl_secs;

        state.access_tokens.insert(
            access_token.clone(),
            IssuedToken {
                user_id: user_id.to_string(),
                expires_at,
                revoked: false,
            },
        );
        state
            .refresh_tokens
            .insert(refresh_token.clone(), user_id.to_string());

        SessionTokens::new(access_token, refresh_token).with_expires_at(expires_at)
    }

    /// Forces an access token to be expired.
    pub fn expire_access_token(&self, access_token: &str) {
        if let Some(token) = self.state.write().access_tokens.get_mut(access_token) {
            token.expires_at = Utc::now().timestamp() - 1;
        }
    }

    /// Returns true if the access token is live (issued, unexpired, unrevoked).
    pub fn is_live(&self, access_token: &str) -> bool {
        let state = self.state.read();
        live_user_id(&state, access_token).is_some()
    }

    /// Appends a row to a table.
    pub fn insert_row(&self, table: &str, row: Value) {
        self.state
            .write()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Appends several rows to a table.
    pub fn insert_rows(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut state = self.state.write();
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Makes every query on `table` fail.
    pub fn fail_table(&self, table: &str) {
        self.state.write().failing_tables.insert(table.to_string());
    }

    /// Undoes [`fail_table`](Self::fail_table).
    pub fn restore_table(&self, table: &str) {
        self.state.write().failing_tables.remove(table);
    }

    /// Makes every identity call fail (or succeed again).
    pub fn set_identity_unavailable(&self, unavailable: bool) {
        self.state.write().identity_unavailable = unavailable;
    }

    /// Returns how many provider-side sign-outs were performed.
    pub fn sign_out_count(&self) -> usize {
        self.state.read().sign_outs
    }

    /// Returns the tables queried so far, in call order.
    pub fn queried_tables(&self) -> Vec<String> {
        self.state.read().queries.clone()
    }

    fn check_identity(&self) -> BackendResult<()> {
        if self.state.read().identity_unavailable {
            return Err(AuthError::Unavailable {
                message: "identity provider offline".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn live_user_id(state: &MemoryState, access_token: &str) -> Option<String> {
    let token = state.access_tokens.get(access_token)?;
    if token.revoked || token.expires_at <= Utc::now().timestamp() {
        return None;
    }
    Some(token.user_id.clone())
}

#[async_trait]
impl IdentityProvider for InMemoryBackend {
    async fn get_user(&self, access_token: &str) -> BackendResult<Option<User>> {
        self.check_identity()?;
        let state = self.state.read();
        Ok(live_user_id(&state, access_token).and_then(|id| state.users.get(&id).cloned()))
    }

    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<SessionTokens> {
        self.check_identity()?;
        let mut state = self.state.write();
        let Some(user_id) = state.refresh_tokens.remove(refresh_token) else {
            return Err(AuthError::RefreshFailed {
                message: "refresh token not found".to_string(),
            }
            .into());
        };
        debug!(user_id = %user_id, "Rotating refresh token");
        Ok(self.issue_locked(&mut state, &user_id))
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        self.check_identity()?;
        let mut state = self.state.write();
        let Some(user_id) = state.access_tokens.get(access_token).map(|t| t.user_id.clone()) else {
            return Ok(());
        };
        for token in state.access_tokens.values_mut() {
            if token.user_id == user_id {
                token.revoked = true;
            }
        }
        state.refresh_tokens.retain(|_, owner| *owner != user_id);
        state.sign_outs += 1;
        Ok(())
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        match Url::parse_with_params(
            "memory://auth/authorize",
            &[("provider", provider), ("redirect_to", redirect_to)],
        ) {
            Ok(url) => url.to_string(),
            Err(_) => "memory://auth/authorize".to_string(),
        }
    }
}

#[async_trait]
impl DataApi for InMemoryBackend {
    async fn query(&self, access_token: Option<&str>, query: &Query) -> BackendResult<Vec<Value>> {
        let table = query.table();
        let mut state = self.state.write();
        state.queries.push(table.to_string());

        if state.failing_tables.contains(table) {
            return Err(QueryError::Unavailable {
                table: table.to_string(),
                message: "injected failure".to_string(),
            }
            .into());
        }
        if let Some(token) = access_token {
            if live_user_id(&state, token).is_none() {
                return Err(QueryError::Rejected {
                    table: table.to_string(),
                    status: 401,
                    message: "JWT expired or revoked".to_string(),
                }
                .into());
            }
        }

        let empty = Vec::new();
        let rows = state.tables.get(table).unwrap_or(&empty);
        let mut matched: Vec<&Value> = rows.iter().filter(|row| query.matches(row)).collect();

        if let Some(order) = query.order_by() {
            matched.sort_by(|a, b| {
                let ordering = match (a.get(&order.column), b.get(&order.column)) {
                    (Some(x), Some(y)) => compare(x, y).unwrap_or(std::cmp::Ordering::Equal),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                };
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        Ok(matched
            .into_iter()
            .map(|row| shape_row(&state.tables, row, query.columns(), query.embeds()))
            .collect())
    }
}

impl Backend for InMemoryBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Projects `row` to `columns` and attaches each embedded table.
fn shape_row(
    tables: &HashMap<String, Vec<Value>>,
    row: &Value,
    columns: &[String],
    embeds: &[Embed],
) -> Value {
    let Some(source) = row.as_object() else {
        return row.clone();
    };

    let mut shaped: Map<String, Value> = if columns.is_empty() {
        source.clone()
    } else {
        columns
            .iter()
            .filter_map(|c| source.get(c).map(|v| (c.clone(), v.clone())))
            .collect()
    };

    for embed in embeds {
        let related = source.get(&embed.foreign_key).and_then(|key| {
            tables.get(&embed.table).and_then(|rows| {
                rows.iter()
                    .find(|candidate| candidate.get("id").is_some_and(|id| values_equal(id, key)))
            })
        });
        let value = match related {
            Some(related) => shape_row(tables, related, &embed.columns, &embed.embeds),
            None => Value::Null,
        };
        shaped.insert(embed.table.clone(), value);
    }

    Value::Object(shaped)
}
