//! Error types for the backend collaborators.
//!
//! Errors are split by contract: [`AuthError`] for the identity provider and
//! [`QueryError`] for the tenant data API. Callers in the portal decide how
//! each one degrades; nothing here retries.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all backend calls.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Identity provider errors
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Data API errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The backend could not be built from its settings.
    #[error("invalid backend configuration: {message}")]
    Config { message: String },
}

impl BackendError {
    /// Returns true when the collaborator could not be reached and the same
    /// call may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Auth(AuthError::Unavailable { .. })
                | BackendError::Query(QueryError::Unavailable { .. })
        )
    }
}

/// Errors raised by the identity provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The presented token is malformed or was never issued.
    #[error("invalid token")]
    InvalidToken,

    /// The refresh token was rejected (already used, revoked or expired).
    #[error("session refresh failed: {message}")]
    RefreshFailed { message: String },

    /// The provider could not be reached or answered with a server error.
    #[error("identity provider unavailable: {message}")]
    Unavailable { message: String },
}

/// Errors raised by the tenant data API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The data API answered with a non-success status.
    #[error("query on {table} rejected with status {status}: {message}")]
    Rejected {
        table: String,
        status: u16,
        message: String,
    },

    /// The data API could not be reached.
    #[error("query on {table} failed: {message}")]
    Unavailable { table: String, message: String },

    /// The response body was not a JSON array of rows.
    #[error("could not decode rows from {table}: {message}")]
    Decode { table: String, message: String },
}

impl QueryError {
    /// Returns the table the failed query targeted.
    pub fn table(&self) -> &str {
        match self {
            QueryError::Rejected { table, .. }
            | QueryError::Unavailable { table, .. }
            | QueryError::Decode { table, .. } => table,
        }
    }
}

/// Result type alias for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;
