//! Error types for the portal.
//!
//! Access-control outcomes are errors too: they short-circuit a handler and
//! turn into redirects, never into error pages.
//!
//! | Error | HTTP Status | Body / Location |
//! |-------|-------------|-----------------|
//! | Unauthenticated | 303 | `/` |
//! | Unauthorized | 303 | `/dashboard` |
//! | SectionDenied | 303 | `/associacao/{id}` |
//! | BadRequest | 400 | `{"error": "bad-request", ...}` |
//! | NotFound | 404 | `{"error": "not-found", ...}` |
//! | Internal | 500 | `{"error": "internal", ...}` |

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use softget_backend::BackendError;
use softget_backend::types::AssociationId;

/// Login path.
pub const LOGIN_PATH: &str = "/";

/// Tenant list path.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// The primary error type for portal requests.
#[derive(Debug)]
pub enum PortalError {
    /// No valid session (redirect to login).
    Unauthenticated,

    /// Valid session without a grant for the requested tenant
    /// (redirect to the tenant list).
    Unauthorized,

    /// Granted tenant, but the role cannot see the requested section
    /// (redirect to the tenant home).
    SectionDenied {
        /// The tenant the caller does have access to.
        association_id: AssociationId,
    },

    /// Malformed request (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
    },

    /// No such page (HTTP 404).
    NotFound {
        /// The requested path.
        path: String,
    },

    /// Internal server error (HTTP 500).
    Internal {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalError::Unauthenticated => write!(f, "Not signed in"),
            PortalError::Unauthorized => write!(f, "No access to this association"),
            PortalError::SectionDenied { association_id } => {
                write!(f, "Section not available in association {}", association_id)
            }
            PortalError::BadRequest { message } => write!(f, "Bad request: {}", message),
            PortalError::NotFound { path } => write!(f, "Not found: {}", path),
            PortalError::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for PortalError {}

impl PortalError {
    /// Creates a BadRequest error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        PortalError::BadRequest {
            message: message.into(),
        }
    }

    /// Returns the redirect target for access-control errors.
    pub fn redirect_target(&self) -> Option<String> {
        match self {
            PortalError::Unauthenticated => Some(LOGIN_PATH.to_string()),
            PortalError::Unauthorized => Some(DASHBOARD_PATH.to_string()),
            PortalError::SectionDenied { association_id } => Some(association_id.home_path()),
            _ => None,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        if let Some(target) = self.redirect_target() {
            return Redirect::to(&target).into_response();
        }

        let (status, code) = match &self {
            PortalError::BadRequest { .. } => (StatusCode::BAD_REQUEST, "bad-request"),
            PortalError::NotFound { .. } => (StatusCode::NOT_FOUND, "not-found"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let body = serde_json::json!({
            "error": code,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<BackendError> for PortalError {
    fn from(err: BackendError) -> Self {
        PortalError::Internal {
            message: err.to_string(),
        }
    }
}

/// Result type alias for portal handlers.
pub type PortalResult<T> = Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;
    use softget_backend::QueryError;

    fn location(response: &Response) -> &str {
        response.headers()[LOCATION].to_str().unwrap()
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        let response = PortalError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[test]
    fn test_unauthorized_redirects_to_dashboard() {
        let response = PortalError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");
    }

    #[test]
    fn test_section_denied_redirects_to_home() {
        let response = PortalError::SectionDenied {
            association_id: AssociationId::new("a-1"),
        }
        .into_response();
        assert_eq!(location(&response), "/associacao/a-1");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PortalError::bad_request("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PortalError::NotFound {
                path: "/x".to_string()
            }
            .into_response()
            .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_backend_error_is_internal() {
        let err: PortalError = BackendError::from(QueryError::Unavailable {
            table: "Membros".to_string(),
            message: "timeout".to_string(),
        })
        .into();
        assert!(matches!(err, PortalError::Internal { .. }));
        assert!(err.redirect_target().is_none());
    }
}
