//! Tenant layout gate.
//!
//! Every tenant-scoped handler takes a [`TenantAccess`]. Extracting it runs
//! the whole gate, in order:
//!
//! 1. resolve the signed-in user (read-only cookies), else redirect to `/`;
//! 2. authorize the user for the association, else redirect to `/dashboard`;
//! 3. when section enforcement is on, check the role against the section,
//!    else redirect to the association home.
//!
//! Handlers receive the resolved role and never re-derive it.

use std::collections::HashMap;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use softget_backend::core::Backend;
use softget_backend::types::{AssociationId, User};
use tracing::warn;

use crate::authz::{Grant, NavLink, Role, Section, authorize, navigation};
use crate::error::PortalError;
use crate::session::RequestCookies;
use crate::state::AppState;
use crate::views::LayoutFrame;

/// Axum extractor for an authorized tenant request.
///
/// # Example
///
/// ```rust,ignore
/// use softget_portal::extractors::TenantAccess;
///
/// async fn handler(access: TenantAccess) {
///     println!("{} is {}", access.user().id, access.role());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TenantAccess {
    user: User,
    grant: Grant,
    section: Section,
    access_token: String,
    path: String,
}

impl TenantAccess {
    /// Creates an access record for an already authorized request.
    pub fn new(
        user: User,
        grant: Grant,
        section: Section,
        access_token: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            user,
            grant,
            section,
            access_token: access_token.into(),
            path: path.into(),
        }
    }

    /// Returns the signed-in user.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Returns the resolved grant.
    pub fn grant(&self) -> &Grant {
        &self.grant
    }

    /// Returns the caller's role.
    pub fn role(&self) -> Role {
        self.grant.role
    }

    /// Returns the association id.
    pub fn association_id(&self) -> &AssociationId {
        &self.grant.association_id
    }

    /// Returns the requested section.
    pub fn section(&self) -> Section {
        self.section
    }

    /// Returns the access token for data queries.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the navigation visible to the caller.
    pub fn navigation(&self) -> Vec<NavLink> {
        navigation(self.grant.role, &self.grant.association_id, &self.path)
    }

    /// Returns the layout frame shared by every tenant view.
    pub fn frame(&self) -> LayoutFrame {
        LayoutFrame::new(&self.grant, self.user.email_or_empty(), self.navigation())
    }
}

impl<B> FromRequestParts<AppState<B>> for TenantAccess
where
    B: Backend + 'static,
{
    type Rejection = PortalError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<B>,
    ) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| PortalError::bad_request(e.body_text()))?;
        let association_id = params
            .get("id")
            .map(AssociationId::new)
            .ok_or_else(|| PortalError::bad_request("missing association id"))?;
        let path = parts.uri.path().to_string();

        let mut identity = state.identity(RequestCookies::from_headers(&parts.headers));
        let auth = identity
            .authenticate()
            .await
            .ok_or(PortalError::Unauthenticated)?;

        let grant = authorize(
            state.backend(),
            auth.access_token(),
            &auth.user,
            &association_id,
        )
        .await
        .grant()
        .ok_or(PortalError::Unauthorized)?;

        let section = match params.get("section") {
            None => Section::Dashboard,
            Some(slug) => {
                Section::from_slug(slug).ok_or_else(|| PortalError::NotFound { path: path.clone() })?
            }
        };

        if state.enforce_section_access() && !section.is_visible_to(grant.role) {
            warn!(
                user_id = %auth.user.id,
                association_id = %association_id,
                role = %grant.role,
                section = %section,
                "Section not available to role"
            );
            return Err(PortalError::SectionDenied { association_id });
        }

        Ok(TenantAccess::new(
            auth.user,
            grant,
            section,
            auth.tokens.access_token,
            path,
        ))
    }
}
