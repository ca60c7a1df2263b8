//! Tenant view models.
//!
//! Each section has a `load` function that runs its queries concurrently
//! with the caller's access token, plus a pure summary that the tests drive
//! directly. Views are only built after the tenant gate has passed, so a
//! loader never sees an unauthorized request.
//!
//! A failed query degrades its part of the page to empty; it never fails the
//! request.

pub mod assets;
pub mod board;
pub mod dashboard;
pub mod finance;
pub mod home;
pub mod members;
pub mod obligations;
pub mod reports;
pub mod rows;

use serde::Serialize;
use softget_backend::types::AssociationId;

use crate::authz::{Grant, NavLink, Role, Section};

/// Member status: active.
pub const STATUS_ACTIVE: &str = "Ativo";
/// Member status: behind on dues.
pub const STATUS_DELINQUENT: &str = "Inadimplente";
/// Member status: inactive.
pub const STATUS_INACTIVE: &str = "Inativo";

/// The association shown in the layout header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationRef {
    /// Association id.
    pub id: AssociationId,
    /// Display name.
    pub name: String,
}

/// Data shared by every tenant page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutFrame {
    /// Current association.
    pub association: AssociationRef,
    /// Caller's role.
    pub role: Role,
    /// Caller's email, empty if unknown.
    pub user_email: String,
    /// Sections visible to the caller.
    pub navigation: Vec<NavLink>,
}

impl LayoutFrame {
    /// Builds the frame for a resolved grant.
    pub fn new(grant: &Grant, user_email: &str, navigation: Vec<NavLink>) -> Self {
        Self {
            association: AssociationRef {
                id: grant.association_id.clone(),
                name: grant.association_name.clone(),
            },
            role: grant.role,
            user_email: user_email.to_string(),
            navigation,
        }
    }
}

/// A rendered tenant page: the layout frame plus the section's data.
#[derive(Debug, Clone, Serialize)]
pub struct TenantPage<T> {
    /// Layout frame.
    #[serde(flatten)]
    pub layout: LayoutFrame,
    /// Section being rendered.
    pub section: Section,
    /// Section data.
    pub data: T,
}

/// A labelled value for charts and breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    /// Label.
    pub name: String,
    /// Value.
    pub value: f64,
}

impl Slice {
    fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Returns `part / whole` as a percentage, or `empty` when `whole` is zero.
pub(crate) fn percentage(part: usize, whole: usize, empty: f64) -> f64 {
    if whole == 0 {
        empty
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
