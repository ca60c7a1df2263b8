//! Tenant sections and the role capability table.

use std::fmt;

use serde::Serialize;
use softget_backend::types::AssociationId;

use super::role::Role;

/// A page of the tenant area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Tenant home (`/associacao/{id}`).
    Dashboard,
    /// Board of directors.
    Diretoria,
    /// Members.
    Associados,
    /// Finance.
    Financeiro,
    /// Assets.
    Patrimonio,
    /// Legal obligations.
    Obrigacoes,
    /// Reports.
    Relatorios,
}

const MANAGEMENT: &[Role] = &[Role::Contador, Role::Presidente, Role::Secretario];
const FINANCE: &[Role] = &[Role::Contador, Role::Presidente, Role::Tesoureiro];

impl Section {
    /// All sections in navigation order.
    pub const ALL: [Section; 7] = [
        Section::Dashboard,
        Section::Diretoria,
        Section::Associados,
        Section::Financeiro,
        Section::Patrimonio,
        Section::Obrigacoes,
        Section::Relatorios,
    ];

    /// Returns the URL segment; empty for the tenant home.
    pub fn slug(&self) -> &'static str {
        match self {
            Section::Dashboard => "",
            Section::Diretoria => "diretoria",
            Section::Associados => "associados",
            Section::Financeiro => "financeiro",
            Section::Patrimonio => "patrimonio",
            Section::Obrigacoes => "obrigacoes",
            Section::Relatorios => "relatorios",
        }
    }

    /// Returns the navigation label.
    pub fn label(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Diretoria => "Diretoria",
            Section::Associados => "Associados",
            Section::Financeiro => "Financeiro",
            Section::Patrimonio => "Patrimônio",
            Section::Obrigacoes => "Obrigações",
            Section::Relatorios => "Relatórios",
        }
    }

    /// Looks a section up by URL segment.
    pub fn from_slug(slug: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.slug() == slug)
    }

    /// Returns the roles that may see this section.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Section::Dashboard => &Role::ALL,
            Section::Diretoria | Section::Associados | Section::Obrigacoes => MANAGEMENT,
            Section::Financeiro | Section::Patrimonio | Section::Relatorios => FINANCE,
        }
    }

    /// Returns true if `role` may see this section.
    pub fn is_visible_to(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }

    /// Returns the section's path within an association.
    pub fn href(&self, association_id: &AssociationId) -> String {
        match self {
            Section::Dashboard => association_id.home_path(),
            other => format!("{}/{}", association_id.home_path(), other.slug()),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    /// Target section.
    pub section: Section,
    /// Display label.
    pub label: &'static str,
    /// Target path.
    pub href: String,
    /// True for the section being viewed.
    pub active: bool,
}

/// Builds the navigation visible to `role`.
///
/// The tenant home is active only on an exact match; other sections are
/// active for any path below them.
pub fn navigation(role: Role, association_id: &AssociationId, current_path: &str) -> Vec<NavLink> {
    let current = current_path.trim_end_matches('/');
    Section::ALL
        .into_iter()
        .filter(|section| section.is_visible_to(role))
        .map(|section| {
            let href = section.href(association_id);
            let active = match section {
                Section::Dashboard => current == href,
                _ => current == href || current.starts_with(&format!("{}/", href)),
            };
            NavLink {
                section,
                label: section.label(),
                href,
                active,
            }
        })
        .collect()
}
