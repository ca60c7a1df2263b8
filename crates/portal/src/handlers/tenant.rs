//! Association home and section pages.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use softget_backend::core::Backend;

use crate::authz::Section;
use crate::error::PortalResult;
use crate::extractors::TenantAccess;
use crate::state::AppState;
use crate::views::{
    TenantPage, assets, board, finance, home, members, obligations, reports,
};

/// Query parameters of a section page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionParams {
    /// Finance period, `YYYY-MM`.
    pub periodo: Option<String>,
}

/// Handler for every tenant page.
///
/// The [`TenantAccess`] extractor has already authenticated and authorized
/// the caller by the time this runs; data is only fetched afterwards.
///
/// # HTTP Request
///
/// - `GET /associacao/{id}`
/// - `GET /associacao/{id}/{section}`
///
/// # Response
///
/// - `200 OK` - layout frame plus section data
/// - `303 See Other` - to `/` (no session), `/dashboard` (no grant) or the
///   association home (section not available to the role)
/// - `400 Bad Request` - malformed `periodo`
/// - `404 Not Found` - unknown section
pub async fn tenant_page_handler<B>(
    State(state): State<AppState<B>>,
    access: TenantAccess,
    Query(params): Query<SectionParams>,
) -> PortalResult<Response>
where
    B: Backend + 'static,
{
    let data = state.backend();
    let today = chrono::Utc::now().date_naive();

    let response = match access.section() {
        Section::Dashboard => page(&access, home::load(data, &access, today).await),
        Section::Diretoria => page(&access, board::load(data, &access).await),
        Section::Associados => page(&access, members::load(data, &access).await),
        Section::Financeiro => page(
            &access,
            finance::load(data, &access, params.periodo.as_deref(), today).await?,
        ),
        Section::Patrimonio => page(&access, assets::load(data, &access).await),
        Section::Obrigacoes => page(&access, obligations::load(data, &access).await),
        Section::Relatorios => page(&access, reports::load(data, &access).await),
    };
    Ok(response)
}

fn page<T: Serialize>(access: &TenantAccess, data: T) -> Response {
    Json(TenantPage {
        layout: access.frame(),
        section: access.section(),
        data,
    })
    .into_response()
}
