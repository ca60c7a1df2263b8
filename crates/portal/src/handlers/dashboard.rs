//! Association picker.

use axum::{Json, extract::State};
use softget_backend::core::Backend;

use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::views::dashboard::{self, DashboardView};

/// Handler for the association picker.
///
/// # HTTP Request
///
/// `GET /dashboard`
///
/// # Response
///
/// - `200 OK` - the associations the user holds a grant for
/// - `303 See Other` - to `/` without a session
pub async fn dashboard_handler<B>(
    State(state): State<AppState<B>>,
    CurrentUser(auth): CurrentUser,
) -> Json<DashboardView>
where
    B: Backend + 'static,
{
    Json(dashboard::load(state.backend(), auth.access_token(), &auth.user).await)
}
