//! Axum extractors for the portal.
//!
//! - [`TenantAccess`] - the tenant layout gate
//! - [`CurrentUser`] - the signed-in user

pub mod tenant;
pub mod user;

pub use tenant::TenantAccess;
pub use user::CurrentUser;
