//! Value types shared by the backend contracts.
//!
//! - [`AssociationId`] - opaque tenant identifier
//! - [`User`] - identity-provider-issued user record
//! - [`SessionTokens`] - access/refresh token pair
//! - [`Query`] - tabular lookup with filters, joins and ordering

mod id;
pub(crate) mod query;
mod session;
mod user;

pub use id::AssociationId;
pub use query::{Embed, Filter, FilterOp, Order, Query};
pub use session::SessionTokens;
pub use user::User;
