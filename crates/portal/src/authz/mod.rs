//! Tenant authorization.
//!
//! - [`gate`] - per-request grant lookup, fail closed
//! - [`role`] - the fixed role enumeration
//! - [`section`] - tenant sections and the role capability table

pub mod gate;
pub mod role;
pub mod section;

pub use gate::{Authorization, Denial, Grant, authorize};
pub use role::Role;
pub use section::{NavLink, Section, navigation};
