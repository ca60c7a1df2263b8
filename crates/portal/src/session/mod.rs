//! Session store adapter.
//!
//! - [`cookies`] - `Cookie` parsing and `Set-Cookie` rendering
//! - [`store`] - read-only and read-write cookie stores
//! - [`codec`] - token pair encoding and cookie chunking

pub mod codec;
pub mod cookies;
pub mod store;

pub use codec::SessionCookie;
pub use cookies::{CookieOptions, SameSite};
pub use store::{RequestCookies, ResponseCookies, SessionStore};
