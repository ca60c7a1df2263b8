//! SoftGet backend collaborators.
//!
//! The portal delegates identity and relational data to a hosted
//! backend-as-a-service. This crate defines the two narrow contracts the
//! portal consumes, the value types that cross them, and the backends that
//! implement them.
//!
//! # Contracts
//!
//! - [`IdentityProvider`](core::IdentityProvider) - resolves users from access
//!   tokens, rotates refresh tokens, revokes sessions and builds the
//!   provider-hosted sign-in URL.
//! - [`DataApi`](core::DataApi) - a fallible tabular lookup:
//!   `query(table, filters, joins) -> rows | error`.
//!
//! # Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | In-memory | always | Seeded tables and issued tokens, for tests and local runs |
//! | Supabase | `supabase` (default) | GoTrue auth + PostgREST over HTTPS |
//!
//! # Quick Start
//!
//! ```
//! use softget_backend::backends::memory::InMemoryBackend;
//! use softget_backend::types::{Query, User};
//! use serde_json::json;
//!
//! let backend = InMemoryBackend::new();
//! backend.add_user(User::new("u-1", "ana@example.org"));
//! backend.insert_row(
//!     "Permissoes_Usuarios",
//!     json!({"user_id": "u-1", "associacao_id": "a-1", "papel": "TESOUREIRO"}),
//! );
//!
//! let query = Query::from("Permissoes_Usuarios")
//!     .select(&["papel"])
//!     .eq("user_id", "u-1");
//! assert_eq!(query.table(), "Permissoes_Usuarios");
//! ```

#![warn(missing_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod types;

pub use error::{AuthError, BackendError, BackendResult, QueryError};
