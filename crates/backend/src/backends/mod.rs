//! Backend implementations.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | In-memory | always | Seeded tables, issued tokens, failure injection |
//! | Supabase | `supabase` | GoTrue + PostgREST over HTTPS |
//!
//! # Example
//!
//! ```
//! use softget_backend::backends::memory::InMemoryBackend;
//! use softget_backend::core::Backend;
//!
//! let backend = InMemoryBackend::new();
//! assert_eq!(backend.backend_name(), "memory");
//! ```

pub mod memory;

#[cfg(feature = "supabase")]
pub mod supabase;
