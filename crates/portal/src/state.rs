//! Application state for the portal.
//!
//! Shared by every handler, middleware and extractor: the backend, the
//! configuration and the session cookie codec derived from it.

use std::sync::Arc;

use softget_backend::core::Backend;

use crate::config::PortalConfig;
use crate::identity::IdentityClient;
use crate::session::{SessionCookie, SessionStore};

/// Shared application state.
///
/// # Type Parameters
///
/// * `B` - The backend serving identity and data
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use softget_backend::backends::memory::InMemoryBackend;
/// use softget_portal::{AppState, PortalConfig};
///
/// let state = AppState::new(Arc::new(InMemoryBackend::new()), PortalConfig::for_testing());
/// assert_eq!(state.session_cookie().name(), "sb-auth-token");
/// ```
pub struct AppState<B> {
    /// The backend.
    backend: Arc<B>,

    /// Portal configuration.
    config: Arc<PortalConfig>,

    /// Session cookie codec.
    session_cookie: Arc<SessionCookie>,
}

// B is behind an Arc and need not be Clone
impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: Arc::clone(&self.config),
            session_cookie: Arc::clone(&self.session_cookie),
        }
    }
}

impl<B: Backend> AppState<B> {
    /// Creates a new AppState.
    pub fn new(backend: Arc<B>, config: PortalConfig) -> Self {
        let session_cookie = Arc::new(config.session_cookie());
        Self {
            backend,
            config: Arc::new(config),
            session_cookie,
        }
    }

    /// Returns a reference to the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Returns the session cookie codec.
    pub fn session_cookie(&self) -> &SessionCookie {
        &self.session_cookie
    }

    /// Returns true if sections are enforced per role.
    pub fn enforce_section_access(&self) -> bool {
        self.config.enforce_section_access
    }

    /// Creates an identity client over `store`.
    pub fn identity<S: SessionStore>(&self, store: S) -> IdentityClient<'_, B, S> {
        IdentityClient::new(self.backend.as_ref(), &self.session_cookie, store)
    }
}
