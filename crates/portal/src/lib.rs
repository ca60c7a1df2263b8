//! # softget-portal - Session and tenant gate for the association dashboard
//!
//! This crate serves the SoftGet association dashboard. Each user may hold
//! a role in several associations (tenants); every tenant page checks the
//! role again before any tenant data is read.
//!
//! ## Request flow
//!
//! 1. **Session store** ([`session`]) - reads and writes the session tokens
//!    held in cookies, chunked and base64 encoded.
//! 2. **Identity client** ([`identity`]) - resolves the caller through the
//!    identity provider, refreshing expiring sessions.
//! 3. **Edge router guard** ([`middleware::guard`]) - keeps the login page
//!    and the dashboard subtree consistent with the session.
//! 4. **Authorization gate** ([`authz`]) - looks up the caller's role in an
//!    association, failing closed.
//! 5. **Tenant layout gate** ([`extractors::TenantAccess`]) - composes the
//!    above for every `/associacao/{id}` page.
//! 6. **Views** ([`views`]) - load the section data, concurrently and only
//!    after the gate.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use softget_portal::{create_app_with_config, PortalConfig};
//! use softget_backend::backends::memory::InMemoryBackend;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PortalConfig::default();
//!     let app = create_app_with_config(InMemoryBackend::new(), config);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Redirects
//!
//! | Situation | Target |
//! |-----------|--------|
//! | No session | `/` |
//! | Session on the login page | `/dashboard` |
//! | No grant for the association | `/dashboard` |
//! | Section not available to the role | `/associacao/{id}` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod authz;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod routing;
pub mod session;
pub mod state;
pub mod views;

// Re-export commonly used types
pub use config::{BackendMode, PortalConfig};
pub use error::{PortalError, PortalResult};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use softget_backend::core::Backend;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app<B>(backend: B) -> Router
where
    B: Backend + 'static,
{
    create_app_with_config(backend, PortalConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// # Arguments
///
/// * `backend` - The identity and data backend
/// * `config` - Portal configuration
///
/// # Example
///
/// ```rust,ignore
/// use softget_portal::{create_app_with_config, PortalConfig};
/// use softget_backend::backends::memory::InMemoryBackend;
///
/// let config = PortalConfig {
///     enable_cors: true,
///     ..PortalConfig::for_testing()
/// };
/// let app = create_app_with_config(InMemoryBackend::new(), config);
/// ```
pub fn create_app_with_config<B>(backend: B, config: PortalConfig) -> Router
where
    B: Backend + 'static,
{
    info!("Creating portal with backend: {}", backend.backend_name());

    let state = AppState::new(Arc::new(backend), config.clone());
    let router = routing::portal_routes::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    let router = if config.enable_request_id {
        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    } else {
        router
    };

    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer from the comma-separated origin list.
fn build_cors_layer(config: &PortalConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins == "*" {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over `level`. Call once at startup.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "softget_portal={level},softget_backend={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

