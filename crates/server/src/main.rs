//! SoftGet portal server
//!
//! Serves the session guard, the sign-in flow and the tenant pages of the
//! association dashboard.

use clap::Parser;
use softget_portal::{BackendMode, PortalConfig, create_app_with_config, init_logging};
use tracing::info;

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &PortalConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PortalConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let backend_mode = config
        .backend_mode()
        .map_err(|e| anyhow::anyhow!("Invalid backend configuration: {}", e))?;

    info!(
        port = config.port,
        host = %config.host,
        backend = %backend_mode,
        enforce_section_access = config.enforce_section_access,
        "Starting SoftGet portal"
    );

    match backend_mode {
        BackendMode::Supabase => start_supabase(config).await,
        BackendMode::Memory => start_memory(config).await,
    }
}

/// The in-memory backend only issues sessions through its test API, so a
/// server started on it could never sign anyone in.
async fn start_memory(_config: PortalConfig) -> anyhow::Result<()> {
    anyhow::bail!(
        "The memory backend is only available to tests. \
         Set PORTAL_BACKEND=supabase with PORTAL_BACKEND_URL and PORTAL_BACKEND_ANON_KEY"
    )
}

/// Starts the server against the hosted backend.
#[cfg(feature = "supabase")]
async fn start_supabase(config: PortalConfig) -> anyhow::Result<()> {
    use softget_backend::backends::supabase::{SupabaseBackend, SupabaseConfig};

    // validate() has already required both settings
    let url = config.backend_url.clone().unwrap_or_default();
    let anon_key = config.backend_anon_key.clone().unwrap_or_default();
    info!(url = %url, "Initializing hosted backend");

    let backend = SupabaseBackend::new(SupabaseConfig::new(url, anon_key))
        .map_err(|e| anyhow::anyhow!("Failed to create hosted backend: {}", e))?;

    let app = create_app_with_config(backend, config.clone());
    serve(app, &config).await
}

/// Fallback when the supabase feature is not enabled.
#[cfg(not(feature = "supabase"))]
async fn start_supabase(_config: PortalConfig) -> anyhow::Result<()> {
    anyhow::bail!(
        "The supabase backend requires the 'supabase' feature. \
         Build with: cargo build -p softget-server --features supabase"
    )
}
