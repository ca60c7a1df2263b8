//! Portal configuration.
//!
//! Every setting can come from a command line flag or an environment
//! variable, and has a default suitable for local development.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORTAL_SERVER_PORT` | 3000 | Server port |
//! | `PORTAL_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `PORTAL_LOG_LEVEL` | info | Log level |
//! | `PORTAL_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `PORTAL_ENABLE_CORS` | false | Enable CORS |
//! | `PORTAL_CORS_ORIGINS` | * | Allowed origins |
//! | `PORTAL_ENABLE_REQUEST_ID` | true | Tag requests with `x-request-id` |
//! | `PORTAL_PUBLIC_URL` | http://localhost:3000 | Public URL (OAuth return target) |
//! | `PORTAL_BACKEND` | supabase | Backend (`supabase`, or `memory` in tests) |
//! | `PORTAL_BACKEND_URL` | - | Hosted backend project URL |
//! | `PORTAL_BACKEND_ANON_KEY` | - | Hosted backend anon key |
//! | `PORTAL_SIGN_IN_PROVIDER` | google | OAuth provider offered on the login page |
//! | `PORTAL_COOKIE_NAME` | sb-auth-token | Session cookie name |
//! | `PORTAL_COOKIE_PATH` | / | Session cookie path |
//! | `PORTAL_COOKIE_MAX_AGE` | 34560000 | Session cookie lifetime (seconds) |
//! | `PORTAL_COOKIE_SAME_SITE` | lax | `lax`, `strict` or `none` |
//! | `PORTAL_COOKIE_SECURE` | false | Mark the session cookie `Secure` |
//! | `PORTAL_ENFORCE_SECTION_ACCESS` | true | Redirect roles away from sections they cannot see |
//!
//! # Example
//!
//! ```rust
//! use softget_portal::PortalConfig;
//!
//! let config = PortalConfig {
//!     port: 8000,
//!     enforce_section_access: false,
//!     ..Default::default()
//! };
//! assert_eq!(config.socket_addr(), "127.0.0.1:8000");
//! ```

use std::fmt;
use std::str::FromStr;

use clap::Parser;

use crate::session::{CookieOptions, SameSite, SessionCookie};

/// Which backend serves identity and data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Hosted backend-as-a-service.
    Supabase,
    /// In-process backend, empty on start.
    Memory,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Supabase => write!(f, "supabase"),
            BackendMode::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "supabase" => Ok(BackendMode::Supabase),
            "memory" => Ok(BackendMode::Memory),
            other => Err(format!(
                "unknown backend '{}' (expected supabase or memory)",
                other
            )),
        }
    }
}

/// Portal configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "softget")]
#[command(about = "SoftGet association dashboard portal")]
pub struct PortalConfig {
    /// Port to listen on.
    #[arg(short, long, env = "PORTAL_SERVER_PORT", default_value = "3000")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "PORTAL_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "PORTAL_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in seconds.
    #[arg(long, env = "PORTAL_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "PORTAL_ENABLE_CORS", default_value = "false")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "PORTAL_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Tag every request and response with an `x-request-id` header.
    #[arg(long, env = "PORTAL_ENABLE_REQUEST_ID", default_value = "true")]
    pub enable_request_id: bool,

    /// Public URL of the portal, used as the OAuth return target.
    #[arg(long, env = "PORTAL_PUBLIC_URL", default_value = "http://localhost:3000")]
    pub public_url: String,

    /// Backend serving identity and data (supabase, or memory in tests).
    #[arg(long = "backend", env = "PORTAL_BACKEND", default_value = "supabase")]
    pub backend_mode: String,

    /// Hosted backend project URL.
    #[arg(long, env = "PORTAL_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Hosted backend anon key.
    #[arg(long, env = "PORTAL_BACKEND_ANON_KEY")]
    pub backend_anon_key: Option<String>,

    /// OAuth provider offered on the login page.
    #[arg(long, env = "PORTAL_SIGN_IN_PROVIDER", default_value = "google")]
    pub sign_in_provider: String,

    /// Session cookie name (chunks are suffixed `.0`, `.1`, ...).
    #[arg(long, env = "PORTAL_COOKIE_NAME", default_value = "sb-auth-token")]
    pub cookie_name: String,

    /// Session cookie path.
    #[arg(long, env = "PORTAL_COOKIE_PATH", default_value = "/")]
    pub cookie_path: String,

    /// Session cookie lifetime in seconds.
    #[arg(long, env = "PORTAL_COOKIE_MAX_AGE", default_value = "34560000")]
    pub cookie_max_age: i64,

    /// Session cookie SameSite attribute (lax, strict, none).
    #[arg(long, env = "PORTAL_COOKIE_SAME_SITE", default_value = "lax")]
    pub cookie_same_site: String,

    /// Mark the session cookie Secure.
    #[arg(long, env = "PORTAL_COOKIE_SECURE", default_value = "false")]
    pub cookie_secure: bool,

    /// Redirect a role away from tenant sections outside its capability set.
    #[arg(long, env = "PORTAL_ENFORCE_SECTION_ACCESS", default_value = "true")]
    pub enforce_section_access: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            request_timeout: 30,
            enable_cors: false,
            cors_origins: "*".to_string(),
            enable_request_id: true,
            public_url: "http://localhost:3000".to_string(),
            backend_mode: "supabase".to_string(),
            backend_url: None,
            backend_anon_key: None,
            sign_in_provider: "google".to_string(),
            cookie_name: "sb-auth-token".to_string(),
            cookie_path: "/".to_string(),
            cookie_max_age: 400 * 24 * 60 * 60,
            cookie_same_site: "lax".to_string(),
            cookie_secure: false,
            enforce_section_access: true,
        }
    }
}

impl PortalConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses the configured backend mode.
    pub fn backend_mode(&self) -> Result<BackendMode, String> {
        self.backend_mode.parse()
    }

    /// Returns the attributes written on the session cookie.
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            path: self.cookie_path.clone(),
            max_age: Some(self.cookie_max_age),
            same_site: self.cookie_same_site.parse().unwrap_or(SameSite::Lax),
            secure: self.cookie_secure,
            http_only: false,
        }
    }

    /// Returns the session cookie codec for this configuration.
    pub fn session_cookie(&self) -> SessionCookie {
        SessionCookie::new(&self.cookie_name, self.cookie_options())
    }

    /// Returns the URL the identity provider sends the browser back to.
    pub fn sign_in_return_url(&self) -> String {
        format!("{}/", self.public_url.trim_end_matches('/'))
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.cookie_name.trim().is_empty() {
            errors.push("Cookie name cannot be empty".to_string());
        }

        if let Err(e) = self.cookie_same_site.parse::<SameSite>() {
            errors.push(e);
        }

        if url::Url::parse(&self.public_url).is_err() {
            errors.push(format!("Invalid public URL: {}", self.public_url));
        }

        match self.backend_mode() {
            Ok(BackendMode::Supabase) => {
                if self.backend_url.as_deref().is_none_or(str::is_empty) {
                    errors.push("PORTAL_BACKEND_URL is required for the supabase backend".to_string());
                }
                if self.backend_anon_key.as_deref().is_none_or(str::is_empty) {
                    errors.push(
                        "PORTAL_BACKEND_ANON_KEY is required for the supabase backend".to_string(),
                    );
                }
            }
            Ok(BackendMode::Memory) => {}
            Err(e) => errors.push(e),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            log_level: "debug".to_string(),
            request_timeout: 5,
            enable_request_id: false,
            backend_mode: "memory".to_string(),
            ..Self::default()
        }
    }
}
