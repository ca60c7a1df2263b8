//! Hosted backend over HTTPS.
//!
//! Identity calls go to the GoTrue endpoints under `/auth/v1`, data queries
//! to PostgREST under `/rest/v1`. Every request carries the project's anon
//! key as `apikey`; data queries additionally carry the caller's access token
//! so row-level security is evaluated for that user.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::core::{Backend, DataApi, IdentityProvider};
use crate::error::{AuthError, BackendError, BackendResult, QueryError};
use crate::types::{Query, SessionTokens, User};

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anon key of the project.
    pub anon_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SupabaseConfig {
    /// Creates a config with a 10 second request timeout.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_tokens(self) -> SessionTokens {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
        let tokens = SessionTokens::new(self.access_token, self.refresh_token);
        match expires_at {
            Some(at) => tokens.with_expires_at(at),
            None => tokens,
        }
    }
}

/// Backend talking to a hosted Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseBackend {
    client: Client,
    base_url: Url,
    anon_key: String,
}

impl SupabaseBackend {
    /// Creates a backend from its connection settings.
    ///
    /// Fails when the URL does not parse or the HTTP client cannot be built.
    pub fn new(config: SupabaseConfig) -> BackendResult<Self> {
        let mut base_url = Url::parse(&config.url).map_err(|e| BackendError::Config {
            message: format!("invalid backend URL: {}", e),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            anon_key: config.anon_key,
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        // `path` is always one of our relative constants
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    fn unavailable(err: impl std::fmt::Display) -> AuthError {
        AuthError::Unavailable {
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseBackend {
    async fn get_user(&self, access_token: &str) -> BackendResult<Option<User>> {
        let response = self
            .client
            .get(self.endpoint("auth/v1/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Self::unavailable)?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Provider rejected access token");
                Ok(None)
            }
            status if status.is_success() => {
                let user: User = response.json().await.map_err(Self::unavailable)?;
                Ok(Some(user))
            }
            status if status.is_client_error() => Ok(None),
            status => Err(Self::unavailable(format!("status {}", status)).into()),
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<SessionTokens> {
        let mut url = self.endpoint("auth/v1/token");
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(Self::unavailable)?;

        let status = response.status();
        if status.is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed { message }.into());
        }
        if !status.is_success() {
            return Err(Self::unavailable(format!("status {}", status)).into());
        }

        let body: TokenResponse = response.json().await.map_err(Self::unavailable)?;
        Ok(body.into_tokens())
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        let response = self
            .client
            .post(self.endpoint("auth/v1/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Self::unavailable)?;

        let status = response.status();
        if status.is_success() || status.is_client_error() {
            // An already revoked session is signed out
            return Ok(());
        }
        Err(Self::unavailable(format!("status {}", status)).into())
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        let mut url = self.endpoint("auth/v1/authorize");
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to);
        url.to_string()
    }
}

#[async_trait]
impl DataApi for SupabaseBackend {
    async fn query(&self, access_token: Option<&str>, query: &Query) -> BackendResult<Vec<Value>> {
        let table = query.table().to_string();
        let mut url = self.endpoint(&format!("rest/v1/{}", table));
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_params() {
                pairs.append_pair(&key, &value);
            }
        }

        let response = self
            .client
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token.unwrap_or(&self.anon_key))
            .send()
            .await
            .map_err(|e| QueryError::Unavailable {
                table: table.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(table = %table, status = status.as_u16(), "Data API rejected query");
            return Err(QueryError::Rejected {
                table,
                status: status.as_u16(),
                message,
            }
            .into());
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| {
                QueryError::Decode {
                    table,
                    message: e.to_string(),
                }
                .into()
            })
    }
}

impl Backend for SupabaseBackend {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}
