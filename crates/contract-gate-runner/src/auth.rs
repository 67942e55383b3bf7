// crates/contract-gate-runner/src/auth.rs
// ============================================================================
// Module: Authentication Context
// Description: Auth strategy application and OAuth2 token lifecycle.
// Purpose: Mutate request URLs and headers per the configured auth mode,
//          caching client-credentials tokens behind one exclusive lock.
// Dependencies: contract-gate-core, contract-gate-config, reqwest, url,
//               base64, time
// ============================================================================

//! ## Overview
//! An [`AuthContext`] resolves one of three authentication strategies into
//! header and URL mutations: none (identity), API key (custom header or
//! query parameter), and OAuth2 bearer (static token, or a cached
//! client-credentials token). The token cache is guarded by a mutex owned
//! unconditionally from construction; the lock scope covers
//! check-then-exchange-then-store so concurrent callers never trigger
//! redundant exchanges.
//!
//! Invariants:
//! - A static bearer token always wins; no network call is made.
//! - A cached token counts as expired once `now >= expiry - 10s`.
//! - Tokens are replaced wholesale on refresh, never mutated in place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::PoisonError;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use contract_gate_config::AuthMode;
use contract_gate_config::AuthSettings;
use contract_gate_config::NetworkSettings;
use contract_gate_core::AuthError;
use contract_gate_core::CheckErrorKind;
use contract_gate_core::MetricError;
use contract_gate_core::NetworkError;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Safety margin subtracted from a token's stated expiry to absorb clock
/// drift and in-flight latency.
pub const TOKEN_EXPIRY_SKEW: time::Duration = time::Duration::seconds(10);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures raised while applying authentication to a request.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum AuthFlowError {
    /// Credential or token-endpoint failure.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Transport failure reaching the token endpoint.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl From<AuthFlowError> for CheckErrorKind {
    fn from(err: AuthFlowError) -> Self {
        match err {
            AuthFlowError::Auth(inner) => Self::Auth(inner),
            AuthFlowError::Network(inner) => Self::Network(inner),
        }
    }
}

impl From<AuthFlowError> for MetricError {
    fn from(err: AuthFlowError) -> Self {
        match err {
            AuthFlowError::Auth(inner) => Self::Auth(inner),
            AuthFlowError::Network(inner) => Self::Network(inner),
        }
    }
}

// ============================================================================
// SECTION: OAuth2 Token
// ============================================================================

/// A bearer token obtained from a successful token-endpoint exchange.
///
/// # Invariants
/// - `expires_at` of `None` means the token never expires.
/// - Instances are immutable; refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Token {
    /// The access token string.
    pub access_token: String,
    /// Token type reported by the endpoint (typically `Bearer`).
    pub token_type: String,
    /// Absolute expiry instant, when the endpoint reported one.
    pub expires_at: Option<OffsetDateTime>,
}

impl OAuth2Token {
    /// Returns true when the token counts as expired at the given instant,
    /// applying the [`TOKEN_EXPIRY_SKEW`] safety margin.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| now >= at - TOKEN_EXPIRY_SKEW)
    }

    /// Returns true when the token counts as expired now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

/// Wire shape of a token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    /// Issued access token.
    #[serde(default)]
    access_token: Option<String>,
    /// Reported token type.
    #[serde(default)]
    token_type: Option<String>,
    /// Lifetime in seconds; numbers and numeric strings are accepted.
    #[serde(default)]
    expires_in: Option<Value>,
}

// ============================================================================
// SECTION: Auth Context
// ============================================================================

/// Authentication context for one run (or one per-check override).
///
/// # Invariants
/// - Settings are immutable; the token cache is the only mutable slot.
/// - The cache mutex is constructor-initialized and owned for the context's
///   whole lifetime.
/// - The lock serializes check-then-exchange-then-store, so at most one
///   refresh is in flight per context.
pub struct AuthContext {
    /// Static authentication settings.
    settings: AuthSettings,
    /// HTTP client used for token exchanges.
    client: Client,
    /// Cached client-credentials token.
    cached_token: Mutex<Option<OAuth2Token>>,
}

impl AuthContext {
    /// Creates an auth context with its own token cache.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::ClientBuild`] when the HTTP client cannot be
    /// constructed.
    pub fn new(settings: AuthSettings, network: &NetworkSettings) -> Result<Self, NetworkError> {
        let client = build_client(network)?;
        Ok(Self {
            settings,
            client,
            cached_token: Mutex::new(None),
        })
    }

    /// Derives a context for a per-check override: same static credential
    /// fields and client, but a fresh token cache and the given mode.
    ///
    /// Overrides never reuse another context's cached token.
    #[must_use]
    pub fn with_mode(&self, mode: AuthMode) -> Self {
        let mut settings = self.settings.clone();
        settings.mode = mode;
        Self {
            settings,
            client: self.client.clone(),
            cached_token: Mutex::new(None),
        }
    }

    /// Returns the static settings this context was built from.
    #[must_use]
    pub const fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Returns the shared HTTP client.
    pub(crate) const fn client(&self) -> &Client {
        &self.client
    }

    /// Applies the auth strategy to request headers, returning the mutated
    /// header map.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError`] when an OAuth2 token exchange is needed and
    /// fails.
    pub fn apply_headers(
        &self,
        headers: &std::collections::BTreeMap<String, String>,
    ) -> Result<std::collections::BTreeMap<String, String>, AuthFlowError> {
        let mut headers = headers.clone();
        match self.settings.mode {
            AuthMode::None => {}
            AuthMode::ApiKey => {
                if let Some(key) = &self.settings.api_key
                    && !self.settings.api_key_header.is_empty()
                    && self.settings.api_key_query_param.is_none()
                {
                    headers.insert(self.settings.api_key_header.clone(), key.clone());
                }
            }
            AuthMode::OAuth2 => {
                if let Some(token) = self.bearer_token()? {
                    headers.insert("Authorization".to_string(), format!("Bearer {token}"));
                }
            }
        }
        Ok(headers)
    }

    /// Applies the auth strategy to the request URL, merging an API-key
    /// query parameter when one is configured. An existing parameter of the
    /// same name is overwritten in place, keeping its position; a new
    /// parameter is appended.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidUrl`] when the URL cannot be parsed.
    pub fn apply_url(&self, url: &str) -> Result<String, NetworkError> {
        if self.settings.mode != AuthMode::ApiKey {
            return Ok(url.to_string());
        }
        let (Some(key), Some(param)) =
            (&self.settings.api_key, &self.settings.api_key_query_param)
        else {
            return Ok(url.to_string());
        };
        let mut parsed = Url::parse(url).map_err(|_| NetworkError::InvalidUrl {
            url: url.to_string(),
        })?;
        let mut pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        let mut replaced = false;
        for (name, value) in &mut pairs {
            if name == param {
                value.clone_from(key);
                replaced = true;
            }
        }
        if !replaced {
            pairs.push((param.clone(), key.clone()));
        }
        {
            let mut serializer = parsed.query_pairs_mut();
            serializer.clear();
            for (name, value) in &pairs {
                serializer.append_pair(name, value);
            }
        }
        Ok(parsed.into())
    }

    /// Resolves the bearer token for OAuth2 mode.
    ///
    /// A static token always wins with no lock and no network call. With a
    /// token URL configured, the cached token is reused while unexpired;
    /// otherwise a client-credentials exchange replaces the cache. Without
    /// either, no token is available and no header is applied.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError`] when the exchange is needed and fails.
    pub fn bearer_token(&self) -> Result<Option<String>, AuthFlowError> {
        if let Some(token) = &self.settings.bearer_token {
            return Ok(Some(token.clone()));
        }
        let Some(token_url) = &self.settings.token_url else {
            return Ok(None);
        };

        // Lock scope covers check, exchange, and store.
        let mut cached = self.cached_token.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = cached.as_ref()
            && !token.is_expired()
        {
            return Ok(Some(token.access_token.clone()));
        }
        let token = self.exchange_client_credentials(token_url)?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(Some(access_token))
    }

    /// Performs the OAuth2 client-credentials exchange.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError`] on missing credentials, transport failure,
    /// a non-success status, or a malformed token response.
    fn exchange_client_credentials(&self, token_url: &str) -> Result<OAuth2Token, AuthFlowError> {
        let (Some(client_id), Some(client_secret)) =
            (&self.settings.client_id, &self.settings.client_secret)
        else {
            return Err(AuthError::MissingClientCredentials.into());
        };

        let basic = STANDARD.encode(format!("{client_id}:{client_secret}"));
        let mut form: Vec<(&str, &str)> = vec![("grant_type", "client_credentials")];
        if let Some(scope) = &self.settings.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = self
            .client
            .post(token_url)
            .header("Accept", "application/json")
            .header("Authorization", format!("Basic {basic}"))
            .form(&form)
            .send()
            .map_err(|err| map_send_error(token_url, &err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::TokenEndpointStatus {
                url: token_url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let payload: TokenResponse = response.json().map_err(|err| {
            AuthFlowError::from(AuthError::MalformedTokenResponse {
                url: token_url.to_string(),
                detail: err.to_string(),
            })
        })?;
        let access_token = payload.access_token.unwrap_or_default().trim().to_string();
        if access_token.is_empty() {
            return Err(AuthError::MalformedTokenResponse {
                url: token_url.to_string(),
                detail: "response missing access_token".to_string(),
            }
            .into());
        }
        let token_type = payload
            .token_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Bearer".to_string());
        let expires_at = payload
            .expires_in
            .as_ref()
            .and_then(expires_in_seconds)
            .map(|seconds| OffsetDateTime::now_utc() + time::Duration::seconds_f64(seconds));

        Ok(OAuth2Token {
            access_token,
            token_type,
            expires_at,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the blocking HTTP client used for auth and check traffic.
///
/// # Errors
///
/// Returns [`NetworkError::ClientBuild`] when construction fails.
pub(crate) fn build_client(network: &NetworkSettings) -> Result<Client, NetworkError> {
    Client::builder()
        .timeout(network.timeout)
        .danger_accept_invalid_certs(!network.verify_tls)
        .build()
        .map_err(|err| NetworkError::ClientBuild {
            detail: err.to_string(),
        })
}

/// Maps a transport error to the network taxonomy, distinguishing timeouts.
pub(crate) fn map_send_error(url: &str, err: &reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
    } else {
        NetworkError::Connection {
            url: url.to_string(),
            detail: err.to_string(),
        }
    }
}

/// Parses `expires_in` as seconds; numbers and numeric strings are
/// accepted, anything else means the token never expires.
fn expires_in_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}
