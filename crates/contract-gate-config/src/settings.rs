// crates/contract-gate-config/src/settings.rs
// ============================================================================
// Module: Run Settings
// Description: Auth and network settings sourced from the environment.
// Purpose: Parse and validate the operator-supplied run configuration.
// Dependencies: contract-gate-core, serde
// ============================================================================

//! ## Overview
//! [`AuthSettings`] selects one of three authentication strategies (none,
//! API key, OAuth2) and carries the static credential fields each strategy
//! needs. [`NetworkSettings`] carries the request timeout and TLS
//! verification flag. Both load from `SUT_*` environment variables; empty
//! values normalize to absent, and an absent mode selector means no
//! authentication.
//!
//! Invariants:
//! - An unknown mode selector is a configuration error, not a fallback.
//! - Loading never reads the environment directly in tests: a deterministic
//!   lookup can be injected via the `from_lookup` constructors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use contract_gate_core::ConfigError;
use serde::Deserialize;

// ============================================================================
// SECTION: Environment Variable Names
// ============================================================================

/// Auth mode selector: `none`, `api_key`/`apikey`, or `oauth2`/`bearer`.
pub const ENV_AUTH_MODE: &str = "SUT_AUTH_MODE";
/// Static API key value.
pub const ENV_API_KEY: &str = "SUT_API_KEY";
/// Header name carrying the API key (default `X-API-Key`).
pub const ENV_API_KEY_HEADER: &str = "SUT_API_KEY_HEADER";
/// Query parameter name carrying the API key, when header delivery is not
/// wanted.
pub const ENV_API_KEY_QUERY_PARAM: &str = "SUT_API_KEY_QUERY_PARAM";
/// Static OAuth2 bearer token; always wins over client-credentials.
pub const ENV_OAUTH_TOKEN: &str = "SUT_OAUTH_TOKEN";
/// OAuth2 token endpoint URL for the client-credentials grant.
pub const ENV_OAUTH_TOKEN_URL: &str = "SUT_OAUTH_TOKEN_URL";
/// OAuth2 client id.
pub const ENV_OAUTH_CLIENT_ID: &str = "SUT_OAUTH_CLIENT_ID";
/// OAuth2 client secret.
pub const ENV_OAUTH_CLIENT_SECRET: &str = "SUT_OAUTH_CLIENT_SECRET";
/// OAuth2 scope requested with the token exchange.
pub const ENV_OAUTH_SCOPE: &str = "SUT_OAUTH_SCOPE";
/// Request timeout in seconds (default 10).
pub const ENV_TIMEOUT_S: &str = "SUT_TIMEOUT_S";
/// TLS verification flag; `0`, `false`, and `no` disable verification.
pub const ENV_VERIFY_TLS: &str = "SUT_VERIFY_TLS";

/// Default header name for API-key delivery.
const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_S: f64 = 10.0;

// ============================================================================
// SECTION: Auth Mode
// ============================================================================

/// Authentication strategy for requests against the system under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// No authentication applied.
    #[default]
    None,
    /// Static API key delivered via header or query parameter.
    ApiKey,
    /// OAuth2 bearer token, static or via client-credentials exchange.
    OAuth2,
}

impl AuthMode {
    /// Parses a mode selector value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownAuthMode`] for unsupported selectors.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "api_key" | "apikey" => Ok(Self::ApiKey),
            "oauth2" | "bearer" => Ok(Self::OAuth2),
            other => Err(ConfigError::UnknownAuthMode {
                mode: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// SECTION: Auth Settings
// ============================================================================

/// Static authentication settings for one contract run.
///
/// # Invariants
/// - Immutable after loading; the runner's token cache lives elsewhere.
/// - Optional fields hold `None` rather than empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthSettings {
    /// Selected authentication strategy.
    #[serde(default)]
    pub mode: AuthMode,
    /// Static API key value.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Header name carrying the API key.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Query parameter name carrying the API key instead of a header.
    #[serde(default)]
    pub api_key_query_param: Option<String>,
    /// Static bearer token; wins over client-credentials when present.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// OAuth2 token endpoint URL.
    #[serde(default)]
    pub token_url: Option<String>,
    /// OAuth2 client id.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth2 client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// OAuth2 scope requested during the exchange.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Serde default for the API-key header name.
fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            mode: AuthMode::None,
            api_key: None,
            api_key_header: default_api_key_header(),
            api_key_query_param: None,
            bearer_token: None,
            token_url: None,
            client_id: None,
            client_secret: None,
            scope: None,
        }
    }
}

impl AuthSettings {
    /// Loads auth settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the mode selector is unsupported.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads auth settings from a caller-supplied variable lookup.
    ///
    /// Empty and whitespace-only values normalize to absent; an absent mode
    /// selector means no authentication.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the mode selector is unsupported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = AuthMode::parse(&lookup(ENV_AUTH_MODE).unwrap_or_default())?;
        let api_key_header =
            non_empty(lookup(ENV_API_KEY_HEADER)).unwrap_or_else(default_api_key_header);
        Ok(Self {
            mode,
            api_key: non_empty(lookup(ENV_API_KEY)),
            api_key_header,
            api_key_query_param: non_empty(lookup(ENV_API_KEY_QUERY_PARAM)),
            bearer_token: non_empty(lookup(ENV_OAUTH_TOKEN)),
            token_url: non_empty(lookup(ENV_OAUTH_TOKEN_URL)),
            client_id: non_empty(lookup(ENV_OAUTH_CLIENT_ID)),
            client_secret: non_empty(lookup(ENV_OAUTH_CLIENT_SECRET)),
            scope: non_empty(lookup(ENV_OAUTH_SCOPE)),
        })
    }
}

// ============================================================================
// SECTION: Network Settings
// ============================================================================

/// Cross-cutting network settings for one contract run.
///
/// # Invariants
/// - `timeout` bounds every network call, including token exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Whether TLS certificates are verified.
    pub verify_tls: bool,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_S),
            verify_tls: true,
        }
    }
}

impl NetworkSettings {
    /// Loads network settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the timeout value is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads network settings from a caller-supplied variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the timeout value is not a positive
    /// number of seconds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = match non_empty(lookup(ENV_TIMEOUT_S)) {
            None => Duration::from_secs_f64(DEFAULT_TIMEOUT_S),
            Some(raw) => {
                let seconds = raw.parse::<f64>().ok().filter(|s| s.is_finite() && *s > 0.0);
                let Some(seconds) = seconds else {
                    return Err(ConfigError::Setting {
                        name: ENV_TIMEOUT_S.to_string(),
                        detail: format!("expected a positive number of seconds, got '{raw}'"),
                    });
                };
                Duration::from_secs_f64(seconds)
            }
        };
        let verify_tls = match non_empty(lookup(ENV_VERIFY_TLS)) {
            None => true,
            Some(raw) => !matches!(raw.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"),
        };
        Ok(Self {
            timeout,
            verify_tls,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Normalizes an optional value: trims whitespace and maps empty to absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
