// crates/contract-gate-runner/src/contract.rs
// ============================================================================
// Module: Contract Runner
// Description: Orchestrates contract checks against the system under test.
// Purpose: Resolve URL and auth per check, dispatch the request, and walk
//          the validation pipeline in strict order.
// Dependencies: contract-gate-core, contract-gate-config, reqwest,
//               serde_yaml
// ============================================================================

//! ## Overview
//! The contract runner executes the checks of one contract document in
//! declaration order, fail-fast: the first failing check aborts the run and
//! surfaces a [`CheckError`] naming the check index, method, and URL. Each
//! check resolves its effective URL and auth override, dispatches over the
//! shared blocking client, and validates status, headers, schema, and
//! assertions in that order. Every executed call is reported to the
//! injected [`ResultSink`].
//!
//! Invariants:
//! - Checks execute strictly in declaration order with no parallelism.
//! - An explicit auth override gets a fresh token cache; only the run
//!   default shares the run-wide cache.
//! - No partial suppression: a failure is surfaced, never logged away.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use contract_gate_config::AuthMode;
use contract_gate_config::NetworkSettings;
use contract_gate_core::AuthOverride;
use contract_gate_core::CallRecord;
use contract_gate_core::CheckDefinition;
use contract_gate_core::CheckError;
use contract_gate_core::CheckErrorKind;
use contract_gate_core::ConfigError;
use contract_gate_core::ContractDocument;
use contract_gate_core::HttpResult;
use contract_gate_core::ResultSink;
use contract_gate_core::RunError;
use contract_gate_core::ValidationFailure;
use contract_gate_core::assertions;
use contract_gate_core::expand;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::auth::AuthContext;
use crate::auth::build_client;
use crate::auth::map_send_error;
use crate::schema::SchemaCache;

// ============================================================================
// SECTION: Document Loading
// ============================================================================

/// Parses a contract document from YAML text.
///
/// An empty document yields an empty check list.
///
/// # Errors
///
/// Returns [`ConfigError::Document`] when the YAML is malformed.
pub fn load_document_str(raw: &str) -> Result<ContractDocument, ConfigError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(raw).map_err(|err| ConfigError::Document {
            detail: err.to_string(),
        })?;
    if value.is_null() {
        return Ok(ContractDocument::default());
    }
    serde_yaml::from_value(value).map_err(|err| ConfigError::Document {
        detail: err.to_string(),
    })
}

/// Loads a contract document from a YAML file.
///
/// # Errors
///
/// Returns [`ConfigError::Document`] when the file is unreadable or the
/// YAML is malformed.
pub fn load_document(path: &Path) -> Result<ContractDocument, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Document {
        detail: format!("{}: {err}", path.display()),
    })?;
    load_document_str(&raw)
}

// ============================================================================
// SECTION: Contract Runner
// ============================================================================

/// Executes contract documents against a base URL.
///
/// # Invariants
/// - The HTTP client and schema cache are shared across all checks.
/// - Environment lookups honor the configured overrides for deterministic
///   tests.
pub struct ContractRunner {
    /// Shared blocking HTTP client for check dispatch.
    client: Client,
    /// Compiled-schema cache shared across checks.
    schemas: SchemaCache,
    /// Base request headers applied before auth and per-check headers.
    base_headers: BTreeMap<String, String>,
    /// Optional override map used for deterministic variable expansion.
    env_overrides: Option<BTreeMap<String, String>>,
}

impl ContractRunner {
    /// Creates a runner with the given network settings.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when the HTTP client cannot be constructed.
    pub fn new(network: &NetworkSettings) -> Result<Self, RunError> {
        let client = build_client(network).map_err(|err| RunError::Config(ConfigError::Setting {
            name: "network".to_string(),
            detail: err.to_string(),
        }))?;
        let mut base_headers = BTreeMap::new();
        base_headers.insert("Accept".to_string(), "application/json".to_string());
        Ok(Self {
            client,
            schemas: SchemaCache::new(),
            base_headers,
            env_overrides: None,
        })
    }

    /// Replaces process-environment lookups with a fixed override map.
    #[must_use]
    pub fn with_env_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.env_overrides = Some(overrides);
        self
    }

    /// Returns the shared schema cache.
    #[must_use]
    pub const fn schemas(&self) -> &SchemaCache {
        &self.schemas
    }

    /// Runs every check of the document in declaration order, fail-fast.
    ///
    /// On success the full ordered result list is returned; on the first
    /// failure execution stops and the failure is surfaced with the check
    /// index, method, and URL.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] for a document-level problem or the first
    /// failing check.
    pub fn run(
        &self,
        document: &ContractDocument,
        base_url: &str,
        auth: &AuthContext,
        sink: &dyn ResultSink,
    ) -> Result<Vec<HttpResult>, RunError> {
        let base_url = self.expand_value(base_url);
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(RunError::Config(ConfigError::MissingField {
                field: "base_url".to_string(),
            }));
        }

        let mut results = Vec::with_capacity(document.checks.len());
        for (index, check) in document.checks.iter().enumerate() {
            results.push(self.run_check(index, check, base_url, auth, sink)?);
        }
        Ok(results)
    }

    /// Executes one check through the full validation pipeline.
    fn run_check(
        &self,
        index: usize,
        check: &CheckDefinition,
        base_url: &str,
        auth: &AuthContext,
        sink: &dyn ResultSink,
    ) -> Result<HttpResult, CheckError> {
        let method = check.method.trim().to_ascii_uppercase();

        let path = self.expand_value(&check.path);
        if path.trim().is_empty() {
            return Err(CheckError::new(
                index,
                &method,
                "",
                ConfigError::MissingField {
                    field: "path".to_string(),
                },
            ));
        }
        let url = join_url(base_url, &path);

        // Per-check auth override: an explicit override gets a fresh token
        // cache; the default shares the run-wide context.
        let override_token = check.auth.as_deref().unwrap_or("");
        let override_mode = AuthOverride::parse(override_token)
            .map_err(|err| CheckError::new(index, &method, &url, err))?;
        let local_auth;
        let effective_auth = match override_mode {
            AuthOverride::Default => auth,
            AuthOverride::None => {
                local_auth = auth.with_mode(AuthMode::None);
                &local_auth
            }
            AuthOverride::ApiKey => {
                local_auth = auth.with_mode(AuthMode::ApiKey);
                &local_auth
            }
            AuthOverride::OAuth2 => {
                local_auth = auth.with_mode(AuthMode::OAuth2);
                &local_auth
            }
        };

        let url = effective_auth
            .apply_url(&url)
            .map_err(|err| CheckError::new(index, &method, &url, err))?;
        let mut headers = effective_auth
            .apply_headers(&self.base_headers)
            .map_err(|err| CheckError::new(index, &method, &url, err))?;
        for (name, value) in &check.headers {
            headers.insert(name.clone(), self.expand_value(value));
        }

        let (status, response_headers, body) =
            self.dispatch(index, &method, &url, &headers, sink)?;

        // Status code validation: exact match, not a range.
        if status != check.expected_status {
            return Err(CheckError::new(
                index,
                &method,
                &url,
                ValidationFailure::Status {
                    method: method.clone(),
                    url: url.clone(),
                    expected: check.expected_status,
                    actual: status,
                },
            ));
        }

        // Response header validation (content type, request ids, etc).
        if !check.expected_headers.is_empty() {
            let lookup = |name: &str| {
                response_headers
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
            };
            assertions::evaluate_headers(lookup, check.expected_headers.iter())
                .map_err(|err| CheckError::new(index, &method, &url, err))?;
        }

        // JSON decoding happens only for non-empty bodies.
        let payload: Option<Value> = if body.is_empty() {
            None
        } else {
            let decoded = serde_json::from_slice(&body).map_err(|err| {
                CheckError::new(
                    index,
                    &method,
                    &url,
                    ValidationFailure::InvalidJson {
                        method: method.clone(),
                        url: url.clone(),
                        detail: err.to_string(),
                    },
                )
            })?;
            Some(decoded)
        };

        if let Some(schema) = &check.schema {
            let expanded = self.expand_value(schema);
            self.schemas
                .validate(Path::new(&expanded), payload.as_ref().unwrap_or(&Value::Null))
                .map_err(|err| CheckError::new(index, &method, &url, err))?;
        }

        if !check.assertions.is_empty() {
            let Some(payload) = payload.as_ref().filter(|p| p.is_object() || p.is_array()) else {
                return Err(CheckError::new(
                    index,
                    &method,
                    &url,
                    ValidationFailure::NonJsonBody {
                        method: method.clone(),
                        url: url.clone(),
                    },
                ));
            };
            assertions::evaluate(payload, &check.assertions)
                .map_err(|err| CheckError::new(index, &method, &url, err))?;
        }

        Ok(HttpResult {
            url,
            status_code: status,
            json: payload,
        })
    }

    /// Dispatches the request and records the call in the sink.
    fn dispatch(
        &self,
        index: usize,
        method: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
        sink: &dyn ResultSink,
    ) -> Result<(u16, reqwest::header::HeaderMap, Vec<u8>), CheckError> {
        let method_obj = reqwest::Method::from_bytes(method.as_bytes()).map_err(|_| {
            CheckError::new(
                index,
                method,
                url,
                ConfigError::Setting {
                    name: "method".to_string(),
                    detail: format!("unsupported method '{method}'"),
                },
            )
        })?;

        let mut request = self.client.request(method_obj, url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let start = Instant::now();
        let outcome = request.send();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                sink.record(&CallRecord {
                    method: method.to_string(),
                    url: url.to_string(),
                    status_code: None,
                    ok: false,
                    elapsed_ms,
                    error: Some(err.to_string()),
                });
                return Err(CheckError::new(
                    index,
                    method,
                    url,
                    CheckErrorKind::Network(map_send_error(url, &err)),
                ));
            }
        };

        let status = response.status();
        sink.record(&CallRecord {
            method: method.to_string(),
            url: url.to_string(),
            status_code: Some(status.as_u16()),
            ok: status.is_success(),
            elapsed_ms,
            error: None,
        });

        let response_headers = response.headers().clone();
        let body = response.bytes().map_err(|err| {
            CheckError::new(
                index,
                method,
                url,
                CheckErrorKind::Network(map_send_error(url, &err)),
            )
        })?;
        Ok((status.as_u16(), response_headers, body.to_vec()))
    }

    /// Expands environment references using the configured lookup.
    fn expand_value(&self, raw: &str) -> String {
        self.env_overrides.as_ref().map_or_else(
            || expand::expand(raw),
            |overrides| expand::expand_with(raw, |name| overrides.get(name).cloned()),
        )
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Joins a base URL and a path unless the path is already absolute.
fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
