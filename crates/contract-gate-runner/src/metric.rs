// crates/contract-gate-runner/src/metric.rs
// ============================================================================
// Module: HTTP Metric Source
// Description: Fetch metric values from the system under test over HTTP.
// Purpose: Implement the metric-source capability with explicit
//          template-or-bulk configuration.
// Dependencies: contract-gate-core, contract-gate-config, reqwest
// ============================================================================

//! ## Overview
//! The HTTP metric source implements the "fetch value by key" capability in
//! one of two explicitly configured modes: a per-metric URL template
//! rendered for each key, or a bulk metrics endpoint fetched once and served
//! from a cached map. Auth application and call recording flow through the
//! same seams as contract checks.
//!
//! Invariants:
//! - Mode selection is explicit configuration, never runtime type probing.
//! - The bulk cache is filled at most once per source instance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Instant;

use contract_gate_core::CallRecord;
use contract_gate_core::MetricError;
use contract_gate_core::MetricSource;
use contract_gate_core::ResultSink;
use contract_gate_core::path;
use serde_json::Value;

use crate::auth::AuthContext;
use crate::auth::map_send_error;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP metric source.
///
/// # Invariants
/// - `metric_url_template` set selects template mode; otherwise bulk mode
///   fetches `metrics_endpoint` once.
/// - The template supports `{base_url}` and `{metric}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMetricConfig {
    /// Base URL of the system under test.
    pub base_url: String,
    /// Optional static bearer token applied before auth mutation.
    pub bearer_token: Option<String>,
    /// Bulk metrics endpoint path.
    pub metrics_endpoint: String,
    /// Optional per-metric URL template.
    pub metric_url_template: Option<String>,
    /// Optional dotted path extracting the value from per-metric payloads.
    pub metric_value_path: Option<String>,
}

impl Default for HttpMetricConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            bearer_token: None,
            metrics_endpoint: "/metrics".to_string(),
            metric_url_template: None,
            metric_value_path: None,
        }
    }
}

// ============================================================================
// SECTION: Source Implementation
// ============================================================================

/// Metric source fetching values from the system under test over HTTP.
///
/// # Invariants
/// - The bulk-mode cache is the only mutable state, filled at most once.
pub struct HttpMetricSource {
    /// Source configuration.
    config: HttpMetricConfig,
    /// Auth context applied to every fetch.
    auth: AuthContext,
    /// Sink receiving one record per executed fetch.
    sink: Arc<dyn ResultSink + Send + Sync>,
    /// Bulk-mode metric map, fetched lazily.
    cache: Mutex<Option<BTreeMap<String, Value>>>,
}

impl HttpMetricSource {
    /// Creates a source over the given configuration and auth context.
    #[must_use]
    pub fn new(
        config: HttpMetricConfig,
        auth: AuthContext,
        sink: Arc<dyn ResultSink + Send + Sync>,
    ) -> Self {
        Self {
            config,
            auth,
            sink,
            cache: Mutex::new(None),
        }
    }

    /// Fetches and decodes JSON from a URL with auth and call recording.
    fn get_json(&self, url: &str) -> Result<Value, MetricError> {
        let url = self.auth.apply_url(url)?;

        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        if let Some(token) = &self.config.bearer_token {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        let headers = self.auth.apply_headers(&headers)?;

        let mut request = self.auth.client().get(&url);
        for (name, value) in &headers {
            request = request.header(name, value);
        }

        let start = Instant::now();
        let outcome = request.send();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                self.sink.record(&CallRecord {
                    method: "GET".to_string(),
                    url: url.clone(),
                    status_code: None,
                    ok: false,
                    elapsed_ms,
                    error: Some(err.to_string()),
                });
                return Err(map_send_error(&url, &err).into());
            }
        };

        let status = response.status();
        self.sink.record(&CallRecord {
            method: "GET".to_string(),
            url: url.clone(),
            status_code: Some(status.as_u16()),
            ok: status.is_success(),
            elapsed_ms,
            error: None,
        });
        if !status.is_success() {
            return Err(MetricError::FetchStatus {
                url,
                status: status.as_u16(),
            });
        }
        response.json().map_err(|err| map_send_error(&url, &err).into())
    }

    /// Fetches the bulk metrics endpoint and normalizes its shape.
    ///
    /// Accepts either `{"metrics": {...}}` or a raw mapping.
    fn fetch_all_metrics(&self) -> Result<BTreeMap<String, Value>, MetricError> {
        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.metrics_endpoint
        );
        let payload = self.get_json(&url)?;

        let Value::Object(map) = payload else {
            return Err(MetricError::UnsupportedShape);
        };
        let inner = match map.get("metrics") {
            Some(Value::Object(metrics)) => metrics.clone(),
            _ => map,
        };
        Ok(inner.into_iter().collect())
    }

    /// Extracts the metric value from a per-metric payload.
    ///
    /// The configured value path wins; otherwise the common shapes
    /// `{"value": ...}`, `{"data": {"value": ...}}`, and `{"result": ...}`
    /// are accepted, falling back to the whole payload.
    fn extract_metric_value(&self, payload: Value) -> Value {
        if let Some(dotted) = &self.config.metric_value_path
            && let Some(extracted) = path::resolve(&payload, dotted)
            && !extracted.is_null()
        {
            return extracted.clone();
        }
        for dotted in ["value", "data.value", "result"] {
            if let Some(found) = path::resolve(&payload, dotted) {
                return found.clone();
            }
        }
        payload
    }
}

impl MetricSource for HttpMetricSource {
    fn metric(&self, key: &str) -> Result<Option<Value>, MetricError> {
        if let Some(template) = &self.config.metric_url_template {
            let url = template
                .replace("{base_url}", self.config.base_url.trim_end_matches('/'))
                .replace("{metric}", key);
            let payload = self.get_json(&url)?;
            return Ok(Some(self.extract_metric_value(payload)));
        }

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if cache.is_none() {
            *cache = Some(self.fetch_all_metrics()?);
        }
        Ok(cache.as_ref().and_then(|metrics| metrics.get(key).cloned()))
    }
}
