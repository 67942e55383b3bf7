// crates/contract-gate-runner/tests/metric_source.rs
// ============================================================================
// Module: Metric Source Tests
// Description: HTTP metric source bulk and per-metric fetch tests.
// Purpose: Verify bulk caching, template-mode extraction, auth application,
//          and the metric error taxonomy against local servers.
// Dependencies: contract-gate-runner, contract-gate-config, contract-gate-core,
//               tiny_http
// ============================================================================

//! ## Overview
//! Exercises the HTTP metric source in both shapes: one bulk `/metrics`
//! fetch cached for the source's lifetime, and per-metric URL templates with
//! value-path extraction.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use contract_gate_config::AuthSettings;
use contract_gate_config::NetworkSettings;
use contract_gate_core::MemorySink;
use contract_gate_core::MetricError;
use contract_gate_core::MetricSource;
use contract_gate_runner::AuthContext;
use contract_gate_runner::HttpMetricConfig;
use contract_gate_runner::HttpMetricSource;
use serde_json::json;

use crate::common::json_response;
use crate::common::oauth2_settings;
use crate::common::request_header;
use crate::common::serve_requests;
use crate::common::spawn_token_endpoint;

/// Builds an unauthenticated source over the given configuration.
fn source(config: HttpMetricConfig) -> (HttpMetricSource, Arc<MemorySink>) {
    let auth = AuthContext::new(AuthSettings::default(), &NetworkSettings::default()).unwrap();
    let sink = Arc::new(MemorySink::default());
    (HttpMetricSource::new(config, auth, Arc::clone(&sink) as _), sink)
}

// ============================================================================
// SECTION: Bulk Mode
// ============================================================================

#[test]
fn bulk_metrics_are_fetched_once_and_cached() {
    // One request serves every lookup for the source's lifetime.
    let base = serve_requests(1, |_, request| {
        assert_eq!(request.url(), "/metrics");
        let body = r#"{"metrics":{"error_rate":0.25,"queue_depth":7}}"#;
        let _ = request.respond(json_response(200, body));
    });
    let (source, sink) = source(HttpMetricConfig {
        base_url: base,
        ..HttpMetricConfig::default()
    });

    assert_eq!(source.metric("error_rate").unwrap(), Some(json!(0.25)));
    assert_eq!(source.metric("queue_depth").unwrap(), Some(json!(7)));
    assert_eq!(source.metric("missing").unwrap(), None);
    assert_eq!(sink.len(), 1, "one fetch backs all three lookups");
}

#[test]
fn a_bare_object_payload_is_accepted_as_the_metric_map() {
    let base = serve_requests(1, |_, request| {
        let _ = request.respond(json_response(200, r#"{"error_rate":0.25}"#));
    });
    let (source, _sink) = source(HttpMetricConfig {
        base_url: base,
        ..HttpMetricConfig::default()
    });

    assert_eq!(source.metric("error_rate").unwrap(), Some(json!(0.25)));
}

#[test]
fn a_non_object_payload_is_an_unsupported_shape() {
    let base = serve_requests(1, |_, request| {
        let _ = request.respond(json_response(200, "[1, 2, 3]"));
    });
    let (source, _sink) = source(HttpMetricConfig {
        base_url: base,
        ..HttpMetricConfig::default()
    });

    let err = source.metric("error_rate").unwrap_err();
    assert!(matches!(err, MetricError::UnsupportedShape));
}

#[test]
fn a_failing_bulk_fetch_surfaces_the_status() {
    let base = serve_requests(1, |_, request| {
        let _ = request.respond(json_response(500, r#"{"error":"boom"}"#));
    });
    let (source, sink) = source(HttpMetricConfig {
        base_url: base,
        ..HttpMetricConfig::default()
    });

    let err = source.metric("error_rate").unwrap_err();
    assert!(matches!(
        err,
        MetricError::FetchStatus {
            status: 500,
            ..
        }
    ));
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert!(!records[0].ok);
}

// ============================================================================
// SECTION: Template Mode
// ============================================================================

#[test]
fn template_mode_fetches_each_metric_individually() {
    let base = serve_requests(2, |_, request| {
        let body = match request.url() {
            "/api/metrics/error_rate" => r#"{"value":0.25}"#,
            "/api/metrics/queue_depth" => r#"{"value":7}"#,
            other => panic!("unexpected path {other}"),
        };
        let _ = request.respond(json_response(200, body));
    });
    let (source, sink) = source(HttpMetricConfig {
        base_url: base,
        metric_url_template: Some("{base_url}/api/metrics/{metric}".to_string()),
        ..HttpMetricConfig::default()
    });

    assert_eq!(source.metric("error_rate").unwrap(), Some(json!(0.25)));
    assert_eq!(source.metric("queue_depth").unwrap(), Some(json!(7)));
    assert_eq!(sink.len(), 2, "template mode never caches");
}

#[test]
fn a_configured_value_path_wins_over_conventional_fields() {
    let base = serve_requests(1, |_, request| {
        let body = r#"{"value":1,"payload":{"reading":0.75}}"#;
        let _ = request.respond(json_response(200, body));
    });
    let (source, _sink) = source(HttpMetricConfig {
        base_url: base,
        metric_url_template: Some("{base_url}/m/{metric}".to_string()),
        metric_value_path: Some("payload.reading".to_string()),
        ..HttpMetricConfig::default()
    });

    assert_eq!(source.metric("reading").unwrap(), Some(json!(0.75)));
}

// ============================================================================
// SECTION: Authentication
// ============================================================================

#[test]
fn a_static_bearer_token_is_sent_with_every_fetch() {
    let base = serve_requests(1, |_, request| {
        let authorization = request_header(&request, "Authorization").unwrap_or_default();
        assert_eq!(authorization, "Bearer metrics-tok");
        let _ = request.respond(json_response(200, r#"{"error_rate":0.25}"#));
    });
    let (source, _sink) = source(HttpMetricConfig {
        base_url: base,
        bearer_token: Some("metrics-tok".to_string()),
        ..HttpMetricConfig::default()
    });

    assert_eq!(source.metric("error_rate").unwrap(), Some(json!(0.25)));
}

#[test]
fn oauth2_fetches_reuse_the_cached_exchange_token() {
    let (token_url, calls) = spawn_token_endpoint(3600, 2);
    let base = serve_requests(2, |_, request| {
        let authorization = request_header(&request, "Authorization").unwrap_or_default();
        assert_eq!(authorization, "Bearer tok-1");
        let body = match request.url() {
            "/m/error_rate" => r#"{"value":0.25}"#,
            _ => r#"{"value":7}"#,
        };
        let _ = request.respond(json_response(200, body));
    });
    let auth =
        AuthContext::new(oauth2_settings(&token_url), &NetworkSettings::default()).unwrap();
    let sink = Arc::new(MemorySink::default());
    let source = HttpMetricSource::new(
        HttpMetricConfig {
            base_url: base,
            metric_url_template: Some("{base_url}/m/{metric}".to_string()),
            ..HttpMetricConfig::default()
        },
        auth,
        Arc::clone(&sink) as _,
    );

    assert_eq!(source.metric("error_rate").unwrap(), Some(json!(0.25)));
    assert_eq!(source.metric("queue_depth").unwrap(), Some(json!(7)));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "one exchange covers both fetches");
}
