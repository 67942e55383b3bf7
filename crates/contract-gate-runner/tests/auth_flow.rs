// crates/contract-gate-runner/tests/auth_flow.rs
// ============================================================================
// Module: Auth Flow Tests
// Description: Auth strategy application and OAuth2 token lifecycle tests.
// Purpose: Verify header/URL mutation per mode and token cache behavior
//          against a local token endpoint.
// Dependencies: contract-gate-runner, contract-gate-config, tiny_http
// ============================================================================

//! ## Overview
//! Exercises the authentication context end to end: API-key delivery via
//! header and query parameter, static bearer precedence, and the OAuth2
//! client-credentials exchange with expiry-driven cache refresh.

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

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

use contract_gate_config::AuthMode;
use contract_gate_config::AuthSettings;
use contract_gate_config::NetworkSettings;
use contract_gate_runner::AuthContext;
use contract_gate_runner::AuthFlowError;
use contract_gate_runner::OAuth2Token;
use contract_gate_runner::TOKEN_EXPIRY_SKEW;
use time::OffsetDateTime;

use crate::common::json_response;
use crate::common::oauth2_settings;
use crate::common::serve_requests;
use crate::common::spawn_token_endpoint;

/// Builds a context over default network settings.
fn context(settings: AuthSettings) -> AuthContext {
    AuthContext::new(settings, &NetworkSettings::default()).unwrap()
}

// ============================================================================
// SECTION: API Key Mode
// ============================================================================

#[test]
fn api_key_mode_sets_exactly_the_configured_header() {
    let ctx = context(AuthSettings {
        mode: AuthMode::ApiKey,
        api_key: Some("s3cret".to_string()),
        api_key_header: "X-Gate-Key".to_string(),
        ..AuthSettings::default()
    });

    let headers = ctx.apply_headers(&BTreeMap::new()).unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers.get("X-Gate-Key").map(String::as_str), Some("s3cret"));
}

#[test]
fn api_key_query_param_replaces_header_delivery() {
    let ctx = context(AuthSettings {
        mode: AuthMode::ApiKey,
        api_key: Some("s3cret".to_string()),
        api_key_query_param: Some("api_key".to_string()),
        ..AuthSettings::default()
    });

    let headers = ctx.apply_headers(&BTreeMap::new()).unwrap();
    assert!(headers.is_empty(), "query-param delivery must not set a header");

    let url = ctx.apply_url("http://sut.local/status?page=2").unwrap();
    assert_eq!(url, "http://sut.local/status?page=2&api_key=s3cret");
}

#[test]
fn api_key_query_param_overwrites_in_place() {
    let ctx = context(AuthSettings {
        mode: AuthMode::ApiKey,
        api_key: Some("fresh".to_string()),
        api_key_query_param: Some("key".to_string()),
        ..AuthSettings::default()
    });

    // An existing parameter keeps its position; other pairs are untouched.
    let url = ctx.apply_url("http://sut.local/status?key=stale&page=2").unwrap();
    assert_eq!(url, "http://sut.local/status?key=fresh&page=2");

    let url = ctx.apply_url("http://sut.local/status").unwrap();
    assert_eq!(url, "http://sut.local/status?key=fresh");
}

#[test]
fn api_key_mode_without_a_key_applies_nothing() {
    let ctx = context(AuthSettings {
        mode: AuthMode::ApiKey,
        ..AuthSettings::default()
    });

    let headers = ctx.apply_headers(&BTreeMap::new()).unwrap();
    assert!(headers.is_empty());
    let url = ctx.apply_url("http://sut.local/status").unwrap();
    assert_eq!(url, "http://sut.local/status");
}

// ============================================================================
// SECTION: Static Bearer
// ============================================================================

#[test]
fn static_bearer_token_wins_without_network_traffic() {
    // A token URL is configured but must never be called.
    let ctx = context(AuthSettings {
        mode: AuthMode::OAuth2,
        bearer_token: Some("static-tok".to_string()),
        token_url: Some("http://127.0.0.1:1/oauth/token".to_string()),
        client_id: Some("client".to_string()),
        client_secret: Some("secret".to_string()),
        ..AuthSettings::default()
    });

    let headers = ctx.apply_headers(&BTreeMap::new()).unwrap();
    assert_eq!(
        headers.get("Authorization").map(String::as_str),
        Some("Bearer static-tok")
    );
}

#[test]
fn oauth2_without_token_source_applies_no_header() {
    let ctx = context(AuthSettings {
        mode: AuthMode::OAuth2,
        ..AuthSettings::default()
    });

    let headers = ctx.apply_headers(&BTreeMap::new()).unwrap();
    assert!(headers.is_empty());
}

// ============================================================================
// SECTION: Client-Credentials Exchange
// ============================================================================

#[test]
fn unexpired_token_is_reused_across_requests() {
    let (token_url, calls) = spawn_token_endpoint(3600, 2);
    let ctx = context(oauth2_settings(&token_url));

    let first = ctx.bearer_token().unwrap();
    let second = ctx.bearer_token().unwrap();

    assert_eq!(first.as_deref(), Some("tok-1"));
    assert_eq!(second.as_deref(), Some("tok-1"));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "one exchange for both requests");
}

#[test]
fn zero_lifetime_token_is_refreshed_on_every_request() {
    let (token_url, calls) = spawn_token_endpoint(0, 2);
    let ctx = context(oauth2_settings(&token_url));

    let first = ctx.bearer_token().unwrap();
    let second = ctx.bearer_token().unwrap();

    assert_eq!(first.as_deref(), Some("tok-1"));
    assert_eq!(second.as_deref(), Some("tok-2"));
    assert_eq!(calls.load(Ordering::SeqCst), 2, "expires_in 0 forces a fresh exchange");
}

#[test]
fn missing_client_credentials_fail_before_any_request() {
    let mut settings = oauth2_settings("http://127.0.0.1:1/oauth/token");
    settings.client_secret = None;
    let ctx = context(settings);

    let err = ctx.bearer_token().unwrap_err();
    assert!(matches!(err, AuthFlowError::Auth(_)));
    assert!(err.to_string().contains("client secret"));
}

#[test]
fn token_endpoint_rejection_surfaces_status() {
    let base = serve_requests(1, |_, request| {
        let _ = request.respond(json_response(401, r#"{"error":"invalid_client"}"#));
    });
    let ctx = context(oauth2_settings(&format!("{base}/oauth/token")));

    let err = ctx.bearer_token().unwrap_err();
    assert!(err.to_string().contains("401"), "unexpected error: {err}");
}

#[test]
fn token_response_without_access_token_is_malformed() {
    let base = serve_requests(1, |_, request| {
        let _ = request.respond(json_response(200, r#"{"token_type":"Bearer"}"#));
    });
    let ctx = context(oauth2_settings(&format!("{base}/oauth/token")));

    let err = ctx.bearer_token().unwrap_err();
    assert!(err.to_string().contains("access_token"), "unexpected error: {err}");
}

#[test]
fn string_expires_in_is_accepted() {
    let base = serve_requests(1, |_, request| {
        let body = r#"{"access_token":"tok-str","expires_in":"3600"}"#;
        let _ = request.respond(json_response(200, body));
    });
    let ctx = context(oauth2_settings(&format!("{base}/oauth/token")));

    let token = ctx.bearer_token().unwrap();
    assert_eq!(token.as_deref(), Some("tok-str"));
}

// ============================================================================
// SECTION: Expiry Arithmetic
// ============================================================================

#[test]
fn expiry_applies_the_safety_skew() {
    let now = OffsetDateTime::now_utc();
    let token = OAuth2Token {
        access_token: "tok".to_string(),
        token_type: "Bearer".to_string(),
        expires_at: Some(now + TOKEN_EXPIRY_SKEW + time::Duration::seconds(1)),
    };
    assert!(!token.is_expired_at(now));
    assert!(token.is_expired_at(now + time::Duration::seconds(2)));
}

#[test]
fn token_without_expiry_never_expires() {
    let token = OAuth2Token {
        access_token: "tok".to_string(),
        token_type: "Bearer".to_string(),
        expires_at: None,
    };
    assert!(!token.is_expired_at(OffsetDateTime::now_utc() + time::Duration::days(365)));
}

// ============================================================================
// SECTION: Per-Check Override Contexts
// ============================================================================

#[test]
fn override_context_starts_with_an_empty_token_cache() {
    let (token_url, calls) = spawn_token_endpoint(3600, 2);
    let ctx = context(oauth2_settings(&token_url));

    assert_eq!(ctx.bearer_token().unwrap().as_deref(), Some("tok-1"));

    // Same credentials, fresh cache: the derived context exchanges again.
    let derived = ctx.with_mode(AuthMode::OAuth2);
    assert_eq!(derived.bearer_token().unwrap().as_deref(), Some("tok-2"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
