// crates/contract-gate-runner/tests/common/mod.rs
// ============================================================================
// Module: Runner Test Helpers
// Description: Shared tiny_http fixtures for runner integration tests.
// Purpose: Spawn bounded local servers and canned JSON responses.
// Dependencies: tiny_http, contract-gate-config
// ============================================================================

//! ## Overview
//! Shared fixtures for runner integration tests: bounded local HTTP servers
//! that handle a known number of requests, canned JSON responses, and a
//! token endpoint that mints sequential `tok-N` tokens.

#![allow(
    dead_code,
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    reason = "Shared helpers are not used by every test binary; test-only panics are permitted."
)]

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;

use contract_gate_config::AuthMode;
use contract_gate_config::AuthSettings;
use tiny_http::Header;
use tiny_http::Request;
use tiny_http::Response;
use tiny_http::Server;

/// Spawns a local server that handles exactly `count` requests and exits.
///
/// Returns the server's base URL. The handler receives the zero-based
/// request index and the request itself and is responsible for responding.
pub fn serve_requests<F>(count: usize, handler: F) -> String
where
    F: Fn(usize, Request) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        for index in 0..count {
            let Ok(request) = server.recv() else {
                return;
            };
            handler(index, request);
        }
    });
    format!("http://{addr}")
}

/// Builds a JSON response with the given status code.
pub fn json_response(status: u16, body: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
    Response::from_string(body).with_status_code(status).with_header(header)
}

/// Returns the value of a request header, when present.
pub fn request_header(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|header| header.value.as_str().to_string())
}

/// Reads the whole request body as text.
pub fn read_body(request: &mut Request) -> String {
    std::io::read_to_string(request.as_reader()).unwrap_or_default()
}

/// Spawns a token endpoint minting sequential `tok-N` tokens.
///
/// Each accepted exchange bumps `calls` and answers with the next token and
/// the given `expires_in` value. Requests must carry the expected Basic
/// credentials for `client:secret` and a `client_credentials` grant.
pub fn spawn_token_endpoint(expires_in: i64, max_requests: usize) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let base = serve_requests(max_requests, move |_, mut request| {
        let authorization = request_header(&request, "Authorization").unwrap_or_default();
        let body = read_body(&mut request);
        if !authorization.starts_with("Basic ") || !body.contains("grant_type=client_credentials")
        {
            let _ = request.respond(json_response(400, r#"{"error":"invalid_request"}"#));
            return;
        }
        let minted = counter.fetch_add(1, Ordering::SeqCst) + 1;
        let payload = format!(
            r#"{{"access_token":"tok-{minted}","token_type":"Bearer","expires_in":{expires_in}}}"#
        );
        let _ = request.respond(json_response(200, &payload));
    });
    (format!("{base}/oauth/token"), calls)
}

/// Auth settings for the client-credentials flow against a token endpoint.
pub fn oauth2_settings(token_url: &str) -> AuthSettings {
    AuthSettings {
        mode: AuthMode::OAuth2,
        token_url: Some(token_url.to_string()),
        client_id: Some("client".to_string()),
        client_secret: Some("secret".to_string()),
        ..AuthSettings::default()
    }
}
