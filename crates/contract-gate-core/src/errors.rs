// crates/contract-gate-core/src/errors.rs
// ============================================================================
// Module: Contract Check Error Taxonomy
// Description: Typed errors for configuration, auth, network, and validation.
// Purpose: Give every failure mode a stable, context-carrying error value.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Four error categories cover every way a contract check can fail:
//! configuration errors (bad contract or settings, never retried), auth
//! errors (credential and token-endpoint failures), network errors (timeout,
//! connection, invalid URL), and validation failures (the system under test
//! broke its contract). [`CheckError`] wraps any of them with the index,
//! method, and URL of the failing check so the caller can diagnose without
//! re-running.
//!
//! Invariants:
//! - Variants are stable for programmatic handling.
//! - No error is swallowed; the first failing check aborts the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Configuration Errors
// ============================================================================

/// Configuration errors: a malformed contract document or invalid settings.
///
/// # Invariants
/// - Always fatal and never retried.
/// - Each variant names the offending field or value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The auth mode selector holds an unsupported value.
    #[error("unsupported auth mode: '{mode}'")]
    UnknownAuthMode {
        /// The rejected mode selector value.
        mode: String,
    },
    /// A per-check auth override holds an unsupported value.
    #[error("unknown auth override: '{value}'")]
    UnknownAuthOverride {
        /// The rejected override value.
        value: String,
    },
    /// A required field is missing or empty.
    #[error("missing required field: '{field}'")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },
    /// The contract document could not be parsed.
    #[error("invalid contract document: {detail}")]
    Document {
        /// Parser diagnostic for the malformed document.
        detail: String,
    },
    /// An assertion is declared with an invalid shape.
    #[error("invalid assertion: {detail}")]
    Assertion {
        /// Description of the invalid assertion.
        detail: String,
    },
    /// A header rule is declared with an invalid shape.
    #[error("invalid header rule for '{header}': {detail}")]
    HeaderRule {
        /// Header name the rule applies to.
        header: String,
        /// Description of the invalid rule.
        detail: String,
    },
    /// A named setting holds an invalid value.
    #[error("invalid setting '{name}': {detail}")]
    Setting {
        /// Name of the setting.
        name: String,
        /// Description of the invalid value.
        detail: String,
    },
    /// A schema file could not be read.
    #[error("schema not readable: {path}: {detail}")]
    SchemaFile {
        /// Path of the schema file.
        path: String,
        /// Filesystem or parse diagnostic.
        detail: String,
    },
    /// A schema document failed to compile.
    #[error("schema invalid: {path}: {detail}")]
    SchemaInvalid {
        /// Path of the schema file.
        path: String,
        /// Compiler diagnostic.
        detail: String,
    },
}

// ============================================================================
// SECTION: Auth Errors
// ============================================================================

/// Authentication errors raised while resolving credentials for a check.
///
/// # Invariants
/// - Fatal for the check being executed; never retried by the core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Client id and secret are required for the client-credentials grant.
    #[error("client id and client secret are required for client-credentials")]
    MissingClientCredentials,
    /// The token endpoint answered with a non-success status.
    #[error("token endpoint {url} returned status {status}")]
    TokenEndpointStatus {
        /// Token endpoint URL.
        url: String,
        /// HTTP status code returned.
        status: u16,
    },
    /// The token endpoint answered with an unusable body.
    #[error("malformed token response from {url}: {detail}")]
    MalformedTokenResponse {
        /// Token endpoint URL.
        url: String,
        /// Description of the malformed response.
        detail: String,
    },
}

// ============================================================================
// SECTION: Network Errors
// ============================================================================

/// Network errors raised while dispatching a request.
///
/// # Invariants
/// - Fatal for the check; retry policy belongs to a calling layer.
/// - Timeouts are distinguishable from other transport failures.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// URL of the timed-out request.
        url: String,
    },
    /// The request failed below the HTTP layer (connect, TLS, read).
    #[error("request to {url} failed: {detail}")]
    Connection {
        /// URL of the failed request.
        url: String,
        /// Transport diagnostic.
        detail: String,
    },
    /// A URL could not be parsed.
    #[error("invalid url: '{url}'")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },
    /// The HTTP client could not be constructed.
    #[error("http client build failed: {detail}")]
    ClientBuild {
        /// Builder diagnostic.
        detail: String,
    },
}

// ============================================================================
// SECTION: Validation Failures
// ============================================================================

/// Contract violations observed in a response from the system under test.
///
/// # Invariants
/// - Each variant names what failed and carries expected vs. actual context.
#[derive(Debug, Error)]
pub enum ValidationFailure {
    /// The response status did not match the expected status exactly.
    #[error("{method} {url}: expected status {expected}, got {actual}")]
    Status {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
        /// Declared expected status.
        expected: u16,
        /// Status actually returned.
        actual: u16,
    },
    /// A declared header is absent from the response.
    #[error("expected header '{header}' to exist")]
    HeaderMissing {
        /// Name of the missing header.
        header: String,
    },
    /// A response header is present but violates its declared rule.
    #[error("expected header '{header}' {rule}, got '{actual}'")]
    HeaderMismatch {
        /// Name of the mismatched header.
        header: String,
        /// Human-readable description of the violated rule.
        rule: String,
        /// Value actually returned.
        actual: String,
    },
    /// The response body violated the declared JSON Schema.
    #[error("schema validation failed for {schema_ref}: {detail}")]
    Schema {
        /// Reference of the violated schema.
        schema_ref: String,
        /// Joined violation messages, sorted by location.
        detail: String,
    },
    /// A body assertion did not hold.
    #[error("assertion failed at '{path}': {reason}")]
    Assertion {
        /// Dotted JSON path the assertion targets.
        path: String,
        /// Why the assertion failed, with expected vs. actual values.
        reason: String,
    },
    /// The response body could not be decoded as JSON.
    #[error("{method} {url}: response body is not valid JSON: {detail}")]
    InvalidJson {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
        /// Decoder diagnostic.
        detail: String,
    },
    /// Assertions are declared but the body is not a JSON object or array.
    #[error("{method} {url}: payload is not a JSON object or array")]
    NonJsonBody {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
    },
}

// ============================================================================
// SECTION: Check Error
// ============================================================================

/// Union of the failure categories a single check can raise.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum CheckErrorKind {
    /// Configuration error scoped to the check.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Authentication failure while preparing the request.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Network failure while dispatching the request.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// Contract violation in the response.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
}

/// Failure of one contract check, pinned to its position in the document.
///
/// # Invariants
/// - `index` is the zero-based declaration position of the failing check.
/// - `url` is the most specific URL known when the failure occurred.
#[derive(Debug, Error)]
#[error("check {index} ({method} {url}): {kind}")]
pub struct CheckError {
    /// Zero-based index of the failing check.
    pub index: usize,
    /// Request method of the failing check.
    pub method: String,
    /// Request URL of the failing check.
    pub url: String,
    /// Underlying failure.
    pub kind: CheckErrorKind,
}

impl CheckError {
    /// Wraps a failure with its check position and request context.
    pub fn new(
        index: usize,
        method: impl Into<String>,
        url: impl Into<String>,
        kind: impl Into<CheckErrorKind>,
    ) -> Self {
        Self {
            index,
            method: method.into(),
            url: url.into(),
            kind: kind.into(),
        }
    }
}

// ============================================================================
// SECTION: Run Error
// ============================================================================

/// Failure of a contract run, either before or during check execution.
///
/// # Invariants
/// - `Config` covers document-level problems with no check scope.
/// - `Check` pinpoints the first failing check; later checks never ran.
#[derive(Debug, Error)]
pub enum RunError {
    /// The run could not start: bad document or run-level settings.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A check failed; execution stopped at that check.
    #[error(transparent)]
    Check(#[from] CheckError),
}

// ============================================================================
// SECTION: Metric Errors
// ============================================================================

/// Errors raised by metric sources.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum MetricError {
    /// Metric source configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Authentication failed while fetching a metric.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The metric fetch failed at the network layer.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// The metric endpoint answered with an unusable JSON shape.
    #[error("metric endpoint returned unsupported JSON shape; expected an object")]
    UnsupportedShape,
    /// The metric endpoint answered with a non-success status.
    #[error("metric fetch from {url} returned status {status}")]
    FetchStatus {
        /// URL of the metric fetch.
        url: String,
        /// HTTP status code returned.
        status: u16,
    },
}
