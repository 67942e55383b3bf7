// crates/contract-gate-runner/src/lib.rs
// ============================================================================
// Module: Contract Gate Runner
// Description: Auth negotiation, schema caching, and contract execution.
// Purpose: Execute declarative contract checks against a running HTTP
//          service with blocking, strictly ordered dispatch.
// Dependencies: contract-gate-core, contract-gate-config, reqwest,
//               jsonschema, serde_yaml, url, base64, time
// ============================================================================

//! ## Overview
//! This crate drives one contract run: it resolves the effective URL and
//! auth for each declared check, dispatches the request over a shared
//! blocking HTTP client, and walks the validation pipeline in strict order
//! (status → headers → schema → assertions). The OAuth2 token cache is the
//! only mutable shared state; it lives behind one exclusive lock per
//! [`AuthContext`].
//!
//! Invariants:
//! - Checks execute strictly in declaration order; the first failure aborts
//!   the run with full context.
//! - Every network call honors the configured timeout and surfaces a
//!   distinguishable timeout error.
//! - Responses from the system under test are untrusted input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod contract;
pub mod metric;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::AuthContext;
pub use auth::AuthFlowError;
pub use auth::OAuth2Token;
pub use auth::TOKEN_EXPIRY_SKEW;
pub use contract::ContractRunner;
pub use contract::load_document;
pub use contract::load_document_str;
pub use metric::HttpMetricConfig;
pub use metric::HttpMetricSource;
pub use schema::SchemaCache;
