// crates/contract-gate-core/src/lib.rs
// ============================================================================
// Module: Contract Gate Core
// Description: Data model and evaluation logic for HTTP contract checks.
// Purpose: Define check definitions, the error taxonomy, and the validation
//          engines shared by the contract runner.
// Dependencies: serde, serde_json, thiserror, regex
// ============================================================================

//! ## Overview
//! This crate defines the declarative contract model (checks, assertions,
//! header rules), the typed error taxonomy, and the pure evaluation logic
//! that the contract runner drives: dotted-path resolution, body assertions,
//! header-rule matching, and environment-variable expansion.
//!
//! Invariants:
//! - Evaluation is deterministic: the same payload and rules always produce
//!   the same outcome.
//! - Every validation stage returns a typed result; no stage panics or
//!   swallows a failure.
//! - Responses from the system under test are untrusted input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assertions;
pub mod errors;
pub mod expand;
pub mod metric;
pub mod path;
pub mod sink;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use errors::AuthError;
pub use errors::CheckError;
pub use errors::CheckErrorKind;
pub use errors::ConfigError;
pub use errors::MetricError;
pub use errors::NetworkError;
pub use errors::RunError;
pub use errors::ValidationFailure;
pub use metric::FixedMapSource;
pub use metric::MetricSource;
pub use sink::CallRecord;
pub use sink::MemorySink;
pub use sink::NullSink;
pub use sink::ResultSink;
pub use types::Assertion;
pub use types::AuthOverride;
pub use types::CheckDefinition;
pub use types::ContractDocument;
pub use types::HeaderRule;
pub use types::HeaderRuleSet;
pub use types::HttpResult;
