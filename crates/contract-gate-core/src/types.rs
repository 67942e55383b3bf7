// crates/contract-gate-core/src/types.rs
// ============================================================================
// Module: Contract Document Model
// Description: Declarative contract checks and their expected outcomes.
// Purpose: Define the immutable data model parsed from contract documents.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A contract document is an ordered list of checks. Each check declares one
//! HTTP request (method, path, extra headers, auth override) and its expected
//! outcome (status, header rules, schema reference, body assertions). The
//! model is immutable once parsed; the runner executes checks strictly in
//! declaration order.
//!
//! Invariants:
//! - Unknown assertion types fail at parse time, not at evaluation time.
//! - Defaults match the wire contract: method GET, expected status 200.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::errors::ConfigError;

// ============================================================================
// SECTION: Contract Document
// ============================================================================

/// Parsed contract document: the ordered list of declared checks.
///
/// # Invariants
/// - Check order matches declaration order in the source document.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ContractDocument {
    /// Declared checks, in document order.
    #[serde(default)]
    pub checks: Vec<CheckDefinition>,
}

/// One declarative contract check: a request plus its expected outcome.
///
/// # Invariants
/// - Immutable after parsing; one instance per declared check.
/// - `path` and extra header values may contain environment-variable
///   references expanded at execution time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckDefinition {
    /// HTTP method (default GET).
    #[serde(default = "default_method")]
    pub method: String,
    /// Relative path or absolute URL of the request.
    pub path: String,
    /// Expected response status (default 200, exact match).
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
    /// Optional path to a JSON Schema file validated against the body.
    #[serde(default)]
    pub schema: Option<String>,
    /// Body assertions, evaluated in declaration order.
    #[serde(default, rename = "assert")]
    pub assertions: Vec<Assertion>,
    /// Response header rules keyed by header name.
    #[serde(default)]
    pub expected_headers: BTreeMap<String, HeaderRule>,
    /// Extra request headers merged after auth application.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Per-check auth override token; absent means the run default.
    #[serde(default)]
    pub auth: Option<String>,
}

/// Default request method for checks that omit `method`.
fn default_method() -> String {
    "GET".to_string()
}

/// Default expected status for checks that omit `expected_status`.
const fn default_expected_status() -> u16 {
    200
}

// ============================================================================
// SECTION: Assertions
// ============================================================================

/// One declarative condition over the decoded response body.
///
/// # Invariants
/// - Each variant is keyed by a dotted JSON path into the body.
/// - An unknown `type` tag fails document parsing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// The path must resolve to a present, non-null value.
    JsonPathExists {
        /// Dotted JSON path.
        path: String,
    },
    /// The resolved value must deep-equal the expected value.
    JsonPathEquals {
        /// Dotted JSON path.
        path: String,
        /// Expected value, compared structurally.
        expected: Value,
    },
    /// The resolved value must be a member of the declared list.
    JsonPathOneOf {
        /// Dotted JSON path.
        path: String,
        /// Non-empty list of acceptable values.
        any_of: Vec<Value>,
    },
    /// The resolved value must be numeric and within the declared bounds.
    JsonPathRange {
        /// Dotted JSON path.
        path: String,
        /// Inclusive lower bound; absent removes the constraint.
        #[serde(default)]
        min: Option<f64>,
        /// Inclusive upper bound; absent removes the constraint.
        #[serde(default)]
        max: Option<f64>,
    },
}

impl Assertion {
    /// Returns the dotted JSON path this assertion targets.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::JsonPathExists {
                path,
            }
            | Self::JsonPathEquals {
                path, ..
            }
            | Self::JsonPathOneOf {
                path, ..
            }
            | Self::JsonPathRange {
                path, ..
            } => path,
        }
    }
}

// ============================================================================
// SECTION: Header Rules
// ============================================================================

/// Declarative rule for one response header.
///
/// # Invariants
/// - A shorthand string means "exists and equals exactly".
/// - Boolean `true` means "exists"; `false` is rejected at evaluation time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HeaderRule {
    /// Shorthand: header must exist and equal this value exactly.
    Equals(String),
    /// Boolean flag: `true` requires the header to exist.
    Exists(bool),
    /// Structured rule; all present sub-rules must pass.
    Rules(HeaderRuleSet),
}

/// Structured header rule combining existence, equality, substring, and
/// regex sub-rules.
///
/// # Invariants
/// - Each present sub-rule is evaluated; all must pass.
/// - `regex` is a search (unanchored), not a full match.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HeaderRuleSet {
    /// Require the header to exist.
    #[serde(default)]
    pub exists: bool,
    /// Require the header to equal this value (string-coerced exact match).
    #[serde(default)]
    pub equals: Option<Value>,
    /// Require the header value to contain this substring.
    #[serde(default)]
    pub contains: Option<String>,
    /// Require the header value to match this regex (search semantics).
    #[serde(default)]
    pub regex: Option<String>,
}

// ============================================================================
// SECTION: Auth Override
// ============================================================================

/// Per-check authentication override parsed from the check's `auth` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOverride {
    /// Reuse the run-wide auth context, including its token cache.
    Default,
    /// Send the request unauthenticated.
    None,
    /// Use API-key auth with the run's static key fields.
    ApiKey,
    /// Use OAuth2 bearer auth with the run's static credential fields.
    OAuth2,
}

impl AuthOverride {
    /// Parses an override token from a contract check.
    ///
    /// Accepted values: empty or `default`, `none`, `api_key`/`apikey`,
    /// `oauth2`/`bearer`. Matching is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownAuthOverride`] for any other value.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Ok(Self::Default),
            "none" => Ok(Self::None),
            "api_key" | "apikey" => Ok(Self::ApiKey),
            "oauth2" | "bearer" => Ok(Self::OAuth2),
            other => Err(ConfigError::UnknownAuthOverride {
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Outcome of one executed check.
///
/// # Invariants
/// - `url` is the final URL actually called, after auth URL mutation.
/// - Immutable; appended to the run's ordered result list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpResult {
    /// Final URL actually called.
    pub url: String,
    /// Response status code.
    pub status_code: u16,
    /// Decoded JSON body, absent when the response had no body.
    pub json: Option<Value>,
}
