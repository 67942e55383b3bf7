// crates/contract-gate-core/src/assertions.rs
// ============================================================================
// Module: Assertion and Header-Rule Evaluation
// Description: Evaluate declarative body assertions and header rules.
// Purpose: Turn contract declarations into typed pass/fail outcomes.
// Dependencies: serde_json, regex
// ============================================================================

//! ## Overview
//! Body assertions are evaluated in declaration order against the decoded
//! response payload; the first failure aborts the check. Header rules are
//! evaluated per declared header name against a case-insensitive lookup.
//! Each stage returns a typed result: a [`ValidationFailure`] when the
//! system under test broke its contract, a [`ConfigError`] when the
//! declaration itself is invalid.
//!
//! Invariants:
//! - `equals` and `one_of` use structural equality, not identity.
//! - `range` bounds are inclusive on both ends; a missing bound removes
//!   that constraint.
//! - An invalid declaration (empty path, empty `any_of`, bad regex) is a
//!   configuration error, never a skipped assertion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use serde_json::Value;

use crate::errors::CheckErrorKind;
use crate::errors::ConfigError;
use crate::errors::ValidationFailure;
use crate::path;
use crate::types::Assertion;
use crate::types::HeaderRule;
use crate::types::HeaderRuleSet;

// ============================================================================
// SECTION: Body Assertions
// ============================================================================

/// Evaluates assertions against a decoded payload, in declaration order.
///
/// # Errors
///
/// Returns [`ValidationFailure::Assertion`] for the first failing assertion,
/// or [`ConfigError::Assertion`] when a declaration is invalid.
pub fn evaluate(payload: &Value, assertions: &[Assertion]) -> Result<(), CheckErrorKind> {
    for assertion in assertions {
        evaluate_one(payload, assertion)?;
    }
    Ok(())
}

/// Evaluates a single assertion against the payload.
fn evaluate_one(payload: &Value, assertion: &Assertion) -> Result<(), CheckErrorKind> {
    let dotted = assertion.path().trim();
    if dotted.is_empty() {
        return Err(ConfigError::Assertion {
            detail: format!("{} requires 'path'", assertion_name(assertion)),
        }
        .into());
    }
    let resolved = path::resolve(payload, dotted);

    match assertion {
        Assertion::JsonPathExists {
            ..
        } => {
            if path::is_present(resolved) {
                Ok(())
            } else {
                Err(failure(dotted, "expected path to exist".to_string()))
            }
        }
        Assertion::JsonPathEquals {
            expected, ..
        } => {
            let actual = resolved.unwrap_or(&Value::Null);
            if actual == expected {
                Ok(())
            } else {
                Err(failure(dotted, format!("expected {expected}, got {actual}")))
            }
        }
        Assertion::JsonPathOneOf {
            any_of, ..
        } => {
            if any_of.is_empty() {
                return Err(ConfigError::Assertion {
                    detail: "json_path_one_of requires non-empty any_of".to_string(),
                }
                .into());
            }
            let actual = resolved.unwrap_or(&Value::Null);
            if any_of.contains(actual) {
                Ok(())
            } else {
                let options = Value::Array(any_of.clone());
                Err(failure(dotted, format!("expected one of {options}, got {actual}")))
            }
        }
        Assertion::JsonPathRange {
            min,
            max,
            ..
        } => evaluate_range(dotted, resolved, *min, *max),
    }
}

/// Evaluates a numeric range assertion with inclusive bounds.
fn evaluate_range(
    dotted: &str,
    resolved: Option<&Value>,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), CheckErrorKind> {
    if !path::is_present(resolved) {
        return Err(failure(dotted, "expected path to exist".to_string()));
    }
    let value = resolved.unwrap_or(&Value::Null);
    let Some(actual) = coerce_number(value) else {
        return Err(failure(dotted, format!("expected numeric value, got {value}")));
    };
    if let Some(min) = min
        && actual < min
    {
        return Err(failure(dotted, format!("expected value >= {min}, got {actual}")));
    }
    if let Some(max) = max
        && actual > max
    {
        return Err(failure(dotted, format!("expected value <= {max}, got {actual}")));
    }
    Ok(())
}

/// Coerces a JSON value to a number the way the contract language allows:
/// numbers, numeric strings, and booleans (1/0) coerce; nothing else does.
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Builds an assertion failure for the given path.
fn failure(dotted: &str, reason: String) -> CheckErrorKind {
    ValidationFailure::Assertion {
        path: dotted.to_string(),
        reason,
    }
    .into()
}

/// Returns the wire-level type tag of an assertion, for diagnostics.
const fn assertion_name(assertion: &Assertion) -> &'static str {
    match assertion {
        Assertion::JsonPathExists {
            ..
        } => "json_path_exists",
        Assertion::JsonPathEquals {
            ..
        } => "json_path_equals",
        Assertion::JsonPathOneOf {
            ..
        } => "json_path_one_of",
        Assertion::JsonPathRange {
            ..
        } => "json_path_range",
    }
}

// ============================================================================
// SECTION: Header Rules
// ============================================================================

/// Evaluates declared header rules against a response header lookup.
///
/// The lookup receives a header name and returns the response value when the
/// header is present; implementations are expected to be case-insensitive,
/// matching HTTP header semantics.
///
/// # Errors
///
/// Returns [`ValidationFailure`] for the first violated rule, or
/// [`ConfigError::HeaderRule`] when a declared rule is invalid.
pub fn evaluate_headers<'a, F>(
    lookup: F,
    rules: impl IntoIterator<Item = (&'a String, &'a HeaderRule)>,
) -> Result<(), CheckErrorKind>
where
    F: Fn(&str) -> Option<String>,
{
    for (name, rule) in rules {
        let actual = lookup(name);
        match rule {
            HeaderRule::Equals(expected) => {
                let actual = require_header(name, actual.as_deref())?;
                if actual != expected.as_str() {
                    return Err(mismatch(name, format!("== '{expected}'"), actual));
                }
            }
            HeaderRule::Exists(flag) => {
                if !flag {
                    return Err(ConfigError::HeaderRule {
                        header: name.clone(),
                        detail: "boolean rule must be true".to_string(),
                    }
                    .into());
                }
                require_header(name, actual.as_deref())?;
            }
            HeaderRule::Rules(set) => {
                evaluate_rule_set(name, actual.as_deref(), set)?;
            }
        }
    }
    Ok(())
}

/// Evaluates a structured header rule set; all present sub-rules must pass.
fn evaluate_rule_set(
    name: &str,
    actual: Option<&str>,
    set: &HeaderRuleSet,
) -> Result<(), CheckErrorKind> {
    if set.exists {
        require_header(name, actual)?;
    }
    if let Some(expected) = &set.equals {
        let actual = require_header(name, actual)?;
        let expected = coerce_text(expected);
        if actual != expected {
            return Err(mismatch(name, format!("== '{expected}'"), actual));
        }
    }
    if let Some(needle) = &set.contains {
        let actual = require_header(name, actual)?;
        if !actual.contains(needle.as_str()) {
            return Err(mismatch(name, format!("to contain '{needle}'"), actual));
        }
    }
    if let Some(pattern) = &set.regex {
        let actual = require_header(name, actual)?;
        let regex = Regex::new(pattern).map_err(|err| ConfigError::HeaderRule {
            header: name.to_string(),
            detail: format!("invalid regex '{pattern}': {err}"),
        })?;
        if !regex.is_match(actual) {
            return Err(mismatch(name, format!("to match /{pattern}/"), actual));
        }
    }
    Ok(())
}

/// Requires a header to be present, returning its value.
fn require_header<'a>(name: &str, actual: Option<&'a str>) -> Result<&'a str, CheckErrorKind> {
    actual.ok_or_else(|| {
        ValidationFailure::HeaderMissing {
            header: name.to_string(),
        }
        .into()
    })
}

/// Builds a header mismatch failure.
fn mismatch(name: &str, rule: String, actual: &str) -> CheckErrorKind {
    ValidationFailure::HeaderMismatch {
        header: name.to_string(),
        rule,
        actual: actual.to_string(),
    }
    .into()
}

/// Coerces a declared header value to text for exact comparison.
///
/// Strings compare as-is; scalars use their JSON rendering, so a declared
/// `200` matches the header value `"200"`.
fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
