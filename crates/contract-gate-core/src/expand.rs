// crates/contract-gate-core/src/expand.rs
// ============================================================================
// Module: Environment-Variable Expansion
// Description: Expand $NAME, ${NAME}, and %NAME% references in strings.
// Purpose: Resolve environment references in check paths and header values.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Contract documents may reference environment variables in check paths,
//! base URLs, and extra request-header values using `$NAME`, `${NAME}`, or
//! `%NAME%` syntax. Unresolved variables expand to the empty string.
//! Callers may substitute a deterministic lookup for tests via
//! [`expand_with`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::OnceLock;

use regex::Captures;
use regex::Regex;

// ============================================================================
// SECTION: Pattern
// ============================================================================

/// Lazily compiled variable-reference pattern shared by all expansions.
static VAR_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Returns the compiled variable-reference pattern.
#[allow(clippy::expect_used, reason = "The pattern is a fixed literal covered by unit tests.")]
fn pattern() -> &'static Regex {
    VAR_PATTERN.get_or_init(|| {
        Regex::new(
            r"\$(?:\{(?P<braced>[A-Za-z_][A-Za-z0-9_]*)\}|(?P<bare>[A-Za-z_][A-Za-z0-9_]*))|%(?P<windows>[A-Za-z_][A-Za-z0-9_]*)%",
        )
        .expect("variable-reference pattern compiles")
    })
}

// ============================================================================
// SECTION: Expansion
// ============================================================================

/// Expands variable references using the process environment.
///
/// Unresolved variables expand to the empty string.
#[must_use]
pub fn expand(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Expands variable references using a caller-supplied lookup.
///
/// A `None` lookup result expands to the empty string, matching the process
/// environment behavior for unset variables.
pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if input.is_empty() {
        return String::new();
    }
    pattern()
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps
                .name("braced")
                .or_else(|| caps.name("bare"))
                .or_else(|| caps.name("windows"))
                .map_or("", |m| m.as_str());
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}
