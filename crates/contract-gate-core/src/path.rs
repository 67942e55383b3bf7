// crates/contract-gate-core/src/path.rs
// ============================================================================
// Module: Dotted JSON Path Resolution
// Description: Descend into JSON objects by dotted path.
// Purpose: Resolve assertion targets inside decoded response bodies.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A dotted path like `data.value` is resolved by descending into JSON
//! objects only. A non-object encountered mid-path, or a missing key, yields
//! "absent". A present `null` also counts as absent for existence checks,
//! while falsy-but-present values (`false`, `0`, `""`) do not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves a dotted path against a payload.
///
/// Returns `None` when any segment is missing or a non-object is reached
/// mid-path. Array indexing is intentionally unsupported.
#[must_use]
pub fn resolve<'a>(payload: &'a Value, dotted: &str) -> Option<&'a Value> {
    let mut current = payload;
    for segment in dotted.split('.') {
        let Value::Object(map) = current else {
            return None;
        };
        current = map.get(segment)?;
    }
    Some(current)
}

/// Returns true when a resolved value is present for `exists` semantics.
///
/// Absent paths and present `null` values both count as missing.
#[must_use]
pub fn is_present(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}
