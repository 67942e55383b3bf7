// crates/contract-gate-runner/src/schema.rs
// ============================================================================
// Module: Schema Cache
// Description: Compiled JSON Schema cache keyed by schema file path.
// Purpose: Validate decoded payloads without recompiling schemas.
// Dependencies: contract-gate-core, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! Schema documents are compiled once per file path (Draft 2020-12) and the
//! compiled validator is cached behind a mutex; repeated validation against
//! the same reference never recompiles. Validation collects all violations,
//! sorts them by instance location for deterministic output, and reports at
//! most the first five messages joined into one failure.
//!
//! Invariants:
//! - Compilation is idempotent per schema path.
//! - A violation is always a single [`ValidationFailure::Schema`] carrying
//!   the reference and the joined messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use contract_gate_core::CheckErrorKind;
use contract_gate_core::ConfigError;
use contract_gate_core::ValidationFailure;
use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;

// ============================================================================
// SECTION: Cache State
// ============================================================================

/// Mutable cache state behind the lock.
struct CacheState {
    /// Compiled validators keyed by schema file path.
    validators: BTreeMap<PathBuf, Arc<Validator>>,
    /// Number of compilations performed, for cache observability.
    compiles: usize,
}

/// Compiled-schema cache shared across checks.
///
/// # Invariants
/// - Each schema path is compiled at most once for the cache's lifetime.
pub struct SchemaCache {
    /// Guarded validators and compile counter.
    state: Mutex<CacheState>,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(CacheState {
                validators: BTreeMap::new(),
                compiles: 0,
            }),
        }
    }

    /// Returns how many schema compilations have run so far.
    #[must_use]
    pub fn compile_count(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).compiles
    }

    /// Validates a payload against the schema at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the schema cannot be read or compiled,
    /// or [`ValidationFailure::Schema`] when the payload violates it.
    pub fn validate(&self, schema_path: &Path, payload: &Value) -> Result<(), CheckErrorKind> {
        let validator = self.validator_for(schema_path)?;

        let mut violations: Vec<(String, String)> = validator
            .iter_errors(payload)
            .map(|err| (err.instance_path().to_string(), err.to_string()))
            .collect();
        if violations.is_empty() {
            return Ok(());
        }
        violations.sort_by(|left, right| left.0.cmp(&right.0));
        let detail = violations
            .iter()
            .take(5)
            .map(|(location, message)| {
                if location.is_empty() {
                    message.clone()
                } else {
                    format!("at {location}: {message}")
                }
            })
            .collect::<Vec<String>>()
            .join("; ");
        Err(ValidationFailure::Schema {
            schema_ref: schema_path.display().to_string(),
            detail,
        }
        .into())
    }

    /// Returns the cached validator for a path, compiling on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the schema file is unreadable or does
    /// not compile.
    fn validator_for(&self, schema_path: &Path) -> Result<Arc<Validator>, CheckErrorKind> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(validator) = state.validators.get(schema_path) {
            return Ok(Arc::clone(validator));
        }

        let raw = std::fs::read_to_string(schema_path).map_err(|err| ConfigError::SchemaFile {
            path: schema_path.display().to_string(),
            detail: err.to_string(),
        })?;
        let document: Value = serde_json::from_str(&raw).map_err(|err| ConfigError::SchemaFile {
            path: schema_path.display().to_string(),
            detail: err.to_string(),
        })?;
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&document)
            .map_err(|err| ConfigError::SchemaInvalid {
                path: schema_path.display().to_string(),
                detail: err.to_string(),
            })?;

        let validator = Arc::new(validator);
        state.validators.insert(schema_path.to_path_buf(), Arc::clone(&validator));
        state.compiles += 1;
        Ok(validator)
    }
}
