// crates/contract-gate-core/src/metric.rs
// ============================================================================
// Module: Metric Source
// Description: Narrow interface for fetching a value by key from the SUT.
// Purpose: Expose one capability behind a trait with explicit impl selection.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A metric source exposes exactly one capability: fetch the current value
//! for a metric key such as `device.model`. Concrete implementations are
//! selected by explicit configuration — a fixed map for harness testing
//! (here) and a templated-HTTP source (in the runner crate) — never by
//! runtime type probing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;

use crate::errors::MetricError;

// ============================================================================
// SECTION: Metric Source Trait
// ============================================================================

/// Capability to fetch the current value for a metric key.
pub trait MetricSource {
    /// Returns the current value for a metric key, or `None` when the
    /// source has no value for it.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError`] when the lookup itself fails.
    fn metric(&self, key: &str) -> Result<Option<Value>, MetricError>;
}

// ============================================================================
// SECTION: Fixed-Map Source
// ============================================================================

/// Metric source backed by a fixed map, for validating the harness itself.
///
/// # Invariants
/// - Lookups are pure; the map never changes after construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FixedMapSource {
    /// Metric values keyed by metric name.
    metrics: BTreeMap<String, Value>,
}

impl FixedMapSource {
    /// Creates a source over the given metric map.
    #[must_use]
    pub const fn new(metrics: BTreeMap<String, Value>) -> Self {
        Self {
            metrics,
        }
    }
}

impl MetricSource for FixedMapSource {
    fn metric(&self, key: &str) -> Result<Option<Value>, MetricError> {
        Ok(self.metrics.get(key).cloned())
    }
}
