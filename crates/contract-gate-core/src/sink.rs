// crates/contract-gate-core/src/sink.rs
// ============================================================================
// Module: Result Sink
// Description: Injectable sink for executed HTTP call records.
// Purpose: Replace a process-wide call log with an explicit interface.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every HTTP call the runner executes (contract checks, token exchanges
//! excluded, metric fetches included) is reported to an injected
//! [`ResultSink`] so that reporting layers can consume call records without
//! the core depending on any ambient mutable store. Sink recording is
//! infallible by construction: a sink can never fail a check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Serialize;

// ============================================================================
// SECTION: Call Record
// ============================================================================

/// Record of one executed HTTP call.
///
/// # Invariants
/// - `status_code` is absent when the request never produced a response.
/// - `ok` reflects transport success and a 2xx status, not contract success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    /// Request method.
    pub method: String,
    /// Final request URL.
    pub url: String,
    /// Response status code, when a response was received.
    pub status_code: Option<u16>,
    /// True when the transport succeeded with a 2xx status.
    pub ok: bool,
    /// Wall-clock duration of the call in milliseconds.
    pub elapsed_ms: f64,
    /// Error text when the call failed below the contract layer.
    pub error: Option<String>,
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Injectable sink receiving one record per executed HTTP call.
pub trait ResultSink {
    /// Records an executed call. Implementations must not panic.
    fn record(&self, record: &CallRecord);
}

// ============================================================================
// SECTION: Built-in Sinks
// ============================================================================

/// In-memory sink collecting records in execution order.
///
/// # Invariants
/// - Records are appended in the order calls complete.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Collected call records.
    records: Mutex<Vec<CallRecord>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of the collected records.
    #[must_use]
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the number of collected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true when no records have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemorySink {
    fn record(&self, record: &CallRecord) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(record.clone());
    }
}

/// Sink that discards all records.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn record(&self, _record: &CallRecord) {}
}
