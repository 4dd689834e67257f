// crates/regcheck-core/src/events.rs
// ============================================================================
// Module: Validation Events
// Description: Structured run events and pluggable JSON-lines sinks.
// Purpose: Emit secret-free progress records without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The engine reports progress through a [`ValidationEventSink`]. Events carry
//! labels, counts and timings only; configuration values (keys, passwords,
//! tokens) never appear in an event payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::options::ValidationMode;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Validation phase label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPhase {
    /// Required-key and field-group structural checks.
    Structural,
    /// Live dependency probes.
    Connectivity,
}

/// Outcome label attached to a completed probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Probe succeeded.
    Ok,
    /// Probe produced at least one finding.
    Failed,
    /// Probe exceeded its deadline.
    TimedOut,
    /// Probe was aborted by cancellation.
    Cancelled,
}

/// Event-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventDetail {
    /// Run started.
    RunStarted {
        /// Requested validation mode.
        mode: ValidationMode,
    },
    /// Phase started.
    PhaseStarted {
        /// Phase label.
        phase: ValidationPhase,
    },
    /// One field group finished a phase.
    FieldGroupCompleted {
        /// Field group name.
        field_group: String,
        /// Phase label.
        phase: ValidationPhase,
        /// Error findings produced.
        errors: usize,
        /// Warning findings produced.
        warnings: usize,
    },
    /// One live probe finished.
    ProbeCompleted {
        /// Probe target label (never a credential).
        target: String,
        /// Outcome label.
        outcome: ProbeOutcome,
        /// Elapsed time in milliseconds.
        elapsed_ms: u128,
    },
    /// Run completed.
    RunCompleted {
        /// Total error findings.
        errors: usize,
        /// Total warning findings.
        warnings: usize,
        /// Whether the run was cancelled.
        cancelled: bool,
    },
}

/// Validation event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event-specific fields.
    #[serde(flatten)]
    pub detail: EventDetail,
}

impl ValidationEvent {
    /// Creates an event with a consistent timestamp.
    fn stamped(event: &'static str, detail: EventDetail) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            detail,
        }
    }

    /// Builds a `run_started` event.
    #[must_use]
    pub fn run_started(mode: ValidationMode) -> Self {
        Self::stamped("run_started", EventDetail::RunStarted {
            mode,
        })
    }

    /// Builds a `phase_started` event.
    #[must_use]
    pub fn phase_started(phase: ValidationPhase) -> Self {
        Self::stamped("phase_started", EventDetail::PhaseStarted {
            phase,
        })
    }

    /// Builds a `field_group_completed` event.
    #[must_use]
    pub fn field_group_completed(
        field_group: &str,
        phase: ValidationPhase,
        errors: usize,
        warnings: usize,
    ) -> Self {
        Self::stamped("field_group_completed", EventDetail::FieldGroupCompleted {
            field_group: field_group.to_string(),
            phase,
            errors,
            warnings,
        })
    }

    /// Builds a `probe_completed` event.
    #[must_use]
    pub fn probe_completed(target: &str, outcome: ProbeOutcome, elapsed_ms: u128) -> Self {
        Self::stamped("probe_completed", EventDetail::ProbeCompleted {
            target: target.to_string(),
            outcome,
            elapsed_ms,
        })
    }

    /// Builds a `run_completed` event.
    #[must_use]
    pub fn run_completed(errors: usize, warnings: usize, cancelled: bool) -> Self {
        Self::stamped("run_completed", EventDetail::RunCompleted {
            errors,
            warnings,
            cancelled,
        })
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink for validation events.
pub trait ValidationEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &ValidationEvent);
}

/// Sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl ValidationEventSink for StderrEventSink {
    fn record(&self, event: &ValidationEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ValidationEventSink for FileEventSink {
    fn record(&self, event: &ValidationEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl ValidationEventSink for NoopEventSink {
    fn record(&self, _event: &ValidationEvent) {}
}

/// In-memory sink, mostly useful for tests and embedding callers.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<ValidationEvent>>,
}

impl MemoryEventSink {
    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ValidationEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl ValidationEventSink for MemoryEventSink {
    fn record(&self, event: &ValidationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
