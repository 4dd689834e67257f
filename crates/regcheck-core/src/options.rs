// crates/regcheck-core/src/options.rs
// ============================================================================
// Module: Validation Options
// Description: Mode, certificate bundle, probes and run controls for one run.
// Purpose: Thread one read-only context through every validator call.
// Dependencies: serde, crate::interfaces, crate::events, crate::cancel
// ============================================================================

//! ## Overview
//! [`ValidationOptions`] is constructed once per run and never mutated during
//! it. It carries the [`ValidationMode`], the [`Certificates`] side channel,
//! the injected [`Probes`], probe deadlines, the event sink, the ambient
//! environment reader and the cancellation signal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::cancel::CancellationSignal;
use crate::environment::AmbientEnvironment;
use crate::events::NoopEventSink;
use crate::events::ValidationEvent;
use crate::events::ValidationEventSink;
use crate::interfaces::Probes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default connect timeout for live probes.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(3_000);
/// Default overall deadline for one live probe.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5_000);
/// Default signing region for S3-dialect backends.
pub const DEFAULT_REGION: &str = "us-east-1";

// ============================================================================
// SECTION: Mode
// ============================================================================

/// Validation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Structural checks only; no network I/O.
    Structural,
    /// Structural checks, then live probes when structurally clean.
    #[default]
    Connectivity,
}

// ============================================================================
// SECTION: Certificates
// ============================================================================

/// Side-channel map from relative file path to raw bytes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Certificates {
    /// File contents keyed by relative path.
    files: BTreeMap<String, Vec<u8>>,
}

impl Certificates {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a file, replacing any previous content.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }

    /// Returns a file by relative path.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    /// Returns true when the file exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Iterates over file names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true when the bundle holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<u8>)> for Certificates {
    fn from_iter<I: IntoIterator<Item = (K, Vec<u8>)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().map(|(name, bytes)| (name.into(), bytes)).collect(),
        }
    }
}

impl fmt::Debug for Certificates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificates").field("files", &self.files.keys().collect::<Vec<_>>()).finish()
    }
}

// ============================================================================
// SECTION: Timeouts
// ============================================================================

/// Deadlines applied to live probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTimeouts {
    /// Connection establishment timeout.
    pub connect: Duration,
    /// Overall deadline for one probe.
    pub request: Duration,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            request: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Options
// ============================================================================

/// Read-only context for one validation run.
#[derive(Clone)]
pub struct ValidationOptions {
    /// Validation mode.
    pub mode: ValidationMode,
    /// Certificate side channel.
    pub certificates: Arc<Certificates>,
    /// Injected live probes.
    pub probes: Probes,
    /// Probe deadlines.
    pub timeouts: ProbeTimeouts,
    /// Event sink.
    pub events: Arc<dyn ValidationEventSink>,
    /// Ambient environment reader used by credential strategies.
    pub environment: AmbientEnvironment,
    /// External cancellation signal.
    pub cancellation: CancellationSignal,
    /// Signing region used when a storage entry names none.
    pub default_region: String,
}

impl ValidationOptions {
    /// Creates options with default timeouts, no events, process environment.
    #[must_use]
    pub fn new(mode: ValidationMode, certificates: Certificates, probes: Probes) -> Self {
        Self {
            mode,
            certificates: Arc::new(certificates),
            probes,
            timeouts: ProbeTimeouts::default(),
            events: Arc::new(NoopEventSink),
            environment: AmbientEnvironment::process(),
            cancellation: CancellationSignal::new(),
            default_region: DEFAULT_REGION.to_string(),
        }
    }

    /// Structural-only options with offline probes.
    #[must_use]
    pub fn structural(certificates: Certificates) -> Self {
        Self::new(ValidationMode::Structural, certificates, Probes::offline())
    }

    /// Replaces probe deadlines.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: ProbeTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn ValidationEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Replaces the ambient environment reader.
    #[must_use]
    pub fn with_environment(mut self, environment: AmbientEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Replaces the cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationSignal) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Replaces the default signing region.
    #[must_use]
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = region.into();
        self
    }

    /// Returns true when live probes may run.
    #[must_use]
    pub fn connectivity_enabled(&self) -> bool {
        self.mode == ValidationMode::Connectivity
    }

    /// Records an event on the configured sink.
    pub fn emit(&self, event: &ValidationEvent) {
        self.events.record(event);
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("mode", &self.mode)
            .field("certificates", &self.certificates)
            .field("timeouts", &self.timeouts)
            .field("default_region", &self.default_region)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}
