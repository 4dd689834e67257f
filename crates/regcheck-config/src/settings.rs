// crates/regcheck-config/src/settings.rs
// ============================================================================
// Module: Validator Settings
// Description: TOML settings for the validator itself.
// Purpose: Load, bound and apply mode, probe deadlines, region and events.
// Dependencies: regcheck-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Settings resolve from an explicit path, then `REGCHECK_SETTINGS`, then
//! `regcheck.toml` in the working directory. Only the default file may be
//! absent; a missing explicit or environment path is an error.
//!
//! Security posture: settings files are bounded in size and path length and
//! every field is range-checked, failing closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use regcheck_core::Certificates;
use regcheck_core::ProbeTimeouts;
use regcheck_core::Probes;
use regcheck_core::ValidationEventSink;
use regcheck_core::ValidationMode;
use regcheck_core::ValidationOptions;
use regcheck_core::events::FileEventSink;
use regcheck_core::events::NoopEventSink;
use regcheck_core::events::StderrEventSink;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Environment variable naming the settings file.
pub const SETTINGS_ENV_VAR: &str = "REGCHECK_SETTINGS";
/// Settings file used when nothing else is named.
pub const DEFAULT_SETTINGS_NAME: &str = "regcheck.toml";
/// Maximum settings file size in bytes.
pub const MAX_SETTINGS_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of one path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Allowed connect timeout range in milliseconds.
pub const CONNECT_TIMEOUT_RANGE_MS: (u64, u64) = (100, 9_000);
/// Allowed request timeout range in milliseconds.
pub const REQUEST_TIMEOUT_RANGE_MS: (u64, u64) = (500, 9_000);

/// Default connect timeout in milliseconds.
const fn default_connect_timeout_ms() -> u64 {
    3_000
}

/// Default request timeout in milliseconds.
const fn default_request_timeout_ms() -> u64 {
    5_000
}

/// Default signing region.
fn default_region() -> String {
    regcheck_core::options::DEFAULT_REGION.to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Settings loading or validation errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O failure while reading settings.
    #[error("settings io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("settings parse error: {0}")]
    Parse(String),
    /// Invalid settings data.
    #[error("invalid settings: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Settings Types
// ============================================================================

/// Probe deadline settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeSettings {
    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Per-probe deadline in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ProbeSettings {
    /// Validates both deadlines against their ranges.
    fn validate(&self) -> Result<(), SettingsError> {
        check_range("probe.connect_timeout_ms", self.connect_timeout_ms, CONNECT_TIMEOUT_RANGE_MS)?;
        check_range("probe.request_timeout_ms", self.request_timeout_ms, REQUEST_TIMEOUT_RANGE_MS)?;
        if self.connect_timeout_ms > self.request_timeout_ms {
            return Err(SettingsError::Invalid(
                "probe.connect_timeout_ms must not exceed probe.request_timeout_ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Storage probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSettings {
    /// Region used when an entry names none.
    #[serde(default = "default_region")]
    pub default_region: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            default_region: default_region(),
        }
    }
}

/// Event sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSinkKind {
    /// Discard events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
}

/// Event settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSettings {
    /// Sink kind.
    #[serde(default)]
    pub sink: EventSinkKind,
    /// Log path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl EventSettings {
    /// Requires a path exactly when the sink is a file.
    fn validate(&self) -> Result<(), SettingsError> {
        match (self.sink, &self.path) {
            (EventSinkKind::File, None) => {
                Err(SettingsError::Invalid("events.path is required when events.sink is file".to_string()))
            }
            (EventSinkKind::File, Some(path)) => validate_path(path),
            (_, Some(_)) => Err(SettingsError::Invalid("events.path is only valid when events.sink is file".to_string())),
            (_, None) => Ok(()),
        }
    }
}

/// Validator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorSettings {
    /// Validation mode.
    #[serde(default)]
    pub mode: ValidationMode,
    /// Probe deadlines.
    #[serde(default)]
    pub probe: ProbeSettings,
    /// Storage probe settings.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Event settings.
    #[serde(default)]
    pub events: EventSettings,
}

impl ValidatorSettings {
    /// Loads settings from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when a named file is missing, a limit is
    /// exceeded, the file does not parse, or a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let (resolved, named) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !named && !resolved.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&resolved).map_err(|err| SettingsError::Io(err.to_string()))?;
        if bytes.len() > MAX_SETTINGS_FILE_SIZE {
            return Err(SettingsError::Invalid("settings file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| SettingsError::Invalid("settings file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates settings text.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the text does not parse or a value is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content).map_err(|err| SettingsError::Parse(err.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates ranges and cross-field rules.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] on the first violation.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.probe.validate()?;
        if self.storage.default_region.trim().is_empty() {
            return Err(SettingsError::Invalid("storage.default_region must be non-empty".to_string()));
        }
        self.events.validate()
    }

    /// Probe deadlines.
    #[must_use]
    pub const fn timeouts(&self) -> ProbeTimeouts {
        ProbeTimeouts {
            connect: Duration::from_millis(self.probe.connect_timeout_ms),
            request: Duration::from_millis(self.probe.request_timeout_ms),
        }
    }

    /// Opens the configured event sink.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] when the event log cannot be opened.
    pub fn event_sink(&self) -> Result<Arc<dyn ValidationEventSink>, SettingsError> {
        match (self.events.sink, &self.events.path) {
            (EventSinkKind::File, Some(path)) => {
                let sink = FileEventSink::new(path).map_err(|err| SettingsError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
            (EventSinkKind::File, None) => {
                Err(SettingsError::Invalid("events.path is required when events.sink is file".to_string()))
            }
            (EventSinkKind::Stderr, _) => Ok(Arc::new(StderrEventSink)),
            (EventSinkKind::None, _) => Ok(Arc::new(NoopEventSink)),
        }
    }

    /// Builds run options from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the event sink cannot be opened.
    pub fn options(&self, certificates: Certificates, probes: Probes) -> Result<ValidationOptions, SettingsError> {
        Ok(ValidationOptions::new(self.mode, certificates, probes)
            .with_timeouts(self.timeouts())
            .with_events(self.event_sink()?)
            .with_default_region(self.storage.default_region.trim()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the settings path; the flag is false for the implicit default.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), SettingsError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(SETTINGS_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(SettingsError::Invalid("settings path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_SETTINGS_NAME), false))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), SettingsError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SettingsError::Invalid("settings path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SettingsError::Invalid("settings path component too long".to_string()));
        }
    }
    Ok(())
}

/// Checks an inclusive range.
fn check_range(field: &str, value: u64, (min, max): (u64, u64)) -> Result<(), SettingsError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::Invalid(format!("{field} must be between {min} and {max}")))
    }
}
