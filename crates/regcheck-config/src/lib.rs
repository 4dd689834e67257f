// crates/regcheck-config/src/lib.rs
// ============================================================================
// Module: Regcheck Config Library
// Description: Registry configuration bundles, field groups and the engine.
// Purpose: Validate a configuration bundle structurally and against live deps.
// Dependencies: regcheck-core, regcheck-storage, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! `regcheck-config` loads a [`ConfigBundle`], decodes it strictly into a
//! [`RegistryConfig`] of field groups, and runs the validation engine
//! ([`run_validation`]) to produce a [`ValidationReport`]. Validator behavior
//! itself is configured by [`ValidatorSettings`]; [`probes::live_probes`]
//! assembles the network-backed probe set.
//!
//! Security posture: bundles are untrusted input and findings never echo
//! passwords, keys or tokens.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bundle;
pub mod config;
pub mod engine;
pub mod field_groups;
pub mod probes;
pub mod required;
pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bundle::ConfigBundle;
pub use bundle::bundle_relative;
pub use config::RegistryConfig;
pub use engine::CANCELLED_MESSAGE;
pub use engine::ValidationReport;
pub use engine::run_validation;
pub use engine::validate_bundle;
pub use field_groups::FieldGroup;
pub use field_groups::FieldGroupConfig;
pub use probes::live_probes;
pub use settings::SettingsError;
pub use settings::ValidatorSettings;
