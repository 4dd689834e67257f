// crates/regcheck-core/src/lib.rs
// ============================================================================
// Module: Regcheck Core Library
// Description: Shared contract for registry configuration validation.
// Purpose: Findings, options, probe interfaces and strict decode helpers.
// Dependencies: async-trait, serde, serde_json, serde_yaml, thiserror, tokio, url
// ============================================================================

//! ## Overview
//! `regcheck-core` defines the vocabulary every other crate shares: the
//! [`Finding`] result currency, the read-only [`ValidationOptions`] context,
//! the probe traits collected in [`Probes`], and the [`RawConfig`] document
//! with its strict decode helpers. It performs no network I/O itself.
//!
//! Security posture: configuration documents and certificate bundles are
//! untrusted input; request types redact secrets from their `Debug` output.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cancel;
pub mod document;
pub mod environment;
pub mod events;
pub mod findings;
pub mod interfaces;
pub mod options;
pub mod rules;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cancel::CancellationSignal;
pub use document::ConfigError;
pub use document::RawConfig;
pub use environment::AmbientEnvironment;
pub use events::ValidationEvent;
pub use events::ValidationEventSink;
pub use findings::Finding;
pub use findings::Severity;
pub use interfaces::*;
pub use options::Certificates;
pub use options::ProbeTimeouts;
pub use options::ValidationMode;
pub use options::ValidationOptions;
