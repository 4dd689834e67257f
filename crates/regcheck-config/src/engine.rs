// crates/regcheck-config/src/engine.rs
// ============================================================================
// Module: Validation Engine
// Description: Runs required keys, structural rules and live probes in order.
// Purpose: Produce one aggregated, severity-classified report per run.
// Dependencies: regcheck-core, serde, tokio
// ============================================================================

//! ## Overview
//! A run always performs the structural phase: the required-key check, then
//! every field group's rules in fixed order. The connectivity phase runs only
//! when the mode asks for it and the structural phase produced no errors.
//! Probes run one group at a time on a dedicated runtime; each is bounded by
//! the request deadline inside the group and raced against cancellation here.
//!
//! Once cancellation is observed no further group runs, the interrupted
//! group's partial findings are dropped, and one error records the cancel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regcheck_core::ConfigError;
use regcheck_core::Finding;
use regcheck_core::ValidationEvent;
use regcheck_core::ValidationOptions;
use regcheck_core::events::ValidationPhase;
use regcheck_core::findings::error_count;
use regcheck_core::findings::has_errors;
use regcheck_core::findings::warning_count;
use regcheck_core::runtime;
use serde::Serialize;

use crate::bundle::ConfigBundle;
use crate::config::RegistryConfig;
use crate::required;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name used for findings about the run itself.
pub const ENGINE_NAME: &str = "Validation";
/// Message recorded when a run is cancelled.
pub const CANCELLED_MESSAGE: &str = "validation cancelled before completion";

// ============================================================================
// SECTION: Report
// ============================================================================

/// Aggregated outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Findings in emission order.
    pub findings: Vec<Finding>,
    /// Whether the run stopped early on cancellation.
    pub cancelled: bool,
}

impl ValidationReport {
    /// Error-severity findings.
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|finding| finding.is_error())
    }

    /// Warning-severity findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|finding| !finding.is_error())
    }

    /// Returns true when the configuration is invalid.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        has_errors(&self.findings)
    }

    /// Process exit code for a wrapping caller: 1 on any error, else 0.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.has_errors())
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Validates a decoded configuration.
#[must_use]
pub fn run_validation(config: &RegistryConfig, options: &ValidationOptions) -> ValidationReport {
    options.emit(&ValidationEvent::run_started(options.mode));
    let mut report = ValidationReport::default();
    structural_phase(config, options, &mut report);
    if !report.cancelled && !report.has_errors() && options.connectivity_enabled() {
        connectivity_phase(config, options, &mut report);
    }
    options.emit(&ValidationEvent::run_completed(
        error_count(&report.findings),
        warning_count(&report.findings),
        report.cancelled,
    ));
    report
}

/// Decodes a bundle's document, then validates it.
///
/// # Errors
///
/// Returns [`ConfigError::Construction`] when a present value is mistyped.
pub fn validate_bundle(bundle: &ConfigBundle, options: &ValidationOptions) -> Result<ValidationReport, ConfigError> {
    let config = RegistryConfig::from_bundle(bundle)?;
    Ok(run_validation(&config, options))
}

/// Required keys plus every group's rules. Performs no I/O.
fn structural_phase(config: &RegistryConfig, options: &ValidationOptions, report: &mut ValidationReport) {
    options.emit(&ValidationEvent::phase_started(ValidationPhase::Structural));
    report.findings.extend(required::check(config.document()));
    for group in config.groups() {
        if options.cancellation.is_cancelled() {
            record_cancel(report);
            return;
        }
        let found = group.check(&options.certificates);
        options.emit(&ValidationEvent::field_group_completed(
            group.group().name(),
            ValidationPhase::Structural,
            error_count(&found),
            warning_count(&found),
        ));
        report.findings.extend(found);
    }
}

/// Live probes, one group at a time.
fn connectivity_phase(config: &RegistryConfig, options: &ValidationOptions, report: &mut ValidationReport) {
    options.emit(&ValidationEvent::phase_started(ValidationPhase::Connectivity));
    let outcome = runtime::block_on(async {
        let mut findings = Vec::new();
        for group in config.groups() {
            let probed = tokio::select! {
                biased;
                () = options.cancellation.cancelled() => None,
                found = group.probe(options) => Some(found),
            };
            let Some(found) = probed else {
                return (findings, true);
            };
            options.emit(&ValidationEvent::field_group_completed(
                group.group().name(),
                ValidationPhase::Connectivity,
                error_count(&found),
                warning_count(&found),
            ));
            findings.extend(found);
        }
        (findings, false)
    });
    match outcome {
        Ok((findings, cancelled)) => {
            report.findings.extend(findings);
            if cancelled {
                record_cancel(report);
            }
        }
        Err(err) => report.findings.push(Finding::error(
            ENGINE_NAME,
            "connectivity",
            format!("connectivity checks could not run: {err}"),
        )),
    }
}

/// Marks the run cancelled and records the finding once.
fn record_cancel(report: &mut ValidationReport) {
    report.cancelled = true;
    report.findings.push(Finding::error(ENGINE_NAME, "run", CANCELLED_MESSAGE));
}
