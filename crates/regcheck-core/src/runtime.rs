// crates/regcheck-core/src/runtime.rs
// ============================================================================
// Module: Probe Runtime
// Description: Deadline and cancellation wrapping for live probes.
// Purpose: Guarantee every network call terminates and is reported.
// Dependencies: tokio, crate::options, crate::events
// ============================================================================

//! ## Overview
//! [`bounded`] races one probe future against the run's request deadline and
//! its cancellation signal, then records a `probe_completed` event.
//! [`block_on`] drives the connectivity phase from the synchronous engine on
//! a private current-thread runtime, moving to a scoped thread when the
//! caller already runs inside a tokio runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;
use std::time::Instant;

use tokio::runtime::Builder;
use tokio::runtime::Handle;

use crate::events::ProbeOutcome;
use crate::events::ValidationEvent;
use crate::interfaces::ProbeError;
use crate::options::ValidationOptions;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Grace period for blocking probe threads when the runtime shuts down.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

// ============================================================================
// SECTION: Bounded Execution
// ============================================================================

/// Runs one probe under the request deadline and the cancellation signal.
///
/// `target` labels the `probe_completed` event and must not contain secrets.
///
/// # Errors
///
/// Returns [`ProbeError::Timeout`] on deadline expiry, [`ProbeError::Cancelled`]
/// on cancellation, or the probe's own error.
pub async fn bounded<T, F>(options: &ValidationOptions, target: &str, future: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    let started = Instant::now();
    let deadline = options.timeouts.request;
    let result = tokio::select! {
        biased;
        () = options.cancellation.cancelled() => Err(ProbeError::Cancelled),
        outcome = tokio::time::timeout(deadline, future) => {
            outcome.unwrap_or_else(|_| Err(ProbeError::Timeout(deadline.as_millis())))
        }
    };
    let outcome = match &result {
        Ok(_) => ProbeOutcome::Ok,
        Err(ProbeError::Timeout(_)) => ProbeOutcome::TimedOut,
        Err(ProbeError::Cancelled) => ProbeOutcome::Cancelled,
        Err(_) => ProbeOutcome::Failed,
    };
    options.emit(&ValidationEvent::probe_completed(target, outcome, started.elapsed().as_millis()));
    result
}

// ============================================================================
// SECTION: Runtime Helpers
// ============================================================================

/// Drives a future to completion from synchronous code.
///
/// # Errors
///
/// Returns [`ProbeError::Unavailable`] when no runtime can be started.
pub fn block_on<F>(future: F) -> Result<F::Output, ProbeError>
where
    F: Future + Send,
    F::Output: Send,
{
    if Handle::try_current().is_ok() {
        return std::thread::scope(|scope| {
            scope
                .spawn(|| run_on_fresh_runtime(future))
                .join()
                .unwrap_or_else(|_| Err(ProbeError::Unavailable("probe thread panicked".to_string())))
        });
    }
    run_on_fresh_runtime(future)
}

/// Builds a current-thread runtime, runs the future, then shuts down.
fn run_on_fresh_runtime<F: Future>(future: F) -> Result<F::Output, ProbeError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| ProbeError::Unavailable(format!("probe runtime: {err}")))?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}
