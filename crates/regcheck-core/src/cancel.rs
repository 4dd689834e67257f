// crates/regcheck-core/src/cancel.rs
// ============================================================================
// Module: Cancellation
// Description: Cloneable cancellation signal shared between caller and engine.
// Purpose: Stop a validation run and abort its in-flight probe.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! [`CancellationSignal`] is a latched flag paired with a [`tokio::sync::Notify`]
//! so that both the synchronous engine loop (polling [`is_cancelled`]) and the
//! async probe runner (awaiting [`cancelled`]) observe the same trigger.
//!
//! [`is_cancelled`]: CancellationSignal::is_cancelled
//! [`cancelled`]: CancellationSignal::cancelled

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::sync::Notify;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Shared state behind every clone of a signal.
#[derive(Debug, Default)]
struct SignalState {
    /// Latched cancellation flag.
    cancelled: AtomicBool,
    /// Wakes async waiters on cancellation.
    notify: Notify,
}

/// External cancellation signal for one validation run.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    /// Shared state.
    state: Arc<SignalState>,
}

impl CancellationSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers cancellation. Idempotent.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    /// Returns true once cancellation has been triggered.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been triggered.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
