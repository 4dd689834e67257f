// crates/regcheck-core/tests/runtime.rs
// ============================================================================
// Module: Probe Runtime Tests
// Description: Deadline, cancellation and event emission for bounded probes.
// Purpose: Prove every probe terminates and is reported.
// ============================================================================

//! Probe runtime tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::time::Duration;

use regcheck_core::CancellationSignal;
use regcheck_core::Certificates;
use regcheck_core::ProbeError;
use regcheck_core::ProbeTimeouts;
use regcheck_core::ValidationOptions;
use regcheck_core::events::EventDetail;
use regcheck_core::events::FileEventSink;
use regcheck_core::events::MemoryEventSink;
use regcheck_core::events::ProbeOutcome;
use regcheck_core::events::ValidationEvent;
use regcheck_core::events::ValidationEventSink;
use regcheck_core::runtime;

fn options_with(sink: Arc<MemoryEventSink>, request: Duration) -> ValidationOptions {
    ValidationOptions::structural(Certificates::new())
        .with_timeouts(ProbeTimeouts {
            connect: request,
            request,
        })
        .with_events(sink)
}

#[test]
fn slow_probe_times_out_and_is_recorded() {
    let sink = Arc::new(MemoryEventSink::default());
    let options = options_with(sink.clone(), Duration::from_millis(50));
    let result = runtime::block_on(runtime::bounded(&options, "cache BUILDLOGS_REDIS", async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<_, ProbeError>(())
    }))
    .unwrap();
    assert_eq!(result, Err(ProbeError::Timeout(50)));
    let events = sink.events();
    assert_eq!(events.len(), 1);
    match &events[0].detail {
        EventDetail::ProbeCompleted {
            target,
            outcome,
            ..
        } => {
            assert_eq!(target, "cache BUILDLOGS_REDIS");
            assert_eq!(*outcome, ProbeOutcome::TimedOut);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn cancellation_aborts_in_flight_probe() {
    let sink = Arc::new(MemoryEventSink::default());
    let cancel = CancellationSignal::new();
    let options = options_with(sink.clone(), Duration::from_secs(30)).with_cancellation(cancel.clone());
    let trigger = cancel.clone();
    let result = runtime::block_on(async move {
        let probe = runtime::bounded(&options, "database", async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, ProbeError>(())
        });
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        };
        let (result, ()) = tokio::join!(probe, canceller);
        result
    })
    .unwrap();
    assert_eq!(result, Err(ProbeError::Cancelled));
    assert!(cancel.is_cancelled());
}

#[test]
fn already_cancelled_signal_short_circuits() {
    let cancel = CancellationSignal::new();
    cancel.cancel();
    let options = options_with(Arc::new(MemoryEventSink::default()), Duration::from_secs(1))
        .with_cancellation(cancel);
    let result = runtime::block_on(runtime::bounded(&options, "mail", async { Ok::<_, ProbeError>(7) })).unwrap();
    assert_eq!(result, Err(ProbeError::Cancelled));
}

#[tokio::test]
async fn block_on_works_inside_an_existing_runtime() {
    let value = runtime::block_on(async { 41 + 1 }).unwrap();
    assert_eq!(value, 42);
}

#[test]
fn file_sink_appends_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let sink = FileEventSink::new(&path).unwrap();
    sink.record(&ValidationEvent::run_completed(2, 1, false));
    sink.record(&ValidationEvent::run_completed(0, 0, true));
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["event"], "run_completed");
    assert_eq!(first["errors"], 2);
    assert_eq!(first["cancelled"], false);
}
