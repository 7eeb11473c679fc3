// SPDX-License-Identifier: Apache-2.0
//! Telemetry hooks for the subtick runner.
//!
//! The runner never depends on a logging framework directly: instrumentation
//! is a trait object the host supplies, so a silent [`NullTelemetrySink`] has
//! zero cost on the hot path and nothing about the scheduler's timing or
//! formatting can leak into its determinism guarantees.

use std::sync::Arc;

use crate::registry::SubtickHandle;

/// Sink for scheduler-level telemetry events.
///
/// All methods take `&self`: sinks are shared across concurrent phase tasks
/// via `Arc<dyn TelemetrySink>` and must be internally synchronized if they
/// hold mutable state.
pub trait TelemetrySink: Send + Sync {
    /// Called once per `run()`, before the first subtick dispatches.
    fn on_run_start(&self, tick: u64) {
        let _ = tick;
    }

    /// Called when a subtick begins dispatching.
    fn on_subtick_start(&self, tick: u64, subtick: SubtickHandle, name: &str) {
        let _ = (tick, subtick, name);
    }

    /// Called when a subtick finishes dispatching, reporting how many cells
    /// it actually invoked an update callback on.
    fn on_subtick_end(&self, tick: u64, subtick: SubtickHandle, cells_updated: u64) {
        let _ = (tick, subtick, cells_updated);
    }

    /// Called once per parallel phase within a subtick's dispatch, reporting
    /// the phase index and how many tasks it submitted to the worker pool.
    fn on_phase(&self, tick: u64, subtick: SubtickHandle, phase_index: usize, task_count: usize) {
        let _ = (tick, subtick, phase_index, task_count);
    }

    /// Called once per `run()`, after the last subtick completes.
    fn on_run_end(&self, tick: u64) {
        let _ = tick;
    }
}

/// Default sink: discards every event. Zero-cost once inlined.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {}

/// Convenience: an `Arc<dyn TelemetrySink>` pointing at [`NullTelemetrySink`].
#[must_use]
pub fn null_sink() -> Arc<dyn TelemetrySink> {
    Arc::new(NullTelemetrySink)
}

/// Debug sink that writes one JSON-lines record per event to stdout. Meant
/// for local development, not production logging — it does not batch,
/// rate-limit, or redact, and its formatting overhead is unsuitable for a
/// hot inner loop running at real-time tick rates.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutJsonlSink;

impl TelemetrySink for StdoutJsonlSink {
    fn on_run_start(&self, tick: u64) {
        println!("{{\"event\":\"run_start\",\"tick\":{tick}}}");
    }

    fn on_subtick_start(&self, tick: u64, subtick: SubtickHandle, name: &str) {
        println!(
            "{{\"event\":\"subtick_start\",\"tick\":{tick},\"subtick\":{},\"name\":{name:?}}}",
            subtick.raw()
        );
    }

    fn on_subtick_end(&self, tick: u64, subtick: SubtickHandle, cells_updated: u64) {
        println!(
            "{{\"event\":\"subtick_end\",\"tick\":{tick},\"subtick\":{},\"cells_updated\":{cells_updated}}}",
            subtick.raw()
        );
    }

    fn on_phase(&self, tick: u64, subtick: SubtickHandle, phase_index: usize, task_count: usize) {
        println!(
            "{{\"event\":\"phase\",\"tick\":{tick},\"subtick\":{},\"phase_index\":{phase_index},\"task_count\":{task_count}}}",
            subtick.raw()
        );
    }

    fn on_run_end(&self, tick: u64) {
        println!("{{\"event\":\"run_end\",\"tick\":{tick}}}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_accepts_every_event_without_panicking() {
        let sink = NullTelemetrySink;
        sink.on_run_start(0);
        sink.on_subtick_start(0, SubtickHandle::from_raw(0), "movers");
        sink.on_phase(0, SubtickHandle::from_raw(0), 1, 4);
        sink.on_subtick_end(0, SubtickHandle::from_raw(0), 12);
        sink.on_run_end(0);
    }
}
