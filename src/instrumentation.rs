//! Explicit instrumentation context (ambient).
//!
//! Counters and stage timings are threaded through `Prover`/`Verifier` as
//! an explicit value rather than read/written through a global logger or
//! timer singleton, so two provers can run concurrently in one process
//! without contending on shared state. Spans are emitted via `tracing`.

use std::time::{Duration, Instant};
use tracing::{info, info_span};

/// Per-run counters and timings collected during a single prove or verify
/// call.
#[derive(Default, Debug, Clone)]
pub struct Instrumentation {
    /// Wall-clock time spent in execution/constraint-lowering, per stage.
    pub stage_durations: Vec<(&'static str, Duration)>,
    /// Number of linear rows retired from the witness arena.
    pub linear_rows: usize,
    /// Number of quadratic row triples retired from the witness arena.
    pub quadratic_rows: usize,
    /// Number of Merkle spot-check positions sampled during disclosure.
    pub spot_checks: usize,
}

impl Instrumentation {
    /// A fresh, empty instrumentation context.
    pub fn new() -> Self {
        Instrumentation::default()
    }

    /// Time `f`, recording its duration under `stage`, and emit a
    /// `tracing` span so the timing shows up in any subscriber the caller
    /// has installed (see `bin/prover.rs`'s `tracing_subscriber::fmt` init).
    pub fn time_stage<T>(&mut self, stage: &'static str, f: impl FnOnce() -> T) -> T {
        let span = info_span!("stage", name = stage);
        let _enter = span.enter();
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        info!(stage, elapsed_ms = elapsed.as_millis() as u64, "stage complete");
        self.stage_durations.push((stage, elapsed));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_stage_records_duration_and_returns_value() {
        let mut inst = Instrumentation::new();
        let result = inst.time_stage("test-stage", || 2 + 2);
        assert_eq!(result, 4);
        assert_eq!(inst.stage_durations.len(), 1);
        assert_eq!(inst.stage_durations[0].0, "test-stage");
    }
}
