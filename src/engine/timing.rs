// Stage timing for launch diagnostics

use std::time::{Duration, Instant};

use tracing::debug;

/// Explicit stopwatch handed to the launch pipeline. Each `lap` logs the
/// elapsed time since the previous mark and restarts the clock; `poll` reads
/// without restarting. A value, not shared state: every pipeline run creates
/// and owns its own timer.
#[derive(Debug, Clone)]
pub struct StageTimer {
    mark: Instant,
}

impl StageTimer {
    pub fn start() -> Self {
        Self {
            mark: Instant::now(),
        }
    }

    /// Log `stage` with the elapsed time and restart the clock.
    pub fn lap(&mut self, stage: &str) -> Duration {
        let elapsed = self.mark.elapsed();
        debug!(stage, elapsed_ms = elapsed.as_millis() as u64, "stage timing");
        self.mark = Instant::now();
        elapsed
    }

    /// Elapsed time since the last mark, without restarting.
    pub fn poll(&self) -> Duration {
        self.mark.elapsed()
    }

    pub fn reset(&mut self) {
        self.mark = Instant::now();
    }
}

impl Default for StageTimer {
    fn default() -> Self {
        Self::start()
    }
}
