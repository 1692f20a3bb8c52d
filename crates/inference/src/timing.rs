use std::fmt;
use std::time::{Duration, Instant};

/// Duration statistics over the repeated runs of one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub count: u32,
    pub total_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            count: 0,
            total_ms: 0.0,
            min_ms: f64::INFINITY,
            max_ms: 0.0,
        }
    }
}

impl RunStats {
    pub fn record(&mut self, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.count += 1;
        self.total_ms += ms;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);
    }

    /// Time `f` and record the duration, returning its result and the duration.
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> (T, Duration) {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        self.record(elapsed);
        (result, elapsed)
    }

    pub fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }

    /// Smallest recorded duration, 0 when nothing was recorded
    pub fn min(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.min_ms }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Repeat {} times, avg time per run is {:.3} ms",
            self.count,
            self.avg_ms()
        )?;
        write!(
            f,
            "max time is {:.3} ms, min time is {:.3} ms",
            self.max_ms,
            self.min()
        )
    }
}
