/// Abstraction over time sources. The session timeline runs off elapsed
/// clock time since start, independent of audio buffering state.
pub trait TimeSource {
    /// Milliseconds elapsed from an arbitrary epoch.
    fn now_ms(&self) -> f64;
}

pub struct SystemClock {
    start: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Settable clock for deterministic tests and scripted playback.
pub struct ManualClock {
    current_ms: std::cell::Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            current_ms: std::cell::Cell::new(0.0),
        }
    }

    pub fn set(&self, ms: f64) {
        self.current_ms.set(ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.current_ms.set(self.current_ms.get() + delta_ms);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> f64 {
        self.current_ms.get()
    }
}
