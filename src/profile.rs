//! Phase timing.

use std::time::{Duration, Instant};

/// Measures one export phase and logs the elapsed time when dropped.
///
/// Call [`ScopedTimer::stop`] to end the measurement early and get the
/// duration back; the timer then reports once and stays silent on drop.
#[derive(Debug)]
pub struct ScopedTimer {
    name: &'static str,
    start: Instant,
    reported: bool,
}

impl ScopedTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
            reported: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn stop(mut self) -> Duration {
        self.report()
    }

    fn report(&mut self) -> Duration {
        let elapsed = self.start.elapsed();
        if !self.reported {
            self.reported = true;
            log::debug!("[profile] {}: {} ms", self.name, elapsed.as_millis());
        }
        elapsed
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        self.report();
    }
}
