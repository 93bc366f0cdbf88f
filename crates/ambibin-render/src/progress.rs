//! Progress accounting for the two-pass renderer.
//!
//! Both passes feed one combined counter. Consumers see integer
//! percentages: an event is emitted only when the percentage increases,
//! and a final 100% event is always emitted regardless of rounding, so
//! the reported sequence is non-decreasing and ends at exactly 100.

/// Receives integer-percentage progress events.
pub trait ProgressSink {
    /// Called with a percentage in `0..=100`, non-decreasing over a render.
    fn progress(&mut self, percent: u32);
}

/// A sink that discards all events.
#[derive(Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn progress(&mut self, _percent: u32) {}
}

/// Tracks ticks against a fixed total and forwards increasing integer
/// percentages to a sink.
pub struct ProgressReporter<'a> {
    total: u64,
    current: u64,
    last_emitted: u32,
    sink: &'a mut dyn ProgressSink,
}

impl<'a> ProgressReporter<'a> {
    /// Create a reporter expecting `total` ticks overall.
    pub fn new(total: u64, sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            total: total.max(1),
            current: 0,
            last_emitted: 0,
            sink,
        }
    }

    /// Record one unit of work, emitting an event if the integer
    /// percentage increased.
    pub fn tick(&mut self) {
        self.current += 1;
        let percent = ((self.current * 100) / self.total).min(100) as u32;
        if percent > self.last_emitted {
            self.last_emitted = percent;
            self.sink.progress(percent);
        }
    }

    /// Unconditionally emit the final 100% event.
    pub fn finish(&mut self) {
        self.last_emitted = 100;
        self.sink.progress(100);
    }
}
