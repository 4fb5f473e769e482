use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::trace::ScreenshotFrame;

/// Filtering knobs applied to a trace before display or export.
///
/// Range bounds and the cadence are in milliseconds relative to the first
/// screenshot of the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPolicy {
    pub use_time_range_filter: bool,
    pub range_start_ms: u64,
    pub range_end_ms: u64,
    pub use_interval_filtering: bool,
    pub interval_ms: u64,
}

impl SamplingPolicy {
    pub const DEFAULT_INTERVAL_MS: u64 = 100;

    /// Clamps the range end to the trace duration. An unset (zero) end is
    /// treated as "until the last screenshot".
    pub fn fit_to_duration(mut self, max_ms: u64) -> Self {
        if self.range_end_ms == 0 || self.range_end_ms > max_ms {
            self.range_end_ms = max_ms;
        }
        self
    }

    pub fn is_passthrough(&self) -> bool {
        !self.use_time_range_filter && !self.use_interval_filtering
    }
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            use_time_range_filter: false,
            range_start_ms: 0,
            range_end_ms: 0,
            use_interval_filtering: false,
            interval_ms: Self::DEFAULT_INTERVAL_MS,
        }
    }
}

/// A screenshot placed on the display timeline.
#[derive(Debug, Clone)]
pub struct DisplayFrame {
    pub source: Arc<ScreenshotFrame>,
    pub index: usize,
    /// Either the capture time or a resampled tick time.
    pub display_timestamp_micros: u64,
    pub relative_time: String,
    pub delta_ms: f64,
    /// Set when the frame was emitted on a cadence tick rather than at its
    /// own capture time.
    pub resampled: bool,
}

impl DisplayFrame {
    /// True for cadence ticks, including ticks that land exactly on a capture.
    pub fn is_synthetic(&self) -> bool {
        self.resampled
    }
}
