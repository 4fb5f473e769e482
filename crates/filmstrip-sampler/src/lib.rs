//! Temporal resampling of screenshot sequences onto a display timeline.
//!
//! Sampling runs in two optional stages. The time-range stage keeps the
//! screenshots inside a window plus the one that was on screen when the window
//! opened. The cadence stage then replays that selection on a fixed tick grid,
//! holding the most recent screenshot at every tick. All arithmetic is in
//! integer microseconds; only the labels round.

use std::sync::Arc;

use filmstrip_types::{
    sampling::{DisplayFrame, SamplingPolicy},
    trace::{ParsedTrace, ScreenshotFrame},
};
use tracing::debug;

const MICROS_PER_MILLI: u64 = 1_000;

/// A frame selected by a sampling stage, optionally stamped with a tick time.
#[derive(Debug, Clone)]
struct Emission {
    frame: Arc<ScreenshotFrame>,
    tick_micros: Option<u64>,
}

impl Emission {
    fn captured(frame: &Arc<ScreenshotFrame>) -> Self {
        Self {
            frame: Arc::clone(frame),
            tick_micros: None,
        }
    }

    fn display_timestamp(&self) -> u64 {
        self.tick_micros.unwrap_or(self.frame.timestamp_micros)
    }
}

/// Resamples `trace` under `policy` and labels every frame relative to
/// `display_base` (microseconds).
///
/// Traces with zero or one screenshot are passed through untouched.
pub fn sample(
    trace: &ParsedTrace,
    policy: &SamplingPolicy,
    display_base: u64,
) -> Vec<DisplayFrame> {
    let emissions = if trace.frames.len() <= 1 || policy.is_passthrough() {
        trace.frames.iter().map(Emission::captured).collect()
    } else {
        let selected = if policy.use_time_range_filter {
            filter_time_range(&trace.frames, policy)
        } else {
            trace.frames.clone()
        };

        if policy.use_interval_filtering && selected.len() > 1 {
            let anchor = if policy.use_time_range_filter {
                range_start(&trace.frames, policy)
            } else {
                selected[0].timestamp_micros
            };
            resample(&selected, anchor, policy.interval_ms)
        } else {
            selected.iter().map(Emission::captured).collect()
        }
    };

    debug!(
        "Sampled {} screenshots into {} display frames",
        trace.frames.len(),
        emissions.len()
    );
    finalize(emissions, display_base)
}

/// Base used for relative labels: the start of the time-range window when it
/// is active, otherwise the first screenshot.
pub fn display_base(trace: &ParsedTrace, policy: &SamplingPolicy) -> u64 {
    if policy.use_time_range_filter && !trace.frames.is_empty() {
        range_start(&trace.frames, policy)
    } else {
        trace.start_time
    }
}

fn range_start(frames: &[Arc<ScreenshotFrame>], policy: &SamplingPolicy) -> u64 {
    let origin = frames.first().map(|f| f.timestamp_micros).unwrap_or(0);
    origin.saturating_add(policy.range_start_ms.saturating_mul(MICROS_PER_MILLI))
}

fn range_end(frames: &[Arc<ScreenshotFrame>], policy: &SamplingPolicy) -> u64 {
    let origin = frames.first().map(|f| f.timestamp_micros).unwrap_or(0);
    origin.saturating_add(policy.range_end_ms.saturating_mul(MICROS_PER_MILLI))
}

/// Keeps the screenshot on screen at the window start plus every screenshot
/// captured inside `[start, end]`.
fn filter_time_range(
    frames: &[Arc<ScreenshotFrame>],
    policy: &SamplingPolicy,
) -> Vec<Arc<ScreenshotFrame>> {
    let start = range_start(frames, policy);
    let end = range_end(frames, policy);

    let carry = frames
        .iter()
        .rposition(|frame| frame.timestamp_micros <= start)
        .unwrap_or(0);

    frames
        .iter()
        .enumerate()
        .filter(|(index, frame)| {
            *index == carry || (start..=end).contains(&frame.timestamp_micros)
        })
        .map(|(_, frame)| Arc::clone(frame))
        .collect()
}

/// Step-function resampling on ticks `anchor, anchor + interval, ...` up to the
/// last screenshot. When the grid does not land on the last screenshot, one
/// extra tick carrying it is appended.
fn resample(frames: &[Arc<ScreenshotFrame>], anchor: u64, interval_ms: u64) -> Vec<Emission> {
    let Some(last) = frames.last() else {
        return Vec::new();
    };
    // A zero cadence would never advance the clock.
    let step = interval_ms.max(1).saturating_mul(MICROS_PER_MILLI);
    let duration = last.timestamp_micros.saturating_sub(anchor);

    let mut emissions = Vec::with_capacity((duration / step) as usize + 2);
    let mut cursor = 0usize;
    let mut offset = 0u64;
    while offset <= duration {
        let tick = anchor + offset;
        while cursor + 1 < frames.len() && frames[cursor + 1].timestamp_micros <= tick {
            cursor += 1;
        }
        emissions.push(Emission {
            frame: Arc::clone(&frames[cursor]),
            tick_micros: Some(tick),
        });
        offset += step;
    }

    let last_tick = emissions
        .last()
        .map(Emission::display_timestamp)
        .unwrap_or(anchor);
    if last.timestamp_micros > last_tick {
        emissions.push(Emission {
            frame: Arc::clone(last),
            tick_micros: Some(anchor.saturating_add(offset)),
        });
    }
    emissions
}

fn finalize(emissions: Vec<Emission>, display_base: u64) -> Vec<DisplayFrame> {
    let mut previous: Option<u64> = None;
    emissions
        .into_iter()
        .enumerate()
        .map(|(index, emission)| {
            let display_timestamp = emission.display_timestamp();
            let delta_ms = previous
                .map(|prev| micros_to_ms(signed_diff(display_timestamp, prev)))
                .unwrap_or(0.0);
            previous = Some(display_timestamp);
            DisplayFrame {
                source: emission.frame,
                index,
                display_timestamp_micros: display_timestamp,
                relative_time: format_timestamp(display_timestamp, display_base),
                delta_ms,
                resampled: emission.tick_micros.is_some(),
            }
        })
        .collect()
}

fn signed_diff(a: u64, b: u64) -> i64 {
    (a as i128 - b as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

fn micros_to_ms(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_MILLI as f64
}

/// Formats `timestamp - base` (microseconds): `"500ms"` below one second,
/// `"1.50s"` from one second up.
pub fn format_timestamp(timestamp: u64, base: u64) -> String {
    let millis = micros_to_ms(signed_diff(timestamp, base));
    if millis < 1_000.0 {
        // Half-way values round up, also for negative offsets.
        format!("{}ms", (millis + 0.5).floor() as i64)
    } else {
        // Centiseconds, half-way values rounded up.
        let centis = (millis / 10.0 + 0.5).floor() as i64;
        format!("{}.{:02}s", centis / 100, centis % 100)
    }
}

/// Milliseconds between two captured screenshots.
pub fn time_delta_ms(current: &ScreenshotFrame, previous: &ScreenshotFrame) -> f64 {
    micros_to_ms(signed_diff(current.timestamp_micros, previous.timestamp_micros))
}

/// Label for a cadence setting, e.g. `"100ms"` or `"1.5s"`.
pub fn interval_label(interval_ms: u64) -> String {
    if interval_ms >= 1_000 {
        let tenths = (interval_ms + 50) / 100;
        format!("{}.{}s", tenths / 10, tenths % 10)
    } else {
        format!("{interval_ms}ms")
    }
}

/// Total capture span of the trace as a display label.
pub fn total_duration_label(trace: &ParsedTrace) -> String {
    format_timestamp(trace.end_time, trace.start_time)
}
