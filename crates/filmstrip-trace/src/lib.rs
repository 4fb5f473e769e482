//! Screenshot extraction from browser performance traces.

pub mod format;

use filmstrip_types::{
    trace::{ParsedTrace, ScreenshotFrame},
    FilmstripError, Result,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

pub use format::{detect, strip_data_uri};

const TRACE_EVENTS_KEY: &str = "traceEvents";
const SCREENSHOT_CATEGORY: &str = "disabled-by-default-devtools.screenshot";

/// Event shapes known to carry a screenshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenshotEvent<'a> {
    /// `Screenshot` in the devtools screenshot category, raw base64 in `args.snapshot`.
    Snapshot(&'a str),
    /// `ScreencastFrame` (any casing) or `CaptureFrame`, data URI or base64 in
    /// `args.dataUri` / `args.data`.
    Frame(&'a str),
}

impl<'a> ScreenshotEvent<'a> {
    fn classify(event: &'a Map<String, Value>) -> Option<Self> {
        let name = event.get("name").and_then(Value::as_str)?;
        let args = event.get("args").and_then(Value::as_object);

        if name == "Screenshot" {
            let category = event.get("cat").and_then(Value::as_str).unwrap_or_default();
            if !category.contains(SCREENSHOT_CATEGORY) {
                return None;
            }
            return non_empty_str(args?, "snapshot").map(ScreenshotEvent::Snapshot);
        }

        if name.eq_ignore_ascii_case("ScreencastFrame") || name == "CaptureFrame" {
            let args = args?;
            return non_empty_str(args, "dataUri")
                .or_else(|| non_empty_str(args, "data"))
                .map(ScreenshotEvent::Frame);
        }

        None
    }

    fn into_frame(self, timestamp_micros: u64) -> ScreenshotFrame {
        match self {
            ScreenshotEvent::Snapshot(data) => {
                ScreenshotFrame::new(timestamp_micros, data, detect(data))
            }
            ScreenshotEvent::Frame(payload) => {
                ScreenshotFrame::new(timestamp_micros, strip_data_uri(payload), detect(payload))
            }
        }
    }
}

fn non_empty_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Reads the `ts` field in microseconds. Missing or negative values map to 0
/// and fractional values are rounded.
fn event_timestamp(event: &Map<String, Value>) -> u64 {
    match event.get("ts") {
        Some(Value::Number(number)) => number.as_u64().unwrap_or_else(|| {
            number
                .as_f64()
                .filter(|ts| ts.is_finite() && *ts > 0.0)
                .map(|ts| ts.round() as u64)
                .unwrap_or(0)
        }),
        _ => 0,
    }
}

/// Extracts every screenshot from a decoded trace document.
///
/// The trace shape is validated strictly: a non-object root yields
/// [`FilmstripError::InvalidFormat`] and a non-array `traceEvents` yields
/// [`FilmstripError::InvalidEventList`]. Individual events are handled
/// leniently; anything that is not a recognised screenshot event is skipped.
pub fn extract(raw_trace: &Value) -> Result<ParsedTrace> {
    let root = raw_trace.as_object().ok_or(FilmstripError::InvalidFormat)?;
    let events: &[Value] = match root.get(TRACE_EVENTS_KEY) {
        None | Some(Value::Null) => &[],
        Some(Value::Array(events)) => events,
        Some(_) => return Err(FilmstripError::InvalidEventList),
    };

    let mut frames = Vec::new();
    let mut skipped = 0usize;
    for event in events {
        let Some(event) = event.as_object() else {
            skipped += 1;
            continue;
        };
        match ScreenshotEvent::classify(event) {
            Some(shape) => frames.push(shape.into_frame(event_timestamp(event))),
            None => skipped += 1,
        }
    }
    debug!(
        "Skipped {} of {} trace events without screenshots",
        skipped,
        events.len()
    );

    let trace = ParsedTrace::from_frames(frames);
    info!(
        "Extracted {} screenshots spanning {}us",
        trace.frame_count, trace.duration_micros
    );
    Ok(trace)
}

/// Parses trace text and extracts its screenshots.
pub fn extract_from_str(contents: &str) -> Result<ParsedTrace> {
    let value: Value = serde_json::from_str(contents).map_err(|err| {
        debug!("Trace is not valid JSON: {err}");
        FilmstripError::InvalidFormat
    })?;
    extract(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filmstrip_types::trace::ImageFormat;
    use serde_json::json;

    fn screenshot_event(ts: u64, snapshot: &str) -> Value {
        json!({
            "name": "Screenshot",
            "cat": "disabled-by-default-devtools.screenshot",
            "ph": "O",
            "ts": ts,
            "args": { "snapshot": snapshot }
        })
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(matches!(extract(&json!([1, 2, 3])), Err(FilmstripError::InvalidFormat)));
        assert!(matches!(extract(&json!("trace")), Err(FilmstripError::InvalidFormat)));
        assert!(matches!(extract(&Value::Null), Err(FilmstripError::InvalidFormat)));
    }

    #[test]
    fn rejects_non_array_event_list() {
        let trace = json!({ "traceEvents": { "name": "Screenshot" } });
        assert!(matches!(extract(&trace), Err(FilmstripError::InvalidEventList)));
    }

    #[test]
    fn missing_event_list_is_empty() {
        let trace = extract(&json!({ "metadata": {} })).expect("extract");
        assert!(trace.frames.is_empty());
        assert_eq!(trace.start_time, 0);
        assert_eq!(trace.end_time, 0);
        assert_eq!(trace.duration_micros, 0);
    }

    #[test]
    fn trace_without_screenshots_has_zero_bounds() {
        let trace = extract(&json!({
            "traceEvents": [
                { "name": "Layout", "cat": "devtools.timeline", "ts": 10 },
                { "name": "Paint", "cat": "devtools.timeline", "ts": 20 }
            ]
        }))
        .expect("extract");
        assert!(trace.frames.is_empty());
        assert_eq!(trace.frame_count, 0);
        assert_eq!((trace.start_time, trace.end_time, trace.duration_micros), (0, 0, 0));
    }

    #[test]
    fn sorts_screenshots_by_timestamp() {
        let trace = extract(&json!({
            "traceEvents": [
                screenshot_event(3_000_000, "/9j/c"),
                screenshot_event(1_000_000, "/9j/a"),
                screenshot_event(2_000_000, "/9j/b")
            ]
        }))
        .expect("extract");
        let stamps: Vec<u64> = trace.frames.iter().map(|f| f.timestamp_micros).collect();
        assert_eq!(stamps, vec![1_000_000, 2_000_000, 3_000_000]);
        assert_eq!(trace.start_time, 1_000_000);
        assert_eq!(trace.end_time, 3_000_000);
        assert_eq!(trace.duration_micros, 2_000_000);
        assert!(trace.start_time <= trace.end_time);
    }

    #[test]
    fn screenshot_requires_devtools_category() {
        let trace = extract(&json!({
            "traceEvents": [
                { "name": "Screenshot", "cat": "devtools.timeline", "ts": 1, "args": { "snapshot": "/9j/a" } },
                { "name": "Screenshot", "cat": "foo,disabled-by-default-devtools.screenshot", "ts": 2, "args": { "snapshot": "iVBORa" } }
            ]
        }))
        .expect("extract");
        assert_eq!(trace.frame_count, 1);
        assert_eq!(trace.frames[0].timestamp_micros, 2);
        assert_eq!(trace.frames[0].format, ImageFormat::Png);
    }

    #[test]
    fn screencast_frames_strip_data_uri() {
        let trace = extract(&json!({
            "traceEvents": [
                { "name": "ScreencastFrame", "ts": 10, "args": { "dataUri": "data:image/png;base64,AAAA" } },
                { "name": "screencastFrame", "ts": 20, "args": { "data": "/9j/BBBB" } },
                { "name": "SCREENCASTFRAME", "ts": 30, "args": { "dataUri": "", "data": "iVBORCCCC" } }
            ]
        }))
        .expect("extract");
        let frames: Vec<(&str, ImageFormat)> = trace
            .frames
            .iter()
            .map(|f| (f.data.as_str(), f.format))
            .collect();
        assert_eq!(
            frames,
            vec![
                ("AAAA", ImageFormat::Png),
                ("/9j/BBBB", ImageFormat::Jpeg),
                ("iVBORCCCC", ImageFormat::Png)
            ]
        );
    }

    #[test]
    fn capture_frames_are_extracted() {
        let trace = extract(&json!({
            "traceEvents": [
                { "name": "CaptureFrame", "ts": 5, "args": { "data": "data:image/jpeg;base64,/9j/x" } }
            ]
        }))
        .expect("extract");
        assert_eq!(trace.frame_count, 1);
        assert_eq!(trace.frames[0].data, "/9j/x");
        assert_eq!(trace.frames[0].format, ImageFormat::Jpeg);
    }

    #[test]
    fn malformed_events_are_skipped() {
        let trace = extract(&json!({
            "traceEvents": [
                null,
                42,
                "Screenshot",
                { "name": "Screenshot", "cat": "disabled-by-default-devtools.screenshot", "ts": 1 },
                { "name": "Screenshot", "cat": "disabled-by-default-devtools.screenshot", "ts": 2, "args": { "snapshot": 7 } },
                { "name": "ScreencastFrame", "ts": 3, "args": {} },
                { "name": "CaptureFrame", "ts": 4 },
                screenshot_event(9, "/9j/ok")
            ]
        }))
        .expect("extract");
        assert_eq!(trace.frame_count, 1);
        assert_eq!(trace.frames[0].data, "/9j/ok");
    }

    #[test]
    fn missing_timestamp_defaults_to_zero() {
        let trace = extract(&json!({
            "traceEvents": [
                { "name": "Screenshot", "cat": "disabled-by-default-devtools.screenshot", "args": { "snapshot": "/9j/a" } },
                { "name": "CaptureFrame", "ts": 1500.6, "args": { "data": "/9j/b" } }
            ]
        }))
        .expect("extract");
        let stamps: Vec<u64> = trace.frames.iter().map(|f| f.timestamp_micros).collect();
        assert_eq!(stamps, vec![0, 1501]);
    }

    #[test]
    fn extract_from_str_rejects_invalid_json() {
        assert!(matches!(extract_from_str("{ not json"), Err(FilmstripError::InvalidFormat)));
        let trace = extract_from_str(r#"{"traceEvents": []}"#).expect("extract");
        assert!(trace.is_empty());
    }
}
