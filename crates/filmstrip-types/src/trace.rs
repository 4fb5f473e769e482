use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Image encodings a screenshot payload can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Jpeg => f.write_str("jpeg"),
            ImageFormat::Png => f.write_str("png"),
        }
    }
}

/// One screenshot pulled out of a trace. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotFrame {
    pub timestamp_micros: u64,
    /// Base64 payload without any `data:` prefix.
    pub data: String,
    pub format: ImageFormat,
}

impl ScreenshotFrame {
    pub fn new(timestamp_micros: u64, data: impl Into<String>, format: ImageFormat) -> Self {
        Self {
            timestamp_micros,
            data: data.into(),
            format,
        }
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.data)
    }
}

/// Screenshots of a single trace, sorted by capture time.
#[derive(Debug, Clone, Default)]
pub struct ParsedTrace {
    pub frames: Vec<Arc<ScreenshotFrame>>,
    pub start_time: u64,
    pub end_time: u64,
    pub duration_micros: u64,
    pub frame_count: usize,
}

impl ParsedTrace {
    /// Builds a trace from frames in event order. The sort is stable, so
    /// frames sharing a timestamp keep their original relative order.
    pub fn from_frames(mut frames: Vec<ScreenshotFrame>) -> Self {
        frames.sort_by_key(|frame| frame.timestamp_micros);
        let (start_time, end_time) = match (frames.first(), frames.last()) {
            (Some(first), Some(last)) => (first.timestamp_micros, last.timestamp_micros),
            _ => (0, 0),
        };
        let frame_count = frames.len();
        Self {
            frames: frames.into_iter().map(Arc::new).collect(),
            start_time,
            end_time,
            duration_micros: end_time - start_time,
            frame_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Capture span in whole milliseconds, rounded up so the last screenshot
    /// stays inside a window that ends at this value.
    pub fn duration_ms(&self) -> u64 {
        self.duration_micros.div_ceil(1000)
    }

    pub fn summary(&self) -> TraceSummary {
        TraceSummary {
            start_time: self.start_time,
            end_time: self.end_time,
            duration_micros: self.duration_micros,
            frame_count: self.frame_count,
        }
    }
}

/// Serializable bounds of a parsed trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub start_time: u64,
    pub end_time: u64,
    pub duration_micros: u64,
    pub frame_count: usize,
}

/// A loaded trace file together with its upload metadata.
#[derive(Debug, Clone)]
pub struct TraceFile {
    pub id: Uuid,
    pub name: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub trace: ParsedTrace,
}

impl TraceFile {
    pub fn new(name: impl Into<String>, size_bytes: u64, trace: ParsedTrace) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size_bytes,
            uploaded_at: Utc::now(),
            trace,
        }
    }
}
