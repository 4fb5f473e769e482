use std::fmt;

use serde::{Deserialize, Serialize};

/// Rendering knobs shared by the montage and animation exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub frame_height_px: u32,
    pub padding_px: u32,
    pub show_timestamps: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            frame_height_px: 200,
            padding_px: 10,
            show_timestamps: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Single PNG with every frame laid out side by side.
    #[default]
    Montage,
    /// Looping GIF, one frame per display frame.
    Animation,
}

impl ExportKind {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportKind::Montage => "image/png",
            ExportKind::Animation => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Montage => "png",
            ExportKind::Animation => "gif",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::Montage => f.write_str("montage"),
            ExportKind::Animation => f.write_str("animation"),
        }
    }
}

/// Encoded export ready to hand to a save/download action.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub kind: ExportKind,
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl ExportArtifact {
    /// Names the artifact `film-strip-<millis>.<ext>`.
    pub fn new(kind: ExportKind, bytes: Vec<u8>, created_at_millis: i64) -> Self {
        Self {
            kind,
            bytes,
            file_name: format!("film-strip-{created_at_millis}.{}", kind.extension()),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_naming_follows_kind() {
        let png = ExportArtifact::new(ExportKind::Montage, vec![1, 2], 1_700_000_000_000);
        assert_eq!(png.file_name, "film-strip-1700000000000.png");
        assert_eq!(png.mime_type(), "image/png");

        let gif = ExportArtifact::new(ExportKind::Animation, Vec::new(), 42);
        assert_eq!(gif.file_name, "film-strip-42.gif");
        assert_eq!(gif.mime_type(), "image/gif");
    }
}
