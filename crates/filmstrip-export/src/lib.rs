//! Rasterizes sampled screenshot sequences into shareable images.
//!
//! Two artifacts are supported: a PNG montage with every frame laid out side by
//! side, and a looping GIF that plays the frames in order. Exports are
//! all-or-nothing; if any frame cannot be decoded no bytes are produced.

pub mod animation;
pub mod decode;
pub mod label;
pub mod montage;
pub mod palette;

use chrono::Utc;
use filmstrip_types::{
    export::{ExportArtifact, ExportKind, ExportSettings},
    sampling::DisplayFrame,
    FilmstripError, Result,
};
use tracing::{info, warn};

pub use decode::{EmbeddedImageDecoder, FrameDecoder};

/// Builds export artifacts using a pluggable frame decoder.
#[derive(Debug, Clone, Default)]
pub struct Compositor<D = EmbeddedImageDecoder> {
    decoder: D,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: FrameDecoder> Compositor<D> {
    pub fn with_decoder(decoder: D) -> Self {
        Self { decoder }
    }

    pub fn compose_montage(
        &self,
        frames: &[DisplayFrame],
        settings: &ExportSettings,
    ) -> Result<Vec<u8>> {
        ensure_frames_present(frames)?;
        montage::compose(&self.decoder, frames, settings)
    }

    pub fn compose_animation(
        &self,
        frames: &[DisplayFrame],
        settings: &ExportSettings,
    ) -> Result<Vec<u8>> {
        ensure_frames_present(frames)?;
        animation::compose(&self.decoder, frames, settings)
    }

    /// Composes `kind` and wraps the bytes with a MIME type and file name.
    pub fn export(
        &self,
        kind: ExportKind,
        frames: &[DisplayFrame],
        settings: &ExportSettings,
    ) -> Result<ExportArtifact> {
        let bytes = match kind {
            ExportKind::Montage => self.compose_montage(frames, settings),
            ExportKind::Animation => self.compose_animation(frames, settings),
        }
        .map_err(|err| {
            warn!("{kind} export failed: {err}");
            err
        })?;
        let artifact = ExportArtifact::new(kind, bytes, Utc::now().timestamp_millis());
        info!(
            "Exported {} ({} bytes)",
            artifact.file_name,
            artifact.bytes.len()
        );
        Ok(artifact)
    }
}

/// Montage PNG using the default decoder.
pub fn compose_montage(frames: &[DisplayFrame], settings: &ExportSettings) -> Result<Vec<u8>> {
    Compositor::new().compose_montage(frames, settings)
}

/// Animated GIF using the default decoder.
pub fn compose_animation(frames: &[DisplayFrame], settings: &ExportSettings) -> Result<Vec<u8>> {
    Compositor::new().compose_animation(frames, settings)
}

/// Generate an error aligned with export semantics.
pub fn export_error(index: usize, reason: impl Into<String>) -> FilmstripError {
    FilmstripError::ExportFailed {
        index,
        reason: reason.into(),
    }
}

fn ensure_frames_present(frames: &[DisplayFrame]) -> Result<()> {
    if frames.is_empty() {
        Err(FilmstripError::EmptyExport)
    } else {
        Ok(())
    }
}
