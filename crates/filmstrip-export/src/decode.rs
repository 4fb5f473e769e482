use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use filmstrip_types::{
    sampling::DisplayFrame,
    trace::{ImageFormat, ScreenshotFrame},
    Result,
};
use image::{DynamicImage, RgbaImage};
use rayon::prelude::*;

use crate::export_error;

/// Turns a screenshot payload into pixels.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, frame: &ScreenshotFrame) -> anyhow::Result<DynamicImage>;
}

/// Decodes base64 PNG/JPEG payloads with the `image` crate.
///
/// The declared format is only a hint; the encoded bytes are sniffed first.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedImageDecoder;

impl FrameDecoder for EmbeddedImageDecoder {
    fn decode(&self, frame: &ScreenshotFrame) -> anyhow::Result<DynamicImage> {
        let bytes = STANDARD
            .decode(frame.data.trim())
            .context("payload is not valid base64")?;
        let image = match image::guess_format(&bytes) {
            Ok(_) => image::load_from_memory(&bytes),
            Err(_) => image::load_from_memory_with_format(&bytes, declared_format(frame.format)),
        }
        .with_context(|| format!("unable to decode {} screenshot", frame.format))?;
        Ok(image)
    }
}

fn declared_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
    }
}

/// Decodes every frame in parallel and applies `prepare` to each result.
///
/// All frames are attempted; the error of the earliest failing frame is
/// returned.
pub(crate) fn decode_all<D, F>(
    decoder: &D,
    frames: &[DisplayFrame],
    prepare: F,
) -> Result<Vec<RgbaImage>>
where
    D: FrameDecoder,
    F: Fn(DynamicImage) -> RgbaImage + Sync,
{
    let results: Vec<Result<RgbaImage>> = frames
        .par_iter()
        .enumerate()
        .map(|(index, frame)| {
            decoder
                .decode(&frame.source)
                .map(&prepare)
                .map_err(|err| export_error(index, format!("{err:#}")))
        })
        .collect();
    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base64() {
        let frame = ScreenshotFrame::new(0, "not base64!", ImageFormat::Png);
        let err = EmbeddedImageDecoder.decode(&frame).expect_err("invalid payload");
        assert!(format!("{err:#}").contains("base64"));
    }

    #[test]
    fn rejects_truncated_jpeg() {
        let frame = ScreenshotFrame::new(0, "/9j/AAAA", ImageFormat::Jpeg);
        assert!(EmbeddedImageDecoder.decode(&frame).is_err());
    }
}
