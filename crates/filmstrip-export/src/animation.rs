use std::borrow::Cow;

use anyhow::Context;
use filmstrip_types::{export::ExportSettings, sampling::DisplayFrame, FilmstripError, Result};
use gif::{Encoder, Frame, Repeat};
use image::{imageops, imageops::FilterType, Rgba, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    decode::{decode_all, FrameDecoder},
    label,
    montage::scaled_width,
    palette::GlobalPalette,
};

/// Animated frames are rendered at twice the configured strip height.
pub const ANIMATION_SCALE: u32 = 2;
pub const ANIMATION_LABEL_HEIGHT: u32 = 60;
const ANIMATION_LABEL_SCALE: u32 = 3;
/// Per-frame display time in hundredths of a second.
pub const FRAME_DELAY_CS: u16 = 50;
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Renders each frame onto an equally sized canvas and encodes a looping GIF
/// with a single global palette.
pub(crate) fn compose<D: FrameDecoder>(
    decoder: &D,
    frames: &[DisplayFrame],
    settings: &ExportSettings,
) -> Result<Vec<u8>> {
    let images = decode_all(decoder, frames, |image| image.to_rgba8())?;
    let Some(first) = images.first() else {
        return Err(FilmstripError::EmptyExport);
    };

    let image_height = settings.frame_height_px.saturating_mul(ANIMATION_SCALE);
    let (first_width, first_height) = first.dimensions();
    let width = scaled_width(first_width, first_height, image_height);
    let label_height = if settings.show_timestamps {
        ANIMATION_LABEL_HEIGHT
    } else {
        0
    };
    let height = image_height.saturating_add(label_height);

    let gif_width = u16::try_from(width).context("animation canvas is wider than GIF allows")?;
    let gif_height = u16::try_from(height).context("animation canvas is taller than GIF allows")?;
    info!(
        "Composing animation of {} frames at {}x{}",
        images.len(),
        width,
        height
    );

    let canvases: Vec<RgbaImage> = images
        .par_iter()
        .zip(frames.par_iter())
        .map(|(image, frame)| {
            let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
            let scaled = imageops::resize(image, width, image_height, FilterType::CatmullRom);
            imageops::overlay(&mut canvas, &scaled, 0, 0);
            if settings.show_timestamps {
                let label_top = image_height
                    + (label_height - label::GLYPH_HEIGHT * ANIMATION_LABEL_SCALE) / 2;
                label::draw_centered(
                    &mut canvas,
                    &frame.relative_time,
                    width / 2,
                    label_top,
                    ANIMATION_LABEL_SCALE,
                );
            }
            canvas
        })
        .collect();

    let palette = GlobalPalette::from_frames(&canvases);
    let palette_rgb = palette.rgb();
    debug!("Global palette holds {} colors", palette_rgb.len() / 3);

    let mut encoder = Encoder::new(Vec::new(), gif_width, gif_height, &palette_rgb)
        .context("failed to start GIF stream")?;
    encoder
        .set_repeat(Repeat::Infinite)
        .context("failed to mark GIF as looping")?;
    for canvas in &canvases {
        let frame = Frame {
            width: gif_width,
            height: gif_height,
            delay: FRAME_DELAY_CS,
            buffer: Cow::Owned(palette.index_frame(canvas)),
            ..Frame::default()
        };
        encoder
            .write_frame(&frame)
            .context("failed to write GIF frame")?;
    }
    let bytes = encoder.into_inner().context("failed to finish GIF stream")?;
    Ok(bytes)
}
