use std::io::Cursor;

use anyhow::Context;
use filmstrip_types::{export::ExportSettings, sampling::DisplayFrame, Result};
use image::{imageops, imageops::FilterType, DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use tracing::info;

use crate::{
    decode::{decode_all, FrameDecoder},
    label,
};

pub const MONTAGE_LABEL_HEIGHT: u32 = 30;
const MONTAGE_LABEL_SCALE: u32 = 2;
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Width of a frame scaled to `target_height` with its aspect ratio kept.
pub fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    if height == 0 {
        return 1;
    }
    let scaled = (u64::from(width) * u64::from(target_height) + u64::from(height) / 2)
        / u64::from(height);
    scaled.clamp(1, u64::from(u32::MAX)) as u32
}

/// Canvas dimensions for `tiles` laid out in a row, or `None` on overflow.
fn canvas_size(
    tiles: &[RgbaImage],
    settings: &ExportSettings,
    label_height: u32,
) -> Option<(u32, u32)> {
    let padding = settings.padding_px;
    let gaps = u32::try_from(tiles.len()).ok()?.checked_add(1)?;
    let width = tiles
        .iter()
        .try_fold(0u32, |sum, tile| sum.checked_add(tile.width()))?
        .checked_add(padding.checked_mul(gaps)?)?;
    let height = settings
        .frame_height_px
        .checked_add(label_height)?
        .checked_add(padding.checked_mul(2)?)?;
    Some((width, height))
}

/// Lays every frame out left to right on a white canvas and encodes it as PNG.
pub(crate) fn compose<D: FrameDecoder>(
    decoder: &D,
    frames: &[DisplayFrame],
    settings: &ExportSettings,
) -> Result<Vec<u8>> {
    let target_height = settings.frame_height_px;
    let padding = settings.padding_px;
    let label_height = if settings.show_timestamps {
        MONTAGE_LABEL_HEIGHT
    } else {
        0
    };

    let tiles = decode_all(decoder, frames, |image| {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let width = scaled_width(width, height, target_height);
        imageops::resize(&rgba, width, target_height, FilterType::Triangle)
    })?;

    let (canvas_width, canvas_height) = canvas_size(&tiles, settings, label_height)
        .context("montage canvas exceeds the maximum image size")?;
    info!(
        "Composing montage of {} frames on {}x{} canvas",
        tiles.len(),
        canvas_width,
        canvas_height
    );

    let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, BACKGROUND);
    let mut x_offset = padding;
    for (tile, frame) in tiles.iter().zip(frames) {
        imageops::overlay(&mut canvas, tile, i64::from(x_offset), i64::from(padding));
        if settings.show_timestamps {
            let label_top = padding
                + target_height
                + (label_height - label::GLYPH_HEIGHT * MONTAGE_LABEL_SCALE) / 2;
            label::draw_centered(
                &mut canvas,
                &frame.relative_time,
                x_offset + tile.width() / 2,
                label_top,
                MONTAGE_LABEL_SCALE,
            );
        }
        x_offset += tile.width() + padding;
    }

    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .context("failed to encode montage PNG")?;
    Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_width_keeps_aspect_ratio() {
        assert_eq!(scaled_width(40, 30, 60), 80);
        assert_eq!(scaled_width(1920, 1080, 200), 356);
        assert_eq!(scaled_width(1, 1000, 10), 1);
        assert_eq!(scaled_width(10, 0, 10), 1);
    }

    #[test]
    fn canvas_size_includes_outer_padding() {
        let tiles = vec![RgbaImage::new(80, 60), RgbaImage::new(40, 60)];
        let settings = ExportSettings {
            frame_height_px: 60,
            padding_px: 5,
            show_timestamps: true,
        };
        assert_eq!(
            canvas_size(&tiles, &settings, MONTAGE_LABEL_HEIGHT),
            Some((135, 100))
        );
    }

    #[test]
    fn canvas_size_overflow_is_detected() {
        let tiles = vec![RgbaImage::new(1, 1), RgbaImage::new(1, 1)];
        let wide = ExportSettings {
            frame_height_px: 1,
            padding_px: u32::MAX / 2,
            show_timestamps: false,
        };
        assert_eq!(canvas_size(&tiles, &wide, 0), None);

        let tall = ExportSettings {
            frame_height_px: u32::MAX,
            padding_px: 0,
            show_timestamps: true,
        };
        assert_eq!(canvas_size(&tiles, &tall, MONTAGE_LABEL_HEIGHT), None);
    }
}
