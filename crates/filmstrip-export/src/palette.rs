//! Shared colour table for animated exports.

use color_quant::NeuQuant;
use image::RgbaImage;

pub const MAX_COLORS: usize = 256;
/// NeuQuant sampling factor: 1 is slowest and most accurate, 30 fastest.
const SAMPLE_FACTOR: i32 = 10;

/// One palette learned from the pixels of every frame at once, so a colour
/// maps to the same index in each frame.
pub struct GlobalPalette {
    quantizer: NeuQuant,
}

impl GlobalPalette {
    pub fn from_frames(frames: &[RgbaImage]) -> Self {
        let total: usize = frames.iter().map(|frame| frame.as_raw().len()).sum();
        let mut pooled = Vec::with_capacity(total);
        for frame in frames {
            pooled.extend_from_slice(frame.as_raw());
        }
        Self {
            quantizer: NeuQuant::new(SAMPLE_FACTOR, MAX_COLORS, &pooled),
        }
    }

    /// Packed RGB triples, as expected by a GIF global colour table.
    pub fn rgb(&self) -> Vec<u8> {
        self.quantizer.color_map_rgb()
    }

    pub fn index_frame(&self, frame: &RgbaImage) -> Vec<u8> {
        frame
            .as_raw()
            .chunks_exact(4)
            .map(|pixel| self.quantizer.index_of(pixel) as u8)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn palette_is_shared_across_frames() {
        let red = RgbaImage::from_pixel(32, 32, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 255, 255]));
        let palette = GlobalPalette::from_frames(&[red.clone(), blue.clone()]);

        let rgb = palette.rgb();
        assert_eq!(rgb.len(), MAX_COLORS * 3);

        let red_index = palette.index_frame(&red);
        let blue_index = palette.index_frame(&blue);
        assert_eq!(red_index.len(), 32 * 32);
        assert!(red_index.iter().all(|i| *i == red_index[0]));
        assert!(blue_index.iter().all(|i| *i == blue_index[0]));
        assert_ne!(red_index[0], blue_index[0]);

        let entry = |i: u8| &rgb[i as usize * 3..i as usize * 3 + 3];
        assert!(entry(red_index[0])[0] > entry(red_index[0])[2]);
        assert!(entry(blue_index[0])[2] > entry(blue_index[0])[0]);
    }
}
