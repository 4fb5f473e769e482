//! Tiny bitmap font for timestamp labels.
//!
//! Labels only ever contain digits, `.`, `-`, `m` and `s`, so a 5x7 glyph
//! table scaled by an integer factor is enough.

use image::{Rgba, RgbaImage};

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

pub const LABEL_COLOR: Rgba<u8> = Rgba([0x1f, 0x29, 0x37, 0xff]);

const DIGITS: [[u8; 7]; 10] = [
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
];
const DOT: [u8; 7] = [0, 0, 0, 0, 0, 0b01100, 0b01100];
const MINUS: [u8; 7] = [0, 0, 0, 0b11111, 0, 0, 0];
const LOWER_M: [u8; 7] = [0, 0, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001];
const LOWER_S: [u8; 7] = [0, 0, 0b01110, 0b10000, 0b01110, 0b00001, 0b11110];

fn glyph(c: char) -> Option<&'static [u8; 7]> {
    match c {
        '0'..='9' => DIGITS.get(c as usize - '0' as usize),
        '.' => Some(&DOT),
        '-' => Some(&MINUS),
        'm' => Some(&LOWER_M),
        's' => Some(&LOWER_S),
        _ => None,
    }
}

/// Rendered width of `text` in pixels.
pub fn text_width(text: &str, scale: u32) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    (chars * GLYPH_ADVANCE - 1) * scale
}

/// Draws `text` horizontally centered on `center_x` with its top edge at
/// `top`. Pixels falling outside the canvas are dropped; unknown characters
/// render as blanks.
pub fn draw_centered(canvas: &mut RgbaImage, text: &str, center_x: u32, top: u32, scale: u32) {
    let scale = scale.max(1);
    let half_width = text_width(text, scale) / 2;
    let mut pen_x = i64::from(center_x) - i64::from(half_width);

    for c in text.chars() {
        if let Some(rows) = glyph(c) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    let x = pen_x + i64::from(col * scale);
                    let y = i64::from(top) + (row as i64) * i64::from(scale);
                    fill_block(canvas, x, y, scale);
                }
            }
        }
        pen_x += i64::from(GLYPH_ADVANCE * scale);
    }
}

fn fill_block(canvas: &mut RgbaImage, x: i64, y: i64, size: u32) {
    let (width, height) = canvas.dimensions();
    for dy in 0..i64::from(size) {
        for dx in 0..i64::from(size) {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && px < i64::from(width) && py < i64::from(height) {
                canvas.put_pixel(px as u32, py as u32, LABEL_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn width_accounts_for_spacing() {
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("1", 1), 5);
        assert_eq!(text_width("500ms", 2), (5 * 6 - 1) * 2);
    }

    #[test]
    fn draws_inside_label_box() {
        let mut canvas = RgbaImage::from_pixel(60, 20, WHITE);
        draw_centered(&mut canvas, "1.50s", 30, 3, 1);
        let inked: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, px)| **px == LABEL_COLOR)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());
        let half = text_width("1.50s", 1) / 2;
        for (x, y) in inked {
            assert!(x >= 30 - half && x < 30 + half + 1);
            assert!((3..3 + GLYPH_HEIGHT).contains(&y));
        }
    }

    #[test]
    fn clips_at_canvas_edges() {
        let mut canvas = RgbaImage::from_pixel(4, 4, WHITE);
        draw_centered(&mut canvas, "-250ms", 0, 2, 3);
        assert_eq!(canvas.dimensions(), (4, 4));
    }

    #[test]
    fn unknown_characters_are_blank() {
        let mut canvas = RgbaImage::from_pixel(20, 10, WHITE);
        draw_centered(&mut canvas, "??", 10, 1, 1);
        assert!(canvas.pixels().all(|px| *px == WHITE));
    }
}
