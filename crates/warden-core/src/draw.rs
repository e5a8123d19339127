//! Frame annotation: hollow face boxes and caption text.
//!
//! Text uses a built-in 3×5 bitmap font, upper-cased. Every pixel write is
//! clipped to the frame, so boxes partly or wholly off-frame are safe.

use crate::types::BoundingBox;
use image::{Rgb, RgbImage};

pub const BOX_THICKNESS: i64 = 2;
pub const TEXT_SCALE: i64 = 2;
/// Gap between the caption's bottom edge and the box's top edge.
pub const CAPTION_GAP: i64 = 10;

const GLYPH_W: i64 = 3;
const GLYPH_H: i64 = 5;

fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        ' ' => [0; 5],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        _ => [0b110, 0b001, 0b010, 0b000, 0b010], // '?'
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < img.width() as i64 && y < img.height() as i64 {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn fill(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let x_lo = x0.max(0);
    let y_lo = y0.max(0);
    let x_hi = x1.min(img.width() as i64);
    let y_hi = y1.min(img.height() as i64);
    for y in y_lo..y_hi {
        for x in x_lo..x_hi {
            put(img, x, y, color);
        }
    }
}

/// Pixel size of `text` at `scale`.
pub fn text_size(text: &str, scale: i64) -> (i64, i64) {
    let n = text.chars().count() as i64;
    let width = if n == 0 { 0 } else { (n * (GLYPH_W + 1) - 1) * scale };
    (width, GLYPH_H * scale)
}

/// Draw `text` with its top-left corner at (`x`, `y`).
pub fn draw_text(img: &mut RgbImage, text: &str, x: i64, y: i64, scale: i64, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let origin_x = x + i as i64 * (GLYPH_W + 1) * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                let px = origin_x + col * scale;
                let py = y + row as i64 * scale;
                fill(img, px, py, px + scale, py + scale, color);
            }
        }
    }
}

/// Draw a hollow rectangle covering `[left, right) × [top, bottom)`.
pub fn draw_hollow_rect(
    img: &mut RgbImage,
    (left, top, right, bottom): (i64, i64, i64, i64),
    thickness: i64,
    color: Rgb<u8>,
) {
    fill(img, left, top, right, top + thickness, color);
    fill(img, left, bottom - thickness, right, bottom, color);
    fill(img, left, top, left + thickness, bottom, color);
    fill(img, right - thickness, top, right, bottom, color);
}

/// Box a face and write its caption above it.
pub fn annotate_face(img: &mut RgbImage, face: &BoundingBox, caption: &str, color: Rgb<u8>) {
    let left = face.x.round() as i64;
    let top = face.y.round() as i64;
    let right = (face.x + face.width).round() as i64;
    let bottom = (face.y + face.height).round() as i64;

    draw_hollow_rect(img, (left, top, right, bottom), BOX_THICKNESS, color);

    let (_, text_h) = text_size(caption, TEXT_SCALE);
    let text_y = (top - CAPTION_GAP - text_h).max(0);
    draw_text(img, caption, left.max(0), text_y, TEXT_SCALE, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    #[test]
    fn test_hollow_rect_edges_and_interior() {
        let mut img = RgbImage::new(20, 20);
        draw_hollow_rect(&mut img, (2, 2, 12, 12), 2, RED);
        assert_eq!(*img.get_pixel(2, 2), RED);
        assert_eq!(*img.get_pixel(11, 11), RED);
        assert_eq!(*img.get_pixel(3, 7), RED);
        assert_eq!(*img.get_pixel(7, 7), BLACK);
        assert_eq!(*img.get_pixel(12, 12), BLACK);
    }

    #[test]
    fn test_drawing_off_frame_is_clipped() {
        let mut img = RgbImage::new(10, 10);
        draw_hollow_rect(&mut img, (-50, -50, 500, 500), 2, RED);
        draw_hollow_rect(&mut img, (100, 100, 200, 200), 2, RED);
        draw_text(&mut img, "OFF FRAME", -30, -4, 2, RED);
        annotate_face(&mut img, &BoundingBox::new(-5.0, -5.0, 3.0, 3.0), "x (threat)", RED);
    }

    #[test]
    fn test_text_size() {
        assert_eq!(text_size("", 2), (0, 10));
        assert_eq!(text_size("AB", 1), (7, 5));
        assert_eq!(text_size("AB", 2), (14, 10));
    }

    #[test]
    fn test_draw_text_sets_glyph_pixels() {
        let mut img = RgbImage::new(8, 8);
        draw_text(&mut img, "-", 0, 0, 1, RED);
        // Middle row of '-' is fully lit, the rest is not.
        for x in 0..3 {
            assert_eq!(*img.get_pixel(x, 2), RED);
            assert_eq!(*img.get_pixel(x, 1), BLACK);
        }
    }

    #[test]
    fn test_caption_sits_above_box() {
        let mut img = RgbImage::new(100, 100);
        let face = BoundingBox::new(20.0, 50.0, 30.0, 30.0);
        annotate_face(&mut img, &face, "I", RED);
        // 'I' top row spans three pixels at y = 50 - 10 - 10 = 30, scaled by 2.
        assert_eq!(*img.get_pixel(20, 30), RED);
        assert_eq!(*img.get_pixel(25, 31), RED);
        // Nothing drawn in the caption gap.
        assert!((40..48).all(|y| *img.get_pixel(22, y) == BLACK));
    }

    #[test]
    fn test_caption_clamped_at_top_edge() {
        let mut img = RgbImage::new(100, 100);
        annotate_face(&mut img, &BoundingBox::new(10.0, 5.0, 30.0, 30.0), "T", RED);
        // 'T' top bar is drawn at row 0 rather than off-frame.
        assert_eq!(*img.get_pixel(10, 0), RED);
    }
}
