use image::{Rgba, RgbaImage};

use super::ui::Color32;

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SCALE: u32 = 4;
const GLYPH_SPACING: u32 = 1;
const PADDING: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelStyle {
    pub text_color: Color32,
    pub background: Color32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            text_color: Color32::BLACK,
            background: Color32::from_rgba_unmultiplied(255, 255, 255, 230),
        }
    }
}

impl LabelStyle {
    pub fn with_text_color(color: Color32) -> Self {
        Self {
            text_color: color,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct LabelSprite {
    pub text: String,
    pub style: LabelStyle,
    pub image: RgbaImage,
    pub world_height: f64,
}

impl LabelSprite {
    pub fn new(text: impl Into<String>, style: LabelStyle, world_height: f64) -> Self {
        let text = text.into();
        let image = rasterize(&text, style);
        Self {
            text,
            style,
            image,
            world_height,
        }
    }

    pub fn world_width(&self) -> f64 {
        let (width, height) = self.image.dimensions();
        if height == 0 {
            return self.world_height;
        }
        self.world_height * width as f64 / height as f64
    }
}

/// Renders `text` with the built-in 5x7 font. Lowercase letters are drawn as capitals.
pub fn rasterize(text: &str, style: LabelStyle) -> RgbaImage {
    let count = text.chars().count() as u32;
    let advance = (GLYPH_WIDTH + GLYPH_SPACING) * GLYPH_SCALE;
    let text_width = (count * advance).saturating_sub(GLYPH_SPACING * GLYPH_SCALE);
    let width = (text_width + PADDING * 2).max(1);
    let height = GLYPH_HEIGHT * GLYPH_SCALE + PADDING * 2;

    let mut image = RgbaImage::from_pixel(width, height, Rgba(style.background.to_array()));
    let ink = Rgba(style.text_color.to_array());

    for (idx, ch) in text.chars().enumerate() {
        let origin_x = PADDING + idx as u32 * advance;
        let rows = glyph(ch);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let x0 = origin_x + col * GLYPH_SCALE;
                let y0 = PADDING + row as u32 * GLYPH_SCALE;
                for y in y0..y0 + GLYPH_SCALE {
                    for x in x0..x0 + GLYPH_SCALE {
                        image.put_pixel(x, y, ink);
                    }
                }
            }
        }
    }
    image
}

fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        ' ' => [0x00; 7],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '"' => [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_size_follows_text_length() {
        let image = rasterize("AB", LabelStyle::default());
        assert_eq!(image.dimensions(), (2 * 24 - 4 + 8, 28 + 8));
        let empty = rasterize("", LabelStyle::default());
        assert_eq!(empty.dimensions(), (8, 36));
    }

    #[test]
    fn background_and_ink_use_style_colors() {
        let style = LabelStyle::with_text_color(Color32::RED);
        let image = rasterize("-", style);
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 230]);
        // middle row of the dash
        assert_eq!(image.get_pixel(PADDING, PADDING + 3 * GLYPH_SCALE).0, [255, 0, 0, 255]);
    }

    #[test]
    fn world_width_keeps_aspect_ratio() {
        let sprite = LabelSprite::new("W: 10.00 mm", LabelStyle::default(), 2.0);
        let (width, height) = sprite.image.dimensions();
        let expected = 2.0 * width as f64 / height as f64;
        assert!((sprite.world_width() - expected).abs() < 1.0e-12);
        assert_eq!(sprite.style.text_color, Color32::BLACK);
    }
}
