//! Bitmap fonts for exported pages and the measurer that matches them.
//!
//! Every text style maps to one Latin-1 mono font drawn at an integer
//! magnification, so a string's width is its glyph count times a fixed
//! advance. Layout and rasterization both go through [`face_for`], which keeps
//! line wrapping and the drawn text in agreement.

use super::layout::{Measurer, TextStyle};
use embedded_graphics::mono_font::iso_8859_1::{
    FONT_10X20, FONT_6X13_BOLD, FONT_7X14, FONT_8X13, FONT_8X13_BOLD,
};
use embedded_graphics::mono_font::MonoFont;

#[derive(Clone, Copy)]
pub struct Face {
    pub font: &'static MonoFont<'static>,
    /// Each glyph pixel becomes a `magnify` x `magnify` block.
    pub magnify: u32,
}

impl Face {
    /// Horizontal distance between glyph origins, in surface pixels.
    pub fn advance(&self) -> u32 {
        (self.font.character_size.width + self.font.character_spacing) * self.magnify
    }

    pub fn glyph_height(&self) -> u32 {
        self.font.character_size.height * self.magnify
    }
}

pub fn face_for(style: TextStyle) -> Face {
    let (font, magnify) = match style {
        TextStyle::Body => (&FONT_8X13, 1),
        TextStyle::Code => (&FONT_7X14, 1),
        TextStyle::Heading(1) => (&FONT_8X13_BOLD, 2),
        TextStyle::Heading(2) => (&FONT_6X13_BOLD, 2),
        TextStyle::Heading(3) => (&FONT_10X20, 1),
        TextStyle::Heading(_) => (&FONT_8X13_BOLD, 1),
    };
    Face { font, magnify }
}

/// Measures text exactly as [`GlyphRasterizer`](super::GlyphRasterizer) draws
/// it: one glyph per `char`, characters outside Latin-1 included.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonoMeasurer;

impl Measurer for MonoMeasurer {
    fn measure_text_px(&self, text: &str, style: TextStyle) -> f32 {
        (text.chars().count() as u32 * face_for(style).advance()) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_text_advances_eight_pixels() {
        assert_eq!(MonoMeasurer.measure_text_px("abcd", TextStyle::Body), 32.0);
        assert_eq!(MonoMeasurer.measure_text_px("", TextStyle::Body), 0.0);
    }

    #[test]
    fn headings_are_wider_than_body() {
        let body = MonoMeasurer.measure_text_px("Title", TextStyle::Body);
        let h1 = MonoMeasurer.measure_text_px("Title", TextStyle::Heading(1));
        let h2 = MonoMeasurer.measure_text_px("Title", TextStyle::Heading(2));
        assert_eq!(h1, body * 2.0);
        assert!(h2 > body && h2 < h1);
    }

    #[test]
    fn glyphs_fit_their_line_heights() {
        let cfg = crate::export::LayoutConfig::default();
        assert!(face_for(TextStyle::Body).glyph_height() <= cfg.line_height);
        assert!(face_for(TextStyle::Code).glyph_height() <= cfg.code_line_height);
        assert!(face_for(TextStyle::Heading(1)).glyph_height() <= cfg.line_height * 2);
    }

    #[test]
    fn non_ascii_counts_one_glyph_per_char() {
        assert_eq!(MonoMeasurer.measure_text_px("héllo", TextStyle::Body), 40.0);
        assert_eq!(MonoMeasurer.measure_text_px("日本", TextStyle::Body), 16.0);
    }
}
