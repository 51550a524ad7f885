use super::font::{face_for, Face};
use super::layout::{Layout, LayoutBox, Paint, TextStyle, WrappedLine};
use crate::error::ExportError;
use embedded_graphics::{
    mono_font::MonoTextStyle,
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};
use image::{imageops, Rgba, RgbaImage};
use std::convert::Infallible;

/// Turns a laid-out surface into pixels.
pub trait Rasterizer {
    /// Render the whole surface at `scale` device pixels per surface pixel.
    fn rasterize(&self, layout: &Layout, scale: f32) -> Result<RgbaImage, ExportError>;
}

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const MUTED: Rgba<u8> = Rgba([150, 150, 150, 255]);
const CODE_BG: Rgba<u8> = Rgba([244, 244, 244, 255]);
const HEADER_BG: Rgba<u8> = Rgba([232, 232, 232, 255]);
const GRID: Rgba<u8> = Rgba([200, 200, 200, 255]);

const INK: Rgb888 = Rgb888::new(33, 33, 33);
const CODE_INK: Rgb888 = Rgb888::new(60, 60, 90);
const QUOTE_INK: Rgb888 = Rgb888::new(90, 90, 90);

/// Draws text with the bitmap faces from [`super::font`], plus code
/// backgrounds, table grids, rules and PNG diagrams.
#[derive(Debug, Clone, Copy)]
pub struct GlyphRasterizer {
    /// Largest surface (in device pixels) it will allocate.
    pub max_pixels: u64,
}

impl Default for GlyphRasterizer {
    fn default() -> Self {
        Self {
            max_pixels: 400_000_000,
        }
    }
}

impl Rasterizer for GlyphRasterizer {
    fn rasterize(&self, layout: &Layout, scale: f32) -> Result<RgbaImage, ExportError> {
        if layout.is_empty() {
            return Err(ExportError::EmptySurface);
        }
        if scale.is_nan() || scale <= 0.0 {
            return Err(ExportError::Raster(format!("invalid scale {}", scale)));
        }
        let width = scaled(layout.width, scale).max(1);
        let height = scaled(layout.height, scale).max(1);
        if u64::from(width) * u64::from(height) > self.max_pixels {
            return Err(ExportError::Raster(format!(
                "surface {}x{} exceeds the raster limit",
                width, height
            )));
        }

        let mut canvas = Canvas {
            image: RgbaImage::from_pixel(width, height, BACKGROUND),
            scale,
        };
        for b in &layout.boxes {
            canvas.paint(b, layout.width)?;
        }
        Ok(canvas.image)
    }
}

fn scaled(v: u32, scale: f32) -> u32 {
    (v as f32 * scale).round() as u32
}

struct Canvas {
    image: RgbaImage,
    scale: f32,
}

impl Canvas {
    /// Fill a rectangle given in surface pixels, clipped to the image. A
    /// non-empty rectangle always covers at least one device pixel.
    fn fill(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
        if w == 0 || h == 0 {
            return;
        }
        let x0 = scaled(x, self.scale);
        let y0 = scaled(y, self.scale);
        let x1 = scaled(x + w, self.scale).max(x0 + 1).min(self.image.width());
        let y1 = scaled(y + h, self.scale).max(y0 + 1).min(self.image.height());
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    fn outline(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
        self.fill(x, y, w, 1, color);
        self.fill(x, y + h.saturating_sub(1), w, 1, color);
        self.fill(x, y, 1, h, color);
        self.fill(x + w.saturating_sub(1), y, 1, h, color);
    }

    /// One wrapped line per `line_height`, glyphs centered vertically.
    fn text_lines(&mut self, x: u32, y: u32, line_height: u32, lines: &[WrappedLine], style: TextStyle, ink: Rgb888) {
        let face = face_for(style);
        let lead = line_height.saturating_sub(face.glyph_height()) / 2;
        for (i, line) in lines.iter().enumerate() {
            if line.text.is_empty() {
                continue;
            }
            let mut pen = Pen {
                canvas: &mut *self,
                origin: (x, y + i as u32 * line_height + lead),
                face,
            };
            let text_style = MonoTextStyle::new(face.font, ink);
            // Drawing into a Pen cannot fail.
            let _ = Text::with_baseline(&line.text, Point::zero(), text_style, Baseline::Top).draw(&mut pen);
        }
    }

    fn paint(&mut self, b: &LayoutBox, surface_width: u32) -> Result<(), ExportError> {
        match &b.paint {
            Paint::Text { lines, style, bar } => {
                let ink = if *bar {
                    self.fill(b.indent.saturating_sub(8), b.y, 3, b.height, MUTED);
                    QUOTE_INK
                } else {
                    INK
                };
                self.text_lines(b.indent, b.y, b.line_height, lines, *style, ink);
            }
            Paint::Code { lines } => {
                self.fill(0, b.y, surface_width, b.height, CODE_BG);
                let pad = b.height.saturating_sub(lines.len() as u32 * b.line_height) / 2;
                self.text_lines(pad, b.y + pad, b.line_height, lines, TextStyle::Code, CODE_INK);
            }
            Paint::Row {
                header,
                columns,
                cells,
            } => {
                if *header {
                    self.fill(0, b.y, surface_width, b.height, HEADER_BG);
                }
                let column_width = surface_width / (*columns).max(1);
                let pad = b.height.saturating_sub(
                    cells.iter().map(Vec::len).max().unwrap_or(0) as u32 * b.line_height,
                ) / 2;
                for (c, lines) in cells.iter().enumerate() {
                    let x = c as u32 * column_width;
                    self.outline(x, b.y, column_width, b.height, GRID);
                    self.text_lines(x + pad, b.y + pad, b.line_height, lines, TextStyle::Body, INK);
                }
            }
            Paint::Picture { width, png } => match png {
                Some(bytes) => {
                    let decoded = image::load_from_memory(bytes)
                        .map_err(|e| ExportError::Raster(format!("diagram image: {}", e)))?
                        .to_rgba8();
                    let w = scaled(*width, self.scale).max(1);
                    let h = scaled(b.height, self.scale).max(1);
                    let resized = imageops::resize(&decoded, w, h, imageops::FilterType::Triangle);
                    imageops::overlay(
                        &mut self.image,
                        &resized,
                        i64::from(scaled(b.indent, self.scale)),
                        i64::from(scaled(b.y, self.scale)),
                    );
                }
                None => {
                    self.fill(b.indent, b.y, *width, b.height, CODE_BG);
                    self.outline(b.indent, b.y, *width, b.height, GRID);
                }
            },
            Paint::Rule => {
                self.fill(0, b.y + b.height / 2, surface_width, 1, GRID);
            }
        }
        Ok(())
    }
}

/// Draw target that places glyph pixels at `origin` in surface space,
/// magnified by the face and then scaled onto the canvas.
struct Pen<'a> {
    canvas: &'a mut Canvas,
    origin: (u32, u32),
    face: Face,
}

impl OriginDimensions for Pen<'_> {
    fn size(&self) -> Size {
        Size::new(self.canvas.image.width(), self.canvas.image.height())
    }
}

impl DrawTarget for Pen<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let m = self.face.magnify;
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let x = self.origin.0 + point.x as u32 * m;
            let y = self.origin.1 + point.y as u32 * m;
            self.canvas
                .fill(x, y, m, m, Rgba([color.r(), color.g(), color.b(), 255]));
        }
        Ok(())
    }
}
