use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use fontdue::layout::{
    CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign, WrapStyle,
};
use fontdue::{Font, FontSettings};
use image::{Pixel, Rgba, RgbaImage};
use log::debug;

use super::paint::Rect;
use crate::CardError;

/// Sans-serif face compiled into the crate. It has no CJK coverage; configure
/// a font that does for Chinese text.
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

const LINE_HEIGHT: f32 = 1.4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Start,
    Center,
}

/// Lays out and rasterizes text with a single font.
#[derive(Clone)]
pub struct TextRenderer {
    font: Arc<Font>,
}

impl fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextRenderer").finish_non_exhaustive()
    }
}

impl TextRenderer {
    pub fn bundled() -> Result<Self, CardError> {
        Self::from_bytes(BUNDLED_FONT)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CardError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|err| CardError::Font(err.to_owned()))?;
        Ok(Self { font: Arc::new(font) })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CardError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let renderer = Self::from_bytes(&bytes)?;
        debug!("loaded font from {}", path.display());
        Ok(renderer)
    }

    /// Width of the widest line and the laid-out height of `text`.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        let width = text
            .lines()
            .map(|line| line.chars().map(|ch| self.font.metrics(ch, size).advance_width).sum())
            .fold(0.0_f32, f32::max);
        let layout = self.layout(text, size, 0.0, 0.0, None, Align::Start);
        (width.ceil() as u32, layout.height().ceil() as u32)
    }

    /// Draws `text` into `area`, wrapping at its width and clipping to it.
    ///
    /// Returns how many visible characters the font has no glyph for; those are
    /// skipped rather than drawn as boxes.
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        area: Rect,
        text: &str,
        size: f32,
        color: Rgba<u8>,
        align: Align,
    ) -> usize {
        let max_width = Some(area.width as f32);
        let layout = self.layout(text, size, area.x as f32, area.y as f32, max_width, align);
        let x_range = area.x.max(0)..area.right().min(i64::from(canvas.width()));
        let y_range = area.y.max(0)..area.bottom().min(i64::from(canvas.height()));

        let mut missing = 0;
        for glyph in layout.glyphs() {
            if glyph.parent.is_whitespace() {
                continue;
            }
            if self.font.lookup_glyph_index(glyph.parent) == 0 {
                missing += 1;
                continue;
            }
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }

            let (_, coverage) = self.font.rasterize_config(glyph.key);
            let left = glyph.x.round() as i64;
            let top = glyph.y.round() as i64;
            for row in 0..glyph.height {
                let y = top + row as i64;
                if !y_range.contains(&y) {
                    continue;
                }
                for col in 0..glyph.width {
                    let x = left + col as i64;
                    let mask = coverage[row * glyph.width + col];
                    if mask == 0 || !x_range.contains(&x) {
                        continue;
                    }
                    let alpha = (u16::from(mask) * u16::from(color.0[3]) / 255) as u8;
                    let [r, g, b, _] = color.0;
                    canvas.get_pixel_mut(x as u32, y as u32).blend(&Rgba([r, g, b, alpha]));
                }
            }
        }

        missing
    }

    fn layout(
        &self,
        text: &str,
        size: f32,
        x: f32,
        y: f32,
        max_width: Option<f32>,
        align: Align,
    ) -> Layout {
        let horizontal_align = match align {
            Align::Start => HorizontalAlign::Left,
            Align::Center => HorizontalAlign::Center,
        };

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x,
            y,
            max_width,
            horizontal_align,
            vertical_align: VerticalAlign::Top,
            line_height: LINE_HEIGHT,
            wrap_style: WrapStyle::Letter,
            ..LayoutSettings::default()
        });
        layout.append(&[self.font.as_ref()], &TextStyle::new(text, size, 0));
        layout
    }
}
