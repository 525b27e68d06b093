use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use log::{debug, warn};

use super::paint::{self, QrStyle, Rect};
use super::text::{Align, TextRenderer};
use crate::card::state::CardState;
use crate::layout::geometry::{Geometry, LayoutLimits};
use crate::CardError;

const FRAME_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const EMPTY_IMAGE_FILL: Rgba<u8> = Rgba([253, 236, 200, 230]);
const TAG_FILL: Rgba<u8> = Rgba([254, 226, 226, 255]);
const LOGO_FILL: Rgba<u8> = Rgba([254, 226, 226, 255]);
const LOGO_MARK: Rgba<u8> = Rgba([220, 38, 38, 255]);
const TEXT_INK: Rgba<u8> = Rgba([185, 28, 28, 255]);
const QR_BACKGROUND: Rgba<u8> = Rgba([243, 244, 246, 255]);
const QR_DARK: Rgba<u8> = Rgba([31, 41, 55, 255]);

const IMAGE_RADIUS: f32 = 6.0;
const CAPTION_INSET: u32 = 16;
/// Gap between the image box and the blessing text.
const BLESSING_GAP: u32 = 8;
/// Blessings longer than this many characters use the small size.
const BLESSING_LONG: usize = 20;
const BLESSING_SIZE: f32 = 14.0;
const BLESSING_SIZE_LONG: f32 = 12.0;
const FOOTER_MARGIN: u32 = 10;
const TAG_HEIGHT: u32 = 16;
const TAG_FONT_SIZE: f32 = 10.0;
const TAG_PADDING: u32 = 8;
const TAG_GLYPH_WIDTH: u32 = 10;
const QR_SIZE: u32 = 32;
const LOGO_INSET: u32 = 12;
const LOGO_SIZE: u32 = 20;
const LOGO_FONT_SIZE: f32 = 6.0;

#[derive(Clone, Debug)]
pub struct CardOutput {
    pub image: RgbaImage,
    pub geometry: Geometry,
}

/// Rasterizes a card preview: frame, image box, caption text and footer
/// decorations.
///
/// Without a [`TextRenderer`] the text areas are laid out but left blank.
#[derive(Clone, Debug, Default)]
pub struct CardRenderer {
    text: Option<TextRenderer>,
}

impl CardRenderer {
    pub fn new(text: Option<TextRenderer>) -> Self {
        Self { text }
    }

    /// Renders the card described by `state`; `source` of `None` leaves the
    /// image box empty.
    pub fn render(
        &self,
        state: &CardState,
        source: Option<&DynamicImage>,
        limits: LayoutLimits,
    ) -> Result<CardOutput, CardError> {
        let config = &state.config;
        let geometry = state.geometry(limits);
        let Geometry { image: image_size, frame, padding } = geometry;
        if frame.width == 0 || frame.height == 0 || image_size.width == 0 || image_size.height == 0
        {
            return Err(CardError::InvalidLayout);
        }

        debug!(
            "rendering {}x{} card ({} {}, border={})",
            frame.width, frame.height, config.aspect_ratio, config.orientation, config.show_border
        );

        let background = if config.show_border { FRAME_FILL } else { Rgba([0, 0, 0, 0]) };
        let mut canvas = RgbaImage::from_pixel(frame.width, frame.height, background);

        let radius = if config.show_border { IMAGE_RADIUS } else { 0.0 };
        let image_x = i64::from(padding.sides);
        let image_y = i64::from(padding.top);

        match source {
            Some(source) => {
                let fitted = source
                    .resize_to_fill(image_size.width, image_size.height, FilterType::CatmullRom)
                    .into_rgba8();
                paint::overlay_rounded(&mut canvas, &fitted, image_x, image_y, radius);
            },
            None => {
                let rect = Rect::new(image_x, image_y, image_size.width, image_size.height);
                paint::fill_rounded_rect(&mut canvas, rect, radius, EMPTY_IMAGE_FILL);
            },
        }

        if config.show_border {
            let mut missing = self.draw_blessing(&mut canvas, state, &geometry);
            missing += self.draw_footer(&mut canvas, state, &geometry)?;
            if config.show_logo {
                missing += self.draw_logo(&mut canvas, frame.width);
            }
            if missing > 0 {
                warn!(
                    "font has no glyphs for {missing} card characters; configure a covering font"
                );
            }
        }

        Ok(CardOutput { image: canvas, geometry })
    }

    /// Centered blessing between the image box and the footer row.
    fn draw_blessing(
        &self,
        canvas: &mut RgbaImage,
        state: &CardState,
        geometry: &Geometry,
    ) -> usize {
        let Some(text) = &self.text else {
            return 0;
        };

        let frame = geometry.frame;
        let top = geometry.padding.top.saturating_add(geometry.image.height) + BLESSING_GAP;
        let bottom = frame.height.saturating_sub(FOOTER_MARGIN + TAG_HEIGHT + 2);
        let area = Rect::new(
            i64::from(CAPTION_INSET),
            i64::from(top),
            frame.width.saturating_sub(CAPTION_INSET * 2),
            bottom.saturating_sub(top),
        );

        let blessing = state.blessing_or_default();
        let size = if blessing.chars().count() > BLESSING_LONG {
            BLESSING_SIZE_LONG
        } else {
            BLESSING_SIZE
        };
        text.draw(canvas, area, blessing, size, TEXT_INK, Align::Center)
    }

    /// Organization tag at the lower left and the QR code at the lower right.
    fn draw_footer(
        &self,
        canvas: &mut RgbaImage,
        state: &CardState,
        geometry: &Geometry,
    ) -> Result<usize, CardError> {
        let frame = geometry.frame;
        let row_bottom = i64::from(frame.height.saturating_sub(FOOTER_MARGIN));
        let organization = state.organization_or_default();

        let text_width = match &self.text {
            Some(text) => text.measure(organization, TAG_FONT_SIZE).0,
            None => organization.chars().count() as u32 * TAG_GLYPH_WIDTH,
        };
        let tag_width =
            (text_width + TAG_PADDING * 2).min(frame.width.saturating_sub(CAPTION_INSET * 2) / 2);
        let tag = Rect::new(
            i64::from(CAPTION_INSET),
            row_bottom - i64::from(TAG_HEIGHT),
            tag_width,
            TAG_HEIGHT,
        );
        paint::fill_rounded_rect(canvas, tag, 4.0, TAG_FILL);

        let mut missing = 0;
        if let Some(text) = &self.text {
            let label = Rect::new(
                tag.x + i64::from(TAG_PADDING),
                tag.y + 1,
                tag_width.saturating_sub(TAG_PADDING * 2),
                TAG_HEIGHT - 1,
            );
            missing +=
                text.draw(canvas, label, organization, TAG_FONT_SIZE, TEXT_INK, Align::Start);
        }

        if state.config.show_qr_code {
            let qr_box = Rect::new(
                i64::from(frame.width.saturating_sub(CAPTION_INSET + QR_SIZE)),
                row_bottom - i64::from(QR_SIZE),
                QR_SIZE,
                QR_SIZE,
            );
            paint::fill_rounded_rect(canvas, qr_box, 4.0, FRAME_FILL);
            let inner = Rect::new(qr_box.x + 2, qr_box.y + 2, QR_SIZE - 4, QR_SIZE - 4);
            paint::fill_rounded_rect(canvas, inner, 3.0, QR_BACKGROUND);
            paint::draw_qr(canvas, inner, state.qr_url(), QR_DARK, QrStyle::Squares)?;
        }

        Ok(missing)
    }

    /// Round badge in the top-right corner, labelled when text is available.
    fn draw_logo(&self, canvas: &mut RgbaImage, frame_width: u32) -> usize {
        let center_x = frame_width.saturating_sub(LOGO_INSET + LOGO_SIZE / 2);
        let center_y = LOGO_INSET + LOGO_SIZE / 2;
        let radius = LOGO_SIZE as f32 / 2.0;
        paint::fill_circle(canvas, center_x as f32, center_y as f32, radius, LOGO_FILL);

        match &self.text {
            Some(text) => {
                let area = Rect::new(
                    i64::from(center_x) - i64::from(LOGO_SIZE / 2),
                    i64::from(center_y) - 5,
                    LOGO_SIZE,
                    10,
                );
                text.draw(canvas, area, "Logo", LOGO_FONT_SIZE, LOGO_MARK, Align::Center)
            },
            None => {
                let (x, y) = (center_x as f32, center_y as f32);
                paint::fill_circle(canvas, x, y, radius / 2.5, LOGO_MARK);
                0
            },
        }
    }
}
