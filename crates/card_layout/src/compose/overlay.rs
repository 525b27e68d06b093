use image::{Rgba, RgbaImage};
use log::warn;

use super::paint::{self, QrStyle, Rect};
use super::text::{Align, TextRenderer};
use crate::CardError;

/// Width the overlay proportions are measured against.
const REFERENCE_WIDTH: f32 = 360.0;

const FOOTER_HEIGHT: f32 = 36.0;
const QR_SIZE: f32 = 32.0;
const LABEL_OFFSET: f32 = 8.0;
const LABEL_FONT: f32 = 10.0;
const LABEL_PADDING_H: f32 = 8.0;
const LABEL_PADDING_V: f32 = 3.0;
const LABEL_RADIUS: f32 = 10.0;
const LABEL_TEXT: &str = "AI生成";
/// Approximate advance of the label in font-size units, used without a font.
const LABEL_TEXT_EMS: f32 = 3.2;

const QR_DOTS: Rgba<u8> = Rgba([244, 208, 63, 255]);

/// Pixel positions of the overlay decorations, scaled to the image width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayLayout {
    pub footer: Rect,
    pub qr_box: Rect,
    pub qr: Rect,
    pub label: Rect,
    pub label_radius: u32,
    pub label_font: u32,
    pub label_padding_h: u32,
    pub label_padding_v: u32,
}

impl OverlayLayout {
    /// Layout with the label width estimated from the font size.
    pub fn for_image(width: u32, height: u32) -> Self {
        Self::with_label_width(width, height, |font| (font as f32 * LABEL_TEXT_EMS).round() as u32)
    }

    /// Layout with the label sized to the text as `text` sets it.
    pub fn for_text(width: u32, height: u32, text: &TextRenderer) -> Self {
        Self::with_label_width(width, height, |font| text.measure(LABEL_TEXT, font as f32).0)
    }

    fn with_label_width(width: u32, height: u32, text_width: impl Fn(u32) -> u32) -> Self {
        let scale = width as f32 / REFERENCE_WIDTH;
        let px = |value: f32| (value * scale).round() as u32;

        let footer_height = px(FOOTER_HEIGHT).min(height);
        let footer_y = i64::from(height - footer_height);
        let footer = Rect::new(0, footer_y, width, footer_height);

        let qr_box_size = footer_height;
        let qr_box_x = i64::from(width.saturating_sub(qr_box_size));
        let qr_box = Rect::new(qr_box_x, footer_y, qr_box_size, qr_box_size);
        let qr_size = px(QR_SIZE).min(qr_box_size);
        let inset = i64::from((qr_box_size - qr_size) / 2);
        let qr = Rect::new(qr_box.x + inset, qr_box.y + inset, qr_size, qr_size);

        let font = px(LABEL_FONT);
        let padding_h = px(LABEL_PADDING_H);
        let padding_v = px(LABEL_PADDING_V);
        let label = Rect::new(
            i64::from(px(LABEL_OFFSET)),
            i64::from(px(LABEL_OFFSET)),
            text_width(font) + padding_h * 2,
            font + padding_v * 2,
        );

        Self {
            footer,
            qr_box,
            qr,
            label,
            label_radius: px(LABEL_RADIUS),
            label_font: font,
            label_padding_h: padding_h,
            label_padding_v: padding_v,
        }
    }
}

/// Composites the save-time decorations of the reveal page over `image`:
/// a translucent red footer band, a dotted QR code in its right end and an
/// "AI生成" pill in the top-left corner. The canvas is not enlarged.
///
/// The pill is left blank when `text` is `None`.
pub fn reveal_overlay(
    image: &RgbaImage,
    qr_payload: &str,
    text: Option<&TextRenderer>,
) -> Result<RgbaImage, CardError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(CardError::InvalidLayout);
    }

    let layout = match text {
        Some(text) => OverlayLayout::for_text(width, height, text),
        None => OverlayLayout::for_image(width, height),
    };
    let mut canvas = image.clone();

    paint::fill_vertical_gradient(
        &mut canvas,
        layout.footer,
        paint::rgba(139, 26, 26, 0.85),
        paint::rgba(107, 21, 21, 0.9),
    );
    paint::draw_qr(&mut canvas, layout.qr, qr_payload, QR_DOTS, QrStyle::Dots)?;
    paint::fill_rounded_rect(
        &mut canvas,
        layout.label,
        layout.label_radius as f32,
        paint::rgba(255, 255, 255, 0.4),
    );

    if let Some(text) = text {
        let label = layout.label;
        let area = Rect::new(
            label.x + i64::from(layout.label_padding_h),
            label.y + i64::from(layout.label_padding_v),
            label.width.saturating_sub(layout.label_padding_h * 2),
            label.height.saturating_sub(layout.label_padding_v),
        );
        let ink = paint::rgba(180, 60, 60, 0.6);
        let missing =
            text.draw(&mut canvas, area, LABEL_TEXT, layout.label_font as f32, ink, Align::Start);
        if missing > 0 {
            warn!("font has no glyphs for {missing} label characters; configure a covering font");
        }
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_at_reference_width() {
        let layout = OverlayLayout::for_image(360, 640);

        assert_eq!(layout.footer, Rect::new(0, 604, 360, 36));
        assert_eq!(layout.qr_box, Rect::new(324, 604, 36, 36));
        assert_eq!(layout.qr, Rect::new(326, 606, 32, 32));
        assert_eq!(layout.label.x, 8);
        assert_eq!(layout.label.height, 16);
        assert_eq!(layout.label_radius, 10);
    }

    #[test]
    fn layout_scales_with_width() {
        let layout = OverlayLayout::for_image(720, 1280);

        assert_eq!(layout.footer.height, 72);
        assert_eq!(layout.footer.y, 1208);
        assert_eq!(layout.qr.width, 64);
        assert_eq!(layout.label.x, 16);
    }

    #[test]
    fn footer_is_tinted_and_canvas_size_kept() {
        let image = RgbaImage::from_pixel(360, 640, Rgba([255, 255, 255, 255]));
        let output = reveal_overlay(&image, "https://card.example.com", None).unwrap();

        assert_eq!(output.dimensions(), (360, 640));
        let footer = output.get_pixel(100, 620).0;
        assert!(footer[0] < 200 && footer[1] < 80, "footer not tinted: {footer:?}");
        assert_eq!(output.get_pixel(180, 300).0, [255, 255, 255, 255]);
    }

    #[test]
    fn empty_image_is_rejected() {
        let image = RgbaImage::new(0, 0);
        assert!(matches!(reveal_overlay(&image, "x", None), Err(CardError::InvalidLayout)));
    }

    #[test]
    fn label_text_is_drawn_inside_pill() {
        let image = RgbaImage::from_pixel(360, 640, Rgba([20, 20, 20, 255]));
        let text = TextRenderer::bundled().unwrap();
        let labelled = reveal_overlay(&image, "https://card.example.com", Some(&text)).unwrap();

        // The pill itself is grey; only the label ink is reddish.
        let reddish = |canvas: &RgbaImage, area: Rect| {
            (area.x..area.right())
                .flat_map(|x| (area.y..area.bottom()).map(move |y| (x as u32, y as u32)))
                .filter(|&(x, y)| {
                    let [r, g, _, _] = canvas.get_pixel(x, y).0;
                    r > g.saturating_add(20)
                })
                .count()
        };
        let label = OverlayLayout::for_text(360, 640, &text).label;
        let blank = reveal_overlay(&image, "https://card.example.com", None).unwrap();

        assert!(reddish(&labelled, label) > 10);
        assert_eq!(reddish(&blank, label), 0);
        assert_eq!(labelled.get_pixel(180, 300), &Rgba([20, 20, 20, 255]));
    }

    #[test]
    fn measured_label_fits_text_and_padding() {
        let text = TextRenderer::bundled().unwrap();
        let layout = OverlayLayout::for_text(720, 1280, &text);
        let (text_width, _) = text.measure(LABEL_TEXT, layout.label_font as f32);

        assert_eq!(layout.label_font, 20);
        assert_eq!(layout.label.width, text_width + layout.label_padding_h * 2);
        assert_eq!(layout.label.height, 20 + layout.label_padding_v * 2);
    }
}
