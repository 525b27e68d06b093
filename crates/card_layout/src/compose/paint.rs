use image::{Pixel, Rgba, RgbaImage};
use qrcode::{Color, QrCode};

use crate::CardError;

/// Modules of light margin kept around a QR symbol.
const QR_QUIET_ZONE: usize = 1;

/// Axis-aligned pixel rectangle. The origin may lie outside the canvas; drawing
/// is clipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    pub fn bottom(&self) -> i64 {
        self.y + i64::from(self.height)
    }

    fn clipped(&self, canvas: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.right().min(i64::from(canvas.width()));
        let y1 = self.bottom().min(i64::from(canvas.height()));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    /// Whether the pixel center at `(px, py)` falls inside the rectangle with
    /// corners rounded by `radius`.
    fn contains_rounded(&self, px: u32, py: u32, radius: f32) -> bool {
        let radius = radius.min(self.width as f32 / 2.0).min(self.height as f32 / 2.0).max(0.0);
        let cx = px as f32 + 0.5 - self.x as f32;
        let cy = py as f32 + 0.5 - self.y as f32;
        let w = self.width as f32;
        let h = self.height as f32;

        let dx = if cx < radius {
            radius - cx
        } else if cx > w - radius {
            cx - (w - radius)
        } else {
            return true;
        };
        let dy = if cy < radius {
            radius - cy
        } else if cy > h - radius {
            cy - (h - radius)
        } else {
            return true;
        };

        dx * dx + dy * dy <= radius * radius
    }
}

pub fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Rgba<u8> {
    Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

pub fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    fill_rounded_rect(canvas, rect, 0.0, color);
}

pub fn fill_rounded_rect(canvas: &mut RgbaImage, rect: Rect, radius: f32, color: Rgba<u8>) {
    let Some((x0, y0, x1, y1)) = rect.clipped(canvas) else {
        return;
    };

    for y in y0..y1 {
        for x in x0..x1 {
            if radius <= 0.0 || rect.contains_rounded(x, y, radius) {
                canvas.get_pixel_mut(x, y).blend(&color);
            }
        }
    }
}

pub fn fill_circle(
    canvas: &mut RgbaImage,
    center_x: f32,
    center_y: f32,
    radius: f32,
    color: Rgba<u8>,
) {
    let rect = Rect::new(
        (center_x - radius).floor() as i64,
        (center_y - radius).floor() as i64,
        (radius * 2.0).ceil() as u32 + 1,
        (radius * 2.0).ceil() as u32 + 1,
    );
    let Some((x0, y0, x1, y1)) = rect.clipped(canvas) else {
        return;
    };

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - center_x;
            let dy = y as f32 + 0.5 - center_y;
            if dx * dx + dy * dy <= radius * radius {
                canvas.get_pixel_mut(x, y).blend(&color);
            }
        }
    }
}

/// Blends a top-to-bottom linear gradient over `rect`.
pub fn fill_vertical_gradient(canvas: &mut RgbaImage, rect: Rect, top: Rgba<u8>, bottom: Rgba<u8>) {
    let Some((x0, y0, x1, y1)) = rect.clipped(canvas) else {
        return;
    };

    let span = rect.height.saturating_sub(1).max(1) as f32;
    for y in y0..y1 {
        let t = ((i64::from(y) - rect.y) as f32 / span).clamp(0.0, 1.0);
        let color = Rgba(std::array::from_fn(|channel| {
            let from = f32::from(top.0[channel]);
            let to = f32::from(bottom.0[channel]);
            (from + (to - from) * t).round() as u8
        }));
        for x in x0..x1 {
            canvas.get_pixel_mut(x, y).blend(&color);
        }
    }
}

/// Copies `source` onto `canvas` at `(x, y)`, masking it to a rounded rectangle.
pub fn overlay_rounded(canvas: &mut RgbaImage, source: &RgbaImage, x: i64, y: i64, radius: f32) {
    let rect = Rect::new(x, y, source.width(), source.height());
    let Some((x0, y0, x1, y1)) = rect.clipped(canvas) else {
        return;
    };

    for cy in y0..y1 {
        for cx in x0..x1 {
            if radius > 0.0 && !rect.contains_rounded(cx, cy, radius) {
                continue;
            }
            let sx = (i64::from(cx) - x) as u32;
            let sy = (i64::from(cy) - y) as u32;
            canvas.get_pixel_mut(cx, cy).blend(source.get_pixel(sx, sy));
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QrStyle {
    #[default]
    Squares,
    Dots,
}

/// Draws the QR symbol for `payload` scaled into the square `rect`.
///
/// Light modules are left untouched so the symbol can sit on any background.
pub fn draw_qr(
    canvas: &mut RgbaImage,
    rect: Rect,
    payload: &str,
    dark: Rgba<u8>,
    style: QrStyle,
) -> Result<(), CardError> {
    let code = QrCode::new(payload.as_bytes())?;
    let modules = code.width();
    let colors = code.to_colors();

    let Some((x0, y0, x1, y1)) = rect.clipped(canvas) else {
        return Ok(());
    };

    let side = rect.width.min(rect.height).max(1) as f32;
    let total = (modules + QR_QUIET_ZONE * 2) as f32;

    for y in y0..y1 {
        let fy = (y as f32 + 0.5 - rect.y as f32) * total / side;
        for x in x0..x1 {
            let fx = (x as f32 + 0.5 - rect.x as f32) * total / side;
            let (mx, my) = (fx.floor() as isize, fy.floor() as isize);
            let (mx, my) = (mx - QR_QUIET_ZONE as isize, my - QR_QUIET_ZONE as isize);
            if mx < 0 || my < 0 || mx as usize >= modules || my as usize >= modules {
                continue;
            }
            if colors[my as usize * modules + mx as usize] != Color::Dark {
                continue;
            }

            let inside = match style {
                QrStyle::Squares => true,
                QrStyle::Dots => {
                    let dx = fx.fract() - 0.5;
                    let dy = fy.fract() - 0.5;
                    dx * dx + dy * dy <= 0.25
                },
            };
            if inside {
                canvas.get_pixel_mut(x, y).blend(&dark);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([200, 0, 0, 255]);

    fn is_near(pixel: &Rgba<u8>, expected: [u8; 4]) -> bool {
        pixel.0.iter().zip(expected).all(|(&a, b)| a.abs_diff(b) <= 1)
    }

    #[test]
    fn fill_rect_clips_to_canvas() {
        let mut canvas = RgbaImage::from_pixel(10, 10, WHITE);
        fill_rect(&mut canvas, Rect::new(-5, 8, 8, 10), RED);

        assert!(is_near(canvas.get_pixel(0, 9), RED.0));
        assert!(is_near(canvas.get_pixel(2, 8), RED.0));
        assert_eq!(*canvas.get_pixel(3, 8), WHITE);
        assert_eq!(*canvas.get_pixel(0, 7), WHITE);
    }

    #[test]
    fn rounded_rect_skips_corners() {
        let mut canvas = RgbaImage::from_pixel(20, 20, WHITE);
        fill_rounded_rect(&mut canvas, Rect::new(0, 0, 20, 20), 6.0, RED);

        assert_eq!(*canvas.get_pixel(0, 0), WHITE);
        assert_eq!(*canvas.get_pixel(19, 19), WHITE);
        assert!(is_near(canvas.get_pixel(10, 0), RED.0));
        assert!(is_near(canvas.get_pixel(10, 10), RED.0));
    }

    #[test]
    fn gradient_runs_top_to_bottom() {
        let mut canvas = RgbaImage::from_pixel(4, 11, Rgba([0, 0, 0, 0]));
        fill_vertical_gradient(
            &mut canvas,
            Rect::new(0, 0, 4, 11),
            Rgba([0, 0, 0, 255]),
            Rgba([200, 100, 0, 255]),
        );

        assert!(is_near(canvas.get_pixel(0, 0), [0, 0, 0, 255]));
        assert!(is_near(canvas.get_pixel(3, 5), [100, 50, 0, 255]));
        assert!(is_near(canvas.get_pixel(1, 10), [200, 100, 0, 255]));
    }

    #[test]
    fn translucent_fill_blends() {
        let mut canvas = RgbaImage::from_pixel(2, 2, WHITE);
        fill_rect(&mut canvas, Rect::new(0, 0, 2, 2), rgba(0, 0, 0, 0.5));
        let value = canvas.get_pixel(0, 0).0[0];
        assert!((120..=135).contains(&value), "unexpected blend result {value}");
    }

    #[test]
    fn qr_code_leaves_quiet_zone_and_marks_finder() {
        let mut canvas = RgbaImage::from_pixel(92, 92, WHITE);
        let black = Rgba([0, 0, 0, 255]);
        let rect = Rect::new(0, 0, 92, 92);
        draw_qr(&mut canvas, rect, "https://card.example.com", black, QrStyle::Squares).unwrap();

        // One module of margin, then the top-left finder pattern.
        assert_eq!(*canvas.get_pixel(1, 1), WHITE);
        assert!(is_near(canvas.get_pixel(5, 5), black.0));
        assert!(canvas.pixels().filter(|pixel| is_near(pixel, black.0)).count() > 500);
    }
}
