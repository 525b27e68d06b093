use log::debug;
use serde::{Deserialize, Serialize};

use super::ratio::{AspectRatio, Orientation};

/// Short side of the image box before any clamping.
pub const DEFAULT_BASE_SHORT_SIDE: u32 = 320;
/// Height of the preview container the card is displayed in.
pub const DEFAULT_CONTAINER_HEIGHT: u32 = 720;
/// Space kept free between the frame and the container edge.
pub const CONTAINER_MARGIN: u32 = 40;

const BORDER: BorderPadding = BorderPadding { top: 20, sides: 20, bottom: 90 };
const MIN_DISPLAY_EDGE: u32 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BorderPadding {
    top: u32,
    sides: u32,
    bottom: u32,
}

impl BorderPadding {
    const NONE: BorderPadding = BorderPadding { top: 0, sides: 0, bottom: 0 };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Padding {
    pub top: u32,
    pub sides: u32,
}

/// Pixel geometry of a card preview.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub image: Size,
    pub frame: Size,
    pub padding: Padding,
}

impl Geometry {
    /// Height of the frame area below the image box.
    pub fn caption_band(&self) -> u32 {
        self.frame.height.saturating_sub(self.padding.top.saturating_add(self.image.height))
    }
}

/// The two display constants the sizing engine works against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutLimits {
    pub base_short_side: u32,
    pub max_frame_height: u32,
}

impl LayoutLimits {
    pub fn from_container(base_short_side: u32, container_height: u32) -> Self {
        let max_frame_height = container_height.saturating_sub(CONTAINER_MARGIN);
        Self { base_short_side, max_frame_height }
    }
}

impl Default for LayoutLimits {
    fn default() -> Self {
        Self::from_container(DEFAULT_BASE_SHORT_SIDE, DEFAULT_CONTAINER_HEIGHT)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub orientation: Orientation,
    pub aspect_ratio: AspectRatio,
    pub show_border: bool,
}

impl LayoutConfig {
    pub fn geometry(&self, limits: LayoutLimits) -> Geometry {
        compute_geometry(
            self.aspect_ratio,
            self.orientation,
            self.show_border,
            limits.base_short_side,
            limits.max_frame_height,
        )
    }
}

/// Computes the image box, frame and padding of a card.
///
/// The short side of the image box is `base_short_side`; orientation decides
/// whether the long side runs horizontally or vertically. When the bordered
/// frame would be taller than `max_frame_height`, every dimension is scaled
/// down proportionally and the frame height is pinned to the limit.
pub fn compute_geometry(
    ratio: AspectRatio,
    orientation: Orientation,
    show_border: bool,
    base_short_side: u32,
    max_frame_height: u32,
) -> Geometry {
    let long_side = round_px(f64::from(base_short_side) * ratio.long_to_short());

    let (mut image_width, mut image_height) = if ratio.is_square() {
        (base_short_side, base_short_side)
    } else {
        match orientation {
            Orientation::Horizontal => (long_side, base_short_side),
            Orientation::Vertical => (base_short_side, long_side),
        }
    };

    let border = if show_border { BORDER } else { BorderPadding::NONE };
    // The long side saturates at u32::MAX for huge bases; keep the sums from
    // wrapping so the clamp below still applies.
    let mut frame_width = image_width.saturating_add(border.sides * 2);
    let mut frame_height = image_height.saturating_add(border.top + border.bottom);

    let mut scale = 1.0;
    if frame_height > max_frame_height {
        scale = f64::from(max_frame_height) / f64::from(frame_height);
        debug!(
            "clamping {frame_width}x{frame_height} frame to height {max_frame_height} \
             (scale {scale:.3})"
        );

        frame_width = round_px(f64::from(frame_width) * scale);
        frame_height = max_frame_height;
        image_width = round_px(f64::from(image_width) * scale);
        image_height = round_px(f64::from(image_height) * scale);
    }

    let padding = if show_border {
        let edge = round_px(f64::from(BORDER.top) * scale).max(MIN_DISPLAY_EDGE);
        Padding { top: edge, sides: edge }
    } else {
        Padding::default()
    };

    Geometry {
        image: Size::new(image_width, image_height),
        frame: Size::new(frame_width, frame_height),
        padding,
    }
}

fn round_px(value: f64) -> u32 {
    value.round().max(0.0) as u32
}
