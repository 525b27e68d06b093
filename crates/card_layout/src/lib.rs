pub mod card;
pub mod compose;
pub mod layout;
pub mod reveal;

pub use card::{
    config::{CardConfig, ContentSettings, LayoutSettings, Settings},
    state::{Action, BusyFlags, CardState, HistoryItem},
};
pub use compose::{
    card::{CardOutput, CardRenderer},
    overlay::{reveal_overlay, OverlayLayout},
    paint::{QrStyle, Rect},
    source::{
        load_or_placeholder, placeholder, FileImage, ImageSource, StaticImage, FALLBACK_DIMENSIONS,
    },
    text::{Align, TextRenderer},
};
pub use layout::{
    geometry::{compute_geometry, Geometry, LayoutConfig, LayoutLimits, Padding, Size},
    ratio::{AspectRatio, Orientation},
};
pub use reveal::{
    ease::{Easing, SizeTween},
    particles::{confetti_bursts, ConfettiBurst, ConvergeSpawner, Particle},
    placement::RevealPlacement,
    timeline::{Effect, Reveal, RunId, Stage, Transition},
};

#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings: {0}")]
    Config(#[from] toml::de::Error),
    #[error("failed to parse font: {0}")]
    Font(String),
    #[error("failed to encode QR code: {0}")]
    Qr(#[from] qrcode::types::QrError),
    #[error("unsupported aspect ratio {0:?}, expected one of 16:9, 1:1, 4:3")]
    InvalidRatio(String),
    #[error("unsupported orientation {0:?}, expected horizontal or vertical")]
    InvalidOrientation(String),
    #[error("unsupported layout dimensions")]
    InvalidLayout,
}
