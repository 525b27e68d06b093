use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use log::{debug, warn};

use crate::CardError;

/// Size used in place of a generated image that could not be fetched.
pub const FALLBACK_DIMENSIONS: (u32, u32) = (720, 1280);

const PLACEHOLDER_FILL: Rgba<u8> = Rgba([253, 236, 200, 255]);

/// Where the picture placed in the card's image box comes from.
pub trait ImageSource {
    fn dimensions(&self) -> Option<(u32, u32)>;
    fn load(&mut self) -> Result<DynamicImage, CardError>;
}

pub struct StaticImage {
    image: DynamicImage,
}

impl StaticImage {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }
}

impl ImageSource for StaticImage {
    fn dimensions(&self) -> Option<(u32, u32)> {
        Some(self.image.dimensions())
    }

    fn load(&mut self) -> Result<DynamicImage, CardError> {
        Ok(self.image.clone())
    }
}

pub struct FileImage {
    path: PathBuf,
    dimensions: Option<(u32, u32)>,
}

impl FileImage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf(), dimensions: None }
    }
}

impl ImageSource for FileImage {
    fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    fn load(&mut self) -> Result<DynamicImage, CardError> {
        let image = image::open(&self.path)?;
        let (w, h) = image.dimensions();
        debug!("loaded card image {}x{} from {}", w, h, self.path.display());
        self.dimensions = Some((w, h));
        Ok(image)
    }
}

/// Flat stand-in used when the real image is unavailable.
pub fn placeholder(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width.max(1), height.max(1), PLACEHOLDER_FILL))
}

/// Loads from `source`, substituting a placeholder of [`FALLBACK_DIMENSIONS`]
/// when loading fails. The error is returned alongside so callers can report it.
pub fn load_or_placeholder(source: &mut dyn ImageSource) -> (DynamicImage, Option<CardError>) {
    match source.load() {
        Ok(image) => (image, None),
        Err(err) => {
            warn!("failed to load card image, using placeholder: {err}");
            let (w, h) = FALLBACK_DIMENSIONS;
            (placeholder(w, h), Some(err))
        },
    }
}
