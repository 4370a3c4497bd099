//! Freshly captured page images

use std::path::Path;

use chrono::{DateTime, Utc};
use image::RgbaImage;

use crate::error::Result;

/// A raster capture of one page at a point in time
///
/// Produced fresh on every run and never mutated. The capture timestamp is
/// recorded when the image is loaded from the engine's screenshot output.
#[derive(Debug, Clone)]
pub struct Snapshot {
    image: RgbaImage,
    captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            captured_at: Utc::now(),
        }
    }

    /// Load a PNG from disk, e.g. the engine's screenshot output
    pub fn load_png(path: &Path) -> Result<Self> {
        let image = image::open(path)?.to_rgba8();
        Ok(Self::new(image))
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}
