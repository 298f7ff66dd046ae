//! On-disk JPEG store for person photos.

use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::error::GalleryError;

/// JPEG quality used when none is configured (compression quality 0.8).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Directory of JPEG files named by generated UUIDs.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    /// Open the store, creating `dir` if it does not exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, GalleryError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "photo store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of a stored photo.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Crop to a centred square, encode as JPEG, write under a fresh name.
    ///
    /// Returns the generated filename.
    pub fn save(&self, image: &DynamicImage, quality: u8) -> Result<String, GalleryError> {
        let edited = square_crop(image).to_rgb8();

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100)).encode_image(&edited)?;

        let name = format!("{}.jpg", uuid::Uuid::new_v4());
        std::fs::write(self.path(&name), &jpeg)?;

        tracing::info!(
            name = %name,
            width = edited.width(),
            height = edited.height(),
            bytes = jpeg.len(),
            "photo saved"
        );
        Ok(name)
    }

    /// Decode an existing image file and store a copy of it.
    pub fn import(&self, source: &Path, quality: u8) -> Result<String, GalleryError> {
        let image = image::open(source)?;
        tracing::debug!(source = %source.display(), "imported image decoded");
        self.save(&image, quality)
    }

    pub fn load(&self, name: &str) -> Result<DynamicImage, GalleryError> {
        Ok(image::open(self.path(name))?)
    }

    /// Delete a stored photo. A file that is already gone is not an error.
    pub fn remove(&self, name: &str) -> Result<(), GalleryError> {
        match std::fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(name, "photo already removed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Largest centred square of `image`.
pub fn square_crop(image: &DynamicImage) -> DynamicImage {
    let (w, h) = (image.width(), image.height());
    let side = w.min(h);
    image.crop_imm((w - side) / 2, (h - side) / 2, side, side)
}
