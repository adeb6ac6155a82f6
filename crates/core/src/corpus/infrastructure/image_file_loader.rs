use std::fs;
use std::path::Path;

use crate::corpus::domain::image_loader::{ImageLoader, LoadedImage};
use crate::shared::frame::Frame;

/// Decodes image files with the `image` crate and fingerprints their bytes
/// with blake3.
///
/// The file is read once; the same buffer feeds the hash and the decoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileLoader;

impl ImageFileLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<LoadedImage, Box<dyn std::error::Error>> {
        let bytes = fs::read(path)?;
        let checksum = blake3::hash(&bytes).to_hex().to_string();
        let decoded = image::load_from_memory(&bytes)?;
        Ok(LoadedImage {
            frame: Frame::from_rgb_image(decoded.to_rgb8()),
            checksum,
        })
    }
}
