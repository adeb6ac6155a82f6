use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::corpus::domain::image_classifier::ImageClassifier;

/// Bytes read from the start of a file; enough for every signature the
/// `image` crate knows.
const HEADER_LEN: u64 = 64;

/// Classifies files by their leading magic bytes, ignoring the extension.
///
/// A file counts as an image only when its format is recognized and the
/// `image` crate can decode it.
#[derive(Clone, Copy, Debug, Default)]
pub struct SniffingImageClassifier;

impl SniffingImageClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl ImageClassifier for SniffingImageClassifier {
    fn is_image(&self, path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
        let mut header = Vec::with_capacity(HEADER_LEN as usize);
        File::open(path)?.take(HEADER_LEN).read_to_end(&mut header)?;
        Ok(image::guess_format(&header).is_ok_and(|format| format.reading_enabled()))
    }
}
