use std::path::Path;

use crate::shared::frame::Frame;

/// A decoded image together with a digest of the bytes it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedImage {
    pub frame: Frame,
    /// Lowercase hex digest of the file contents.
    pub checksum: String,
}

/// Reads and decodes an image file into RGB pixels.
pub trait ImageLoader: Send {
    fn load(&self, path: &Path) -> Result<LoadedImage, Box<dyn std::error::Error>>;
}
