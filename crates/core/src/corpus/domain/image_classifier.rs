use std::path::Path;

/// Decides whether a file is an image the loader can decode.
///
/// An `Err` means the file could not be inspected at all; the pipeline
/// counts it as a classification failure and moves on.
pub trait ImageClassifier: Send {
    fn is_image(&self, path: &Path) -> Result<bool, Box<dyn std::error::Error>>;
}
