//! Deterministic stand-ins for the detection and decoding adapters.
//!
//! A stub "image" is a text file of space-separated `r,g,b` pixels. Each
//! pixel is one face whose descriptor is the pixel's three values. A black
//! pixel yields no descriptor, a white pixel makes the descriptor source
//! fail, a blue channel of 254 yields a 2-d descriptor, and a file starting
//! with `corrupt` fails to decode.

use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::domain::face_catalog::FaceCatalog;
use crate::catalog::domain::face_record::LocationInfo;
use crate::catalog::domain::shared_catalog::SharedCatalog;
use crate::corpus::domain::image_classifier::ImageClassifier;
use crate::corpus::domain::image_loader::{ImageLoader, LoadedImage};
use crate::corpus::domain::location_reader::LocationReader;
use crate::descriptor::face_descriptor::FaceDescriptor;
use crate::descriptor::similarity_comparator::{DistanceMetric, SimilarityComparator};
use crate::detection::domain::descriptor_source::DescriptorSource;
use crate::detection::domain::face_detector::{DetectedFace, FaceDetector};
use crate::pipeline::file_analyzer::FileAnalyzer;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

type BoxError = Box<dyn std::error::Error>;

/// `jpg` is an image, `bad` cannot be classified, anything else is not an
/// image.
pub struct StubClassifier;

impl ImageClassifier for StubClassifier {
    fn is_image(&self, path: &Path) -> Result<bool, BoxError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jpg") => Ok(true),
            Some("bad") => Err("unreadable header".into()),
            _ => Ok(false),
        }
    }
}

pub struct StubLoader;

impl ImageLoader for StubLoader {
    fn load(&self, path: &Path) -> Result<LoadedImage, BoxError> {
        let text = fs::read_to_string(path)?;
        if text.starts_with("corrupt") {
            return Err("cannot decode".into());
        }
        let mut data = Vec::new();
        for pixel in text.split_whitespace() {
            for channel in pixel.split(',') {
                data.push(channel.trim().parse::<u8>()?);
            }
        }
        let width = (data.len() / 3) as u32;
        Ok(LoadedImage {
            frame: Frame::new(data, width, 1),
            checksum: blake3::hash(text.as_bytes()).to_hex().to_string(),
        })
    }
}

/// One face per pixel column.
pub struct StubDetector;

impl FaceDetector for StubDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, BoxError> {
        let w = frame.width();
        Ok((0..w)
            .map(|i| DetectedFace {
                bounding_box: BoundingBox::new(i as f32 / w as f32, 0.0, 1.0 / w as f32, 1.0),
                crop: frame.crop(i, 0, 1, 1),
            })
            .collect())
    }
}

pub struct StubDescriptorSource;

impl DescriptorSource for StubDescriptorSource {
    fn describe(&mut self, crop: &Frame) -> Result<Option<FaceDescriptor>, BoxError> {
        let values: Vec<f32> = crop.data()[..3].iter().map(|&v| v as f32).collect();
        match crop.data()[..3] {
            [0, 0, 0] => Ok(None),
            [255, 255, 255] => Err("descriptor model failed".into()),
            [_, _, 254] => Ok(Some(FaceDescriptor::new(values[..2].to_vec())?)),
            _ => Ok(Some(FaceDescriptor::new(values)?)),
        }
    }
}

pub struct StubLocationReader(pub Option<LocationInfo>);

impl LocationReader for StubLocationReader {
    fn read_location(&self, _path: &Path) -> Result<Option<LocationInfo>, BoxError> {
        Ok(self.0)
    }
}

pub fn analyzer() -> FileAnalyzer {
    analyzer_with_location(None)
}

pub fn analyzer_with_location(location: Option<LocationInfo>) -> FileAnalyzer {
    FileAnalyzer::new(
        Box::new(StubClassifier),
        Box::new(StubLoader),
        Box::new(StubDetector),
        Box::new(StubDescriptorSource),
        Some(Box::new(StubLocationReader(location))),
    )
}

/// Pixel values within 5 of each other are the same face.
pub fn shared_catalog() -> SharedCatalog {
    SharedCatalog::new(FaceCatalog::new(SimilarityComparator::new(
        DistanceMetric::Euclidean,
        5.0,
    )))
}

/// Writes `(relative name, content)` pairs under `root` and returns their
/// paths in the given order.
pub fn write_corpus(root: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, content)| {
            let path = root.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            path
        })
        .collect()
}
