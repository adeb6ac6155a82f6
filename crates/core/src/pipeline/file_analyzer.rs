use std::path::Path;

use crate::catalog::domain::face_record::{LocationInfo, ObservedFace, Provenance};
use crate::corpus::domain::image_classifier::ImageClassifier;
use crate::corpus::domain::image_loader::ImageLoader;
use crate::corpus::domain::location_reader::LocationReader;
use crate::detection::domain::descriptor_source::DescriptorSource;
use crate::detection::domain::face_detector::FaceDetector;

/// Result of sniffing one file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Image,
    NotImage,
    Failed,
}

/// Faces found in one image, ready for deduplication.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageAnalysis {
    pub faces_detected: usize,
    pub descriptor_failures: usize,
    /// One entry per face that produced a descriptor, in detection order.
    pub observed: Vec<ObservedFace>,
}

/// Everything that happens to a file outside the catalog lock: sniffing,
/// decoding, detection, description and location lookup.
///
/// Each ingestion worker owns one analyzer, so the adapters never need to
/// be shared between threads.
pub struct FileAnalyzer {
    classifier: Box<dyn ImageClassifier>,
    loader: Box<dyn ImageLoader>,
    detector: Box<dyn FaceDetector>,
    descriptor_source: Box<dyn DescriptorSource>,
    location_reader: Option<Box<dyn LocationReader>>,
}

impl FileAnalyzer {
    pub fn new(
        classifier: Box<dyn ImageClassifier>,
        loader: Box<dyn ImageLoader>,
        detector: Box<dyn FaceDetector>,
        descriptor_source: Box<dyn DescriptorSource>,
        location_reader: Option<Box<dyn LocationReader>>,
    ) -> Self {
        Self {
            classifier,
            loader,
            detector,
            descriptor_source,
            location_reader,
        }
    }

    pub fn classify(&self, path: &Path) -> Classification {
        match self.classifier.is_image(path) {
            Ok(true) => Classification::Image,
            Ok(false) => Classification::NotImage,
            Err(e) => {
                log::warn!("Cannot classify {}: {e}", path.display());
                Classification::Failed
            }
        }
    }

    /// Decodes the image and describes every detected face.
    ///
    /// An `Err` is a detection failure for the whole file; a face without a
    /// descriptor only increments `descriptor_failures`.
    pub fn analyze(&mut self, path: &Path) -> Result<ImageAnalysis, Box<dyn std::error::Error>> {
        let image = self.loader.load(path)?;
        let detected = self.detector.detect(&image.frame)?;
        log::debug!("{}: {} faces detected", path.display(), detected.len());

        let location = self.read_location(path);
        let mut analysis = ImageAnalysis {
            faces_detected: detected.len(),
            ..Default::default()
        };

        for face in detected {
            match self.descriptor_source.describe(&face.crop) {
                Ok(Some(descriptor)) => analysis.observed.push(ObservedFace {
                    descriptor,
                    provenance: Provenance {
                        source_image_path: Some(path.to_path_buf()),
                        bounding_box: face.bounding_box,
                        location,
                        source_checksum: Some(image.checksum.clone()),
                    },
                }),
                Ok(None) => {
                    log::debug!("{}: no descriptor for face", path.display());
                    analysis.descriptor_failures += 1;
                }
                Err(e) => {
                    log::warn!("{}: descriptor failed: {e}", path.display());
                    analysis.descriptor_failures += 1;
                }
            }
        }
        Ok(analysis)
    }

    fn read_location(&self, path: &Path) -> Option<LocationInfo> {
        let reader = self.location_reader.as_ref()?;
        match reader.read_location(path) {
            Ok(location) => location,
            Err(e) => {
                log::debug!("{}: no location: {e}", path.display());
                None
            }
        }
    }
}
