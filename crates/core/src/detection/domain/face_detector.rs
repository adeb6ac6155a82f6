use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::FACE_CROP_MARGIN;
use crate::shared::frame::Frame;

/// One face found in an image.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    /// Location in the source image, normalized to `[0, 1]`.
    pub bounding_box: BoundingBox,
    /// Pixels of the face plus [`FACE_CROP_MARGIN`] on every side,
    /// clipped to the image.
    pub crop: Frame,
}

impl DetectedFace {
    /// Cuts the face out of `frame` with the standard margin.
    pub fn from_frame(frame: &Frame, bounding_box: BoundingBox) -> Self {
        let (x, y, w, h) =
            bounding_box.to_pixel_rect(frame.width(), frame.height(), FACE_CROP_MARGIN);
        Self {
            bounding_box,
            crop: frame.crop(x, y, w, h),
        }
    }
}

/// Domain interface for face detection.
///
/// Returns an empty vector when the image contains no faces. Sessions keep
/// mutable inference state, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}
