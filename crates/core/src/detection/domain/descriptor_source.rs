use crate::descriptor::face_descriptor::FaceDescriptor;
use crate::shared::frame::Frame;

/// Domain interface for turning a face crop into a descriptor.
///
/// `Ok(None)` means the crop held no usable face. An `Err` is a failure of
/// the capability itself. Both are counted as descriptor failures by the
/// pipeline; neither aborts a run.
pub trait DescriptorSource: Send {
    fn describe(&mut self, crop: &Frame)
        -> Result<Option<FaceDescriptor>, Box<dyn std::error::Error>>;
}
