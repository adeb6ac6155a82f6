pub mod descriptor_source;
pub mod face_detector;
