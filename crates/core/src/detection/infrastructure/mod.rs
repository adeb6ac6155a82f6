pub mod arcface_descriptor_source;
pub(crate) mod nms;
pub mod onnx_blazeface_detector;
pub mod onnx_session;
pub mod onnx_yolo_detector;
