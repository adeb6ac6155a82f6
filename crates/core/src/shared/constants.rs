pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// BlazeFace short-range detector. Not downloadable; must be present in
/// the model cache or the bundled model directory.
pub const BLAZEFACE_MODEL_NAME: &str = "blazeface_short_range.onnx";

pub const DESCRIPTOR_MODEL_NAME: &str = "w600k_r50.onnx";
pub const DESCRIPTOR_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Application directory name under the platform cache/data directories.
pub const APP_DIR_NAME: &str = "FaceCatalog";

pub const CATALOG_FILE_NAME: &str = "catalog.json";

/// Pixels added around each detected face before it is cropped for
/// description.
pub const FACE_CROP_MARGIN: u32 = 120;

