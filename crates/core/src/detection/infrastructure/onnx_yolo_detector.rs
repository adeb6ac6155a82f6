/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Letterboxes the image, runs the pose-style face model and maps the boxes
/// back to normalized image coordinates. Keypoints in the output rows are
/// ignored.
use std::path::Path;

use crate::detection::domain::face_detector::{DetectedFace, FaceDetector};
use crate::detection::infrastructure::nms::{nms, Candidate};
use crate::detection::infrastructure::onnx_session::open_session;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Input resolution used when the model does not declare one.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f32 = 0.45;

/// Letterbox padding value, the YOLO training convention.
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Values before the keypoints in one output row: cx, cy, w, h, confidence.
const BOX_VALUES: usize = 5;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f32,
    input_size: u32,
}

/// Where the image sits inside the letterboxed model input.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model.
    ///
    /// The input resolution is read from the model's NCHW input shape and
    /// falls back to 640 when the shape is dynamic.
    pub fn new(
        model_path: &Path,
        confidence: f64,
        intra_threads: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path, intra_threads)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);
        log::debug!("YOLO input size: {input_size}");

        Ok(Self {
            session,
            confidence: confidence as f32,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }

        let (input_tensor, letterbox) = letterbox(frame, self.input_size);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut candidates = decode(
            data,
            &shape,
            letterbox,
            frame.width(),
            frame.height(),
            self.confidence,
        )?;
        let kept = nms(&mut candidates, NMS_IOU_THRESH);
        log::debug!(
            "YOLO: {} candidates, {} after NMS",
            candidates.len(),
            kept.len()
        );

        Ok(kept
            .into_iter()
            .map(|c| DetectedFace::from_frame(frame, c.bounding_box))
            .collect())
    }
}

/// Letterbox-resize a frame to `target_size × target_size`, normalized to
/// [0,1] NCHW float32.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).clamp(1, target_size);
    let new_h = ((fh * scale).round() as u32).clamp(1, target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let size = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

/// Turns the raw output tensor into normalized boxes above `confidence`.
///
/// The output is `[1, features, detections]` or `[1, detections, features]`;
/// the smaller of the last two axes is taken as the feature axis.
fn decode(
    data: &[f32],
    shape: &[usize],
    letterbox: Letterbox,
    frame_width: u32,
    frame_height: u32,
    confidence: f32,
) -> Result<Vec<Candidate>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < BOX_VALUES || data.len() < num_dets * num_feats {
        return Err(format!("YOLO output too small for shape {shape:?}").into());
    }

    let value = |det: usize, feat: usize| {
        if transposed {
            data[feat * num_dets + det]
        } else {
            data[det * num_feats + feat]
        }
    };

    let Letterbox {
        scale,
        pad_x,
        pad_y,
    } = letterbox;
    let unpad_x = |v: f64| (v - pad_x as f64) / scale;
    let unpad_y = |v: f64| (v - pad_y as f64) / scale;

    let mut candidates = Vec::new();
    for det in 0..num_dets {
        let score = value(det, 4);
        if score < confidence {
            continue;
        }
        let cx = value(det, 0) as f64;
        let cy = value(det, 1) as f64;
        let w = value(det, 2) as f64;
        let h = value(det, 3) as f64;

        let x1 = unpad_x(cx - w / 2.0).max(0.0);
        let y1 = unpad_y(cy - h / 2.0).max(0.0);
        let x2 = unpad_x(cx + w / 2.0);
        let y2 = unpad_y(cy + h / 2.0);
        let bounding_box =
            BoundingBox::from_pixel_corners(x1, y1, x2, y2, frame_width, frame_height);
        if bounding_box.area() <= 0.0 {
            continue;
        }

        candidates.push(Candidate {
            bounding_box,
            score,
        });
    }
    Ok(candidates)
}
