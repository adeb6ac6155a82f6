/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// Produces one normalized bounding box per face together with a margin
/// crop for the descriptor stage. Landmarks in the regressor output are
/// ignored.
use std::path::Path;

use crate::detection::domain::face_detector::{DetectedFace, FaceDetector};
use crate::detection::infrastructure::nms::{nms, Candidate};
use crate::detection::infrastructure::onnx_session::open_session;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// Default confidence threshold.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f32 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: box (4) + 6 keypoints (12).
const REGRESSOR_STRIDE: usize = 16;

pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    confidence: f32,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model.
    pub fn new(
        model_path: &Path,
        confidence: f64,
        intra_threads: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path, intra_threads)?;
        Ok(Self {
            session,
            confidence: confidence as f32,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }

        let input_tensor = preprocess(frame, INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }
        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let mut candidates = decode(reg_data, score_data, &self.anchors, self.confidence);
        let kept = nms(&mut candidates, NMS_IOU_THRESH);
        log::debug!(
            "BlazeFace: {} candidates, {} after NMS",
            candidates.len(),
            kept.len()
        );

        Ok(kept
            .into_iter()
            .map(|c| DetectedFace::from_frame(frame, c.bounding_box))
            .collect())
    }
}

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

/// Generate BlazeFace anchors for the short-range model.
///
/// Two feature maps: 16×16 with 2 anchors per cell and 8×8 with 6.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

/// Turns raw model output into normalized boxes above `confidence`.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    confidence: f32,
) -> Vec<Candidate> {
    let scale = INPUT_SIZE as f32;
    let mut candidates = Vec::new();

    for (i, &raw_score) in score_data.iter().enumerate().take(anchors.len()) {
        let score = sigmoid(raw_score);
        if score < confidence {
            continue;
        }
        let offset = i * REGRESSOR_STRIDE;
        if offset + 4 > reg_data.len() {
            break;
        }

        let anchor = anchors[i];
        let cx = anchor[0] + reg_data[offset] / scale;
        let cy = anchor[1] + reg_data[offset + 1] / scale;
        let w = reg_data[offset + 2] / scale;
        let h = reg_data[offset + 3] / scale;

        // Clamp the corners first so a box hanging off the left edge keeps
        // only its visible part instead of shifting right.
        let x1 = (cx - w / 2.0).clamp(0.0, 1.0);
        let y1 = (cy - h / 2.0).clamp(0.0, 1.0);
        let x2 = (cx + w / 2.0).clamp(0.0, 1.0);
        let y2 = (cy + h / 2.0).clamp(0.0, 1.0);
        let bounding_box = BoundingBox::new(x1, y1, x2 - x1, y2 - y1);
        if bounding_box.area() <= 0.0 {
            continue;
        }

        candidates.push(Candidate {
            bounding_box,
            score,
        });
    }
    candidates
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
