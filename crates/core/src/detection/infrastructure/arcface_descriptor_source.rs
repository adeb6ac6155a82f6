/// ArcFace descriptor source using ONNX Runtime.
///
/// Produces 512-d L2-normalized embeddings, so the catalog's cosine
/// distance is `1 - dot(a, b)`.
use std::path::Path;

use crate::descriptor::face_descriptor::{DescriptorError, FaceDescriptor};
use crate::detection::domain::descriptor_source::DescriptorSource;
use crate::detection::infrastructure::onnx_session::open_session;
use crate::shared::frame::Frame;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

/// Crops narrower or shorter than this carry too little detail to embed.
pub const MIN_CROP_SIDE: u32 = 16;

pub struct ArcfaceDescriptorSource {
    session: ort::session::Session,
}

impl ArcfaceDescriptorSource {
    pub fn new(model_path: &Path, intra_threads: usize) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: open_session(model_path, intra_threads)?,
        })
    }
}

impl DescriptorSource for ArcfaceDescriptorSource {
    fn describe(
        &mut self,
        crop: &Frame,
    ) -> Result<Option<FaceDescriptor>, Box<dyn std::error::Error>> {
        if crop.width() < MIN_CROP_SIDE || crop.height() < MIN_CROP_SIDE {
            log::debug!("Crop {}x{} too small to describe", crop.width(), crop.height());
            return Ok(None);
        }

        let tensor = preprocess(crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        Ok(to_descriptor(embedding_slice.to_vec())?)
    }
}

/// Resize crop to 112x112, normalize to [-1, 1], NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src = crop.as_ndarray();
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}

/// An all-zero embedding carries no identity and yields no descriptor.
fn to_descriptor(embedding: Vec<f32>) -> Result<Option<FaceDescriptor>, DescriptorError> {
    if embedding.iter().all(|v| *v == 0.0) {
        return Ok(None);
    }
    FaceDescriptor::normalized(embedding).map(Some)
}
