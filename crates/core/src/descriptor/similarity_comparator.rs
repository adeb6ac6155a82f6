use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::face_descriptor::FaceDescriptor;

/// Default cosine-distance threshold: cosine similarity >= 0.4, the usual
/// same-person cut-off for ArcFace embeddings.
pub const DEFAULT_COSINE_THRESHOLD: f64 = 0.6;

/// Default euclidean threshold, the tolerance dlib-style 128-d encoders
/// are tuned for.
pub const DEFAULT_EUCLIDEAN_THRESHOLD: f64 = 0.6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    #[error("descriptor dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`, in `[0, 2]`.
    Cosine,
    /// L2 distance.
    Euclidean,
}

impl DistanceMetric {
    pub fn default_threshold(self) -> f64 {
        match self {
            DistanceMetric::Cosine => DEFAULT_COSINE_THRESHOLD,
            DistanceMetric::Euclidean => DEFAULT_EUCLIDEAN_THRESHOLD,
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::Euclidean => write!(f, "euclidean"),
        }
    }
}

/// Result of comparing two descriptors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Comparison {
    pub is_match: bool,
    pub distance: f64,
}

/// Decides whether two descriptors belong to the same identity.
///
/// Pure: the verdict depends only on the two descriptors, the metric and
/// the threshold. `is_match` is `distance <= threshold`; a NaN distance
/// never matches.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityComparator {
    metric: DistanceMetric,
    threshold: f64,
}

impl Default for SimilarityComparator {
    fn default() -> Self {
        Self::with_default_threshold(DistanceMetric::Cosine)
    }
}

impl SimilarityComparator {
    pub fn new(metric: DistanceMetric, threshold: f64) -> Self {
        Self { metric, threshold }
    }

    pub fn with_default_threshold(metric: DistanceMetric) -> Self {
        Self::new(metric, metric.default_threshold())
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn compare(
        &self,
        a: &FaceDescriptor,
        b: &FaceDescriptor,
    ) -> Result<Comparison, SimilarityError> {
        let distance = self.distance(a, b)?;
        Ok(Comparison {
            is_match: distance <= self.threshold,
            distance,
        })
    }

    pub fn distance(&self, a: &FaceDescriptor, b: &FaceDescriptor) -> Result<f64, SimilarityError> {
        if a.dimension() != b.dimension() {
            return Err(SimilarityError::DimensionMismatch {
                left: a.dimension(),
                right: b.dimension(),
            });
        }
        Ok(match self.metric {
            DistanceMetric::Cosine => cosine_distance(a.values(), b.values()),
            DistanceMetric::Euclidean => euclidean_distance(a.values(), b.values()),
        })
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    if a == b {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    let similarity = if denom > 0.0 { dot / denom } else { 0.0 };
    (1.0 - similarity).clamp(0.0, 2.0)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64 - *y as f64).powi(2))
        .sum::<f64>()
        .sqrt()
}
