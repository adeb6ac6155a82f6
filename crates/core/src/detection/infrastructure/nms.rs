use crate::shared::bounding_box::BoundingBox;

/// A scored box before non-maximum suppression.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Candidate {
    pub bounding_box: BoundingBox,
    pub score: f32,
}

/// Greedy NMS: highest score first, dropping boxes that overlap a kept box
/// by more than `iou_thresh`.
pub(crate) fn nms(candidates: &mut [Candidate], iou_thresh: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::new();
    for candidate in candidates.iter() {
        if keep
            .iter()
            .all(|k| k.bounding_box.iou(&candidate.bounding_box) <= iou_thresh)
        {
            keep.push(*candidate);
        }
    }
    keep
}
