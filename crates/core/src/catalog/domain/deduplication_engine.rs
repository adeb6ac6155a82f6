use thiserror::Error;

use crate::catalog::domain::face_catalog::FaceCatalog;
use crate::catalog::domain::face_record::{FaceId, ObservedFace};
use crate::descriptor::similarity_comparator::SimilarityError;

/// How one observed face relates to the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Same identity as an existing record; nothing was admitted.
    Matched(FaceId),
    /// No record within threshold; admitted under the given id.
    Novel(FaceId),
}

impl MatchOutcome {
    pub fn face_id(&self) -> FaceId {
        match *self {
            MatchOutcome::Matched(id) | MatchOutcome::Novel(id) => id,
        }
    }

    pub fn is_novel(&self) -> bool {
        matches!(self, MatchOutcome::Novel(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeduplicationError {
    #[error("observed face {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Similarity(#[from] SimilarityError),
}

/// Result of [`DeduplicationEngine::process_compatible`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchOutcome {
    /// Outcomes of the faces that were deduplicated, in input order.
    pub outcomes: Vec<MatchOutcome>,
    /// Input indices of faces left out for having the wrong dimension.
    pub rejected: Vec<usize>,
}

/// Matches batches of observed faces against a catalog and admits the
/// novel ones.
///
/// Faces of one batch are handled in input order, and a face admitted
/// earlier in the batch is visible to the faces after it, so two
/// near-identical faces in the same image yield one record. A matched face
/// is never admitted and never alters the record it matched.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeduplicationEngine;

impl DeduplicationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Processes one batch. The whole batch is dimension-checked before the
    /// catalog is touched, so an error leaves the catalog unchanged.
    pub fn process(
        &self,
        catalog: &mut FaceCatalog,
        observed: &[ObservedFace],
    ) -> Result<Vec<MatchOutcome>, DeduplicationError> {
        if observed.is_empty() {
            return Ok(Vec::new());
        }
        check_dimensions(catalog, observed)?;

        let mut outcomes = Vec::with_capacity(observed.len());
        for face in observed {
            let outcome = match catalog.find_best_match(&face.descriptor)? {
                Some((id, distance)) => {
                    log::debug!("Matched {id} at distance {distance:.4}");
                    MatchOutcome::Matched(id)
                }
                None => {
                    let id = catalog
                        .admit(face.descriptor.clone(), face.provenance.clone())
                        .id();
                    log::debug!("Admitted {id}");
                    MatchOutcome::Novel(id)
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Like [`process`](Self::process), but leaves out faces whose
    /// dimension differs from the catalog's instead of failing the batch.
    ///
    /// On an empty catalog the first face of the batch sets the dimension.
    pub fn process_compatible(
        &self,
        catalog: &mut FaceCatalog,
        observed: &[ObservedFace],
    ) -> Result<BatchOutcome, DeduplicationError> {
        let Some(expected) = catalog
            .dimension()
            .or_else(|| observed.first().map(|f| f.descriptor.dimension()))
        else {
            return Ok(BatchOutcome::default());
        };

        let mut compatible = Vec::with_capacity(observed.len());
        let mut rejected = Vec::new();
        for (index, face) in observed.iter().enumerate() {
            if face.descriptor.dimension() == expected {
                compatible.push(face.clone());
            } else {
                log::debug!(
                    "Face {index} has dimension {}, catalog uses {expected}",
                    face.descriptor.dimension()
                );
                rejected.push(index);
            }
        }

        let outcomes = self.process(catalog, &compatible)?;
        Ok(BatchOutcome { outcomes, rejected })
    }
}

fn check_dimensions(
    catalog: &FaceCatalog,
    observed: &[ObservedFace],
) -> Result<(), DeduplicationError> {
    let expected = catalog
        .dimension()
        .unwrap_or_else(|| observed[0].descriptor.dimension());
    match observed
        .iter()
        .enumerate()
        .find(|(_, f)| f.descriptor.dimension() != expected)
    {
        Some((index, face)) => Err(DeduplicationError::DimensionMismatch {
            index,
            expected,
            found: face.descriptor.dimension(),
        }),
        None => Ok(()),
    }
}
