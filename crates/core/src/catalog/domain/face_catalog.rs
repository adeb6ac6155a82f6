use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::catalog::domain::face_record::{FaceId, FaceRecord, Provenance};
use crate::descriptor::face_descriptor::FaceDescriptor;
use crate::descriptor::similarity_comparator::{SimilarityComparator, SimilarityError};

/// Inconsistencies found when rebuilding a catalog from stored records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("duplicate record id {0}")]
    DuplicateId(FaceId),
    #[error("record {0} leaves no room for further ids")]
    IdSpaceExhausted(FaceId),
    #[error("record {id} has dimension {found}, catalog uses {expected}")]
    MixedDimensions {
        id: FaceId,
        expected: usize,
        found: usize,
    },
}

/// The set of accepted, mutually distinguishable faces.
///
/// Append-only: records are created by [`FaceCatalog::admit`] and never
/// mutated or removed. Records are kept in admission order, which is also
/// the tie-break order of [`FaceCatalog::find_best_match`].
///
/// Lookup is a linear scan over all records.
#[derive(Clone, Debug)]
pub struct FaceCatalog {
    comparator: SimilarityComparator,
    records: Vec<FaceRecord>,
    sources: HashSet<PathBuf>,
    next_id: u64,
    next_sequence: u64,
}

impl Default for FaceCatalog {
    fn default() -> Self {
        Self::new(SimilarityComparator::default())
    }
}

impl FaceCatalog {
    pub fn new(comparator: SimilarityComparator) -> Self {
        Self {
            comparator,
            records: Vec::new(),
            sources: HashSet::new(),
            next_id: 0,
            next_sequence: 0,
        }
    }

    /// Rebuilds a catalog from persisted records.
    ///
    /// `next_id` is raised past every stored id so ids are never reused,
    /// even if the stored counter is stale.
    pub fn from_records(
        comparator: SimilarityComparator,
        mut records: Vec<FaceRecord>,
        next_id: u64,
    ) -> Result<Self, CatalogError> {
        records.sort_by_key(|r| (r.first_seen_at(), r.id()));

        let mut ids = HashSet::with_capacity(records.len());
        let expected = records.first().map(|r| r.descriptor().dimension());
        for record in &records {
            if !ids.insert(record.id()) {
                return Err(CatalogError::DuplicateId(record.id()));
            }
            if let Some(expected) = expected {
                let found = record.descriptor().dimension();
                if found != expected {
                    return Err(CatalogError::MixedDimensions {
                        id: record.id(),
                        expected,
                        found,
                    });
                }
            }
        }

        let mut max_id = 0;
        for record in &records {
            let after = record
                .id()
                .0
                .checked_add(1)
                .ok_or(CatalogError::IdSpaceExhausted(record.id()))?;
            max_id = max_id.max(after);
        }
        let next_sequence = match records.last() {
            Some(last) => last
                .first_seen_at()
                .checked_add(1)
                .ok_or(CatalogError::IdSpaceExhausted(last.id()))?,
            None => 0,
        };
        if next_id == u64::MAX {
            return Err(CatalogError::IdSpaceExhausted(FaceId(next_id)));
        }
        let sources = records
            .iter()
            .filter_map(|r| r.provenance().source_image_path.clone())
            .collect();

        Ok(Self {
            comparator,
            records,
            sources,
            next_id: next_id.max(max_id),
            next_sequence,
        })
    }

    /// Closest record within the comparator's threshold, with its distance.
    ///
    /// On equal minimal distance the earliest-admitted record wins.
    pub fn find_best_match(
        &self,
        descriptor: &FaceDescriptor,
    ) -> Result<Option<(FaceId, f64)>, SimilarityError> {
        let mut best: Option<(FaceId, f64)> = None;
        for record in &self.records {
            let distance = self.comparator.distance(descriptor, record.descriptor())?;
            if distance.is_nan() {
                continue;
            }
            // Strict comparison keeps the earlier record on ties.
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((record.id(), distance));
            }
        }
        Ok(best.filter(|&(_, d)| d <= self.comparator.threshold()))
    }

    /// Stores a new record and returns it.
    pub fn admit(&mut self, descriptor: FaceDescriptor, provenance: Provenance) -> &FaceRecord {
        let id = FaceId(self.next_id);
        self.next_id += 1;
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        if let Some(path) = &provenance.source_image_path {
            self.sources.insert(path.clone());
        }
        self.records
            .push(FaceRecord::new(id, descriptor, provenance, sequence));
        &self.records[self.records.len() - 1]
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in admission order.
    pub fn records(&self) -> &[FaceRecord] {
        &self.records
    }

    /// Whether any record was taken from the image at `path`.
    pub fn contains_source(&self, path: &Path) -> bool {
        self.sources.contains(path)
    }

    /// Descriptor length shared by all records, `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(|r| r.descriptor().dimension())
    }

    pub fn comparator(&self) -> &SimilarityComparator {
        &self.comparator
    }

    /// Id the next admission will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::similarity_comparator::DistanceMetric;
    use crate::shared::bounding_box::BoundingBox;
    use approx::assert_relative_eq;

    fn d(values: &[f32]) -> FaceDescriptor {
        FaceDescriptor::new(values.to_vec()).unwrap()
    }

    fn provenance() -> Provenance {
        Provenance::in_memory(BoundingBox::new(0.0, 0.0, 0.5, 0.5))
    }

    fn from_file(path: &str) -> Provenance {
        Provenance {
            source_image_path: Some(PathBuf::from(path)),
            ..provenance()
        }
    }

    fn euclidean(threshold: f64) -> FaceCatalog {
        FaceCatalog::new(SimilarityComparator::new(DistanceMetric::Euclidean, threshold))
    }

    // ── admit ────────────────────────────────────────────────────────

    #[test]
    fn test_admit_assigns_sequential_ids_and_order() {
        let mut catalog = euclidean(0.5);
        let first = catalog.admit(d(&[0.0, 0.0]), provenance()).clone();
        let second = catalog.admit(d(&[5.0, 5.0]), provenance()).clone();

        assert_eq!(first.id(), FaceId(0));
        assert_eq!(second.id(), FaceId(1));
        assert!(first.first_seen_at() < second.first_seen_at());
        assert_eq!(catalog.size(), 2);
        assert_eq!(catalog.next_id(), 2);
    }

    #[test]
    fn test_admit_tracks_source_paths() {
        let mut catalog = euclidean(0.5);
        catalog.admit(d(&[0.0]), from_file("/photos/a.jpg"));

        assert!(catalog.contains_source(Path::new("/photos/a.jpg")));
        assert!(!catalog.contains_source(Path::new("/photos/b.jpg")));
    }

    #[test]
    fn test_dimension_follows_first_record() {
        let mut catalog = euclidean(0.5);
        assert_eq!(catalog.dimension(), None);
        catalog.admit(d(&[0.0, 1.0, 2.0]), provenance());
        assert_eq!(catalog.dimension(), Some(3));
    }

    // ── find_best_match ──────────────────────────────────────────────

    #[test]
    fn test_find_best_match_on_empty_catalog() {
        let catalog = euclidean(0.5);
        assert_eq!(catalog.find_best_match(&d(&[1.0])).unwrap(), None);
    }

    #[test]
    fn test_find_best_match_picks_smallest_distance() {
        let mut catalog = euclidean(1.0);
        catalog.admit(d(&[0.9]), provenance());
        let closest = catalog.admit(d(&[0.2]), provenance()).id();
        catalog.admit(d(&[-0.5]), provenance());

        let (id, distance) = catalog.find_best_match(&d(&[0.0])).unwrap().unwrap();

        assert_eq!(id, closest);
        assert_relative_eq!(distance, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_find_best_match_rejects_outside_threshold() {
        let mut catalog = euclidean(0.5);
        catalog.admit(d(&[2.0]), provenance());
        assert_eq!(catalog.find_best_match(&d(&[0.0])).unwrap(), None);
    }

    #[test]
    fn test_find_best_match_tie_goes_to_earliest_record() {
        let mut catalog = euclidean(1.0);
        let r1 = catalog.admit(d(&[1.0, 0.0]), provenance()).id();
        let _r2 = catalog.admit(d(&[-1.0, 0.0]), provenance()).id();

        let (id, distance) = catalog.find_best_match(&d(&[0.0, 0.0])).unwrap().unwrap();

        assert_eq!(id, r1);
        assert_relative_eq!(distance, 1.0);
    }

    #[test]
    fn test_find_best_match_propagates_dimension_mismatch() {
        let mut catalog = euclidean(1.0);
        catalog.admit(d(&[1.0, 0.0]), provenance());
        let err = catalog.find_best_match(&d(&[1.0])).unwrap_err();
        assert_eq!(err, SimilarityError::DimensionMismatch { left: 1, right: 2 });
    }

    // ── from_records ─────────────────────────────────────────────────

    #[test]
    fn test_from_records_restores_admission_order_and_counters() {
        let records = vec![
            FaceRecord::new(FaceId(4), d(&[1.0, 0.0]), from_file("/b.jpg"), 7),
            FaceRecord::new(FaceId(2), d(&[-1.0, 0.0]), from_file("/a.jpg"), 3),
        ];
        let mut catalog =
            FaceCatalog::from_records(SimilarityComparator::default(), records, 0).unwrap();

        assert_eq!(catalog.records()[0].id(), FaceId(2));
        assert_eq!(catalog.next_id(), 5);
        assert!(catalog.contains_source(Path::new("/a.jpg")));

        let admitted = catalog.admit(d(&[0.0, 1.0]), provenance());
        assert_eq!(admitted.id(), FaceId(5));
        assert_eq!(admitted.first_seen_at(), 8);
    }

    #[test]
    fn test_from_records_keeps_larger_stored_next_id() {
        let records = vec![FaceRecord::new(FaceId(0), d(&[1.0]), provenance(), 0)];
        let catalog =
            FaceCatalog::from_records(SimilarityComparator::default(), records, 10).unwrap();
        assert_eq!(catalog.next_id(), 10);
    }

    #[test]
    fn test_from_records_rejects_duplicate_ids() {
        let records = vec![
            FaceRecord::new(FaceId(1), d(&[1.0]), provenance(), 0),
            FaceRecord::new(FaceId(1), d(&[2.0]), provenance(), 1),
        ];
        let err = FaceCatalog::from_records(SimilarityComparator::default(), records, 0)
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId(FaceId(1)));
    }

    #[test]
    fn test_from_records_rejects_largest_id() {
        let records = vec![FaceRecord::new(FaceId(u64::MAX), d(&[1.0]), provenance(), 0)];
        let err = FaceCatalog::from_records(SimilarityComparator::default(), records, 0)
            .unwrap_err();
        assert_eq!(err, CatalogError::IdSpaceExhausted(FaceId(u64::MAX)));
    }

    #[test]
    fn test_from_records_rejects_exhausted_counters() {
        let late = vec![FaceRecord::new(FaceId(0), d(&[1.0]), provenance(), u64::MAX)];
        assert!(matches!(
            FaceCatalog::from_records(SimilarityComparator::default(), late, 1),
            Err(CatalogError::IdSpaceExhausted(_))
        ));
        assert!(matches!(
            FaceCatalog::from_records(SimilarityComparator::default(), Vec::new(), u64::MAX),
            Err(CatalogError::IdSpaceExhausted(_))
        ));
    }

    #[test]
    fn test_from_records_rejects_mixed_dimensions() {
        let records = vec![
            FaceRecord::new(FaceId(0), d(&[1.0]), provenance(), 0),
            FaceRecord::new(FaceId(1), d(&[1.0, 2.0]), provenance(), 1),
        ];
        let err = FaceCatalog::from_records(SimilarityComparator::default(), records, 0)
            .unwrap_err();
        assert!(matches!(err, CatalogError::MixedDimensions { found: 2, .. }));
    }
}
