use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::catalog::domain::deduplication_engine::{
    BatchOutcome, DeduplicationEngine, DeduplicationError,
};
use crate::catalog::domain::face_catalog::FaceCatalog;
use crate::catalog::domain::face_record::ObservedFace;

/// A [`FaceCatalog`] shared between ingestion workers.
///
/// Every batch runs its match-then-admit sequence under a single lock
/// acquisition. Two workers holding near-identical faces therefore cannot
/// both miss each other and admit twice.
#[derive(Debug, Default)]
pub struct SharedCatalog {
    inner: Mutex<FaceCatalog>,
}

impl SharedCatalog {
    pub fn new(catalog: FaceCatalog) -> Self {
        Self {
            inner: Mutex::new(catalog),
        }
    }

    /// Deduplicates the faces of one batch that fit the catalog's
    /// dimension, under a single lock.
    pub fn process_compatible(
        &self,
        engine: &DeduplicationEngine,
        observed: &[ObservedFace],
    ) -> Result<BatchOutcome, DeduplicationError> {
        engine.process_compatible(&mut self.lock(), observed)
    }

    pub fn contains_source(&self, path: &Path) -> bool {
        self.lock().contains_source(path)
    }

    pub fn size(&self) -> usize {
        self.lock().size()
    }

    /// Direct access for callers that need several reads to be consistent.
    pub fn lock(&self) -> MutexGuard<'_, FaceCatalog> {
        // A worker that panicked mid-batch cannot leave a partial record:
        // admit pushes a fully built record in one step.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn into_inner(self) -> FaceCatalog {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
