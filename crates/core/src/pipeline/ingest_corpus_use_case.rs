use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::catalog::domain::shared_catalog::SharedCatalog;
use crate::corpus::infrastructure::corpus_walker::{CorpusError, CorpusWalker};
use crate::pipeline::ingestion_executor::{IngestionConfig, IngestionExecutor};
use crate::pipeline::ingestion_stats::IngestionStats;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error(transparent)]
    InvalidRoot(#[from] CorpusError),
    #[error("ingestion aborted: {0}")]
    Aborted(String),
}

/// Corpus ingestion: walk → classify → detect → describe → deduplicate.
///
/// Per-file failures are counted in the returned stats. Only an unusable
/// root or a crashed executor aborts the run, and the root is checked before
/// any file is touched.
pub struct IngestCorpusUseCase {
    walker: CorpusWalker,
    executor: Box<dyn IngestionExecutor>,
    config: IngestionConfig,
}

impl IngestCorpusUseCase {
    pub fn new(executor: Box<dyn IngestionExecutor>, config: IngestionConfig) -> Self {
        Self {
            walker: CorpusWalker::new(),
            executor,
            config,
        }
    }

    /// Ingests every file under `root` (or `root` itself when it is a file)
    /// into `catalog`.
    pub fn run(
        &mut self,
        root: &Path,
        catalog: &SharedCatalog,
    ) -> Result<IngestionStats, IngestionError> {
        // Provenance paths are absolute so skip checks hold across runs
        // started from different working directories.
        let root = fs::canonicalize(root).map_err(|source| CorpusError::InvalidRoot {
            path: root.to_path_buf(),
            source,
        })?;
        let entries = self.walker.walk(&root)?;
        log::info!("Ingesting {} files from {}", entries.len(), root.display());

        let stats = self
            .executor
            .execute(entries, catalog, &self.config)
            .map_err(|e| IngestionError::Aborted(e.to_string()))?;

        if self.config.is_cancelled() {
            log::warn!("Ingestion cancelled after {} files", stats.total_files);
        }
        log::info!(
            "Ingested {} files: {} faces admitted, {} matched, catalog holds {}",
            stats.total_files,
            stats.faces_admitted,
            stats.faces_matched,
            catalog.size()
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::catalog_store::CatalogStore;
    use crate::catalog::infrastructure::json_catalog_store::JsonCatalogStore;
    use crate::descriptor::similarity_comparator::{DistanceMetric, SimilarityComparator};
    use crate::pipeline::ingestion_executor::SequentialIngestionExecutor;
    use crate::pipeline::test_stubs::{analyzer, shared_catalog, write_corpus};
    use tempfile::TempDir;

    fn use_case(skip_already_processed: bool) -> IngestCorpusUseCase {
        IngestCorpusUseCase::new(
            Box::new(SequentialIngestionExecutor::new(analyzer())),
            IngestionConfig {
                skip_already_processed,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_two_photos_of_one_person_and_a_text_file() {
        let tmp = TempDir::new().unwrap();
        write_corpus(
            tmp.path(),
            &[("a.jpg", "10,10,10"), ("b.jpg", "11,10,10"), ("c.txt", "hello")],
        );
        let catalog = shared_catalog();

        let stats = use_case(true).run(tmp.path(), &catalog).unwrap();

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.image_files, 2);
        assert_eq!(stats.classification_failures, 0);
        assert_eq!(stats.faces_detected, 2);
        assert_eq!(stats.faces_admitted, 1);
        assert_eq!(stats.faces_matched, 1);
        assert_eq!(catalog.size(), 1);
    }

    #[test]
    fn test_empty_corpus_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let catalog = shared_catalog();

        let stats = use_case(true).run(tmp.path(), &catalog).unwrap();

        assert_eq!(stats, IngestionStats::default());
        assert_eq!(catalog.size(), 0);
    }

    #[test]
    fn test_classifier_error_counts_as_parse_failure() {
        let tmp = TempDir::new().unwrap();
        write_corpus(tmp.path(), &[("a.bad", ""), ("b.jpg", "40,40,40")]);

        let stats = use_case(true).run(tmp.path(), &shared_catalog()).unwrap();

        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.classification_failures, 1);
        assert_eq!(stats.image_files, 1);
        assert_eq!(stats.faces_admitted, 1);
    }

    #[test]
    fn test_second_run_with_skip_admits_nothing() {
        let tmp = TempDir::new().unwrap();
        write_corpus(tmp.path(), &[("a.jpg", "10,10,10 90,90,90"), ("b.jpg", "200,0,0")]);
        let catalog = shared_catalog();
        let mut use_case = use_case(true);

        let first = use_case.run(tmp.path(), &catalog).unwrap();
        let second = use_case.run(tmp.path(), &catalog).unwrap();

        assert_eq!(first.faces_admitted, 3);
        assert_eq!(second.faces_admitted, 0);
        assert_eq!(second.files_skipped, 2);
        assert_eq!(second.faces_detected, 0);
        assert_eq!(catalog.size(), 3);
    }

    #[test]
    fn test_second_run_without_skip_matches_everything() {
        let tmp = TempDir::new().unwrap();
        write_corpus(tmp.path(), &[("a.jpg", "10,10,10 90,90,90")]);
        let catalog = shared_catalog();
        let mut use_case = use_case(false);

        use_case.run(tmp.path(), &catalog).unwrap();
        let second = use_case.run(tmp.path(), &catalog).unwrap();

        assert_eq!(second.faces_admitted, 0);
        assert_eq!(second.faces_matched, 2);
        assert_eq!(catalog.size(), 2);
    }

    #[test]
    fn test_single_file_root() {
        let tmp = TempDir::new().unwrap();
        let paths = write_corpus(tmp.path(), &[("a.jpg", "10,10,10"), ("b.jpg", "90,90,90")]);
        let catalog = shared_catalog();

        let stats = use_case(true).run(&paths[1], &catalog).unwrap();

        assert_eq!(stats.total_files, 1);
        assert_eq!(stats.faces_admitted, 1);
        assert_eq!(catalog.lock().records()[0].descriptor().values(), &[90.0, 90.0, 90.0]);
    }

    #[test]
    fn test_missing_root_fails_before_processing() {
        let tmp = TempDir::new().unwrap();
        let err = use_case(true)
            .run(&tmp.path().join("nope"), &shared_catalog())
            .unwrap_err();
        assert!(matches!(err, IngestionError::InvalidRoot(CorpusError::InvalidRoot { .. })));
    }

    #[test]
    fn test_skip_survives_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let corpus = tmp.path().join("photos");
        write_corpus(&corpus, &[("a.jpg", "10,10,10")]);
        let store = JsonCatalogStore::new(
            tmp.path().join("app/catalog.json"),
            SimilarityComparator::new(DistanceMetric::Euclidean, 5.0),
        );

        let catalog = SharedCatalog::new(store.load().unwrap());
        use_case(true).run(&corpus, &catalog).unwrap();
        store.save(&catalog.into_inner()).unwrap();

        let reloaded = SharedCatalog::new(store.load().unwrap());
        let stats = use_case(true).run(&corpus, &reloaded).unwrap();

        assert_eq!(stats.files_skipped, 1);
        assert_eq!(reloaded.size(), 1);
    }
}
