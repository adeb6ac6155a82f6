use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::catalog::domain::deduplication_engine::DeduplicationEngine;
use crate::catalog::domain::shared_catalog::SharedCatalog;
use crate::corpus::infrastructure::corpus_walker::CorpusEntry;
use crate::pipeline::file_analyzer::{Classification, FileAnalyzer};
use crate::pipeline::ingestion_stats::IngestionStats;

/// Configuration for an ingestion run.
pub struct IngestionConfig {
    /// Leave out images the catalog already holds faces from.
    pub skip_already_processed: bool,
    /// Called with `(files_done, total_files)`; returning `false` cancels.
    pub on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            skip_already_processed: true,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl IngestionConfig {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Reports progress and records a cancellation requested by the callback.
    pub(crate) fn report_progress(&self, done: usize, total: usize) {
        if let Some(callback) = &self.on_progress {
            if !callback(done, total) {
                self.cancelled.store(true, Ordering::Relaxed);
            }
        }
    }
}

/// Abstracts how corpus entries are driven through analysis and
/// deduplication.
///
/// Implementations decide the threading; the per-file steps are the same
/// for all of them (see [`ingest_entry`]). Entries not reached before a
/// cancellation are left out of the returned stats.
pub trait IngestionExecutor: Send {
    fn execute(
        &mut self,
        entries: Vec<CorpusEntry>,
        catalog: &SharedCatalog,
        config: &IngestionConfig,
    ) -> Result<IngestionStats, Box<dyn std::error::Error>>;
}

/// Runs one corpus entry through classify, skip check, analysis and
/// deduplication. Every failure is counted and logged, never propagated.
///
/// A face whose descriptor dimension differs from the catalog's is counted
/// as rejected; the other faces of the image are still deduplicated.
pub fn ingest_entry(
    entry: &CorpusEntry,
    analyzer: &mut FileAnalyzer,
    engine: &DeduplicationEngine,
    catalog: &SharedCatalog,
    skip_already_processed: bool,
) -> IngestionStats {
    let mut stats = IngestionStats {
        total_files: 1,
        ..Default::default()
    };

    let path = match entry {
        CorpusEntry::File(path) => path,
        CorpusEntry::Unreadable { .. } => {
            stats.classification_failures = 1;
            return stats;
        }
    };

    match analyzer.classify(path) {
        Classification::Image => stats.image_files = 1,
        Classification::NotImage => return stats,
        Classification::Failed => {
            stats.classification_failures = 1;
            return stats;
        }
    }

    if skip_already_processed && catalog.contains_source(path) {
        log::debug!("Skipping already processed {}", path.display());
        stats.files_skipped = 1;
        return stats;
    }

    let analysis = match analyzer.analyze(path) {
        Ok(analysis) => analysis,
        Err(e) => {
            log::warn!("Detection failed for {}: {e}", path.display());
            stats.detection_failures = 1;
            return stats;
        }
    };
    stats.faces_detected = analysis.faces_detected;
    stats.descriptor_failures = analysis.descriptor_failures;

    match catalog.process_compatible(engine, &analysis.observed) {
        Ok(batch) => {
            if !batch.rejected.is_empty() {
                log::warn!(
                    "{} faces of {} rejected: descriptor dimension differs from the catalog",
                    batch.rejected.len(),
                    path.display()
                );
            }
            let admitted = batch.outcomes.iter().filter(|o| o.is_novel()).count();
            stats.faces_admitted = admitted;
            stats.faces_matched = batch.outcomes.len() - admitted;
            stats.faces_rejected = batch.rejected.len();
        }
        Err(e) => {
            log::warn!("Faces of {} rejected: {e}", path.display());
            stats.faces_rejected = analysis.observed.len();
        }
    }
    stats
}

/// Processes entries one after another on the calling thread.
pub struct SequentialIngestionExecutor {
    analyzer: FileAnalyzer,
    engine: DeduplicationEngine,
}

impl SequentialIngestionExecutor {
    pub fn new(analyzer: FileAnalyzer) -> Self {
        Self {
            analyzer,
            engine: DeduplicationEngine::new(),
        }
    }
}

impl IngestionExecutor for SequentialIngestionExecutor {
    fn execute(
        &mut self,
        entries: Vec<CorpusEntry>,
        catalog: &SharedCatalog,
        config: &IngestionConfig,
    ) -> Result<IngestionStats, Box<dyn std::error::Error>> {
        let total = entries.len();
        let mut stats = IngestionStats::default();

        for (index, entry) in entries.iter().enumerate() {
            if config.is_cancelled() {
                break;
            }
            stats += ingest_entry(
                entry,
                &mut self.analyzer,
                &self.engine,
                catalog,
                config.skip_already_processed,
            );
            config.report_progress(index + 1, total);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_stubs::{analyzer, shared_catalog, write_corpus};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn files(paths: Vec<PathBuf>) -> Vec<CorpusEntry> {
        paths.into_iter().map(CorpusEntry::File).collect()
    }

    // ── ingest_entry ─────────────────────────────────────────────────

    #[test]
    fn test_unreadable_entry_counts_as_classification_failure() {
        let entry = CorpusEntry::Unreadable {
            path: None,
            reason: "permission denied".into(),
        };
        let stats = ingest_entry(
            &entry,
            &mut analyzer(),
            &DeduplicationEngine::new(),
            &shared_catalog(),
            true,
        );
        assert_eq!(stats.total_files, 1);
        assert_eq!(stats.classification_failures, 1);
    }

    #[test]
    fn test_non_image_only_counts_as_seen() {
        let tmp = TempDir::new().unwrap();
        let paths = write_corpus(tmp.path(), &[("notes.txt", "1,1,1")]);
        let stats = ingest_entry(
            &CorpusEntry::File(paths[0].clone()),
            &mut analyzer(),
            &DeduplicationEngine::new(),
            &shared_catalog(),
            true,
        );
        assert_eq!(
            stats,
            IngestionStats {
                total_files: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_decode_failure_counts_as_detection_failure() {
        let tmp = TempDir::new().unwrap();
        let paths = write_corpus(tmp.path(), &[("a.jpg", "corrupt")]);
        let stats = ingest_entry(
            &CorpusEntry::File(paths[0].clone()),
            &mut analyzer(),
            &DeduplicationEngine::new(),
            &shared_catalog(),
            true,
        );
        assert_eq!(stats.image_files, 1);
        assert_eq!(stats.detection_failures, 1);
        assert_eq!(stats.faces_detected, 0);
    }

    #[test]
    fn test_image_faces_are_deduplicated() {
        let tmp = TempDir::new().unwrap();
        let paths = write_corpus(tmp.path(), &[("a.jpg", "10,10,10 12,10,10 90,90,90 0,0,0")]);
        let catalog = shared_catalog();

        let stats = ingest_entry(
            &CorpusEntry::File(paths[0].clone()),
            &mut analyzer(),
            &DeduplicationEngine::new(),
            &catalog,
            true,
        );

        assert_eq!(stats.faces_detected, 4);
        assert_eq!(stats.descriptor_failures, 1);
        assert_eq!(stats.faces_admitted, 2);
        assert_eq!(stats.faces_matched, 1);
        assert_eq!(catalog.size(), 2);
    }

    #[test]
    fn test_dimension_mismatch_rejects_only_that_face() {
        let tmp = TempDir::new().unwrap();
        let paths = write_corpus(tmp.path(), &[("a.jpg", "10,10,10 1,2,254 90,90,90")]);
        let catalog = shared_catalog();

        let stats = ingest_entry(
            &CorpusEntry::File(paths[0].clone()),
            &mut analyzer(),
            &DeduplicationEngine::new(),
            &catalog,
            true,
        );

        assert_eq!(stats.faces_detected, 3);
        assert_eq!(stats.faces_rejected, 1);
        assert_eq!(stats.faces_admitted, 2);
        assert_eq!(catalog.size(), 2);
    }

    #[test]
    fn test_processed_image_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let paths = write_corpus(tmp.path(), &[("a.jpg", "10,10,10")]);
        let entry = CorpusEntry::File(paths[0].clone());
        let catalog = shared_catalog();
        let engine = DeduplicationEngine::new();
        let mut analyzer = analyzer();

        ingest_entry(&entry, &mut analyzer, &engine, &catalog, true);
        let second = ingest_entry(&entry, &mut analyzer, &engine, &catalog, true);
        let forced = ingest_entry(&entry, &mut analyzer, &engine, &catalog, false);

        assert_eq!(second.image_files, 1);
        assert_eq!(second.files_skipped, 1);
        assert_eq!(second.faces_detected, 0);
        assert_eq!(forced.files_skipped, 0);
        assert_eq!(forced.faces_matched, 1);
    }

    // ── SequentialIngestionExecutor ──────────────────────────────────

    #[test]
    fn test_sequential_reports_progress() {
        let tmp = TempDir::new().unwrap();
        let paths = write_corpus(tmp.path(), &[("a.jpg", "1,1,1"), ("b.txt", ""), ("c.jpg", "")]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_callback = Arc::clone(&seen);
        let config = IngestionConfig {
            on_progress: Some(Box::new(move |done, total| {
                seen_in_callback.lock().unwrap().push((done, total));
                true
            })),
            ..Default::default()
        };

        let stats = SequentialIngestionExecutor::new(analyzer())
            .execute(files(paths), &shared_catalog(), &config)
            .unwrap();

        assert_eq!(stats.total_files, 3);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_sequential_stops_when_progress_cancels() {
        let tmp = TempDir::new().unwrap();
        let paths = write_corpus(tmp.path(), &[("a.jpg", "1,1,1"), ("b.jpg", "50,50,50")]);
        let config = IngestionConfig {
            on_progress: Some(Box::new(|_, _| false)),
            ..Default::default()
        };
        let catalog = shared_catalog();

        let stats = SequentialIngestionExecutor::new(analyzer())
            .execute(files(paths), &catalog, &config)
            .unwrap();

        assert!(config.is_cancelled());
        assert_eq!(stats.total_files, 1);
        assert_eq!(catalog.size(), 1);
    }
}
