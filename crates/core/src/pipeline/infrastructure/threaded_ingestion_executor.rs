use std::sync::atomic::Ordering;

use crate::catalog::domain::deduplication_engine::DeduplicationEngine;
use crate::catalog::domain::shared_catalog::SharedCatalog;
use crate::corpus::infrastructure::corpus_walker::CorpusEntry;
use crate::pipeline::file_analyzer::FileAnalyzer;
use crate::pipeline::ingestion_executor::{ingest_entry, IngestionConfig, IngestionExecutor};
use crate::pipeline::ingestion_stats::IngestionStats;

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Builds one analyzer per worker. Each worker owns its own detector and
/// descriptor sessions.
pub type AnalyzerFactory =
    Box<dyn Fn() -> Result<FileAnalyzer, Box<dyn std::error::Error>> + Send>;

/// Ingests with a pool of analysis workers.
///
/// Layout: `feeder → N workers [analyze, then lock + deduplicate] → main
/// [merge stats, report progress]`
///
/// Decoding, detection and description overlap across workers; only the
/// skip check and each image's match-then-admit step take the catalog lock.
pub struct ThreadedIngestionExecutor {
    workers: usize,
    channel_capacity: usize,
    factory: AnalyzerFactory,
    engine: DeduplicationEngine,
}

impl ThreadedIngestionExecutor {
    pub fn new(workers: usize, factory: AnalyzerFactory) -> Self {
        Self {
            workers: workers.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            factory,
            engine: DeduplicationEngine::new(),
        }
    }
}

impl IngestionExecutor for ThreadedIngestionExecutor {
    fn execute(
        &mut self,
        entries: Vec<CorpusEntry>,
        catalog: &SharedCatalog,
        config: &IngestionConfig,
    ) -> Result<IngestionStats, Box<dyn std::error::Error>> {
        let total = entries.len();
        if total == 0 {
            return Ok(IngestionStats::default());
        }

        let worker_count = self.workers.min(total);
        let analyzers = (0..worker_count)
            .map(|_| (self.factory)())
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Ingesting {total} entries with {worker_count} workers");

        let (job_tx, job_rx) = crossbeam_channel::bounded::<CorpusEntry>(self.channel_capacity);
        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<IngestionStats>(self.channel_capacity);
        let cancelled = &config.cancelled;
        let engine = self.engine;
        let skip_already_processed = config.skip_already_processed;

        std::thread::scope(|scope| {
            let feeder = scope.spawn(move || {
                for entry in entries {
                    if cancelled.load(Ordering::Relaxed) || job_tx.send(entry).is_err() {
                        break;
                    }
                }
            });

            let workers: Vec<_> = analyzers
                .into_iter()
                .map(|mut analyzer| {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        for entry in job_rx {
                            if cancelled.load(Ordering::Relaxed) {
                                break;
                            }
                            let stats = ingest_entry(
                                &entry,
                                &mut analyzer,
                                &engine,
                                catalog,
                                skip_already_processed,
                            );
                            if result_tx.send(stats).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();

            // Only the workers hold these now, so the loops below end when
            // the workers do.
            drop(job_rx);
            drop(result_tx);

            let mut stats = IngestionStats::default();
            let mut done = 0;
            for file_stats in result_rx {
                stats += file_stats;
                done += 1;
                config.report_progress(done, total);
            }

            let mut first_error: Option<Box<dyn std::error::Error>> = None;
            if feeder.join().is_err() {
                first_error = Some("Feeder thread panicked".into());
            }
            for worker in workers {
                if worker.join().is_err() && first_error.is_none() {
                    first_error = Some("Ingestion worker panicked".into());
                }
            }

            match first_error {
                Some(e) => Err(e),
                None => Ok(stats),
            }
        })
    }
}
