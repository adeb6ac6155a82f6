pub mod file_analyzer;
pub mod infrastructure;
pub mod ingest_corpus_use_case;
pub mod ingestion_executor;
pub mod ingestion_stats;

#[cfg(test)]
mod test_stubs;
