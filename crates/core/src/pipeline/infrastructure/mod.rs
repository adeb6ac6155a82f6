pub mod threaded_ingestion_executor;
