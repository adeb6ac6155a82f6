pub mod catalog_store;
pub mod deduplication_engine;
pub mod face_catalog;
pub mod face_record;
pub mod shared_catalog;
