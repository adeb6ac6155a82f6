pub mod json_catalog_store;
