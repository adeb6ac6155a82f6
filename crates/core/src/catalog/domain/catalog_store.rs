use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::domain::face_catalog::{CatalogError, FaceCatalog};

#[derive(Error, Debug)]
pub enum CatalogStoreError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write catalog {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog {path} has unsupported format version {version}")]
    UnsupportedVersion { path: PathBuf, version: u32 },
    #[error("catalog {path} is inconsistent: {source}")]
    Inconsistent {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },
}

/// Durable home of a [`FaceCatalog`] between runs.
///
/// Implementations must round-trip every record field exactly, including
/// ids and admission order.
pub trait CatalogStore {
    fn load(&self) -> Result<FaceCatalog, CatalogStoreError>;
    fn save(&self, catalog: &FaceCatalog) -> Result<(), CatalogStoreError>;
}
