use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::domain::catalog_store::{CatalogStore, CatalogStoreError};
use crate::catalog::domain::face_catalog::FaceCatalog;
use crate::catalog::domain::face_record::FaceRecord;
use crate::descriptor::similarity_comparator::SimilarityComparator;
use crate::shared::constants::{APP_DIR_NAME, CATALOG_FILE_NAME};

const FORMAT_VERSION: u32 = 1;

/// Catalog file inside `app_folder`.
pub fn catalog_path_in(app_folder: &Path) -> PathBuf {
    app_folder.join(CATALOG_FILE_NAME)
}

/// Catalog file in the platform data directory, e.g.
/// `~/.local/share/FaceCatalog/catalog.json` on Linux.
pub fn default_catalog_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| catalog_path_in(&dir.join(APP_DIR_NAME)))
}

#[derive(Serialize)]
struct CatalogFileRef<'a> {
    version: u32,
    comparator: &'a SimilarityComparator,
    next_id: u64,
    records: &'a [FaceRecord],
}

#[derive(Deserialize)]
struct CatalogFile {
    version: u32,
    comparator: SimilarityComparator,
    next_id: u64,
    records: Vec<FaceRecord>,
}

/// Stores the catalog as one pretty-printed JSON document.
///
/// Saving writes a sibling `.tmp` file and renames it over the target, so
/// an interrupted save leaves the previous catalog intact.
pub struct JsonCatalogStore {
    path: PathBuf,
    new_catalog_comparator: SimilarityComparator,
}

impl JsonCatalogStore {
    /// `new_catalog_comparator` configures the catalog returned when no file
    /// exists yet. An existing catalog keeps the comparator it was built with.
    pub fn new(path: impl Into<PathBuf>, new_catalog_comparator: SimilarityComparator) -> Self {
        Self {
            path: path.into(),
            new_catalog_comparator,
        }
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> Result<FaceCatalog, CatalogStoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No catalog at {}, starting empty", self.path.display());
                return Ok(FaceCatalog::new(self.new_catalog_comparator));
            }
            Err(e) => {
                return Err(CatalogStoreError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let file: CatalogFile =
            serde_json::from_str(&json).map_err(|e| CatalogStoreError::Malformed {
                path: self.path.clone(),
                source: e,
            })?;
        if file.version != FORMAT_VERSION {
            return Err(CatalogStoreError::UnsupportedVersion {
                path: self.path.clone(),
                version: file.version,
            });
        }

        let catalog = FaceCatalog::from_records(file.comparator, file.records, file.next_id)
            .map_err(|e| CatalogStoreError::Inconsistent {
                path: self.path.clone(),
                source: e,
            })?;
        log::info!(
            "Loaded {} faces from {}",
            catalog.size(),
            self.path.display()
        );
        Ok(catalog)
    }

    fn save(&self, catalog: &FaceCatalog) -> Result<(), CatalogStoreError> {
        let write_err = |e: std::io::Error| CatalogStoreError::Write {
            path: self.path.clone(),
            source: e,
        };

        let file = CatalogFileRef {
            version: FORMAT_VERSION,
            comparator: catalog.comparator(),
            next_id: catalog.next_id(),
            records: catalog.records(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| CatalogStoreError::Malformed {
            path: self.path.clone(),
            source: e,
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json).map_err(write_err)?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_err(e));
        }
        log::debug!("Saved {} faces to {}", catalog.size(), self.path.display());
        Ok(())
    }
}
