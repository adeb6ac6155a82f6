use std::path::Path;

use crate::catalog::domain::face_record::LocationInfo;

/// Extracts where a photo was taken, if the file records it.
///
/// `Ok(None)` for files without location data. Callers treat an `Err` the
/// same way: the location is simply absent.
pub trait LocationReader: Send {
    fn read_location(&self, path: &Path) -> Result<Option<LocationInfo>, Box<dyn std::error::Error>>;
}
