use std::ops::AddAssign;

/// Counters accumulated over one ingestion run.
///
/// Every counter is a plain sum, so per-file or per-worker stats can be
/// merged in any order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestionStats {
    /// Files seen by the traversal, including unreadable entries.
    pub total_files: usize,
    /// Files classified as images.
    pub image_files: usize,
    /// Files that could not be classified.
    pub classification_failures: usize,
    /// Images left out because the catalog already holds faces from them.
    pub files_skipped: usize,
    /// Images that failed to decode or whose detection failed.
    pub detection_failures: usize,
    pub faces_detected: usize,
    /// Detected faces for which no descriptor could be computed.
    pub descriptor_failures: usize,
    pub faces_admitted: usize,
    pub faces_matched: usize,
    /// Faces whose batch was refused by deduplication.
    pub faces_rejected: usize,
}

impl IngestionStats {
    pub fn merge(&mut self, other: &IngestionStats) {
        self.total_files += other.total_files;
        self.image_files += other.image_files;
        self.classification_failures += other.classification_failures;
        self.files_skipped += other.files_skipped;
        self.detection_failures += other.detection_failures;
        self.faces_detected += other.faces_detected;
        self.descriptor_failures += other.descriptor_failures;
        self.faces_admitted += other.faces_admitted;
        self.faces_matched += other.faces_matched;
        self.faces_rejected += other.faces_rejected;
    }
}

impl AddAssign for IngestionStats {
    fn add_assign(&mut self, other: Self) {
        self.merge(&other);
    }
}

impl std::fmt::Display for IngestionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total files:           {}", self.total_files)?;
        writeln!(f, "Image files:           {}", self.image_files)?;
        writeln!(f, "Parse failures:        {}", self.classification_failures)?;
        writeln!(f, "Skipped (processed):   {}", self.files_skipped)?;
        writeln!(f, "Detection failures:    {}", self.detection_failures)?;
        writeln!(f, "Faces detected:        {}", self.faces_detected)?;
        writeln!(f, "Descriptor failures:   {}", self.descriptor_failures)?;
        writeln!(f, "Faces admitted:        {}", self.faces_admitted)?;
        writeln!(f, "Faces matched:         {}", self.faces_matched)?;
        write!(f, "Faces rejected:        {}", self.faces_rejected)
    }
}
