use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::descriptor::face_descriptor::FaceDescriptor;
use crate::shared::bounding_box::BoundingBox;

/// Catalog-assigned record identifier. Never reused within a catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceId(pub u64);

impl std::fmt::Display for FaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "face-{}", self.0)
    }
}

/// Geolocation of the image a face was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_accuracy: Option<f64>,
}

/// Where an observed face came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Absent for crops that only ever existed in memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image_path: Option<PathBuf>,
    pub bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationInfo>,
    /// Hex blake3 digest of the source file bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_checksum: Option<String>,
}

impl Provenance {
    pub fn in_memory(bounding_box: BoundingBox) -> Self {
        Self {
            source_image_path: None,
            bounding_box,
            location: None,
            source_checksum: None,
        }
    }
}

/// A face accepted into the catalog. Immutable once admitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    id: FaceId,
    descriptor: FaceDescriptor,
    provenance: Provenance,
    first_seen_at: u64,
}

impl FaceRecord {
    pub(crate) fn new(
        id: FaceId,
        descriptor: FaceDescriptor,
        provenance: Provenance,
        first_seen_at: u64,
    ) -> Self {
        Self {
            id,
            descriptor,
            provenance,
            first_seen_at,
        }
    }

    pub fn id(&self) -> FaceId {
        self.id
    }

    pub fn descriptor(&self) -> &FaceDescriptor {
        &self.descriptor
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Admission order within the catalog; smaller means admitted earlier.
    pub fn first_seen_at(&self) -> u64 {
        self.first_seen_at
    }
}

/// One face handed to the deduplication engine.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservedFace {
    pub descriptor: FaceDescriptor,
    pub provenance: Provenance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_id_display() {
        assert_eq!(FaceId(7).to_string(), "face-7");
    }

    #[test]
    fn test_in_memory_provenance_has_no_source() {
        let p = Provenance::in_memory(BoundingBox::new(0.1, 0.1, 0.2, 0.2));
        assert!(p.source_image_path.is_none());
        assert!(p.location.is_none());
        assert!(p.source_checksum.is_none());
    }

    #[test]
    fn test_record_json_omits_absent_optionals() {
        let record = FaceRecord::new(
            FaceId(3),
            FaceDescriptor::new(vec![1.0, 0.0]).unwrap(),
            Provenance::in_memory(BoundingBox::new(0.0, 0.0, 0.5, 0.5)),
            2,
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["first_seen_at"], 2);
        assert!(json["provenance"].get("location").is_none());
        assert!(json["provenance"].get("source_image_path").is_none());
    }

    #[test]
    fn test_record_round_trip_with_full_provenance() {
        let record = FaceRecord::new(
            FaceId(1),
            FaceDescriptor::new(vec![0.5, 0.25]).unwrap(),
            Provenance {
                source_image_path: Some(PathBuf::from("/photos/a.jpg")),
                bounding_box: BoundingBox::new(0.1, 0.2, 0.3, 0.4),
                location: Some(LocationInfo {
                    latitude: 48.8584,
                    longitude: 2.2945,
                    position_accuracy: Some(5.0),
                }),
                source_checksum: Some("ab12".into()),
            },
            0,
        );
        let json = serde_json::to_string(&record).unwrap();
        let back: FaceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
