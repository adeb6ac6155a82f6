use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{Exif, In, Rational, Tag, Value};

use crate::catalog::domain::face_record::LocationInfo;
use crate::corpus::domain::location_reader::LocationReader;

/// Reads GPS coordinates from a photo's EXIF block.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExifLocationReader;

impl ExifLocationReader {
    pub fn new() -> Self {
        Self
    }
}

impl LocationReader for ExifLocationReader {
    fn read_location(&self, path: &Path) -> Result<Option<LocationInfo>, Box<dyn std::error::Error>> {
        let mut reader = BufReader::new(File::open(path)?);
        let exif = match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(
                exif::Error::NotFound(_) | exif::Error::NotSupported(_) | exif::Error::BlankValue(_),
            ) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(location_from_exif(&exif))
    }
}

fn location_from_exif(exif: &Exif) -> Option<LocationInfo> {
    let latitude = coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S', 90.0)?;
    let longitude = coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W', 180.0)?;
    let position_accuracy = exif
        .get_field(Tag::GPSHPositioningError, In::PRIMARY)
        .and_then(|field| match &field.value {
            Value::Rational(v) => v.first().map(Rational::to_f64),
            _ => None,
        })
        .filter(|v| v.is_finite());

    Some(LocationInfo {
        latitude,
        longitude,
        position_accuracy,
    })
}

fn coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative: u8, limit: f64) -> Option<f64> {
    let dms = match &exif.get_field(value_tag, In::PRIMARY)?.value {
        Value::Rational(v) => v.clone(),
        _ => return None,
    };
    let reference = match exif.get_field(ref_tag, In::PRIMARY).map(|f| &f.value) {
        Some(Value::Ascii(parts)) => parts.first().and_then(|p| p.first()).copied(),
        _ => None,
    };
    let degrees = dms_to_degrees(&dms)?;
    let signed = if reference == Some(negative) {
        -degrees
    } else {
        degrees
    };
    (signed.abs() <= limit).then_some(signed)
}

/// Degrees, minutes, seconds to decimal degrees. Missing trailing parts
/// count as zero.
fn dms_to_degrees(dms: &[Rational]) -> Option<f64> {
    if dms.is_empty() || dms.len() > 3 || dms.iter().any(|r| r.denom == 0) {
        return None;
    }
    let divisors = [1.0, 60.0, 3600.0];
    Some(
        dms.iter()
            .zip(divisors)
            .map(|(r, d)| r.to_f64() / d)
            .sum(),
    )
}
