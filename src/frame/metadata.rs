use serde::Serialize;
use std::path::Path;
use tracing::{debug, trace};

use super::FrameError;

pub const MODEL: &str = "Model";
pub const EXPOSURE_TIME: &str = "ExposureTime";
pub const ISO_SPEED_RATINGS: &str = "ISOSpeedRatings";
pub const F_NUMBER: &str = "FNumber";

/// Unsigned EXIF rational, kept exactly as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `None` for a zero denominator.
    pub fn value(&self) -> Option<f64> {
        if self.denominator == 0 {
            return None;
        }
        Some(self.numerator as f64 / self.denominator as f64)
    }
}

impl From<&rexif::URational> for Rational {
    fn from(r: &rexif::URational) -> Self {
        Self::new(r.numerator, r.denominator)
    }
}

/// The four capture attributes printed under a framed photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptureMetadata {
    pub model: Option<String>,
    pub exposure_time: Option<Rational>,
    pub iso_speed: Option<u32>,
    pub f_number: Option<Rational>,
}

impl CaptureMetadata {
    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.exposure_time.is_none()
            && self.iso_speed.is_none()
            && self.f_number.is_none()
    }

    /// EXIF names of the recognised keys that are absent.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.model.is_none() {
            missing.push(MODEL);
        }
        if self.exposure_time.is_none() {
            missing.push(EXPOSURE_TIME);
        }
        if self.iso_speed.is_none() {
            missing.push(ISO_SPEED_RATINGS);
        }
        if self.f_number.is_none() {
            missing.push(F_NUMBER);
        }
        missing
    }
}

/// Everything read from the EXIF block in one pass: the caption attributes
/// plus the extra fields shown by the metadata preview and the orientation
/// used to turn the photo upright.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhotoDetails {
    #[serde(flatten)]
    pub capture: CaptureMetadata,
    pub make: Option<String>,
    pub focal_length: Option<Rational>,
    pub date_time_original: Option<String>,
    /// Raw EXIF Orientation value, 1 through 8.
    pub orientation: Option<u16>,
}

/// Read capture metadata from an encoded image.
///
/// An image without an EXIF block is not an error: the result is simply empty.
pub fn extract(bytes: &[u8]) -> CaptureMetadata {
    extract_details(bytes).capture
}

pub fn extract_file(path: &Path) -> Result<CaptureMetadata, FrameError> {
    let bytes = std::fs::read(path)?;
    Ok(extract(&bytes))
}

pub fn extract_details(bytes: &[u8]) -> PhotoDetails {
    match rexif::parse_buffer(bytes) {
        Ok(exif_data) => collect_details(&exif_data.entries),
        Err(e) => {
            trace!("No EXIF data in image: {}", e);
            PhotoDetails::default()
        }
    }
}

fn ascii_value(entry: &rexif::ExifEntry) -> Option<String> {
    let value = match &entry.value {
        rexif::TagValue::Ascii(s) => s.clone(),
        _ => entry.value_more_readable.to_string(),
    };
    let value = value.trim_end_matches('\0').trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn first_rational(entry: &rexif::ExifEntry) -> Option<Rational> {
    match &entry.value {
        rexif::TagValue::URational(values) => values.first().map(Rational::from),
        _ => None,
    }
}

fn collect_details(entries: &[rexif::ExifEntry]) -> PhotoDetails {
    let mut details = PhotoDetails::default();

    for entry in entries {
        match entry.tag {
            rexif::ExifTag::Make => details.make = ascii_value(entry),
            rexif::ExifTag::FocalLength => details.focal_length = first_rational(entry),
            rexif::ExifTag::DateTimeOriginal => details.date_time_original = ascii_value(entry),
            rexif::ExifTag::Orientation => {
                details.orientation = match &entry.value {
                    rexif::TagValue::U16(values) => values.first().copied(),
                    _ => None,
                };
            }
            rexif::ExifTag::Model => details.capture.model = ascii_value(entry),
            rexif::ExifTag::ExposureTime => details.capture.exposure_time = first_rational(entry),
            rexif::ExifTag::FNumber => details.capture.f_number = first_rational(entry),
            rexif::ExifTag::ISOSpeedRatings => {
                details.capture.iso_speed = match &entry.value {
                    rexif::TagValue::U16(values) => values.first().map(|&v| v as u32),
                    rexif::TagValue::U32(values) => values.first().copied(),
                    _ => entry.value_more_readable.trim().parse::<u32>().ok(),
                };
            }
            _ => {}
        }
    }

    debug!("EXIF details: {:?}", details);
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ExifFixture, jpeg_with_exif, plain_jpeg};

    #[test]
    fn test_extract_known_tags() {
        let fixture = ExifFixture::x100();
        let bytes = jpeg_with_exif(64, 48, &fixture);

        let metadata = extract(&bytes);
        assert_eq!(metadata.model.as_deref(), Some("X100"));
        assert_eq!(metadata.f_number.and_then(|r| r.value()), Some(2.8));
        assert_eq!(metadata.exposure_time.and_then(|r| r.value()), Some(0.004));
        assert_eq!(metadata.iso_speed, Some(200));
        assert!(metadata.missing_keys().is_empty());
    }

    #[test]
    fn test_extract_keeps_rationals_exact() {
        let fixture = ExifFixture::x100();
        let metadata = extract(&jpeg_with_exif(16, 16, &fixture));
        assert_eq!(metadata.exposure_time, Some(Rational::new(1, 250)));
        assert_eq!(metadata.f_number, Some(Rational::new(28, 10)));
    }

    #[test]
    fn test_extract_without_exif_is_empty() {
        let metadata = extract(&plain_jpeg(32, 32));
        assert!(metadata.is_empty());
        assert_eq!(metadata.missing_keys().len(), 4);
    }

    #[test]
    fn test_extract_garbage_is_empty() {
        let metadata = extract(b"definitely not an image");
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_extract_partial_tags() {
        let fixture = ExifFixture {
            f_number: None,
            ..ExifFixture::x100()
        };
        let metadata = extract(&jpeg_with_exif(16, 16, &fixture));
        assert!(!metadata.is_empty());
        assert_eq!(metadata.missing_keys(), vec![F_NUMBER]);
    }

    #[test]
    fn test_model_is_trimmed() {
        let fixture = ExifFixture {
            model: Some("X100V   ".to_string()),
            ..ExifFixture::x100()
        };
        let metadata = extract(&jpeg_with_exif(16, 16, &fixture));
        assert_eq!(metadata.model.as_deref(), Some("X100V"));
    }

    #[test]
    fn test_rational_zero_denominator_has_no_value() {
        assert_eq!(Rational::new(28, 0).value(), None);
        assert_eq!(Rational::new(0, 0).value(), None);
        assert_eq!(Rational::new(0, 1).value(), Some(0.0));
    }

    #[test]
    fn test_extract_details_preview_fields() {
        let fixture = ExifFixture {
            orientation: Some(6),
            ..ExifFixture::x100()
        };
        let details = extract_details(&jpeg_with_exif(16, 16, &fixture));

        assert_eq!(details.make.as_deref(), Some("FUJIFILM"));
        assert_eq!(details.focal_length, Some(Rational::new(230, 10)));
        assert_eq!(
            details.date_time_original.as_deref(),
            Some("2024:05:01 10:20:30")
        );
        assert_eq!(details.orientation, Some(6));
        assert_eq!(details.capture, extract(&jpeg_with_exif(16, 16, &fixture)));
    }

    #[test]
    fn test_extra_tags_do_not_count_as_capture_metadata() {
        let fixture = ExifFixture {
            model: None,
            exposure_time: None,
            f_number: None,
            iso_speed: None,
            ..ExifFixture::x100()
        };
        let details = extract_details(&jpeg_with_exif(16, 16, &fixture));
        assert_eq!(details.make.as_deref(), Some("FUJIFILM"));
        assert!(details.capture.is_empty());
    }

    #[test]
    fn test_extract_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("x100.jpg");
        std::fs::write(&path, jpeg_with_exif(16, 16, &ExifFixture::x100())).unwrap();

        let metadata = extract_file(&path).unwrap();
        assert_eq!(metadata.iso_speed, Some(200));

        assert!(matches!(
            extract_file(&dir.path().join("missing.jpg")),
            Err(FrameError::Io(_))
        ));
    }
}
