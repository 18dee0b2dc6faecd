use serde::{Deserialize, Serialize};

use super::FrameError;
use super::metadata::{CaptureMetadata, Rational};

const PLACEHOLDER: &str = "N/A";
const FIELD_SEPARATOR: &str = "   ";

/// What to do when some, but not all, capture attributes are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataPolicy {
    /// Print `N/A` for each missing attribute.
    #[default]
    Placeholder,
    /// Refuse to frame the photo.
    RequireAll,
}

/// `"<Model>   F<FNumber>   1/<1/ExposureTime>   ISO <ISO>"`
pub fn metadata_line(
    metadata: &CaptureMetadata,
    policy: MetadataPolicy,
) -> Result<String, FrameError> {
    if metadata.is_empty() {
        return Err(FrameError::NoMetadata);
    }
    if policy == MetadataPolicy::RequireAll {
        let missing = metadata.missing_keys();
        if !missing.is_empty() {
            return Err(FrameError::PartialMetadata { missing });
        }
    }

    let model = metadata.model.as_deref().unwrap_or(PLACEHOLDER);
    let aperture = match metadata.f_number {
        Some(f_number) => aperture_value(f_number)?,
        None => PLACEHOLDER.to_string(),
    };
    let shutter = match metadata.exposure_time {
        Some(exposure) => shutter_denominator(exposure)?,
        None => PLACEHOLDER.to_string(),
    };
    let iso = metadata
        .iso_speed
        .map(|iso| iso.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    Ok([
        model.to_string(),
        format!("F{}", aperture),
        format!("1/{}", shutter),
        format!("ISO {}", iso),
    ]
    .join(FIELD_SEPARATOR))
}

pub fn attribution_label(handle: &str) -> String {
    let handle = handle.trim();
    let handle = handle.strip_prefix('@').unwrap_or(handle);
    format!("Photo by @{}", handle)
}

fn aperture_value(f_number: Rational) -> Result<String, FrameError> {
    f_number
        .value()
        .map(format_decimal)
        .ok_or(FrameError::InvalidAperture {
            numerator: f_number.numerator,
            denominator: f_number.denominator,
        })
}

/// Reciprocal of the exposure time, the `N` in `1/N`.
fn shutter_denominator(exposure: Rational) -> Result<String, FrameError> {
    if exposure.numerator == 0 || exposure.denominator == 0 {
        return Err(FrameError::InvalidExposure {
            numerator: exposure.numerator,
            denominator: exposure.denominator,
        });
    }
    Ok(format_decimal(
        exposure.denominator as f64 / exposure.numerator as f64,
    ))
}

/// Integral values keep a trailing `.0`; everything else prints its shortest
/// round-trip form.
fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
