use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Image carries no capture metadata")]
    NoMetadata,

    #[error("Capture metadata is incomplete, missing: {}", missing.join(", "))]
    PartialMetadata { missing: Vec<&'static str> },

    #[error("Image could not be decoded: {0}")]
    Decode(#[source] image::ImageError),

    #[error(
        "Placement {width}x{height} at ({x}, {y}) does not fit the {canvas_width}x{canvas_height} canvas"
    )]
    GeometryOverflow {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },

    #[error("Exposure time {numerator}/{denominator} cannot be shown as a shutter speed")]
    InvalidExposure { numerator: u32, denominator: u32 },

    #[error("FNumber {numerator}/{denominator} cannot be shown as an aperture")]
    InvalidAperture { numerator: u32, denominator: u32 },

    #[error("Failed to load caption font")]
    Font,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image could not be encoded: {0}")]
    Encode(#[source] image::ImageError),
}

impl FrameError {
    /// Stable code reported to API callers.
    pub fn reason(&self) -> &'static str {
        match self {
            FrameError::NoMetadata => "no_metadata",
            FrameError::PartialMetadata { .. } => "partial_metadata",
            FrameError::Decode(_) => "decode_error",
            FrameError::GeometryOverflow { .. } => "geometry_overflow",
            FrameError::InvalidExposure { .. } => "invalid_exposure",
            FrameError::InvalidAperture { .. } => "invalid_aperture",
            FrameError::Font => "font_error",
            FrameError::Io(_) => "io_error",
            FrameError::Encode(_) => "encode_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_metadata_lists_missing_keys() {
        let err = FrameError::PartialMetadata {
            missing: vec!["FNumber", "ExposureTime"],
        };
        assert_eq!(
            err.to_string(),
            "Capture metadata is incomplete, missing: FNumber, ExposureTime"
        );
        assert_eq!(err.reason(), "partial_metadata");
    }

    #[test]
    fn test_reason_codes_are_distinct() {
        let errors = [
            FrameError::NoMetadata,
            FrameError::PartialMetadata { missing: vec![] },
            FrameError::GeometryOverflow {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
                canvas_width: 1,
                canvas_height: 1,
            },
            FrameError::InvalidExposure {
                numerator: 0,
                denominator: 1,
            },
            FrameError::InvalidAperture {
                numerator: 28,
                denominator: 0,
            },
            FrameError::Font,
            FrameError::Io(std::io::Error::other("boom")),
        ];

        let mut reasons: Vec<_> = errors.iter().map(FrameError::reason).collect();
        reasons.sort_unstable();
        reasons.dedup();
        assert_eq!(reasons.len(), errors.len());
    }
}
