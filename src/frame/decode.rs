use image::metadata::Orientation as ExifOrientation;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use super::FrameError;

/// Map the raw EXIF Orientation value onto the transform that makes the
/// photo upright. Missing or out-of-range values leave the pixels alone.
pub fn exif_orientation(value: Option<u16>) -> ExifOrientation {
    value
        .and_then(|v| u8::try_from(v).ok())
        .and_then(ExifOrientation::from_exif)
        .unwrap_or(ExifOrientation::NoTransforms)
}

/// Whether the transform turns the photo a quarter turn (EXIF 5 through 8).
pub fn swaps_dimensions(orientation: ExifOrientation) -> bool {
    matches!(
        orientation,
        ExifOrientation::Rotate90
            | ExifOrientation::Rotate270
            | ExifOrientation::Rotate90FlipH
            | ExifOrientation::Rotate270FlipH
    )
}

/// Stored pixel dimensions as the viewer sees them.
pub fn upright_dimensions(width: u32, height: u32, orientation: Option<u16>) -> (u32, u32) {
    if swaps_dimensions(exif_orientation(orientation)) {
        (height, width)
    } else {
        (width, height)
    }
}

/// Decode the photo and apply its EXIF orientation, so layout sees the
/// photo the way the camera meant it to be shown.
pub fn decode_upright(
    bytes: &[u8],
    format: ImageFormat,
    orientation: Option<u16>,
) -> Result<DynamicImage, FrameError> {
    let mut image =
        image::load_from_memory_with_format(bytes, format).map_err(FrameError::Decode)?;

    let transform = exif_orientation(orientation);
    if !matches!(transform, ExifOrientation::NoTransforms) {
        debug!(
            "Applying EXIF orientation {:?} to {}x{} photo",
            transform,
            image.width(),
            image.height()
        );
        image.apply_orientation(transform);
    }

    Ok(image)
}
