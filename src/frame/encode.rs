use image::{ImageEncoder, RgbImage, codecs::jpeg::JpegEncoder};
use tracing::debug;

use super::FrameError;

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Encode the canvas as a baseline JPEG.
pub fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Vec<u8>, FrameError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .write_image(
            canvas,
            canvas.width(),
            canvas.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(FrameError::Encode)?;

    debug!("Encoded frame as JPEG: {} bytes", buffer.len());
    Ok(buffer)
}
