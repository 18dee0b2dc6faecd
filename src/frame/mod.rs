// Frame module - photo framing pipeline
mod caption;
mod compositor;
mod decode;
mod encode;
mod error;
mod layout;
mod metadata;

pub use caption::{MetadataPolicy, attribution_label, metadata_line};
pub use compositor::{Composition, FrameCompositor};
pub use decode::{decode_upright, exif_orientation, upright_dimensions};
pub use encode::{DEFAULT_JPEG_QUALITY, encode_jpeg};
pub use error::FrameError;
pub use layout::{CANVAS_HEIGHT, CANVAS_WIDTH, Layout, Orientation, centered_x};
pub use metadata::{
    CaptureMetadata, PhotoDetails, Rational, extract, extract_details, extract_file,
};

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const OUTPUT_PREFIX: &str = "frame_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FrameOptions {
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default)]
    pub metadata_policy: MetadataPolicy,
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            metadata_policy: MetadataPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FramedImage {
    pub image: RgbImage,
    pub jpeg: Vec<u8>,
    pub layout: Layout,
    pub metadata: CaptureMetadata,
}

/// Frame an encoded photo: read its capture metadata, compose, encode as JPEG.
pub fn frame_photo(
    bytes: &[u8],
    handle: &str,
    options: &FrameOptions,
) -> Result<FramedImage, FrameError> {
    let format = image::guess_format(bytes).map_err(FrameError::Decode)?;
    debug!("Detected input format: {:?}", format);

    let details = extract_details(bytes);
    if details.capture.is_empty() {
        warn!("No capture metadata found, refusing to frame");
        return Err(FrameError::NoMetadata);
    }
    let metadata = details.capture;

    let source = decode_upright(bytes, format, details.orientation)?;

    let compositor = FrameCompositor::new()?;
    let composition = compositor.compose(&source, &metadata, handle, options.metadata_policy)?;
    let jpeg = encode_jpeg(&composition.canvas, options.jpeg_quality)?;

    Ok(FramedImage {
        image: composition.canvas,
        jpeg,
        layout: composition.layout,
        metadata,
    })
}

/// `frame_<file name>` next to whatever directory the caller picks.
pub fn output_file_name(input: &Path) -> Option<String> {
    input
        .file_name()
        .map(|name| format!("{}{}", OUTPUT_PREFIX, name.to_string_lossy()))
}

/// Frame the photo at `input` and write the JPEG to `output_dir/frame_<name>`.
pub fn frame_file(
    input: &Path,
    output_dir: &Path,
    handle: &str,
    options: &FrameOptions,
) -> Result<PathBuf, FrameError> {
    let file_name = output_file_name(input).ok_or_else(|| {
        FrameError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{:?} has no file name", input),
        ))
    })?;

    let bytes = std::fs::read(input)?;
    let framed = frame_photo(&bytes, handle, options)?;

    let output = output_dir.join(file_name);
    std::fs::write(&output, &framed.jpeg)?;
    debug!("Wrote framed image to {:?}", output);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ExifFixture, jpeg_with_exif, plain_jpeg};
    use tempfile::TempDir;

    #[test]
    fn test_frame_photo_landscape() {
        let bytes = jpeg_with_exif(400, 300, &ExifFixture::x100());
        let framed = frame_photo(&bytes, "_znkvz", &FrameOptions::default()).unwrap();

        assert_eq!(framed.image.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert_eq!(framed.layout.orientation, Orientation::Landscape);
        assert_eq!(framed.metadata.model.as_deref(), Some("X100"));

        let decoded = image::load_from_memory(&framed.jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (CANVAS_WIDTH, CANVAS_HEIGHT));
    }

    #[test]
    fn test_frame_photo_sideways_phone_portrait() {
        // Stored 400x300 but tagged "rotate 90 CW", so it is shown as 300x400
        let fixture = ExifFixture {
            orientation: Some(6),
            ..ExifFixture::x100()
        };
        let bytes = jpeg_with_exif(400, 300, &fixture);
        let framed = frame_photo(&bytes, "phone", &FrameOptions::default()).unwrap();

        assert_eq!(framed.layout.orientation, Orientation::Portrait);
        assert_eq!(framed.layout.y, 70);
        assert_eq!((framed.layout.width, framed.layout.height), (675, 900));
        assert_eq!(framed.layout, Layout::compute(300, 400).unwrap());
    }

    #[test]
    fn test_frame_photo_upside_down_keeps_layout() {
        let fixture = ExifFixture {
            orientation: Some(3),
            ..ExifFixture::x100()
        };
        let bytes = jpeg_with_exif(400, 300, &fixture);
        let framed = frame_photo(&bytes, "flip", &FrameOptions::default()).unwrap();

        assert_eq!(framed.layout.orientation, Orientation::Landscape);
        assert_eq!(framed.layout.y, 200);
    }

    #[test]
    fn test_frame_photo_without_metadata_fails() {
        let result = frame_photo(&plain_jpeg(40, 30), "nobody", &FrameOptions::default());
        assert!(matches!(result, Err(FrameError::NoMetadata)));
    }

    #[test]
    fn test_frame_photo_garbage_is_decode_error() {
        let result = frame_photo(b"GIF? no.", "nobody", &FrameOptions::default());
        assert!(matches!(result, Err(FrameError::Decode(_))));
    }

    #[test]
    fn test_frame_photo_require_all_policy() {
        let fixture = ExifFixture {
            iso_speed: None,
            ..ExifFixture::x100()
        };
        let bytes = jpeg_with_exif(40, 30, &fixture);
        let options = FrameOptions {
            metadata_policy: MetadataPolicy::RequireAll,
            ..FrameOptions::default()
        };
        assert!(matches!(
            frame_photo(&bytes, "strict", &options),
            Err(FrameError::PartialMetadata { .. })
        ));
        assert!(frame_photo(&bytes, "lenient", &FrameOptions::default()).is_ok());
    }

    #[test]
    fn test_frame_photo_is_byte_identical_across_runs() {
        let bytes = jpeg_with_exif(300, 400, &ExifFixture::x100());
        let options = FrameOptions::default();
        let first = frame_photo(&bytes, "repeat", &options).unwrap();
        let second = frame_photo(&bytes, "repeat", &options).unwrap();
        assert_eq!(first.jpeg, second.jpeg);
    }

    #[test]
    fn test_frame_file_naming() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("1.jpg");
        std::fs::write(&input, jpeg_with_exif(80, 60, &ExifFixture::x100())).unwrap();

        let out_dir = temp_dir.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();

        let output = frame_file(&input, &out_dir, "_znkvz", &FrameOptions::default()).unwrap();
        assert_eq!(output, out_dir.join("frame_1.jpg"));
        assert!(output.exists());
    }

    #[test]
    fn test_frame_file_failure_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("bare.jpg");
        std::fs::write(&input, plain_jpeg(80, 60)).unwrap();

        let result = frame_file(&input, temp_dir.path(), "x", &FrameOptions::default());
        assert!(matches!(result, Err(FrameError::NoMetadata)));
        assert!(!temp_dir.path().join("frame_bare.jpg").exists());
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            output_file_name(Path::new("/tmp/abc.jpg")).as_deref(),
            Some("frame_abc.jpg")
        );
        assert_eq!(output_file_name(Path::new("/")), None);
    }
}
