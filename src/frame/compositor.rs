use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::{DynamicImage, Rgb, RgbImage, imageops::FilterType};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::debug;

use super::FrameError;
use super::caption::{self, MetadataPolicy};
use super::layout::{CANVAS_HEIGHT, CANVAS_WIDTH, Layout, centered_x};
use super::metadata::CaptureMetadata;

static CAPTION_FONT: &[u8] = include_bytes!("../../static/DejaVuSans.ttf");

const CAPTION_SCALE: f32 = 30.0;
const CANVAS_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// A finished canvas together with the values that produced it.
#[derive(Debug, Clone)]
pub struct Composition {
    pub canvas: RgbImage,
    pub layout: Layout,
    pub metadata_line: String,
    pub attribution: String,
}

pub struct FrameCompositor {
    font: FontRef<'static>,
    scale: PxScale,
}

impl FrameCompositor {
    pub fn new() -> Result<Self, FrameError> {
        let font = FontRef::try_from_slice(CAPTION_FONT).map_err(|_| FrameError::Font)?;
        Ok(Self {
            font,
            scale: PxScale::from(CAPTION_SCALE),
        })
    }

    /// Width in pixels of `text` at the caption size.
    pub fn measure(&self, text: &str) -> u32 {
        text_size(self.scale, &self.font, text).0
    }

    /// Place `source` on a white canvas with the metadata line and attribution below it.
    ///
    /// Captions and geometry are validated before the canvas is allocated, so a
    /// failure never leaves a partially drawn frame behind.
    pub fn compose(
        &self,
        source: &DynamicImage,
        metadata: &CaptureMetadata,
        handle: &str,
        policy: MetadataPolicy,
    ) -> Result<Composition, FrameError> {
        let metadata_line = caption::metadata_line(metadata, policy)?;
        let attribution = caption::attribution_label(handle);
        let layout = Layout::compute(source.width(), source.height())?;

        debug!(
            "Layout for {}x{} source: {:?}",
            source.width(),
            source.height(),
            layout
        );

        let resized = image::imageops::resize(
            &source.to_rgb8(),
            layout.width,
            layout.height,
            FilterType::CatmullRom,
        );

        let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, CANVAS_COLOR);
        image::imageops::replace(&mut canvas, &resized, layout.x as i64, layout.y as i64);

        self.draw_centered(&mut canvas, &metadata_line, layout.metadata_baseline);
        self.draw_centered(&mut canvas, &attribution, layout.attribution_baseline);

        Ok(Composition {
            canvas,
            layout,
            metadata_line,
            attribution,
        })
    }

    fn draw_centered(&self, canvas: &mut RgbImage, text: &str, baseline: u32) {
        let x = centered_x(self.measure(text));
        // imageproc positions text by its top edge
        let ascent = self.font.as_scaled(self.scale).ascent().round() as i32;
        let y = baseline as i32 - ascent;
        draw_text_mut(canvas, TEXT_COLOR, x, y, self.scale, &self.font, text);
    }
}
