use serde::Serialize;

use super::FrameError;

pub const CANVAS_WIDTH: u32 = 1080;
pub const CANVAS_HEIGHT: u32 = 1350;

const PORTRAIT_WIDTH_DIVISOR: f64 = 1.6;
const LANDSCAPE_WIDTH_DIVISOR: f64 = 1.4;
const PORTRAIT_TOP: u32 = 70;
const LANDSCAPE_TOP: u32 = 200;

/// Baseline offsets of the two caption lines below the photo.
const METADATA_LINE_OFFSET: u32 = 50;
const ATTRIBUTION_LINE_OFFSET: u32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Square images count as landscape.
    pub fn of(width: u32, height: u32) -> Self {
        if height > width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    fn width_divisor(self) -> f64 {
        match self {
            Orientation::Portrait => PORTRAIT_WIDTH_DIVISOR,
            Orientation::Landscape => LANDSCAPE_WIDTH_DIVISOR,
        }
    }

    fn top(self) -> u32 {
        match self {
            Orientation::Portrait => PORTRAIT_TOP,
            Orientation::Landscape => LANDSCAPE_TOP,
        }
    }
}

/// Placement of the photo and caption baselines on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    pub metadata_baseline: u32,
    pub attribution_baseline: u32,
}

impl Layout {
    pub fn compute(source_width: u32, source_height: u32) -> Result<Self, FrameError> {
        let orientation = Orientation::of(source_width, source_height);

        let width = (CANVAS_WIDTH as f64 / orientation.width_divisor()).round_ties_even() as u32;
        let height = if source_width == 0 {
            0
        } else {
            (source_height as f64 / source_width as f64 * width as f64).round_ties_even() as u32
        };
        let x = CANVAS_WIDTH / 2 - width / 2;
        let y = orientation.top();

        if height == 0
            || y.saturating_add(height) > CANVAS_HEIGHT
            || x + width > CANVAS_WIDTH
        {
            return Err(FrameError::GeometryOverflow {
                x,
                y,
                width,
                height,
                canvas_width: CANVAS_WIDTH,
                canvas_height: CANVAS_HEIGHT,
            });
        }

        Ok(Self {
            orientation,
            width,
            height,
            x,
            y,
            metadata_baseline: y + height + METADATA_LINE_OFFSET,
            attribution_baseline: y + height + ATTRIBUTION_LINE_OFFSET,
        })
    }
}

/// Left edge that centres a run of text on the canvas.
pub fn centered_x(text_width: u32) -> i32 {
    (CANVAS_WIDTH as i32 - text_width as i32).div_euclid(2)
}
