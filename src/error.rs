use thiserror::Error;

use crate::color::Rect;

/// Failures local to a single frame's calibration.
///
/// None of these abort a run: the pipeline logs them and
/// emits the frame with sentinel values instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("color scale has no entries")]
    EmptyScale,
    #[error("sampling region lies entirely outside the image")]
    EmptyRegion,
    #[error("crop {rect:?} does not intersect the {width}x{height} frame")]
    CropOutOfBounds { rect: Rect, width: u32, height: u32 },
    #[error("malformed legend reading: {0:?}")]
    MalformedReading(String),
}

pub type Result<T> = std::result::Result<T, Error>;
