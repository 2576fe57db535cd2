//! Library to recover temperatures from thermal camera
//! video.
//!
//! Many thermal cameras only export a rendered video: every
//! pixel is a false color and the frame carries an on-screen
//! legend, a gradient strip labelled with the lowest and the
//! highest temperature in view. This crate inverts that
//! rendering:
//!
//! 1. Locate an arbitrary color on the legend gradient with
//! sub-step precision ([`ColorScale`]).
//!
//! 2. Read the two legend numerals by majority vote over
//! many OCR passes of differently processed crops
//! ([`OcrConsensus`]).
//!
//! 3. Average the legend position over circular regions of
//! interest ([`RegionSampler`]) and map it linearly onto the
//! numeral range ([`ScaleRange`]).
//!
//! [`FramePipeline`] ties these together for every
//! `stride`-th frame of a video.
//!
//! # Usage
//!
//! ## Looking up colors
//!
//! ```rust
//! # fn test_compile() -> anyhow::Result<()> {
//! use thermal_legend::{scale::Axis, ColorScale};
//!
//! let legend = image::open("legend.png")?.to_rgba8();
//! let mut scale = ColorScale::default();
//! scale.load(&legend, Axis::Row(0), false)?;
//!
//! let pixel = (*legend.get_pixel(10, 0)).into();
//! let position = scale.intensity_of(pixel)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Processing a video
//!
//! Frames are read from a directory of stills, an animated
//! GIF or a single image ([`frames::open`]), and one
//! [`FrameRecord`] per processed frame is written to a
//! [`RecordSink`].
//!
//! ```rust
//! # fn test_compile() -> anyhow::Result<()> {
//! use std::{io::stdout, path::Path};
//! use thermal_legend::{
//!     calibration::{ScaleRange, Unit},
//!     frames, report::CsvSink, FramePipeline, PipelineConfig, RangeSource,
//! };
//!
//! let config = PipelineConfig::default();
//! let mut sink = CsvSink::new(stdout(), &config.region_names())?;
//! let range = ScaleRange::new(20., 40., Some(Unit::Celsius));
//! let mut pipeline = FramePipeline::new(config, RangeSource::Fixed(range));
//! pipeline.run(frames::open(Path::new("frames/"))?, &mut sink)?;
//! # Ok(())
//! # }
//! ```
//!
//! Reading the numerals from the frames instead requires a
//! [`TextRecognizer`]; the `ocr` feature provides one backed
//! by Tesseract.

pub mod error;

pub mod calibration;
pub mod color;
pub mod ocr;
pub mod region;
pub mod render;
pub mod scale;

pub mod frames;
pub mod pipeline;
pub mod report;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::calibration::ScaleRange;
pub use crate::color::Color;
pub use crate::ocr::{OcrConsensus, TextRecognizer};
pub use crate::pipeline::{FramePipeline, FrameRecord, PipelineConfig, RangeSource};
pub use crate::region::RegionSampler;
pub use crate::report::RecordSink;
pub use crate::scale::ColorScale;
