//! Frame by frame calibration of a thermal video.
//!
//! For every `stride`-th frame the [`FramePipeline`] reads the
//! legend numerals, loads the legend gradient, averages the
//! legend position over each region of interest and maps it
//! to a temperature. Anything that goes wrong inside a frame
//! only degrades that frame's record; the frame is still
//! emitted so record indices stay aligned with the video.
use anyhow::{ensure, Context, Result};
use image::{imageops, RgbaImage};
use serde_derive::*;
use tracing::{debug, info, warn};

use crate::{
    calibration::ScaleRange,
    color::{Point, Rect},
    frames::Frame,
    ocr::{ConsensusConfig, OcrConsensus},
    region::{average_value, RegionSampler},
    report::RecordSink,
    scale::{Axis, ColorScale},
};

/// Rotation applied to each frame before anything is read
/// from it. Every other coordinate in [`PipelineConfig`] is in
/// the rotated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::None
    }
}

impl Rotation {
    pub fn apply(&self, frame: RgbaImage) -> RgbaImage {
        match self {
            Rotation::None => frame,
            Rotation::Cw90 => imageops::rotate90(&frame),
            Rotation::Cw180 => imageops::rotate180(&frame),
            Rotation::Cw270 => imageops::rotate270(&frame),
        }
    }
}

/// Where the legend lives in the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    /// Crop holding the gradient strip.
    pub strip: Rect,
    /// Line of the strip crop to read.
    pub axis: Axis,
    /// The strip is drawn hottest first.
    pub reversed: bool,
    /// Crop holding the lowest temperature numeral.
    pub min_label: Rect,
    /// Crop holding the highest temperature numeral.
    pub max_label: Rect,
}

impl Default for LegendConfig {
    fn default() -> Self {
        LegendConfig {
            strip: Rect::new(80, 615, 320, 10),
            axis: Axis::Row(5),
            reversed: false,
            min_label: Rect::new(0, 600, 80, 40),
            max_label: Rect::new(400, 600, 80, 40),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub name: String,
    pub center: Point,
    pub radius: u32,
}

impl RegionOfInterest {
    pub fn new(name: &str, x: i64, y: i64, radius: u32) -> Self {
        RegionOfInterest {
            name: name.into(),
            center: Point::new(x, y),
            radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Process every `stride`-th frame, starting at frame 0.
    pub stride: usize,
    pub rotation: Rotation,
    pub legend: LegendConfig,
    pub regions: Vec<RegionOfInterest>,
    pub ocr: ConsensusConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            stride: 75,
            rotation: Rotation::None,
            legend: LegendConfig::default(),
            regions: vec![
                RegionOfInterest::new("a", 346, 499, 8),
                RegionOfInterest::new("b", 386, 484, 8),
                RegionOfInterest::new("c", 388, 514, 8),
                RegionOfInterest::new("d", 374, 498, 24),
            ],
            ocr: ConsensusConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.name.clone()).collect()
    }
}

/// Where each frame's temperature range comes from.
pub enum RangeSource {
    /// Read the legend numerals of every frame.
    Ocr(OcrConsensus),
    /// Use the same range for every frame.
    Fixed(ScaleRange),
}

/// Averaged legend position and calibrated value of one
/// region in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionSample {
    /// `None` when the region missed the frame or the frame
    /// had no usable legend.
    pub raw: Option<f64>,
    /// Temperature, or `0` when the frame is uncalibrated.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub frame: usize,
    pub range: ScaleRange,
    pub samples: Vec<RegionSample>,
}

pub struct FramePipeline {
    config: PipelineConfig,
    ranges: RangeSource,
    scale: ColorScale,
    sampler: RegionSampler,
}

impl FramePipeline {
    pub fn new(config: PipelineConfig, ranges: RangeSource) -> Self {
        FramePipeline {
            config,
            ranges,
            scale: ColorScale::default(),
            sampler: RegionSampler::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every `stride`-th frame of `frames` and hand
    /// the records to `sink` in frame order. Returns the number
    /// of records written.
    ///
    /// Only selected frames are loaded. Fails only if the
    /// source yields no frames, a selected frame cannot be
    /// decoded or the sink fails.
    pub fn run<I, F, S>(&mut self, frames: I, sink: &mut S) -> Result<usize>
    where
        I: IntoIterator<Item = Result<F>>,
        F: Into<Frame>,
        S: RecordSink + ?Sized,
    {
        let stride = self.config.stride;
        ensure!(stride > 0, "frame stride must be positive");

        let mut seen = 0usize;
        let mut written = 0usize;
        for (index, frame) in frames.into_iter().enumerate() {
            seen += 1;
            if index % stride != 0 {
                continue;
            }

            let frame = frame
                .and_then(|f| Frame::load(f.into()))
                .with_context(|| format!("could not decode frame {}", index))?;
            let record = self.process_frame(index, frame);
            sink.write_record(&record)
                .with_context(|| format!("could not write record for frame {}", index))?;
            written += 1;
        }
        ensure!(seen > 0, "frame source produced no frames");

        sink.finish()?;
        info!("wrote {} records from {} frames", written, seen);
        Ok(written)
    }

    /// Calibrate and sample a single frame.
    pub fn process_frame(&mut self, index: usize, frame: RgbaImage) -> FrameRecord {
        let frame = self.config.rotation.apply(frame);
        let range = self.read_range(index, &frame);

        let FramePipeline {
            config,
            scale,
            sampler,
            ..
        } = self;

        let legend = &config.legend;
        let has_scale = match legend
            .strip
            .crop(&frame)
            .and_then(|strip| scale.load(&strip, legend.axis, legend.reversed))
        {
            Ok(()) => true,
            Err(e) => {
                warn!("frame {}: no color scale: {}", index, e);
                false
            }
        };

        let span = scale.span();
        let calibrated = range.is_calibrated() && span > 0.;
        let (width, height) = frame.dimensions();

        let samples = config
            .regions
            .iter()
            .map(|roi| {
                let raw = if has_scale {
                    let points = sampler.region(roi.center, roi.radius, width, height);
                    match average_value(&frame, &points, |c| scale.intensity_of(c)) {
                        Ok(raw) => Some(raw),
                        Err(e) => {
                            warn!("frame {}: region {}: {}", index, roi.name, e);
                            None
                        }
                    }
                } else {
                    None
                };

                let value = match raw {
                    Some(raw) if calibrated => range.map(span, raw),
                    _ => 0.,
                };
                RegionSample { raw, value }
            })
            .collect();

        info!(
            "frame {}: {}..{}{} over {} regions",
            index,
            range.low,
            range.high,
            range.unit_label(),
            config.regions.len()
        );
        FrameRecord {
            frame: index,
            range,
            samples,
        }
    }

    /// The frame's temperature range, or the placeholder if
    /// either legend numeral is unreadable.
    fn read_range(&mut self, index: usize, frame: &RgbaImage) -> ScaleRange {
        let ocr = match &mut self.ranges {
            RangeSource::Fixed(range) => return *range,
            RangeSource::Ocr(ocr) => ocr,
        };
        let legend = &self.config.legend;

        let mut read_label = |label: Rect, which: &str| match label.crop(frame) {
            Ok(crop) => {
                let reading = ocr.extract(&crop).into_text();
                if reading.is_none() {
                    warn!("frame {}: could not read {} label", index, which);
                }
                reading
            }
            Err(e) => {
                warn!("frame {}: {} label: {}", index, which, e);
                None
            }
        };

        let min = read_label(legend.min_label, "min");
        let max = read_label(legend.max_label, "max");
        let (min, max) = match (min, max) {
            (Some(min), Some(max)) => (min, max),
            _ => return ScaleRange::placeholder(),
        };

        debug!("frame {}: legend reads {:?}..{:?}", index, min, max);
        ScaleRange::from_readings(&min, &max).unwrap_or_else(|e| {
            warn!("frame {}: {}", index, e);
            ScaleRange::placeholder()
        })
    }
}
