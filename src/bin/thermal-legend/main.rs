mod args;

use std::{
    fs::File,
    io::{stdout, BufWriter, Write},
};

use anyhow::{Context, Result};
use thermal_legend::{
    cli::{init_tracing, load_config, progress_spinner},
    frames,
    report::{CsvSink, JsonSink},
    FramePipeline, PipelineConfig, RangeSource, RecordSink, ScaleRange,
};
use tracing::info;

use crate::args::Args;

fn main() -> Result<()> {
    init_tracing();
    let args = Args::from_cmd_line()?;

    let mut config = load_config(args.config.as_deref())?;
    if let Some(stride) = args.stride {
        config.stride = stride;
    }
    if let Some(seed) = args.seed {
        config.ocr.seed = seed;
    }
    let names = config.region_names();
    let ranges = range_source(&args, &config)?;
    let mut pipeline = FramePipeline::new(config, ranges);

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("could not create {}", path.display()))?,
        )),
        None => Box::new(stdout()),
    };
    let mut sink: Box<dyn RecordSink> = if args.is_json {
        Box::new(JsonSink::new(out))
    } else {
        Box::new(CsvSink::new(out, &names)?)
    };

    let bar = progress_spinner();
    let bar_dup = bar.clone();
    let frames = frames::open(&args.input)?.inspect(move |_| bar_dup.inc(1));
    let count = pipeline.run(frames, sink.as_mut())?;
    bar.finish_and_clear();

    info!("Processed {} frames", count);
    Ok(())
}

fn range_source(args: &Args, config: &PipelineConfig) -> Result<RangeSource> {
    if let Some((low, high, unit)) = args.fixed {
        info!("using fixed legend range {}..{}{}", low, high, unit);
        return Ok(RangeSource::Fixed(ScaleRange::new(low, high, Some(unit))));
    }
    ocr_source(args, config)
}

#[cfg(feature = "ocr")]
fn ocr_source(args: &Args, config: &PipelineConfig) -> Result<RangeSource> {
    use thermal_legend::{ocr::TesseractEngine, OcrConsensus};

    let engine = TesseractEngine::new(args.tessdata.as_deref(), args.language.as_deref())?;
    Ok(RangeSource::Ocr(OcrConsensus::new(
        Box::new(engine),
        config.ocr.clone(),
    )))
}

#[cfg(not(feature = "ocr"))]
fn ocr_source(_args: &Args, _config: &PipelineConfig) -> Result<RangeSource> {
    anyhow::bail!("built without the `ocr` feature: pass --min, --max and --unit")
}
