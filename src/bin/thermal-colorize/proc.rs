use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use thermal_legend::{
    pipeline::{LegendConfig, Rotation},
    render::{intensity_map, to_greyscale},
    ColorScale,
};

pub struct ColorizeArgs {
    pub legend: LegendConfig,
    pub rotation: Rotation,
    pub output: PathBuf,
}

impl ColorizeArgs {
    pub fn output_stem_for(&self, path: &Path) -> Result<PathBuf> {
        let stem = path
            .file_stem()
            .ok_or_else(|| anyhow!("no file name in {}", path.display()))?;
        Ok(self.output.join(stem))
    }
}

/// Each image is read against its own legend strip.
pub fn colorize_image(path: &Path, args: &ColorizeArgs) -> Result<PathBuf> {
    let frame = image::open(path)
        .with_context(|| format!("could not decode {}", path.display()))?
        .to_rgba8();
    let frame = args.rotation.apply(frame);

    let legend = &args.legend;
    let strip = legend.strip.crop(&frame)?;
    let mut scale = ColorScale::default();
    scale
        .load(&strip, legend.axis, legend.reversed)
        .with_context(|| format!("no legend in {}", path.display()))?;

    let map = intensity_map(&mut scale, &frame)?;
    let out_path = args.output_stem_for(path)?.with_extension("png");
    to_greyscale(&scale, &map)
        .save(&out_path)
        .with_context(|| format!("could not write {}", out_path.display()))?;

    Ok(out_path)
}
