mod args;
mod proc;

use anyhow::Result;
use indicatif::ParallelProgressIterator;
use thermal_legend::cli::{init_tracing, load_config, progress_bar};
use tracing::info;

use crate::{
    args::Args,
    proc::{colorize_image, ColorizeArgs},
};

fn main() -> Result<()> {
    init_tracing();
    let args = Args::from_cmd_line()?;
    let config = load_config(args.config.as_deref())?;
    std::fs::create_dir_all(&args.output)?;

    let c_args = ColorizeArgs {
        legend: config.legend,
        rotation: config.rotation,
        output: args.output.clone(),
    };
    let bar = progress_bar(args.paths.len() as u64);

    use rayon::prelude::*;
    let count = args
        .paths
        .par_iter()
        .progress_with(bar)
        .map(|p| -> Result<()> {
            colorize_image(p, &c_args)?;
            Ok(())
        })
        .try_fold(
            || 0usize,
            |acc, res| -> Result<_> {
                res?;
                Ok(acc + 1)
            },
        )
        .try_reduce(|| 0, |a, b| Ok(a + b))?;

    info!("Processed {} images", count);
    Ok(())
}
