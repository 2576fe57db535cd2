use anyhow::Result;
use clap::value_t_or_exit;
use std::path::PathBuf;
use thermal_legend::{arg, args_parser, opt};

pub struct Args {
    pub paths: Vec<PathBuf>,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("thermal-colorize")
            .about("Render thermal frames as greyscale legend intensity.")
            .arg(
                opt!("output")
                    .short("o")
                    .required(true)
                    .help("Output directory"),
            )
            .arg(
                opt!("config")
                    .short("c")
                    .help("Pipeline config (json) locating the legend strip"),
            )
            .arg(
                arg!("images")
                    .required(true)
                    .multiple(true)
                    .help("Image paths"),
            )
            .get_matches();

        let paths = matches
            .values_of("images")
            .unwrap()
            .map(|f| f.into())
            .collect();
        let output = value_t_or_exit!(matches, "output", PathBuf);
        let config = matches.value_of("config").map(PathBuf::from);

        Ok(Args {
            paths,
            output,
            config,
        })
    }
}
