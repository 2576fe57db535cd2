use anyhow::Result;
use clap::value_t_or_exit;
use std::path::PathBuf;
use thermal_legend::{arg, args_parser, calibration::Unit, opt};

#[cfg_attr(not(feature = "ocr"), allow(dead_code))]
pub struct Args {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub is_json: bool,
    pub stride: Option<usize>,
    pub seed: Option<u64>,
    pub fixed: Option<(f64, f64, Unit)>,
    pub tessdata: Option<String>,
    pub language: Option<String>,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("thermal-legend")
            .setting(clap::AppSettings::AllowLeadingHyphen)
            .about("Calibrate regions of a thermal video against its on-screen legend.")
            .arg(
                opt!("config")
                    .short("c")
                    .help("Pipeline config (json). Missing fields use the defaults"),
            )
            .arg(
                opt!("output")
                    .short("o")
                    .help("Write records here (default: stdout)"),
            )
            .arg(
                opt!("json")
                    .short("j")
                    .takes_value(false)
                    .help("Write json lines (default: csv)"),
            )
            .arg(opt!("stride").short("s").help("Process every n-th frame"))
            .arg(opt!("seed").help("Seed for the OCR variant order"))
            .arg(
                opt!("min")
                    .requires_all(&["max", "unit"])
                    .help("Fixed legend minimum (skips OCR)"),
            )
            .arg(
                opt!("max")
                    .requires_all(&["min", "unit"])
                    .help("Fixed legend maximum (skips OCR)"),
            )
            .arg(
                opt!("unit")
                    .possible_values(&["F", "C"])
                    .requires_all(&["min", "max"])
                    .help("Unit of the fixed legend range"),
            )
            .arg(opt!("tessdata").help("Tesseract data directory (ocr builds)"))
            .arg(opt!("language").help("Tesseract language. Default is eng"))
            .arg(
                arg!("input")
                    .required(true)
                    .help("Directory of frames, animated gif or single image"),
            )
            .get_matches();

        let input = value_t_or_exit!(matches, "input", PathBuf);
        let config = matches.value_of("config").map(PathBuf::from);
        let output = matches.value_of("output").map(PathBuf::from);
        let is_json = matches.is_present("json");
        let stride = matches
            .is_present("stride")
            .then(|| value_t_or_exit!(matches.value_of("stride"), usize));
        let seed = matches
            .is_present("seed")
            .then(|| value_t_or_exit!(matches.value_of("seed"), u64));
        let fixed = matches.is_present("min").then(|| {
            (
                value_t_or_exit!(matches, "min", f64),
                value_t_or_exit!(matches, "max", f64),
                value_t_or_exit!(matches, "unit", Unit),
            )
        });
        let tessdata = matches.value_of("tessdata").map(String::from);
        let language = matches.value_of("language").map(String::from);

        Ok(Args {
            input,
            config,
            output,
            is_json,
            stride,
            seed,
            fixed,
            tessdata,
            language,
        })
    }
}
