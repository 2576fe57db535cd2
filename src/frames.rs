//! Sources of video frames.
//!
//! Frames come in video order. Supported inputs are a
//! directory of still frames (as written by e.g.
//! `ffmpeg -i video.mp4 frames/%d.png`), an animated GIF, or a
//! single image treated as a one frame video.
//!
//! Stills in a directory are only decoded by [`Frame::load`],
//! so frames a consumer skips cost nothing but a path. GIF
//! frames depend on their predecessors and are decoded in
//! sequence as the source is iterated.
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use image::{codecs::gif::GifDecoder, AnimationDecoder, RgbaImage};
use itertools::Itertools;

pub type Frames = Box<dyn Iterator<Item = Result<Frame>>>;

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// One frame of a source, possibly not decoded yet.
#[derive(Debug, Clone)]
pub enum Frame {
    Decoded(RgbaImage),
    Still(PathBuf),
}

impl Frame {
    pub fn load(self) -> Result<RgbaImage> {
        match self {
            Frame::Decoded(image) => Ok(image),
            Frame::Still(path) => decode(&path),
        }
    }
}

impl From<RgbaImage> for Frame {
    fn from(image: RgbaImage) -> Self {
        Frame::Decoded(image)
    }
}

/// Open `path` as a frame source.
pub fn open(path: &Path) -> Result<Frames> {
    if path.is_dir() {
        return frames_in_dir(path);
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("gif") => gif_frames(path),
        Some(e) if FRAME_EXTENSIONS.contains(&e) => {
            let frame = decode(path)?;
            Ok(Box::new(std::iter::once(Ok(Frame::Decoded(frame)))))
        }
        _ => bail!("unsupported frame source: {}", path.display()),
    }
}

/// Still frames in `dir`, in natural order of their file
/// names: `frame2.png` comes before `frame10.png`.
pub fn frame_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut opts = glob::MatchOptions::new();
    opts.case_sensitive = false;

    let mut paths = vec![];
    for ext in FRAME_EXTENSIONS {
        let pattern = dir.join(format!("*.{}", ext));
        let pattern = pattern
            .to_str()
            .ok_or_else(|| anyhow!("non utf-8 path: {}", dir.display()))?;
        for entry in glob::glob_with(pattern, opts)? {
            paths.push(entry?);
        }
    }
    paths.sort_by_cached_key(|p| natural_key(p));
    paths.dedup();
    Ok(paths)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Number(u64),
    Text(String),
}

/// File name split into digit and non-digit runs.
fn natural_key(path: &Path) -> Vec<Chunk> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let runs = name.chars().group_by(|c| c.is_ascii_digit());
    let key = runs
        .into_iter()
        .map(|(digits, run)| {
            let run: String = run.collect();
            match run.parse() {
                Ok(n) if digits => Chunk::Number(n),
                _ => Chunk::Text(run),
            }
        })
        .collect();
    key
}

fn frames_in_dir(dir: &Path) -> Result<Frames> {
    let paths = frame_paths(dir)?;
    if paths.is_empty() {
        bail!("no frames found in {}", dir.display());
    }
    tracing::info!("{} frames in {}", paths.len(), dir.display());
    Ok(Box::new(paths.into_iter().map(|p| Ok(Frame::Still(p)))))
}

fn gif_frames(path: &Path) -> Result<Frames> {
    let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
    let decoder = GifDecoder::new(BufReader::new(file))
        .with_context(|| format!("could not decode {}", path.display()))?;
    Ok(Box::new(decoder.into_frames().map(|f| {
        let f = f.context("could not decode gif frame")?;
        Ok(Frame::Decoded(f.into_buffer()))
    })))
}

fn decode(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)
        .with_context(|| format!("could not decode {}", path.display()))?
        .to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{codecs::gif::GifEncoder, Rgba};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("thermal-legend-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn load_all(path: &Path) -> Vec<RgbaImage> {
        open(path)
            .unwrap()
            .map(|f| f.and_then(Frame::load).unwrap())
            .collect()
    }

    #[test]
    fn directory_frames_come_in_name_order() {
        let dir = scratch_dir("frames");
        for (i, name) in ["000002.png", "000000.png", "000001.PNG"].iter().enumerate() {
            RgbaImage::from_pixel(2, 2, Rgba([i as u8, 0, 0, 255]))
                .save(dir.join(name))
                .unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let reds: Vec<u8> = load_all(&dir).iter().map(|f| f.get_pixel(0, 0).0[0]).collect();
        assert_eq!(reds, vec![1, 2, 0]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unpadded_frame_numbers_sort_numerically() {
        let dir = scratch_dir("unpadded");
        for n in &[10u8, 2, 1] {
            RgbaImage::from_pixel(1, 1, Rgba([*n, 0, 0, 255]))
                .save(dir.join(format!("frame{}.png", n)))
                .unwrap();
        }

        let reds: Vec<u8> = load_all(&dir).iter().map(|f| f.get_pixel(0, 0).0[0]).collect();
        assert_eq!(reds, vec![1, 2, 10]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn stills_are_decoded_only_when_loaded() {
        let dir = scratch_dir("deferred");
        RgbaImage::new(2, 2).save(dir.join("000000.png")).unwrap();
        std::fs::write(dir.join("000001.png"), "garbage").unwrap();
        RgbaImage::new(2, 2).save(dir.join("000002.png")).unwrap();

        let frames: Vec<Frame> = open(&dir).unwrap().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 3);
        let mut frames = frames.into_iter();
        assert!(frames.next().unwrap().load().is_ok());
        assert!(frames.next().unwrap().load().is_err());
        assert!(frames.next().unwrap().load().is_ok());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn gif_frames_come_in_order() {
        let dir = scratch_dir("gif");
        let path = dir.join("clip.gif");
        let colors = [
            Rgba([255, 0, 0, 255]),
            Rgba([0, 255, 0, 255]),
            Rgba([0, 0, 255, 255]),
        ];
        {
            let mut encoder = GifEncoder::new(File::create(&path).unwrap());
            encoder
                .encode_frames(
                    colors
                        .iter()
                        .map(|c| image::Frame::new(RgbaImage::from_pixel(4, 3, *c))),
                )
                .unwrap();
        }

        let frames = load_all(&path);
        assert_eq!(frames.len(), 3);
        for (frame, color) in frames.iter().zip(colors.iter()) {
            assert_eq!(frame.dimensions(), (4, 3));
            let px = frame.get_pixel(1, 1);
            // Brightest channel survives palette quantization.
            let brightest = (0..3).max_by_key(|&i| px.0[i]).unwrap();
            let expected = (0..3).max_by_key(|&i| color.0[i]).unwrap();
            assert_eq!(brightest, expected);
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn single_image_is_one_frame() {
        let dir = scratch_dir("single");
        let path = dir.join("frame.png");
        RgbaImage::new(3, 3).save(&path).unwrap();
        assert_eq!(open(&path).unwrap().count(), 1);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_directory_and_unknown_files_fail() {
        let dir = scratch_dir("empty");
        assert!(open(&dir).is_err());
        assert!(open(&dir.join("movie.mkv")).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
