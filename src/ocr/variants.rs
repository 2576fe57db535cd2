//! Degraded renderings of a glyph crop.
//!
//! No single grayscale conversion or threshold gives clean
//! glyphs under every lighting condition, so each crop is
//! rendered many ways and every rendering gets its own OCR
//! pass. A [`Variant`] is only a recipe; rendering happens
//! when the candidate is actually evaluated.
use image::{imageops, imageops::FilterType, GrayImage, Luma, RgbaImage};
use itertools::iproduct;

/// PIL's `EDGE_ENHANCE_MORE`.
const EDGE_ENHANCE_MORE: [f32; 9] = [-1., -1., -1., -1., 9., -1., -1., -1., -1.];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Luma,
    Red,
    Green,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Normal,
    Inverted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finish {
    Upscaled,
    Sharpened,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variant {
    pub channel: Channel,
    pub polarity: Polarity,
    /// Binarize at this level; `None` keeps the gray levels.
    pub threshold: Option<u8>,
    pub finish: Finish,
}

/// Every combination of channel, polarity, threshold and
/// finish, in a fixed order.
pub fn plan(thresholds: &[u8]) -> Vec<Variant> {
    let channels = [Channel::Luma, Channel::Red, Channel::Green, Channel::Blue];
    let polarities = [Polarity::Normal, Polarity::Inverted];
    let finishes = [Finish::Upscaled, Finish::Sharpened];
    let levels: Vec<Option<u8>> = std::iter::once(None)
        .chain(thresholds.iter().copied().map(Some))
        .collect();

    iproduct!(
        channels.iter(),
        polarities.iter(),
        levels.iter(),
        finishes.iter()
    )
    .map(|(&channel, &polarity, &threshold, &finish)| Variant {
        channel,
        polarity,
        threshold,
        finish,
    })
    .collect()
}

impl Variant {
    /// Render `source`: pick a channel, invert, binarize, pad
    /// by `padding` pixels of background, scale up by
    /// `upscale` and optionally sharpen.
    pub fn render(&self, source: &RgbaImage, upscale: u32, padding: u32) -> GrayImage {
        let mut gray = match self.channel {
            Channel::Luma => imageops::grayscale(source),
            Channel::Red => split_channel(source, 0),
            Channel::Green => split_channel(source, 1),
            Channel::Blue => split_channel(source, 2),
        };

        if self.polarity == Polarity::Inverted {
            imageops::invert(&mut gray);
        }

        if let Some(level) = self.threshold {
            for px in gray.pixels_mut() {
                px.0[0] = if px.0[0] > level { u8::MAX } else { 0 };
            }
        }

        let padded = pad(&gray, padding);
        let (width, height) = padded.dimensions();
        let upscale = upscale.max(1);
        let big = imageops::resize(
            &padded,
            width * upscale,
            height * upscale,
            FilterType::CatmullRom,
        );

        match self.finish {
            Finish::Upscaled => big,
            Finish::Sharpened => imageops::filter3x3(&big, &EDGE_ENHANCE_MORE),
        }
    }
}

fn split_channel(source: &RgbaImage, idx: usize) -> GrayImage {
    GrayImage::from_fn(source.width(), source.height(), |x, y| {
        Luma([source.get_pixel(x, y).0[idx]])
    })
}

/// Surround with a border of the top-left pixel's level,
/// which is background on a legend crop.
fn pad(gray: &GrayImage, padding: u32) -> GrayImage {
    let background = if gray.width() > 0 && gray.height() > 0 {
        *gray.get_pixel(0, 0)
    } else {
        Luma([0])
    };
    let mut padded = GrayImage::from_pixel(
        gray.width() + 2 * padding,
        gray.height() + 2 * padding,
        background,
    );
    imageops::replace(&mut padded, gray, padding as i64, padding as i64);
    padded
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use image::Rgba;

    fn glyph() -> RgbaImage {
        let mut image = RgbaImage::from_pixel(6, 4, Rgba([20, 30, 40, 255]));
        image.put_pixel(2, 2, Rgba([250, 200, 150, 255]));
        image
    }

    #[test]
    fn plan_covers_the_full_cross_product() {
        let variants = plan(&[100, 150]);
        assert_eq!(variants.len(), 4 * 2 * 3 * 2);
        let distinct: HashSet<_> = variants.iter().collect();
        assert_eq!(distinct.len(), variants.len());
        assert!(variants.iter().any(|v| v.polarity == Polarity::Inverted));
        assert!(variants.iter().any(|v| v.threshold == Some(150)));
    }

    #[test]
    fn render_pads_and_upscales() {
        let variant = Variant {
            channel: Channel::Luma,
            polarity: Polarity::Normal,
            threshold: None,
            finish: Finish::Upscaled,
        };
        let out = variant.render(&glyph(), 3, 2);
        assert_eq!(out.dimensions(), ((6 + 4) * 3, (4 + 4) * 3));
    }

    #[test]
    fn threshold_binarizes_selected_channel() {
        let variant = Variant {
            channel: Channel::Red,
            polarity: Polarity::Normal,
            threshold: Some(100),
            finish: Finish::Upscaled,
        };
        let out = variant.render(&glyph(), 1, 0);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(2, 2).0[0], 255);

        let inverted = Variant {
            polarity: Polarity::Inverted,
            ..variant
        };
        let out = inverted.render(&glyph(), 1, 0);
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
        assert_eq!(out.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn sharpened_keeps_dimensions() {
        let variant = Variant {
            channel: Channel::Blue,
            polarity: Polarity::Inverted,
            threshold: Some(120),
            finish: Finish::Sharpened,
        };
        assert_eq!(variant.render(&glyph(), 2, 1).dimensions(), (16, 12));
    }
}
