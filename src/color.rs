//! Plain value types shared by the calibration code:
//! colors, pixel coordinates and crop rectangles.
use image::{imageops, Rgba, RgbaImage};
use serde_derive::*;

use crate::error::{Error, Result};

/// Largest Euclidean distance two 8-bit RGBA colors can
/// have, i.e. `dist((0, 0, 0, 0), (255, 255, 255, 255))`.
pub const MAX_COLOR_DISTANCE: f64 = 510.0;

/// An RGBA color with exact, channel-wise equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Opaque grey with all color channels set to `level`.
    pub const fn grey(level: u8) -> Self {
        Color::new(level, level, level, u8::MAX)
    }

    #[inline]
    pub fn channels(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Euclidean distance over the four channels.
    #[inline]
    pub fn distance(&self, other: &Color) -> f64 {
        self.channels()
            .iter()
            .zip(other.channels().iter())
            .map(|(&a, &b)| {
                let d = a as f64 - b as f64;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}

impl From<Rgba<u8>> for Color {
    fn from(px: Rgba<u8>) -> Self {
        let [r, g, b, a] = px.0;
        Color { r, g, b, a }
    }
}

impl From<Color> for Rgba<u8> {
    fn from(c: Color) -> Self {
        Rgba(c.channels())
    }
}

/// Integer pixel coordinate. Signed so that translated
/// disk points may fall off the image before clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Point { x, y }
    }

    #[inline]
    pub fn offset(&self, by: Point) -> Point {
        Point::new(self.x + by.x, self.y + by.y)
    }

    #[inline]
    pub fn within(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < width as i64 && self.y < height as i64
    }
}

/// Axis aligned crop rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Crop `image` to this rectangle, clipped to the image
    /// bounds. Fails if nothing of the rectangle remains.
    pub fn crop(&self, image: &RgbaImage) -> Result<RgbaImage> {
        let (width, height) = image.dimensions();
        let x_end = self.x.saturating_add(self.width).min(width);
        let y_end = self.y.saturating_add(self.height).min(height);
        if self.x >= x_end || self.y >= y_end {
            return Err(Error::CropOutOfBounds {
                rect: *self,
                width,
                height,
            });
        }
        Ok(imageops::crop_imm(image, self.x, self.y, x_end - self.x, y_end - self.y).to_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean_over_all_channels() {
        let black = Color::new(0, 0, 0, 0);
        let white = Color::new(255, 255, 255, 255);
        assert_eq!(black.distance(&white), MAX_COLOR_DISTANCE);
        assert_eq!(Color::new(3, 4, 0, 0).distance(&Color::default()), 5.0);
        assert_eq!(white.distance(&white), 0.0);
    }

    #[test]
    fn crop_clips_to_image_bounds() {
        let image = RgbaImage::from_pixel(10, 8, Rgba([1, 2, 3, 4]));
        let cropped = Rect::new(6, 4, 10, 10).crop(&image).unwrap();
        assert_eq!(cropped.dimensions(), (4, 4));
    }

    #[test]
    fn crop_outside_image_fails() {
        let image = RgbaImage::new(10, 8);
        let err = Rect::new(10, 0, 5, 5).crop(&image).unwrap_err();
        assert!(matches!(err, Error::CropOutOfBounds { width: 10, .. }));
        assert!(Rect::new(0, 0, 0, 5).crop(&image).is_err());
    }
}
