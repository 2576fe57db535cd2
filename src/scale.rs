//! Color to intensity lookup against a calibration legend.
//!
//! A [`ColorScale`] holds the legend gradient as an ordered
//! list of colors, coldest first. [`ColorScale::intensity_of`]
//! places an arbitrary color on that list with sub-step
//! precision.
//!
//! # Convention
//!
//! Intensities are expressed in *raw index* units: a color
//! equal to entry `i` has intensity `i as f64`, and a color
//! that falls between entries is placed at most half a step
//! away from its nearest entry. Values are never clamped;
//! a color past either end of the legend is placed towards
//! the only neighbour its nearest entry has.
use std::collections::HashMap;

use image::RgbaImage;
use serde_derive::*;

use crate::{
    color::{Color, Point, MAX_COLOR_DISTANCE},
    error::{Error, Result},
};

/// Which line of the legend image holds the gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Read row `y`, left to right.
    Row(u32),
    /// Read column `x`, top to bottom.
    Column(u32),
}

impl Default for Axis {
    fn default() -> Self {
        Axis::Row(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColorScale {
    colors: Vec<Color>,
    cache: HashMap<Color, f64>,
}

impl ColorScale {
    pub fn from_colors(colors: Vec<Color>) -> Result<Self> {
        let mut scale = ColorScale::default();
        scale.replace(colors)?;
        Ok(scale)
    }

    /// Load the gradient from one row or column of `image`.
    /// With `reversed`, the line is read back to front (for
    /// legends drawn hottest first).
    ///
    /// Replaces the current gradient and clears the cache.
    pub fn load(&mut self, image: &RgbaImage, axis: Axis, reversed: bool) -> Result<()> {
        let (width, height) = image.dimensions();
        let mut colors: Vec<Color> = match axis {
            Axis::Row(y) if y < height => (0..width)
                .map(|x| (*image.get_pixel(x, y)).into())
                .collect(),
            Axis::Column(x) if x < width => (0..height)
                .map(|y| (*image.get_pixel(x, y)).into())
                .collect(),
            _ => vec![],
        };
        if reversed {
            colors.reverse();
        }
        self.replace(colors)
    }

    /// Load the gradient by walking the straight line from
    /// `start` (inclusive) to `stop` (exclusive). Pixels off
    /// the image are skipped.
    pub fn load_line(&mut self, image: &RgbaImage, start: Point, stop: Point) -> Result<()> {
        let (width, height) = image.dimensions();
        let dx = stop.x - start.x;
        let dy = stop.y - start.y;
        let steps = dx.abs().max(dy.abs());

        let colors = (0..steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                Point::new(
                    start.x + (t * dx as f64).round() as i64,
                    start.y + (t * dy as f64).round() as i64,
                )
            })
            .filter(|p| p.within(width, height))
            .map(|p| (*image.get_pixel(p.x as u32, p.y as u32)).into())
            .collect();
        self.replace(colors)
    }

    fn replace(&mut self, colors: Vec<Color>) -> Result<()> {
        self.cache.clear();
        if colors.is_empty() {
            self.colors.clear();
            return Err(Error::EmptyScale);
        }
        self.colors = colors;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Distance in index units between the coldest and the
    /// hottest entry; the width used for calibration.
    pub fn span(&self) -> f64 {
        self.colors.len().saturating_sub(1) as f64
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Position of `target` on the scale, memoized.
    pub fn intensity_of(&mut self, target: Color) -> Result<f64> {
        self.intensity_with(target, true)
    }

    /// Position of `target` on the scale. With `use_cache`
    /// false the cache is neither read nor written.
    pub fn intensity_with(&mut self, target: Color, use_cache: bool) -> Result<f64> {
        if use_cache {
            if let Some(&hit) = self.cache.get(&target) {
                return Ok(hit);
            }
        }

        let intensity = self.locate(target)?;
        if use_cache {
            self.cache.insert(target, intensity);
        }
        Ok(intensity)
    }

    fn locate(&self, target: Color) -> Result<f64> {
        if self.colors.is_empty() {
            return Err(Error::EmptyScale);
        }

        // Duplicates resolve to the first entry.
        if let Some(idx) = self.colors.iter().position(|c| *c == target) {
            return Ok(idx as f64);
        }

        let (nearest, nearest_dist) = self
            .colors
            .iter()
            .map(|c| c.distance(&target))
            .enumerate()
            .fold((0, f64::INFINITY), |best, (idx, dist)| {
                if dist < best.1 {
                    (idx, dist)
                } else {
                    best
                }
            });

        // Leftward distances are negated so the sign of the
        // winning neighbour carries the direction.
        let left = match nearest.checked_sub(1) {
            Some(idx) => -self.colors[idx].distance(&target),
            None => MAX_COLOR_DISTANCE,
        };
        let right = match self.colors.get(nearest + 1) {
            Some(c) => c.distance(&target),
            None => MAX_COLOR_DISTANCE,
        };
        let next_closest = if left.abs() < right { left } else { right };

        let ratio = (nearest_dist / next_closest) * 0.5;
        Ok(nearest as f64 + ratio)
    }

    /// Grey level used when rendering an intensity map.
    pub fn grey_of(&self, intensity: f64) -> u8 {
        if self.colors.is_empty() {
            return 0;
        }
        (intensity / self.colors.len() as f64 * 255.).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BLACK: Color = Color::grey(0);
    const DARK_GREY: Color = Color::grey(64);
    const GREY: Color = Color::grey(128);
    const LIGHT_GREY: Color = Color::grey(192);
    const WHITE: Color = Color::grey(255);

    fn greys() -> ColorScale {
        ColorScale::from_colors(vec![BLACK, DARK_GREY, GREY, LIGHT_GREY, WHITE]).unwrap()
    }

    #[test]
    fn exact_entry_maps_to_its_index() {
        let mut scale = greys();
        assert_eq!(scale.intensity_of(BLACK).unwrap(), 0.0);
        assert_eq!(scale.intensity_of(GREY).unwrap(), 2.0);
        assert_eq!(scale.intensity_of(WHITE).unwrap(), 4.0);
    }

    #[test]
    fn halfway_between_entries_interpolates() {
        let mut scale = greys();
        let between = Color::grey(160);
        let v = scale.intensity_of(between).unwrap();
        assert!((v - 2.5).abs() < 1e-12, "got {}", v);
    }

    #[test]
    fn leans_towards_the_closer_neighbour() {
        let mut scale = greys();
        // Just below grey.
        let v = scale.intensity_of(Color::grey(120)).unwrap();
        assert!(v < 2.0 && v > 1.5, "got {}", v);
        // Just above dark grey.
        let v = scale.intensity_of(Color::grey(72)).unwrap();
        assert!(v > 1.0 && v < 1.5, "got {}", v);
    }

    #[test]
    fn monotonic_along_the_gradient() {
        let mut scale = greys();
        let mut last = f64::NEG_INFINITY;
        for level in 0..=255u8 {
            let v = scale.intensity_of(Color::grey(level)).unwrap();
            assert!(v >= last, "level {} went from {} to {}", level, last, v);
            last = v;
        }
    }

    #[test]
    fn cached_value_is_bit_identical() {
        let mut scale = greys();
        let target = Color::new(100, 140, 90, 255);
        let first = scale.intensity_of(target).unwrap();
        assert_eq!(scale.cache_len(), 1);
        let second = scale.intensity_of(target).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(
            first.to_bits(),
            scale.intensity_with(target, false).unwrap().to_bits()
        );
    }

    #[test]
    fn bypassing_cache_leaves_it_untouched() {
        let mut scale = greys();
        scale.intensity_with(Color::grey(10), false).unwrap();
        assert_eq!(scale.cache_len(), 0);
    }

    #[test]
    fn single_entry_scale_stays_near_zero() {
        let mut scale = ColorScale::from_colors(vec![GREY]).unwrap();
        let v = scale.intensity_of(Color::grey(138)).unwrap();
        assert!(v > 0.0 && v < 0.05, "got {}", v);
        assert_eq!(scale.span(), 0.0);
    }

    #[test]
    fn colors_past_the_ends_lean_towards_the_only_neighbour() {
        let mut scale = ColorScale::from_colors(vec![DARK_GREY, GREY, LIGHT_GREY]).unwrap();
        let below = scale.intensity_of(Color::grey(50)).unwrap();
        assert!(below > 0.0 && below < 0.5, "got {}", below);
        let above = scale.intensity_of(Color::grey(210)).unwrap();
        assert!(above < 2.0 && above > 1.5, "got {}", above);
    }

    #[test]
    fn duplicates_resolve_to_first_index() {
        let mut scale = ColorScale::from_colors(vec![BLACK, GREY, GREY, WHITE]).unwrap();
        assert_eq!(scale.intensity_of(GREY).unwrap(), 1.0);
    }

    #[test]
    fn load_replaces_colors_and_clears_cache() {
        let mut scale = greys();
        scale.intensity_of(Color::grey(3)).unwrap();

        let mut legend = RgbaImage::new(3, 2);
        for x in 0..3 {
            legend.put_pixel(x, 1, Rgba([x as u8 * 100, 0, 0, 255]));
        }
        scale.load(&legend, Axis::Row(1), false).unwrap();
        assert_eq!(scale.len(), 3);
        assert_eq!(scale.cache_len(), 0);
        assert_eq!(scale.colors()[2], Color::new(200, 0, 0, 255));

        scale.load(&legend, Axis::Row(1), true).unwrap();
        assert_eq!(scale.colors()[0], Color::new(200, 0, 0, 255));

        scale.load(&legend, Axis::Column(2), false).unwrap();
        assert_eq!(scale.len(), 2);
    }

    #[test]
    fn empty_legend_is_an_error() {
        let mut scale = greys();
        let legend = RgbaImage::new(4, 1);
        assert_eq!(scale.load(&legend, Axis::Row(5), false), Err(Error::EmptyScale));
        assert!(scale.is_empty());
        assert_eq!(scale.intensity_of(BLACK), Err(Error::EmptyScale));
        assert_eq!(ColorScale::from_colors(vec![]).unwrap_err(), Error::EmptyScale);
    }

    #[test]
    fn load_line_walks_diagonals() {
        let mut legend = RgbaImage::new(4, 4);
        for i in 0..4 {
            legend.put_pixel(i, i, Rgba([i as u8, 0, 0, 255]));
        }
        let mut scale = ColorScale::default();
        scale
            .load_line(&legend, Point::new(0, 0), Point::new(4, 4))
            .unwrap();
        assert_eq!(scale.len(), 4);
        assert_eq!(scale.colors()[3], Color::new(3, 0, 0, 255));
    }
}
