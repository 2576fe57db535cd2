//! Disk shaped sampling regions.
use std::collections::HashMap;

use image::RgbaImage;

use crate::{
    color::{Color, Point},
    error::{Error, Result},
};

/// Offsets of every pixel within `radius` of the origin
/// (inclusive). Built once, translated to any center.
#[derive(Debug, Clone, PartialEq)]
pub struct Disk {
    radius: u32,
    offsets: Vec<Point>,
}

impl Disk {
    pub fn new(radius: u32) -> Self {
        let r = radius as i64;
        let r_sq = r * r;
        let offsets = itertools::iproduct!(-r..=r, -r..=r)
            .filter(|&(dy, dx)| dx * dx + dy * dy <= r_sq)
            .map(|(dy, dx)| Point::new(dx, dy))
            .collect();
        Disk { radius, offsets }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn offsets(&self) -> &[Point] {
        &self.offsets
    }

    /// Translate the disk to `center`, dropping points
    /// outside `[0, width) x [0, height)`. The result is empty
    /// when the disk misses the image entirely.
    pub fn clip(&self, center: Point, width: u32, height: u32) -> Vec<Point> {
        self.offsets
            .iter()
            .map(|&o| center.offset(o))
            .filter(|p| p.within(width, height))
            .collect()
    }
}

/// Keeps one [`Disk`] per radius so repeated regions reuse
/// the same template across frames.
#[derive(Debug, Default)]
pub struct RegionSampler {
    disks: HashMap<u32, Disk>,
}

impl RegionSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disk(&mut self, radius: u32) -> &Disk {
        self.disks
            .entry(radius)
            .or_insert_with(|| Disk::new(radius))
    }

    /// In-bounds pixels of the disk of `radius` at `center`.
    pub fn region(&mut self, center: Point, radius: u32, width: u32, height: u32) -> Vec<Point> {
        self.disk(radius).clip(center, width, height)
    }
}

/// Mean of `value_fn` over the pixels at `points`.
///
/// Points off the image are ignored. Fails with
/// [`Error::EmptyRegion`] when no pixel contributes, and with
/// the first error `value_fn` returns.
pub fn average_value<F>(image: &RgbaImage, points: &[Point], mut value_fn: F) -> Result<f64>
where
    F: FnMut(Color) -> Result<f64>,
{
    let (width, height) = image.dimensions();
    let mut sum = 0.;
    let mut count = 0usize;
    for p in points.iter().filter(|p| p.within(width, height)) {
        sum += value_fn((*image.get_pixel(p.x as u32, p.y as u32)).into())?;
        count += 1;
    }

    if count == 0 {
        return Err(Error::EmptyRegion);
    }
    Ok(sum / count as f64)
}
