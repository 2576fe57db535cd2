//! Whole image rendering through a [`ColorScale`].
use image::{GrayImage, Luma, RgbaImage};
use itertools::iproduct;
use ndarray::Array2;

use crate::{error::Result, scale::ColorScale};

/// Legend intensity of every pixel, indexed `(row, col)`.
pub fn intensity_map(scale: &mut ColorScale, image: &RgbaImage) -> Result<Array2<f64>> {
    let (wid, ht) = image.dimensions();
    let mut map = Array2::zeros((ht as usize, wid as usize));
    for (row, col) in iproduct!(0..ht, 0..wid) {
        let color = (*image.get_pixel(col, row)).into();
        map[(row as usize, col as usize)] = scale.intensity_of(color)?;
    }
    Ok(map)
}

/// Grey levels of an [`intensity_map`]; coldest is black.
pub fn to_greyscale(scale: &ColorScale, map: &Array2<f64>) -> GrayImage {
    let (ht, wid) = map.dim();
    GrayImage::from_fn(wid as u32, ht as u32, |col, row| {
        Luma([scale.grey_of(map[(row as usize, col as usize)])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use image::Rgba;

    #[test]
    fn map_follows_legend_positions() {
        let mut scale = ColorScale::from_colors(
            [0u8, 85, 170, 255].iter().map(|&l| Color::grey(l)).collect(),
        )
        .unwrap();

        let mut image = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]));
        image.put_pixel(2, 0, Rgba([255, 255, 255, 255]));
        image.put_pixel(1, 1, Rgba([170, 170, 170, 255]));

        let map = intensity_map(&mut scale, &image).unwrap();
        assert_eq!(map.dim(), (2, 3));
        assert_eq!(map[(0, 2)], 3.);
        assert_eq!(map[(1, 1)], 2.);
        assert_eq!(map[(1, 0)], 0.);
        // One entry per distinct color.
        assert_eq!(scale.cache_len(), 3);

        let grey = to_greyscale(&scale, &map);
        assert_eq!(grey.dimensions(), (3, 2));
        assert_eq!(grey.get_pixel(0, 0).0[0], 0);
        // 3 of 4 legend positions.
        assert_eq!(grey.get_pixel(2, 0).0[0], 191);
        assert_eq!(grey.get_pixel(1, 1).0[0], 128);
    }
}
