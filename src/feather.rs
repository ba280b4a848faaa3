// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single-band feather blend
//!
//! The baseline the multiband blend is judged against: one weighted
//! average per pixel, no pyramid.  Samples are widened to `i32` so
//! the weighted sums cannot overflow, and the result is divided by
//! the total weight at that pixel.  Pixels where neither mask has any
//! weight come out black and are left out of the confidence mask.

use crate::error::{check_same_dimensions, BlendError, Result};
use crate::masks::MaskPair;
use image::{GrayImage, Luma, Rgb, RgbImage};
use itertools::iproduct;

/// What the reference blend produces.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatherOutput {
    pub image: RgbImage,
    /// 255 wherever some weight contributed, 0 elsewhere.
    pub confidence: GrayImage,
}

pub fn feather_blend(left: &RgbImage, right: &RgbImage, masks: &MaskPair) -> Result<FeatherOutput> {
    check_same_dimensions(left.dimensions(), right.dimensions())?;
    check_same_dimensions(left.dimensions(), masks.left.dimensions())?;
    check_same_dimensions(left.dimensions(), masks.right.dimensions())?;
    let (width, height) = left.dimensions();
    if width == 0 || height == 0 {
        return Err(BlendError::EmptyImage);
    }

    let mut image = RgbImage::new(width, height);
    let mut confidence = GrayImage::new(width, height);
    for (y, x) in iproduct!(0..height, 0..width) {
        let wl = i32::from(masks.left.get_pixel(x, y).0[0]);
        let wr = i32::from(masks.right.get_pixel(x, y).0[0]);
        let total = wl + wr;
        if total == 0 {
            continue;
        }
        let (pl, pr) = (left.get_pixel(x, y), right.get_pixel(x, y));
        let mut out = [0u8; 3];
        for (o, (a, b)) in out.iter_mut().zip(pl.0.iter().zip(&pr.0)) {
            let sum = i32::from(*a) * wl + i32::from(*b) * wr;
            // Round half up; the quotient is always within 0..=255.
            *o = ((sum + total / 2) / total).clamp(0, 255) as u8;
        }
        image.put_pixel(x, y, Rgb(out));
        confidence.put_pixel(x, y, Luma([255]));
    }
    Ok(FeatherOutput { image, confidence })
}

/// Mean absolute per-sample difference between two images of the same
/// size, in 8-bit intensity levels.
pub fn mean_abs_difference(a: &RgbImage, b: &RgbImage) -> Result<f64> {
    check_same_dimensions(a.dimensions(), b.dimensions())?;
    let samples = a.as_raw().len();
    if samples == 0 {
        return Err(BlendError::EmptyImage);
    }
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    Ok(total as f64 / samples as f64)
}
