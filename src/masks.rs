// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Soft seam masks
//!
//! Given a left and a right image of the same size, find where the
//! vertical seam between them should go and build a pair of
//! complementary 8-bit weight masks with a raised-cosine ramp across
//! a band centred on that seam.
//!
//! The seam is placed halfway between the last column of the left
//! image that has any content and the first column of the right image
//! that has any content, "content" meaning a luma value above
//! `NON_BLACK_THRESHOLD`.  Images that are mostly black padding around
//! a photograph therefore seam in the gap between the photographs.

use crate::error::{check_same_dimensions, BlendError, Result};
use image::{imageops, GenericImageView, GrayImage, Luma, Pixel, Primitive};
use itertools::iproduct;
use num_traits::ToPrimitive;
use std::f64::consts::PI;

/// A luma at or below this counts as black.
pub const NON_BLACK_THRESHOLD: u8 = 1;

/// Overlap width used when the caller does not pick one.
pub const DEFAULT_OVERLAP: u32 = 50;

/// The columns `start_col..=end_col` over which the left mask falls
/// from 255 to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapBand {
    pub start_col: u32,
    pub end_col: u32,
}

impl OverlapBand {
    /// A band `overlap_width` wide centred on `center`, clipped to an
    /// image `width` columns wide.
    pub fn around(center: u32, overlap_width: u32, width: u32) -> Self {
        let half = overlap_width / 2;
        let last = width.saturating_sub(1);
        OverlapBand {
            start_col: center.saturating_sub(half).min(last),
            end_col: center.saturating_add(half).min(last),
        }
    }

    /// Width of the ramp, never zero.
    pub fn span(&self) -> u32 {
        (self.end_col - self.start_col).max(1)
    }

    /// Left-mask weight for column `x`.
    pub fn weight_at(&self, x: u32) -> u8 {
        if x < self.start_col {
            255
        } else if x > self.end_col {
            0
        } else {
            let progress = f64::from(x - self.start_col) / f64::from(self.span());
            let weight = 0.5 + 0.5 * (PI * progress).cos();
            (255.0 * weight).round().max(0.0).min(255.0).to_u8().unwrap_or(0)
        }
    }
}

/// Complementary masks: `left[p] + right[p] == 255` everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskPair {
    pub left: GrayImage,
    pub right: GrayImage,
}

#[inline]
fn luma_of<P, S>(p: &P) -> f64
where
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    p.to_luma().0[0].to_f64().unwrap_or(0.0)
}

fn column_has_content<I, P, S>(image: &I, x: u32) -> bool
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    let threshold = f64::from(NON_BLACK_THRESHOLD);
    (0..image.height()).any(|y| luma_of(&image.get_pixel(x, y)) > threshold)
}

/// Find the seam column between two images of the same size.  Falls
/// back to the middle column if either image is black all the way
/// through.
pub fn find_seam_center<I, P, S>(left: &I, right: &I) -> Result<u32>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    check_same_dimensions(left.dimensions(), right.dimensions())?;
    let width = left.width();
    if width == 0 || left.height() == 0 {
        return Err(BlendError::EmptyImage);
    }

    let left_edge = (0..width).rev().find(|&x| column_has_content(left, x));
    let right_edge = (0..width).find(|&x| column_has_content(right, x));

    Ok(match (left_edge, right_edge) {
        (Some(l), Some(r)) => (l + r) / 2,
        _ => width / 2,
    })
}

/// Fill a mask pair for an image of the given size from a band.  The
/// right mask is the inverse of the left, never computed on its own.
pub fn cosine_masks(width: u32, height: u32, band: OverlapBand) -> MaskPair {
    let mut left = GrayImage::new(width, height);
    let profile: Vec<u8> = (0..width).map(|x| band.weight_at(x)).collect();
    for (y, x) in iproduct!(0..height, 0..width) {
        left.put_pixel(x, y, Luma([profile[x as usize]]));
    }

    let mut right = left.clone();
    imageops::invert(&mut right);
    MaskPair { left, right }
}

/// Locate the seam between two images and build soft masks with an
/// `overlap_width`-column cosine ramp across it.
pub fn make_soft_masks<I, P, S>(left: &I, right: &I, overlap_width: u32) -> Result<MaskPair>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    let center = find_seam_center(left, right)?;
    let (width, height) = left.dimensions();
    let band = OverlapBand::around(center, overlap_width, width);
    log::debug!(
        "seam at column {}, band {}..={}",
        center,
        band.start_col,
        band.end_col
    );
    Ok(cosine_masks(width, height, band))
}
