// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Multiband blending
//!
//! Blend two images under a mask by blending their Laplacian pyramids
//! level by level, each level weighted by the mask at the same scale,
//! and collapsing the result.  Coarse levels see a heavily smoothed
//! mask and mix over a wide region; fine levels see a sharp one and
//! mix over a narrow region.  That is what hides the seam.

use crate::device::Device;
use crate::error::{check_same_dimensions, BlendError, Result};
use crate::masks::DEFAULT_OVERLAP;
use crate::plane::{to_normalized, to_samples, ColorPlane, WeightPlane};
use crate::pyramid::{
    build_gaussian_pyramid, build_laplacian_pyramid, reconstruct_from_laplacian_pyramid, Pyramid,
};
use crate::resample::Resampler;
use image::{GrayImage, Luma, Rgb, RgbImage};
use log::{debug, info};

/// Pyramid depth used when the caller does not pick one.
pub const DEFAULT_LEVELS: usize = 5;

/// The knobs a blend run is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendOptions {
    /// Number of pyramid levels, at least one.
    pub levels: usize,
    /// Width in columns of the cosine ramp across the seam.
    pub overlap_width: u32,
}

impl Default for BlendOptions {
    fn default() -> Self {
        BlendOptions {
            levels: DEFAULT_LEVELS,
            overlap_width: DEFAULT_OVERLAP,
        }
    }
}

impl BlendOptions {
    pub fn validate(&self) -> Result<()> {
        if self.levels < 1 {
            return Err(BlendError::InvalidLevels(self.levels));
        }
        Ok(())
    }
}

/// Holds the device and the pyramid depth; one instance can blend any
/// number of image pairs.
#[derive(Debug, Clone)]
pub struct MultibandBlender {
    device: Device,
    levels: usize,
}

impl MultibandBlender {
    pub fn new(device: Device, levels: usize) -> Result<Self> {
        if levels < 1 {
            return Err(BlendError::InvalidLevels(levels));
        }
        Ok(MultibandBlender { device, levels })
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Blend `left` and `right`, taking `mask` as the weight of the
    /// left image (255 is all left, 0 is all right).
    pub fn blend(&self, left: &RgbImage, right: &RgbImage, mask: &GrayImage) -> Result<RgbImage> {
        self.blend_with(left, right, mask, |_, _| {})
    }

    /// As `blend`, but hands every blended pyramid level to `inspect`
    /// before the pyramid is collapsed.
    pub fn blend_with<F>(
        &self,
        left: &RgbImage,
        right: &RgbImage,
        mask: &GrayImage,
        mut inspect: F,
    ) -> Result<RgbImage>
    where
        F: FnMut(usize, &ColorPlane),
    {
        check_same_dimensions(left.dimensions(), right.dimensions())?;
        check_same_dimensions(left.dimensions(), mask.dimensions())?;
        if left.width() == 0 || left.height() == 0 {
            return Err(BlendError::EmptyImage);
        }
        info!(
            "blending {}x{} images over {} levels",
            left.width(),
            left.height(),
            self.levels
        );

        let device = &self.device;
        let levels = self.levels;

        // The three inputs are independent until the combine step.
        let (gauss_left, gauss_right, gauss_mask) = device.with_streams(|streams| {
            let pending_left = streams.issue("left", || {
                build_gaussian_pyramid(device, to_normalized::<_, Rgb<f32>>(left)?, levels)
            });
            let pending_right = streams.issue("right", || {
                build_gaussian_pyramid(device, to_normalized::<_, Rgb<f32>>(right)?, levels)
            });
            let pending_mask = streams.issue("mask", || {
                let weights: WeightPlane = to_normalized(mask)?;
                build_gaussian_pyramid(device, weights, levels)
            });
            Ok((
                pending_left.wait()?,
                pending_right.wait()?,
                pending_mask.wait()?,
            ))
        })?;

        let lap_left = build_laplacian_pyramid(device, &gauss_left)?;
        drop(gauss_left);
        let lap_right = build_laplacian_pyramid(device, &gauss_right)?;
        drop(gauss_right);

        let blended = self.blend_pyramids(&lap_left, &lap_right, &gauss_mask)?;
        for (index, level) in blended.iter().enumerate() {
            inspect(index, level);
        }

        let collapsed = reconstruct_from_laplacian_pyramid(device, blended)?;
        to_samples(&collapsed)
    }

    /// Weighted sum of two Laplacian pyramids, level by level, under a
    /// Gaussian pyramid of weights.  All three must have the same
    /// shape.
    pub fn blend_pyramids(
        &self,
        left: &Pyramid<Rgb<f32>>,
        right: &Pyramid<Rgb<f32>>,
        weights: &Pyramid<Luma<f32>>,
    ) -> Result<Pyramid<Rgb<f32>>> {
        if left.len() != right.len() || left.len() != weights.len() {
            return Err(BlendError::InvalidLevels(weights.len()));
        }
        let levels = left
            .iter()
            .zip(right.iter())
            .zip(weights.iter())
            .enumerate()
            .map(|(index, ((l, r), w))| {
                debug!("combining level {} at {:?}", index, l.dimensions());
                self.combine_level(l, r, w)
            })
            .collect::<Result<Vec<_>>>()?;
        Pyramid::from_levels(levels)
    }

    // left * w + right * (1 - w), with w replicated across channels.
    fn combine_level(&self, left: &ColorPlane, right: &ColorPlane, weight: &WeightPlane) -> Result<ColorPlane> {
        let device = &self.device;
        let weight: ColorPlane = device.merge_channels(&[weight, weight, weight])?;
        let complement = device.scale_offset(&weight, -1.0, 1.0);
        let from_left = device.multiply(left, &weight)?;
        let from_right = device.multiply(right, &complement)?;
        device.add(&from_left, &from_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masks::{cosine_masks, OverlapBand};

    fn blender(levels: usize) -> MultibandBlender {
        MultibandBlender::new(Device::with_workers(2).unwrap(), levels).unwrap()
    }

    fn busy(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 9 + y) as u8, (x ^ y) as u8 * 3, ((x * y) % 251) as u8])
        })
    }

    #[test]
    fn zero_levels_are_rejected() {
        let outcome = MultibandBlender::new(Device::with_workers(1).unwrap(), 0);
        assert!(matches!(outcome, Err(BlendError::InvalidLevels(0))));
    }

    #[test]
    fn options_default_and_validate() {
        let options = BlendOptions::default();
        assert_eq!(options.levels, 5);
        assert_eq!(options.overlap_width, 50);
        assert!(options.validate().is_ok());
        let bad = BlendOptions { levels: 0, ..options };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let image = busy(16, 16);
        let mask = GrayImage::new(16, 15);
        let outcome = blender(3).blend(&image, &image, &mask);
        assert!(matches!(outcome, Err(BlendError::DimensionMismatch { .. })));
    }

    #[test]
    fn output_keeps_the_input_shape() {
        let (left, right) = (busy(45, 31), busy(45, 31));
        let masks = cosine_masks(45, 31, OverlapBand::around(22, 10, 45));
        let out = blender(4).blend(&left, &right, &masks.left).unwrap();
        assert_eq!(out.dimensions(), (45, 31));
    }

    #[test]
    fn full_mask_returns_the_left_image() {
        let (left, right) = (busy(40, 24), RgbImage::from_pixel(40, 24, Rgb([0, 255, 0])));
        let mask = GrayImage::from_pixel(40, 24, Luma([255]));
        let out = blender(4).blend(&left, &right, &mask).unwrap();
        for (a, b) in out.pixels().zip(left.pixels()) {
            for (x, y) in a.0.iter().zip(&b.0) {
                assert!((i16::from(*x) - i16::from(*y)).abs() <= 1);
            }
        }
    }

    #[test]
    fn inspect_sees_every_level() {
        let image = busy(32, 32);
        let mask = GrayImage::from_pixel(32, 32, Luma([128]));
        let mut seen = Vec::new();
        blender(3)
            .blend_with(&image, &image, &mask, |index, level| {
                seen.push((index, level.dimensions()))
            })
            .unwrap();
        assert_eq!(seen, vec![(0, (32, 32)), (1, (16, 16)), (2, (8, 8))]);
    }
}
