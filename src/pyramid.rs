// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gaussian and Laplacian pyramids
//!
//! Level 0 is full resolution; every level after it is the previous
//! level smoothed and halved.  A Laplacian level is what a Gaussian
//! level has that the next, coarser one cannot reproduce: the
//! difference between the level and its coarser neighbour doubled
//! back up.  The coarsest Laplacian level is the coarsest Gaussian
//! level itself, which is what makes the decomposition invertible.
//!
//! Halving rounds odd sizes up, so doubling a coarser level can come
//! back one pixel too large.  Whenever that happens the doubled level
//! is resized to the exact size of its finer neighbour with linear
//! interpolation before the two are combined.

use crate::device::Device;
use crate::error::{BlendError, Result};
use crate::plane::Plane;
use crate::resample::{Interpolation, Resampler};
use crate::stream::join_all;
use image::Pixel;
use log::debug;
use std::ops::Index;

/// An ordered stack of planes, finest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Pyramid<P: Pixel<Subpixel = f32>> {
    levels: Vec<Plane<P>>,
}

impl<P: Pixel<Subpixel = f32>> Pyramid<P> {
    /// Wrap an existing stack of levels.  A pyramid is never empty.
    pub fn from_levels(levels: Vec<Plane<P>>) -> Result<Self> {
        if levels.is_empty() {
            return Err(BlendError::InvalidLevels(0));
        }
        Ok(Pyramid { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[Plane<P>] {
        &self.levels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Plane<P>> {
        self.levels.iter()
    }

    pub fn into_levels(self) -> Vec<Plane<P>> {
        self.levels
    }
}

impl<P: Pixel<Subpixel = f32>> Index<usize> for Pyramid<P> {
    type Output = Plane<P>;

    fn index(&self, level: usize) -> &Plane<P> {
        &self.levels[level]
    }
}

// Double `coarse` and make sure it comes out at `(width, height)`.
fn expand_to<P>(device: &Device, coarse: &Plane<P>, (width, height): (u32, u32)) -> Plane<P>
where
    P: Pixel<Subpixel = f32>,
{
    let up = device.pyr_up(coarse);
    if up.dimensions() == (width, height) {
        up
    } else {
        debug!(
            "resizing expanded level {:?} to {:?}",
            up.dimensions(),
            (width, height)
        );
        device.resize_to(&up, width, height, Interpolation::Linear)
    }
}

/// Build a Gaussian pyramid with exactly `levels` levels.  The image
/// becomes level 0 as is.
pub fn build_gaussian_pyramid<P>(device: &Device, image: Plane<P>, levels: usize) -> Result<Pyramid<P>>
where
    P: Pixel<Subpixel = f32>,
{
    if levels < 1 {
        return Err(BlendError::InvalidLevels(levels));
    }
    let mut stack = Vec::with_capacity(levels);
    stack.push(image);
    while stack.len() < levels {
        let next = device.pyr_down(&stack[stack.len() - 1]);
        debug!("gaussian level {} is {:?}", stack.len(), next.dimensions());
        stack.push(next);
    }
    Pyramid::from_levels(stack)
}

/// Derive the Laplacian pyramid of a Gaussian pyramid.  Every level
/// but the last only reads two Gaussian levels, so each one is issued
/// on its own stream and all of them are joined before returning.
pub fn build_laplacian_pyramid<P>(device: &Device, gaussian: &Pyramid<P>) -> Result<Pyramid<P>>
where
    P: Pixel<Subpixel = f32> + Send + Sync,
{
    let levels = gaussian.levels();
    let coarsest = levels.len() - 1;

    let mut residuals = device.with_streams(|streams| {
        let pending = levels
            .windows(2)
            .map(|pair| {
                let (fine, coarse) = (&pair[0], &pair[1]);
                streams.issue("laplacian-level", move || {
                    let expanded = expand_to(device, coarse, fine.dimensions());
                    device.subtract(fine, &expanded)
                })
            })
            .collect();
        join_all(pending)
    })?;

    residuals.push(levels[coarsest].clone());
    Pyramid::from_levels(residuals)
}

/// Collapse a Laplacian pyramid back into a single plane.  Each step
/// needs the one before it, so this runs level by level on the
/// calling thread; the running accumulator is consumed and replaced
/// at every step.
pub fn reconstruct_from_laplacian_pyramid<P>(device: &Device, laplacian: Pyramid<P>) -> Result<Plane<P>>
where
    P: Pixel<Subpixel = f32>,
{
    let mut levels = laplacian.into_levels();
    let mut accumulator = match levels.pop() {
        Some(coarsest) => coarsest,
        None => return Err(BlendError::InvalidLevels(0)),
    };
    while let Some(residual) = levels.pop() {
        let expanded = expand_to(device, &accumulator, residual.dimensions());
        accumulator = device.add(&expanded, &residual)?;
    }
    Ok(accumulator)
}
