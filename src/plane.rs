// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Planes: the arithmetic form of an image
//!
//! Stored images are 8-bit.  All pyramid arithmetic happens on `f32`
//! samples normalised to [0, 1], held in an ordinary `ImageBuffer`
//! so the `image` crate's pixel types keep track of channel counts.
//! Laplacian residuals go negative; nothing here clamps except the
//! trip back to 8 bits.

use crate::error::{BlendError, Result};
use image::{ImageBuffer, Luma, Pixel, Rgb};
use num_traits::ToPrimitive;

/// An image with `f32` samples.
pub type Plane<P> = ImageBuffer<P, Vec<f32>>;

/// Three-channel arithmetic image.
pub type ColorPlane = Plane<Rgb<f32>>;

/// Single-channel arithmetic image, used for blend weights.
pub type WeightPlane = Plane<Luma<f32>>;

const SAMPLE_MAX: f32 = 255.0;

#[inline]
pub(crate) fn channels<P: Pixel>() -> usize {
    P::CHANNEL_COUNT as usize
}

fn check_channels<A: Pixel, B: Pixel>() -> Result<()> {
    if channels::<A>() == channels::<B>() {
        Ok(())
    } else {
        Err(BlendError::ChannelMismatch {
            expected: channels::<B>(),
            found: channels::<A>(),
        })
    }
}

/// 8-bit samples to normalised `f32` samples (divide by 255).  The
/// source and target pixel types must agree on channel count.
pub fn to_normalized<A, B>(image: &ImageBuffer<A, Vec<u8>>) -> Result<Plane<B>>
where
    A: Pixel<Subpixel = u8>,
    B: Pixel<Subpixel = f32>,
{
    check_channels::<A, B>()?;
    let (width, height) = image.dimensions();
    let samples = image
        .as_raw()
        .iter()
        .map(|s| s.to_f32().unwrap_or(0.0) / SAMPLE_MAX)
        .collect();
    ImageBuffer::from_raw(width, height, samples).ok_or(BlendError::EmptyImage)
}

/// Normalised `f32` samples back to 8 bits: multiply by 255, round,
/// saturate.
pub fn to_samples<A, B>(plane: &Plane<A>) -> Result<ImageBuffer<B, Vec<u8>>>
where
    A: Pixel<Subpixel = f32>,
    B: Pixel<Subpixel = u8>,
{
    check_channels::<A, B>()?;
    let (width, height) = plane.dimensions();
    let samples = plane.as_raw().iter().map(|v| saturate_u8(v * SAMPLE_MAX)).collect();
    ImageBuffer::from_raw(width, height, samples).ok_or(BlendError::EmptyImage)
}

/// Round to nearest and clamp into `u8`.  NaN maps to zero.
#[inline]
pub fn saturate_u8(v: f32) -> u8 {
    v.round().max(0.0).min(SAMPLE_MAX).to_u8().unwrap_or(0)
}
