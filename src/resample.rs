// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Resampling primitives
//!
//! The handful of image operations the pyramid code is built from:
//! smoothed halving, smoothed doubling, resizing to an exact size,
//! elementwise arithmetic and channel merging.  They are expressed as
//! a trait so the pyramid and blend code only ever talk to "the
//! device", and the device decides how the pixels get computed.
//!
//! Smoothing is the 5-tap binomial kernel [1 4 6 4 1] in both
//! directions.  Borders reflect without repeating the edge pixel
//! (`dcb|abcd|cba`).  Halving keeps the even pixels and rounds odd
//! sizes up; doubling inserts zero rows and columns and smooths with
//! four times the kernel to keep the brightness.  A constant image
//! therefore survives both directions unchanged, borders included.

use crate::device::Device;
use crate::error::{check_same_dimensions, BlendError, Result};
use crate::plane::{channels, Plane, WeightPlane};
use image::{ImageBuffer, Pixel};

const BINOMIAL: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
const BINOMIAL_NORM_DOWN: f32 = 256.0;
const BINOMIAL_NORM_UP: f32 = 64.0;

/// Kernel used by `resize_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Linear,
}

/// The operations the rest of the crate needs from a device.
pub trait Resampler: Sync {
    /// Smooth, then keep every other row and column.  Odd sizes round
    /// up: `(w, h) -> ((w + 1) / 2, (h + 1) / 2)`.
    fn pyr_down<P: Pixel<Subpixel = f32>>(&self, src: &Plane<P>) -> Plane<P>;

    /// Double both dimensions and smooth: `(w, h) -> (2w, 2h)`.
    fn pyr_up<P: Pixel<Subpixel = f32>>(&self, src: &Plane<P>) -> Plane<P>;

    /// Resample to exactly `width` x `height`.
    fn resize_to<P: Pixel<Subpixel = f32>>(
        &self,
        src: &Plane<P>,
        width: u32,
        height: u32,
        interpolation: Interpolation,
    ) -> Plane<P>;

    fn add<P: Pixel<Subpixel = f32>>(&self, a: &Plane<P>, b: &Plane<P>) -> Result<Plane<P>>;

    fn subtract<P: Pixel<Subpixel = f32>>(&self, a: &Plane<P>, b: &Plane<P>) -> Result<Plane<P>>;

    fn multiply<P: Pixel<Subpixel = f32>>(&self, a: &Plane<P>, b: &Plane<P>) -> Result<Plane<P>>;

    /// `v * scale + offset` for every sample.
    fn scale_offset<P: Pixel<Subpixel = f32>>(&self, src: &Plane<P>, scale: f32, offset: f32)
        -> Plane<P>;

    /// Interleave single-channel planes into one multi-channel plane.
    /// Exactly one input plane per output channel.
    fn merge_channels<P: Pixel<Subpixel = f32>>(&self, planes: &[&WeightPlane]) -> Result<Plane<P>>;
}

// Reflect an index back into [0, n) without repeating the edge.
#[inline]
fn reflect101(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

// Source index and weight of the second tap, for every output
// coordinate along one axis.
fn linear_taps(src_len: u32, dst_len: u32) -> Vec<(usize, usize, f32)> {
    let last = src_len as usize - 1;
    let ratio = src_len as f32 / dst_len as f32;
    (0..dst_len)
        .map(|d| {
            let s = ((d as f32 + 0.5) * ratio - 0.5).max(0.0);
            let s0 = (s.floor() as usize).min(last);
            let s1 = (s0 + 1).min(last);
            (s0, s1, s - s0 as f32)
        })
        .collect()
}

fn nearest_taps(src_len: u32, dst_len: u32) -> Vec<usize> {
    let last = src_len as usize - 1;
    let ratio = src_len as f32 / dst_len as f32;
    (0..dst_len)
        .map(|d| (((d as f32 + 0.5) * ratio).floor() as usize).min(last))
        .collect()
}

impl Device {
    fn zip_with<P, F>(&self, a: &Plane<P>, b: &Plane<P>, op: F) -> Result<Plane<P>>
    where
        P: Pixel<Subpixel = f32>,
        F: Fn(f32, f32) -> f32 + Sync,
    {
        check_same_dimensions(a.dimensions(), b.dimensions())?;
        let (width, height) = a.dimensions();
        let row_len = width as usize * channels::<P>();
        let (left, right) = (a.as_raw(), b.as_raw());
        let mut out: Plane<P> = ImageBuffer::new(width, height);
        self.for_each_row(&mut out, row_len, |y, row| {
            let start = y * row_len;
            let pairs = left[start..start + row_len]
                .iter()
                .zip(&right[start..start + row_len]);
            for (o, (l, r)) in row.iter_mut().zip(pairs) {
                *o = op(*l, *r);
            }
        });
        Ok(out)
    }
}

impl Resampler for Device {
    fn pyr_down<P: Pixel<Subpixel = f32>>(&self, src: &Plane<P>) -> Plane<P> {
        let (width, height) = src.dimensions();
        let (dw, dh) = ((width + 1) / 2, (height + 1) / 2);
        let c = channels::<P>();
        let (w, h) = (width as usize, height as usize);
        let data = src.as_raw();

        let mut out: Plane<P> = ImageBuffer::new(dw, dh);
        self.for_each_row(&mut out, dw as usize * c, |dy, row| {
            let sy = 2 * dy as isize;
            for (dx, px) in row.chunks_mut(c).enumerate() {
                let sx = 2 * dx as isize;
                for (ky, wy) in BINOMIAL.iter().enumerate() {
                    let yy = reflect101(sy + ky as isize - 2, h);
                    for (kx, wx) in BINOMIAL.iter().enumerate() {
                        let xx = reflect101(sx + kx as isize - 2, w);
                        let base = (yy * w + xx) * c;
                        let weight = wy * wx / BINOMIAL_NORM_DOWN;
                        for (o, s) in px.iter_mut().zip(&data[base..base + c]) {
                            *o += weight * s;
                        }
                    }
                }
            }
        });
        out
    }

    fn pyr_up<P: Pixel<Subpixel = f32>>(&self, src: &Plane<P>) -> Plane<P> {
        let (width, height) = src.dimensions();
        let (uw, uh) = (width * 2, height * 2);
        let c = channels::<P>();
        let w = width as usize;
        let data = src.as_raw();

        let mut out: Plane<P> = ImageBuffer::new(uw, uh);
        self.for_each_row(&mut out, uw as usize * c, |oy, row| {
            for (ox, px) in row.chunks_mut(c).enumerate() {
                for (ky, wy) in BINOMIAL.iter().enumerate() {
                    // Odd rows of the zero-stuffed image contribute nothing.
                    let zy = reflect101(oy as isize + ky as isize - 2, uh as usize);
                    if zy % 2 == 1 {
                        continue;
                    }
                    for (kx, wx) in BINOMIAL.iter().enumerate() {
                        let zx = reflect101(ox as isize + kx as isize - 2, uw as usize);
                        if zx % 2 == 1 {
                            continue;
                        }
                        let base = ((zy / 2) * w + zx / 2) * c;
                        let weight = wy * wx / BINOMIAL_NORM_UP;
                        for (o, s) in px.iter_mut().zip(&data[base..base + c]) {
                            *o += weight * s;
                        }
                    }
                }
            }
        });
        out
    }

    fn resize_to<P: Pixel<Subpixel = f32>>(
        &self,
        src: &Plane<P>,
        width: u32,
        height: u32,
        interpolation: Interpolation,
    ) -> Plane<P> {
        let (sw, sh) = src.dimensions();
        if (sw, sh) == (width, height) {
            return src.clone();
        }
        let mut out: Plane<P> = ImageBuffer::new(width, height);
        if sw == 0 || sh == 0 || width == 0 || height == 0 {
            return out;
        }

        let c = channels::<P>();
        let stride = sw as usize * c;
        let data = src.as_raw();

        match interpolation {
            Interpolation::Nearest => {
                let xs = nearest_taps(sw, width);
                let ys = nearest_taps(sh, height);
                self.for_each_row(&mut out, width as usize * c, |y, row| {
                    let src_row = &data[ys[y] * stride..(ys[y] + 1) * stride];
                    for (px, sx) in row.chunks_mut(c).zip(&xs) {
                        px.copy_from_slice(&src_row[sx * c..(sx + 1) * c]);
                    }
                });
            }
            Interpolation::Linear => {
                let xs = linear_taps(sw, width);
                let ys = linear_taps(sh, height);
                self.for_each_row(&mut out, width as usize * c, |y, row| {
                    let (y0, y1, fy) = ys[y];
                    let (top, bottom) = (&data[y0 * stride..], &data[y1 * stride..]);
                    for (px, (x0, x1, fx)) in row.chunks_mut(c).zip(&xs) {
                        for (k, o) in px.iter_mut().enumerate() {
                            let upper = top[x0 * c + k] * (1.0 - fx) + top[x1 * c + k] * fx;
                            let lower = bottom[x0 * c + k] * (1.0 - fx) + bottom[x1 * c + k] * fx;
                            *o = upper * (1.0 - fy) + lower * fy;
                        }
                    }
                });
            }
        }
        out
    }

    fn add<P: Pixel<Subpixel = f32>>(&self, a: &Plane<P>, b: &Plane<P>) -> Result<Plane<P>> {
        self.zip_with(a, b, |l, r| l + r)
    }

    fn subtract<P: Pixel<Subpixel = f32>>(&self, a: &Plane<P>, b: &Plane<P>) -> Result<Plane<P>> {
        self.zip_with(a, b, |l, r| l - r)
    }

    fn multiply<P: Pixel<Subpixel = f32>>(&self, a: &Plane<P>, b: &Plane<P>) -> Result<Plane<P>> {
        self.zip_with(a, b, |l, r| l * r)
    }

    fn scale_offset<P: Pixel<Subpixel = f32>>(
        &self,
        src: &Plane<P>,
        scale: f32,
        offset: f32,
    ) -> Plane<P> {
        let (width, height) = src.dimensions();
        let row_len = width as usize * channels::<P>();
        let data = src.as_raw();
        let mut out: Plane<P> = ImageBuffer::new(width, height);
        self.for_each_row(&mut out, row_len, |y, row| {
            let start = y * row_len;
            for (o, s) in row.iter_mut().zip(&data[start..start + row_len]) {
                *o = s * scale + offset;
            }
        });
        out
    }

    fn merge_channels<P: Pixel<Subpixel = f32>>(&self, planes: &[&WeightPlane]) -> Result<Plane<P>> {
        let c = channels::<P>();
        if planes.len() != c {
            return Err(BlendError::ChannelMismatch {
                expected: c,
                found: planes.len(),
            });
        }
        let (width, height) = planes[0].dimensions();
        for plane in &planes[1..] {
            check_same_dimensions((width, height), plane.dimensions())?;
        }

        let w = width as usize;
        let mut out: Plane<P> = ImageBuffer::new(width, height);
        self.for_each_row(&mut out, w * c, |y, row| {
            for (x, px) in row.chunks_mut(c).enumerate() {
                for (o, plane) in px.iter_mut().zip(planes) {
                    *o = plane.as_raw()[y * w + x];
                }
            }
        });
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::ColorPlane;
    use image::{Luma, Rgb};

    fn device() -> Device {
        Device::with_workers(2).unwrap()
    }

    fn ramp(width: u32, height: u32) -> WeightPlane {
        ImageBuffer::from_fn(width, height, |x, y| Luma([(x + 3 * y) as f32 / 100.0]))
    }

    #[test]
    fn reflection_skips_the_edge_pixel() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(-2, 2), 0);
        assert_eq!(reflect101(3, 1), 0);
    }

    #[test]
    fn halving_rounds_odd_sizes_up() {
        let down = device().pyr_down(&ramp(9, 5));
        assert_eq!(down.dimensions(), (5, 3));
        let down = device().pyr_down(&ramp(1, 1));
        assert_eq!(down.dimensions(), (1, 1));
    }

    #[test]
    fn doubling_doubles() {
        let up = device().pyr_up(&ramp(5, 3));
        assert_eq!(up.dimensions(), (10, 6));
    }

    #[test]
    fn constants_survive_both_directions() {
        let flat: ColorPlane = ImageBuffer::from_pixel(13, 7, Rgb([0.25, 0.5, 1.0]));
        let d = device();
        for plane in [d.pyr_down(&flat), d.pyr_up(&flat)] {
            for px in plane.pixels() {
                for (got, want) in px.0.iter().zip(&[0.25, 0.5, 1.0]) {
                    assert!((got - want).abs() < 1e-6, "{} != {}", got, want);
                }
            }
        }
    }

    #[test]
    fn halving_smooths_a_spike() {
        let mut spike: WeightPlane = ImageBuffer::new(8, 8);
        spike.put_pixel(4, 4, Luma([1.0]));
        let down = device().pyr_down(&spike);
        assert!((down.get_pixel(2, 2).0[0] - 36.0 / 256.0).abs() < 1e-6);
        assert!((down.get_pixel(1, 2).0[0] - 6.0 / 256.0).abs() < 1e-6);
        let total: f32 = down.as_raw().iter().sum();
        assert!((total - 0.25).abs() < 1e-6);
    }

    #[test]
    fn linear_resize_to_same_size_is_identity() {
        let src = ramp(6, 4);
        let out = device().resize_to(&src, 6, 4, Interpolation::Linear);
        assert_eq!(out, src);
    }

    #[test]
    fn linear_resize_keeps_corners_and_interpolates_between() {
        let src: WeightPlane = ImageBuffer::from_fn(2, 1, |x, _| Luma([x as f32]));
        let out = device().resize_to(&src, 4, 1, Interpolation::Linear);
        let row: Vec<f32> = out.as_raw().clone();
        assert_eq!(row[0], 0.0);
        assert!((row[1] - 0.25).abs() < 1e-6);
        assert!((row[2] - 0.75).abs() < 1e-6);
        assert_eq!(row[3], 1.0);
    }

    #[test]
    fn nearest_resize_picks_source_pixels() {
        let src: WeightPlane = ImageBuffer::from_fn(3, 1, |x, _| Luma([x as f32]));
        let out = device().resize_to(&src, 6, 2, Interpolation::Nearest);
        assert_eq!(out.as_raw(), &vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn arithmetic_is_elementwise() {
        let d = device();
        let a = ramp(4, 3);
        let b: WeightPlane = ImageBuffer::from_pixel(4, 3, Luma([0.5]));
        let sum = d.add(&a, &b).unwrap();
        let diff = d.subtract(&sum, &b).unwrap();
        let prod = d.multiply(&a, &b).unwrap();
        for ((x, y, p), q) in a.enumerate_pixels().zip(prod.pixels()) {
            assert!((diff.get_pixel(x, y).0[0] - p.0[0]).abs() < 1e-6);
            assert!((q.0[0] - p.0[0] * 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn arithmetic_rejects_mismatched_sizes() {
        let outcome = device().add(&ramp(4, 3), &ramp(3, 4));
        assert!(matches!(outcome, Err(BlendError::DimensionMismatch { .. })));
    }

    #[test]
    fn scale_offset_complements_weights() {
        let w: WeightPlane = ImageBuffer::from_raw(3, 1, vec![0.0, 0.25, 1.0]).unwrap();
        let inv = device().scale_offset(&w, -1.0, 1.0);
        assert_eq!(inv.as_raw(), &vec![1.0, 0.75, 0.0]);
    }

    #[test]
    fn merging_replicates_a_weight_across_channels() {
        let w = ramp(3, 2);
        let merged: ColorPlane = device().merge_channels(&[&w, &w, &w]).unwrap();
        for (x, y, px) in merged.enumerate_pixels() {
            let v = w.get_pixel(x, y).0[0];
            assert_eq!(px.0, [v, v, v]);
        }
    }

    #[test]
    fn merging_needs_one_plane_per_channel() {
        let w = ramp(3, 2);
        let outcome: Result<ColorPlane> = device().merge_channels(&[&w, &w]);
        assert!(matches!(
            outcome,
            Err(BlendError::ChannelMismatch {
                expected: 3,
                found: 2
            })
        ));
    }
}
