// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Image I/O and diagnostic dumps
//!
//! Loading and saving go through the `image` crate; every failure is
//! reported with the path that caused it.  Pyramid levels are dumped
//! for inspection by stretching each level's own range onto 0..=255,
//! since Laplacian levels are mostly small and often negative.

use crate::error::{BlendError, Result};
use crate::plane::{saturate_u8, ColorPlane};
use image::{ImageBuffer, Pixel, RgbImage};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Load an image and convert it to 8-bit RGB.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();
    image::open(path)
        .map(|image| image.to_rgb8())
        .map_err(|source| BlendError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Save an 8-bit image; the format follows the file extension.
pub fn save<Px, P>(image: &ImageBuffer<Px, Vec<u8>>, path: P) -> Result<()>
where
    Px: Pixel<Subpixel = u8> + image::PixelWithColorType,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    debug!("writing {}", path.display());
    image.save(path).map_err(|source| BlendError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Create `dir` and any missing parents.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| BlendError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(dir.to_path_buf())
}

/// Map a plane's smallest sample to 0 and its largest to 255.  A flat
/// plane maps to black.
pub fn level_to_image(level: &ColorPlane) -> RgbImage {
    let (lo, hi) = level
        .as_raw()
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let range = hi - lo;
    let (width, height) = level.dimensions();
    let samples = level
        .as_raw()
        .iter()
        .map(|v| {
            if range > 0.0 {
                saturate_u8((v - lo) / range * 255.0)
            } else {
                0
            }
        })
        .collect();
    ImageBuffer::from_raw(width, height, samples).unwrap_or_else(|| RgbImage::new(width, height))
}

/// Write one pyramid level as `<dir>/<stage>_level<index>.png`.
pub fn dump_level(dir: &Path, stage: &str, index: usize, level: &ColorPlane) -> Result<PathBuf> {
    let path = dir.join(format!("{}_level{}.png", stage, index));
    save(&level_to_image(level), &path)?;
    Ok(path)
}
