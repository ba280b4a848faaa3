// #![deny(missing_docs)]

//! Multiband seam blending.
//!
//! Two overlapping images are joined along a vertical seam.  The seam
//! and a pair of soft masks come from `masks`; the blend itself
//! decomposes both images and the mask into pyramids, mixes them one
//! frequency band at a time, and collapses the result.

pub mod error;
pub use error::{BlendError, Result};

pub mod device;
pub use device::Device;

pub mod stream;
pub use stream::{join_all, Pending, Streams};

pub mod plane;
pub use plane::{to_normalized, to_samples, ColorPlane, Plane, WeightPlane};

pub mod resample;
pub use resample::{Interpolation, Resampler};

pub mod masks;
pub use masks::{find_seam_center, make_soft_masks, MaskPair, OverlapBand};

pub mod pyramid;
pub use pyramid::{
    build_gaussian_pyramid, build_laplacian_pyramid, reconstruct_from_laplacian_pyramid, Pyramid,
};

pub mod blender;
pub use blender::{BlendOptions, MultibandBlender};

pub mod feather;
pub use feather::{feather_blend, mean_abs_difference, FeatherOutput};

pub mod dump;
