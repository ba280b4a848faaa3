// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The one error type for the whole pipeline.
//!
//! Nothing in here is retried.  Mismatched sizes and bad level counts
//! are caller mistakes and come back immediately; a missing device or
//! an unreadable file ends the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlendError {
    #[error("image dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch {
        left: (u32, u32),
        right: (u32, u32),
    },

    #[error("expected {expected} channels, got {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("pyramid needs at least one level, got {0}")]
    InvalidLevels(usize),

    #[error("image has no pixels")]
    EmptyImage,

    #[error("no compute device available")]
    NoDevice,

    #[error("stream '{0}' did not run to completion")]
    StreamFailed(&'static str),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BlendError>;

/// Both images must share width and height.
pub(crate) fn check_same_dimensions(left: (u32, u32), right: (u32, u32)) -> Result<()> {
    if left == right {
        Ok(())
    } else {
        Err(BlendError::DimensionMismatch { left, right })
    }
}
