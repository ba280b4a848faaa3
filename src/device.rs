// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The compute device
//!
//! Every pixel operation in the pipeline runs "on the device".  Here
//! the device is a pool of worker threads: the output of a primitive
//! is broken up into bands of rows, the bands are pushed onto a shared
//! work queue, and the workers steal bands until the queue is empty.
//! Each band is a disjoint `chunks_mut` slice of the output, so no
//! worker ever touches another's pixels and nothing needs a lock.
//!
//! The capability check lives here too.  It is meant to be called
//! exactly once, at process entry; the rest of the crate is handed a
//! `Device` and never goes looking for hardware on its own.

use crate::error::{BlendError, Result};
use log::info;

#[cfg(feature = "threaded")]
use crossbeam_deque::{Injector, Steal};

// Rows per unit of stolen work.  Small enough that a 256-row pyramid
// level still spreads across a handful of workers.
#[cfg(feature = "threaded")]
const ROWS_PER_BAND: usize = 16;

/// A handle to the compute device.  Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    name: String,
    workers: usize,
}

impl Device {
    /// Probe for a usable device.  Fails with `NoDevice` if there is
    /// nothing to run on; callers are expected to abort the whole run
    /// in that case, there is no slower fallback path.
    pub fn detect() -> Result<Self> {
        let device = Device::with_workers(available_workers())?;
        info!("using device {} ({} workers)", device.name, device.workers);
        Ok(device)
    }

    /// Build a device with an explicit worker count.  Zero workers is
    /// the same as no device at all.
    pub fn with_workers(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(BlendError::NoDevice);
        }
        Ok(Device {
            name: format!("cpu-pool/{}", workers),
            workers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `kernel` once for every row of `data`, where a row is
    /// `row_len` samples long.  The kernel receives the row index and
    /// the row itself, and must fill in the row completely.
    #[cfg(feature = "threaded")]
    pub(crate) fn for_each_row<F>(&self, data: &mut [f32], row_len: usize, kernel: F)
    where
        F: Fn(usize, &mut [f32]) + Sync,
    {
        if row_len == 0 || data.is_empty() {
            return;
        }
        let rows = data.len() / row_len;
        if self.workers == 1 || rows <= ROWS_PER_BAND {
            data.chunks_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| kernel(y, row));
            return;
        }

        let queue = Injector::new();
        data.chunks_mut(row_len * ROWS_PER_BAND)
            .enumerate()
            .for_each(|band| queue.push(band));

        let workers = self.workers.min(rows / ROWS_PER_BAND + 1);
        let outcome = crossbeam::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|_| loop {
                    match queue.steal() {
                        Steal::Success((index, band)) => {
                            let first = index * ROWS_PER_BAND;
                            band.chunks_mut(row_len)
                                .enumerate()
                                .for_each(|(y, row)| kernel(first + y, row));
                        }
                        Steal::Retry => continue,
                        Steal::Empty => break,
                    }
                });
            }
        });

        // A kernel panic is a bug in the kernel; hand it back unchanged.
        if let Err(panic) = outcome {
            std::panic::resume_unwind(panic);
        }
    }

    #[cfg(not(feature = "threaded"))]
    pub(crate) fn for_each_row<F>(&self, data: &mut [f32], row_len: usize, kernel: F)
    where
        F: Fn(usize, &mut [f32]) + Sync,
    {
        if row_len == 0 {
            return;
        }
        data.chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| kernel(y, row));
    }
}

#[cfg(feature = "threaded")]
fn available_workers() -> usize {
    num_cpus::get()
}

#[cfg(not(feature = "threaded"))]
fn available_workers() -> usize {
    1
}
