// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Execution streams
//!
//! A stream is a unit of device work issued without waiting for it.
//! Independent streams run side by side; the orchestrator joins them
//! explicitly, with `Pending::wait` or `join_all`, before any stage
//! that needs more than one of their results.  Joining is the only
//! place the control thread blocks.  There is no cancellation: once
//! issued, a stream runs to the end.
//!
//! Streams only live inside `Device::with_streams`.  Anything still
//! pending when that closure returns is joined on the way out, so no
//! work can outlive the buffers it borrows.

use crate::device::Device;
use crate::error::{BlendError, Result};
use crossbeam::thread::{Scope, ScopedJoinHandle};
use log::debug;

/// The set of streams open on a device for the duration of one
/// `with_streams` call.
pub struct Streams<'scope, 'env> {
    scope: &'scope Scope<'env>,
}

/// Work that has been issued but not yet joined.
pub struct Pending<'scope, T> {
    label: &'static str,
    handle: ScopedJoinHandle<'scope, Result<T>>,
}

impl Device {
    /// Open a set of streams, run `body`, and join whatever it left
    /// pending.
    pub fn with_streams<'env, F, R>(&self, body: F) -> Result<R>
    where
        F: FnOnce(&Streams<'_, 'env>) -> Result<R>,
    {
        crossbeam::thread::scope(|scope| body(&Streams { scope }))
            .map_err(|_| BlendError::StreamFailed("unjoined"))?
    }
}

impl<'scope, 'env> Streams<'scope, 'env> {
    /// Issue `work` on a fresh stream and return immediately.
    pub fn issue<F, T>(&self, label: &'static str, work: F) -> Pending<'scope, T>
    where
        F: FnOnce() -> Result<T> + Send + 'env,
        T: Send + 'env,
    {
        debug!("issue stream {}", label);
        Pending {
            label,
            handle: self.scope.spawn(move |_| work()),
        }
    }
}

impl<'scope, T> Pending<'scope, T> {
    /// Block until the stream has finished and take its result.
    pub fn wait(self) -> Result<T> {
        let label = self.label;
        let result = self
            .handle
            .join()
            .map_err(|_| BlendError::StreamFailed(label))?;
        debug!("joined stream {}", label);
        result
    }
}

/// Join every stream in order and collect their results.  All streams
/// are joined even if an earlier one failed; the first error wins.
pub fn join_all<T>(pending: Vec<Pending<'_, T>>) -> Result<Vec<T>> {
    let joined: Vec<Result<T>> = pending.into_iter().map(Pending::wait).collect();
    joined.into_iter().collect()
}
