// SPDX-License-Identifier: MPL-2.0

//! Shared async runtime for background network work.
//!
//! Photo downloads and other fire-and-forget fetches all run on one Tokio
//! runtime instead of paying for a fresh runtime per request.

use once_cell::sync::Lazy;
use std::future::Future;
use tokio::runtime::Runtime;

/// Two workers are plenty for I/O-bound traffic.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("chronomap-io")
        .build()
        .expect("failed to create async runtime")
});

/// Run a future to completion on the shared runtime, blocking the caller.
#[allow(dead_code)]
pub fn block_on<F: Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}

/// Spawn a future on the shared runtime without blocking.
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    RUNTIME.spawn(future)
}
