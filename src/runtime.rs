//! The runtime behind [`crate::blocking`].
//!
//! Pooled connections outlive any single blocking call, so their sockets
//! stay registered with one runtime that lives as long as the process.

use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Runtime};

/// Overrides the number of worker threads.
const THREADS_ENV: &str = "RESPITE_RUNTIME_THREADS";

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name("respite-blocking");
        if let Some(threads) = std::env::var(THREADS_ENV).ok().and_then(|v| parse_threads(&v)) {
            builder.worker_threads(threads);
        }
        builder
            .build()
            .unwrap_or_else(|e| panic!("respite: cannot start blocking runtime: {e}"))
    })
}

fn parse_threads(value: &str) -> Option<usize> {
    value.trim().parse().ok().filter(|&n| n > 0)
}

/// Run `fut` to completion on the shared runtime.
///
/// Panics when called from inside an async context.
pub fn block_on<F: Future>(fut: F) -> F::Output {
    runtime().block_on(fut)
}
