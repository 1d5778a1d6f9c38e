use std::{future::Future, time::Duration};

use crate::protocol::host::{HostError, HostResult};

/// Spawn a detached task on the current runtime
pub fn spawn_task<F>(future: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::task::spawn(future)
}

/// Spawn a blocking task on the runtime's blocking pool
pub fn spawn_blocking_task<F, R>(func: F) -> tokio::task::JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(func)
}

/// Run blocking host I/O off the runtime, bounded by `limit`.
///
/// A call that outlives `limit` is reported as a transport failure. The
/// closure itself keeps running to completion in the pool, so its own I/O
/// must be bounded too.
pub async fn run_blocking_io<F, R>(limit: Duration, func: F) -> HostResult<R>
where
    F: FnOnce() -> HostResult<R> + Send + 'static,
    R: Send + 'static,
{
    match tokio::time::timeout(limit, spawn_blocking_task(func)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(HostError::Transport(format!(
            "blocking I/O task failed: {join_err}"
        ))),
        Err(_) => Err(HostError::Transport(format!(
            "operation timed out after {limit:?}"
        ))),
    }
}
