//! Async runtime helpers for blocking callers.
//!
//! The HTTP step is synchronous from the workflow engine's point of view while
//! the transport is async. [`block_on`] drives a future to completion from
//! synchronous code, reusing the current Tokio runtime when one is available.

use std::future::Future;
use std::{io, panic, thread};

use tokio::{
    runtime::{Builder, Handle, RuntimeFlavor},
    task,
};

/// Execute an async future from synchronous code.
///
/// # Arguments
/// - `future`: The future to run to completion.
///
/// # Returns
/// Returns the future's output, or the error raised while bootstrapping a
/// fallback runtime converted through `E: From<io::Error>`.
///
/// # Notes
/// - Inside a multi-threaded Tokio runtime the current worker is marked as
///   blocking (`block_in_place`) and the future runs on the existing runtime.
/// - Inside a current-thread runtime the future runs on a helper thread with
///   its own runtime while the caller waits; that runtime cannot block in place.
/// - Outside Tokio a single-threaded runtime is created for this call only.
///
/// ```rust
/// use stepcall_util::block_on;
///
/// let value: Result<u8, std::io::Error> = block_on(async { Ok(7) });
/// assert_eq!(value.unwrap(), 7);
/// ```
pub fn block_on<F, T, E>(future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<io::Error> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            task::block_in_place(|| handle.block_on(future))
        }
        Ok(_) => thread::scope(|scope| match scope.spawn(|| block_on_fresh_runtime(future)).join() {
            Ok(output) => output,
            Err(payload) => panic::resume_unwind(payload),
        }),
        Err(_) => block_on_fresh_runtime(future),
    }
}

fn block_on_fresh_runtime<F, T, E>(future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<io::Error>,
{
    Builder::new_current_thread().enable_all().build()?.block_on(future)
}
