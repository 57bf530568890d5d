//! Runtime ownership for the binary.

use std::future::Future;
use std::io;

/// Run `future` to completion on a fresh multi-threaded runtime.
///
/// Tokio's stdin reads on a blocking thread that cannot be interrupted.
/// Dropping the runtime would wait for that read, so a signal arriving
/// while the client keeps stdin open would never let the process exit.
/// The runtime is shut down in the background instead, abandoning any
/// blocking work still parked.
pub fn run_detached<F: Future>(future: F) -> io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("mongosearch-mcp")
        .build()?;

    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}
