//! Diagnostic tracing for the adapter.
//!
//! What gets logged, by level:
//!
//! - `info`: the rendered engine command line for each fit.
//! - `debug`: batch file written, removed or kept; engine exit code and the
//!   number of stdout bytes discarded.
//! - `warn`: engine failure or timeout, a kept batch file, cleanup errors.
//! - `error`: the engine executable could not be spawned.
//!
//! The engine's stdout is drained and dropped, never logged. Its stderr is
//! not captured either: it interleaves with these lines on the same stream.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=fitter=debug fitter in.fasta out.csv Universal HKY85 /opt/hyphy
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
