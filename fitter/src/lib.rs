//! Command-line adapter for the HyPhy simple global fitter.
//!
//! One invocation renders a batch configuration document, runs the fitting
//! engine against it and removes the document afterwards. The crate keeps the
//! same split the rest of the tooling uses:
//!
//! - **[`core`]**: Pure request and command-line construction. No I/O.
//! - **[`io`]**: Template rendering, temp files, settings and child processes.
//!
//! [`fit`] ties the two together for the binary.

pub mod core;
pub mod exit_codes;
pub mod fit;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
