//! Stable exit codes for the `fitter` binary.

/// Engine ran (its status is ignored unless status checking is enabled).
pub const OK: i32 = 0;
/// Settings, temp file, spawn or cleanup failure.
pub const INVALID: i32 = 1;
/// Status checking is enabled and the engine exited non-zero or timed out.
pub const ENGINE_FAILED: i32 = 3;
