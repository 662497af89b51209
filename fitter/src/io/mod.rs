//! I/O helpers for a fit run.

pub mod config;
pub mod config_file;
pub mod engine;
pub mod process;
pub mod template;
