//! Pure logic: request normalization and engine command construction.

pub mod command;
pub mod request;
