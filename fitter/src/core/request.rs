//! Explicit, normalized arguments for one fit run.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Everything the caller supplies for a single fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitRequest {
    /// Alignment to fit, absolute.
    pub input: PathBuf,
    /// Destination for the writer module's table, absolute.
    pub output: PathBuf,
    /// Genetic code identifier, embedded verbatim (e.g. `Universal`).
    pub genetic_code: String,
    /// Nucleotide bias / model string, embedded verbatim (e.g. `HKY85`).
    pub model: String,
    /// Engine installation root.
    pub engine_base: PathBuf,
}

impl FitRequest {
    /// Build a request relative to the process working directory.
    pub fn new(
        input: &str,
        output: &str,
        genetic_code: &str,
        model: &str,
        engine_base: impl Into<PathBuf>,
    ) -> Result<Self> {
        let cwd = std::env::current_dir().context("read current directory")?;
        Ok(Self::resolve_in(
            &cwd,
            input,
            output,
            genetic_code,
            model,
            engine_base,
        ))
    }

    /// Build a request, resolving relative paths against `cwd`.
    ///
    /// String arguments are trimmed. Identifiers are not checked against any
    /// known set; the engine decides what it accepts.
    pub fn resolve_in(
        cwd: &Path,
        input: &str,
        output: &str,
        genetic_code: &str,
        model: &str,
        engine_base: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: absolute_from(cwd, input.trim()),
            output: absolute_from(cwd, output.trim()),
            genetic_code: genetic_code.trim().to_string(),
            model: model.trim().to_string(),
            engine_base: engine_base.into(),
        }
    }
}

/// Join `path` onto `cwd` unless already absolute, then fold `.` and `..`.
///
/// Purely lexical: the path does not have to exist.
fn absolute_from(cwd: &Path, path: &str) -> PathBuf {
    let joined = cwd.join(path);
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `/..` stays `/`
                if !matches!(out.components().next_back(), Some(Component::RootDir) | None) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
