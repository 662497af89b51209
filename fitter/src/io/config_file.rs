//! Scoped temporary batch file handed to the engine.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::{Builder, TempPath};
use tracing::debug;

/// A rendered batch document on disk, deleted when dropped.
///
/// The write handle is closed before the engine sees the path; only the path
/// guard is held for the lifetime of the run.
#[derive(Debug)]
pub struct ConfigFile {
    path: TempPath,
}

impl ConfigFile {
    /// Write `contents` to a fresh, uniquely named file in `dir` (or the system temp dir).
    pub fn create(dir: Option<&Path>, contents: &str) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix("fitter-").suffix(".bf");
        let mut file = match dir {
            Some(dir) => builder
                .tempfile_in(dir)
                .with_context(|| format!("create batch file in {}", dir.display()))?,
            None => builder.tempfile().context("create batch file")?,
        };
        file.write_all(contents.as_bytes())
            .with_context(|| format!("write {}", file.path().display()))?;
        file.flush()
            .with_context(|| format!("flush {}", file.path().display()))?;
        let path = file.into_temp_path();
        debug!(path = %path.display(), "wrote batch file");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting failure (including an already missing file).
    pub fn remove(self) -> Result<()> {
        let shown = self.path.display().to_string();
        self.path
            .close()
            .with_context(|| format!("remove batch file {shown}"))?;
        debug!(path = %shown, "removed batch file");
        Ok(())
    }

    /// Disarm deletion and hand back the path.
    pub fn keep(self) -> Result<PathBuf> {
        let path = self.path.keep().context("keep batch file")?;
        debug!(path = %path.display(), "kept batch file");
        Ok(path)
    }
}
