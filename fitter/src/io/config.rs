//! Adapter settings loaded from the TOML file given with `--config`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Adapter settings (TOML).
///
/// Every field has a default matching the stock HyPhy layout, so running
/// without `--config` behaves exactly like passing an empty file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FitterConfig {
    /// Value passed as `USEPATH=`.
    pub null_device: String,

    /// Directory for the generated batch file. System temp dir when unset.
    pub temp_dir: Option<PathBuf>,

    /// Treat a non-zero engine exit (or timeout) as a failed run.
    pub check_exit_status: bool,

    /// Leave the batch file on disk when a checked run fails.
    pub keep_config_on_failure: bool,

    pub engine: EngineConfig,

    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable name relative to the engine base directory.
    pub executable: String,

    /// Batch script run via `ExecuteAFile`; relative paths resolve under the base directory.
    pub data_reader: String,

    /// Kill the engine after this many seconds. `0` waits forever.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Option slot `00`: analysis run on each gene, relative to the data reader.
    pub module: String,

    /// Option slot `01`: output writer, relative to the data reader.
    pub writer: String,

    /// Option slot `02`: Newick tree string. Empty lets the analysis infer one.
    pub tree: String,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            null_device: "/dev/null".to_string(),
            temp_dir: None,
            check_exit_status: false,
            keep_config_on_failure: false,
            engine: EngineConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: "HYPHY".to_string(),
            data_reader: "GenomeFitters/DataReaders/FastaReader.bf".to_string(),
            timeout_secs: 0,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            module: "../AnalysisModules/SimpleGlobalFitter.bf".to_string(),
            writer: "../Writers/TAB.bf".to_string(),
            tree: String::new(),
        }
    }
}

impl EngineConfig {
    /// `None` when the engine may run indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl FitterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.null_device.trim().is_empty() {
            return Err(anyhow!("null_device must be non-empty"));
        }
        if self.engine.executable.trim().is_empty() {
            return Err(anyhow!("engine.executable must be non-empty"));
        }
        if self.engine.data_reader.trim().is_empty() {
            return Err(anyhow!("engine.data_reader must be non-empty"));
        }
        if self.analysis.module.trim().is_empty() {
            return Err(anyhow!("analysis.module must be non-empty"));
        }
        if self.analysis.writer.trim().is_empty() {
            return Err(anyhow!("analysis.writer must be non-empty"));
        }
        Ok(())
    }
}

/// Load settings from a TOML file named on the command line.
///
/// The file must exist; callers without a settings file use
/// `FitterConfig::default()` instead.
pub fn load_config(path: &Path) -> Result<FitterConfig> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: FitterConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
