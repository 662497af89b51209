//! Engine abstraction for running a fit.
//!
//! The [`Engine`] trait decouples the fit orchestration from the real
//! HyPhy binary. Tests use a scripted engine that records the command and
//! inspects the batch file without spawning anything.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::command::EngineCommand;
use crate::io::process::run_command;

/// How an engine run ended.
///
/// A non-zero exit is reported here rather than as an error; whether it
/// matters is decided by the caller's failure policy. The engine's stderr is
/// not captured: it reaches the caller's stderr as the engine writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRun {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub timed_out: bool,
}

#[cfg(any(test, feature = "test-support"))]
impl EngineRun {
    pub fn succeeded() -> Self {
        Self {
            exit_code: Some(0),
            success: true,
            timed_out: false,
        }
    }

    pub fn failed(exit_code: i32) -> Self {
        Self {
            exit_code: Some(exit_code),
            success: false,
            timed_out: false,
        }
    }
}

/// Abstraction over fitting engine backends.
pub trait Engine {
    /// Run `command` and block until the engine exits.
    fn run(&self, command: &EngineCommand) -> Result<EngineRun>;
}

/// Engine that spawns the HyPhy executable.
#[derive(Debug, Clone)]
pub struct HyphyEngine {
    pub timeout: Option<Duration>,
}

impl Engine for HyphyEngine {
    #[instrument(skip_all, fields(program = %command.program.display()))]
    fn run(&self, command: &EngineCommand) -> Result<EngineRun> {
        info!(command = %command.render(), "starting engine");

        let output = run_command(command.to_command(), self.timeout).context("run engine")?;

        let run = EngineRun {
            exit_code: output.status.code(),
            success: output.status.success() && !output.timed_out,
            timed_out: output.timed_out,
        };

        if run.success {
            debug!(discarded_stdout_bytes = output.stdout_bytes, "engine completed");
        } else {
            warn!(
                exit_code = ?run.exit_code,
                timed_out = run.timed_out,
                "engine did not succeed"
            );
        }
        Ok(run)
    }
}
