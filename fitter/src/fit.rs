//! Orchestration for a single fit: render, run, clean up.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::core::command::{EngineCommand, EngineLayout};
use crate::core::request::FitRequest;
use crate::io::config::FitterConfig;
use crate::io::config_file::ConfigFile;
use crate::io::engine::{Engine, EngineRun};
use crate::io::template::{ConfigSlots, ConfigTemplate};

/// Whether the run counts as done under the configured failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    /// Engine ran; its exit status was fine or not checked.
    Completed,
    /// Exit status checking is on and the engine failed or timed out.
    EngineFailed,
}

/// Result of a single fit.
#[derive(Debug, Clone)]
pub struct FitReport {
    pub status: FitStatus,
    /// Rendered engine command line.
    pub command_line: String,
    /// Where the batch file was written.
    pub config_path: PathBuf,
    pub engine: EngineRun,
    /// Set when the batch file was preserved after a failed run.
    pub kept_config: Option<PathBuf>,
}

/// Rendered document and command line, with nothing written or spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRun {
    pub document: String,
    pub command_line: String,
}

struct Prepared {
    layout: EngineLayout,
    document: String,
}

fn prepare(request: &FitRequest, config: &FitterConfig) -> Result<Prepared> {
    let layout = EngineLayout::new(
        &request.engine_base,
        &config.engine.executable,
        &config.engine.data_reader,
    );
    let slots = ConfigSlots::new(request, &layout, &config.analysis)?;
    let document = ConfigTemplate::new()?.render(&slots)?;
    Ok(Prepared { layout, document })
}

/// Run the engine once for `request`.
///
/// The batch file exists for exactly the duration of the engine call. It is
/// removed on every path out of this function except a checked failure with
/// `keep_config_on_failure` set.
pub fn run_fit<E: Engine>(
    request: &FitRequest,
    config: &FitterConfig,
    engine: &E,
) -> Result<FitReport> {
    let prepared = prepare(request, config)?;
    let config_file = ConfigFile::create(config.temp_dir.as_deref(), &prepared.document)?;
    let config_path = config_file.path().to_path_buf();

    let command = EngineCommand::for_fit(&prepared.layout, &config_path, &config.null_device);
    let command_line = command.render();
    info!(command = %command_line, "running fit");

    // On error the guard drops here and the file goes with it.
    let run = engine.run(&command).context("fit engine")?;

    let status = if config.check_exit_status && !run.success {
        FitStatus::EngineFailed
    } else {
        FitStatus::Completed
    };

    let kept_config = match status {
        FitStatus::EngineFailed if config.keep_config_on_failure => {
            let kept = config_file.keep()?;
            warn!(path = %kept.display(), "keeping batch file after failed fit");
            Some(kept)
        }
        FitStatus::EngineFailed => {
            if let Err(err) = config_file.remove() {
                warn!(err = %format!("{err:#}"), "cleanup after failed fit");
            }
            None
        }
        FitStatus::Completed => {
            config_file.remove()?;
            None
        }
    };

    debug!(?status, exit_code = ?run.exit_code, "fit finished");
    Ok(FitReport {
        status,
        command_line,
        config_path,
        engine: run,
        kept_config,
    })
}

/// Render what [`run_fit`] would do, without creating files or processes.
pub fn render_fit(request: &FitRequest, config: &FitterConfig) -> Result<DryRun> {
    let prepared = prepare(request, config)?;
    let placeholder = config
        .temp_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir)
        .join("fitter-XXXXXX.bf");
    let command = EngineCommand::for_fit(&prepared.layout, &placeholder, &config.null_device);
    Ok(DryRun {
        document: prepared.document,
        command_line: command.render(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedEngine, option_slot, sample_request};
    use std::fs;

    fn config_in(dir: &std::path::Path) -> FitterConfig {
        FitterConfig {
            temp_dir: Some(dir.to_path_buf()),
            ..FitterConfig::default()
        }
    }

    #[test]
    fn successful_fit_runs_engine_and_removes_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = ScriptedEngine::exiting(EngineRun::succeeded());

        let report = run_fit(&sample_request(), &config_in(temp.path()), &engine).expect("fit");

        assert_eq!(report.status, FitStatus::Completed);
        assert!(report.kept_config.is_none());
        assert!(!report.config_path.exists());

        let seen = engine.seen();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].config_existed);
        assert_eq!(
            report.command_line,
            format!(
                "/opt/tools/hyphy/HYPHY BASEPATH=/opt/tools/hyphy USEPATH=/dev/null {}",
                report.config_path.display()
            )
        );
        assert_eq!(option_slot(&seen[0].document, "03").as_deref(), Some("/data/input.fasta"));
        assert_eq!(option_slot(&seen[0].document, "06").as_deref(), Some("HKY85"));
    }

    #[test]
    fn failing_engine_is_ignored_by_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = ScriptedEngine::exiting(EngineRun::failed(1));

        let report = run_fit(&sample_request(), &config_in(temp.path()), &engine).expect("fit");

        assert_eq!(report.status, FitStatus::Completed);
        assert!(!report.engine.success);
        assert!(!report.config_path.exists());
    }

    #[test]
    fn checked_failure_removes_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = ScriptedEngine::exiting(EngineRun::failed(1));
        let config = FitterConfig {
            check_exit_status: true,
            ..config_in(temp.path())
        };

        let report = run_fit(&sample_request(), &config, &engine).expect("fit");

        assert_eq!(report.status, FitStatus::EngineFailed);
        assert!(report.kept_config.is_none());
        assert!(!report.config_path.exists());
    }

    #[test]
    fn checked_failure_can_keep_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = ScriptedEngine::exiting(EngineRun::failed(7));
        let config = FitterConfig {
            check_exit_status: true,
            keep_config_on_failure: true,
            ..config_in(temp.path())
        };

        let report = run_fit(&sample_request(), &config, &engine).expect("fit");

        assert_eq!(report.status, FitStatus::EngineFailed);
        let kept = report.kept_config.expect("kept path");
        assert_eq!(kept, report.config_path);
        let contents = fs::read_to_string(&kept).expect("read kept");
        assert_eq!(option_slot(&contents, "05").as_deref(), Some("Universal"));
    }

    #[test]
    fn keep_is_ignored_when_engine_succeeds() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = ScriptedEngine::exiting(EngineRun::succeeded());
        let config = FitterConfig {
            check_exit_status: true,
            keep_config_on_failure: true,
            ..config_in(temp.path())
        };

        let report = run_fit(&sample_request(), &config, &engine).expect("fit");
        assert_eq!(report.status, FitStatus::Completed);
        assert!(!report.config_path.exists());
    }

    #[test]
    fn spawn_error_still_removes_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = ScriptedEngine::spawn_error("no such file");

        let err = run_fit(&sample_request(), &config_in(temp.path()), &engine)
            .expect_err("spawn failure");
        assert!(format!("{err:#}").contains("no such file"));

        let seen = engine.seen();
        assert!(seen[0].config_existed);
        assert!(!seen[0].config_path.exists());
        assert_eq!(fs::read_dir(temp.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn missing_file_after_success_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = ScriptedEngine::exiting(EngineRun::succeeded()).deleting_config();

        let err = run_fit(&sample_request(), &config_in(temp.path()), &engine)
            .expect_err("cleanup failure");
        assert!(format!("{err:#}").contains("remove batch file"));
    }

    #[test]
    fn missing_file_after_checked_failure_keeps_failure_status() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = ScriptedEngine::exiting(EngineRun::failed(2)).deleting_config();
        let config = FitterConfig {
            check_exit_status: true,
            ..config_in(temp.path())
        };

        let report = run_fit(&sample_request(), &config, &engine).expect("fit");
        assert_eq!(report.status, FitStatus::EngineFailed);
    }

    #[test]
    fn custom_layout_flows_into_command_and_document() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = ScriptedEngine::exiting(EngineRun::succeeded());
        let mut config = config_in(temp.path());
        config.engine.executable = "bin/HYPHYMP".to_string();
        config.engine.data_reader = "/srv/batch/Reader.bf".to_string();
        config.null_device = "NUL".to_string();

        let report = run_fit(&sample_request(), &config, &engine).expect("fit");

        assert!(
            report
                .command_line
                .starts_with("/opt/tools/hyphy/bin/HYPHYMP BASEPATH=/opt/tools/hyphy USEPATH=NUL ")
        );
        assert!(
            engine.seen()[0]
                .document
                .contains("ExecuteAFile (\"/srv/batch/Reader.bf\", _genomeScreenOptions);")
        );
    }

    #[test]
    fn dry_run_writes_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dry = render_fit(&sample_request(), &config_in(temp.path())).expect("render");

        assert_eq!(
            dry.command_line,
            format!(
                "/opt/tools/hyphy/HYPHY BASEPATH=/opt/tools/hyphy USEPATH=/dev/null {}",
                temp.path().join("fitter-XXXXXX.bf").display()
            )
        );
        assert_eq!(option_slot(&dry.document, "04").as_deref(), Some("/data/out.csv"));
        assert_eq!(fs::read_dir(temp.path()).expect("read dir").count(), 0);
    }
}
