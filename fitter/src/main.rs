//! Run the HyPhy simple global fitter on one alignment.
//!
//! Renders the batch file the engine's FASTA data reader expects, runs
//! `<base>/HYPHY BASEPATH=<base> USEPATH=/dev/null <batch file>` and removes
//! the batch file once the engine exits.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use fitter::core::request::FitRequest;
use fitter::exit_codes;
use fitter::fit::{FitStatus, render_fit, run_fit};
use fitter::io::config::{FitterConfig, load_config};
use fitter::io::engine::HyphyEngine;
use fitter::logging;

#[derive(Parser)]
#[command(
    name = "fitter",
    version,
    about = "Fit a global codon model to an alignment with HyPhy"
)]
struct Cli {
    /// Alignment file (relative paths resolve against the working directory).
    input: String,
    /// Output table written by the engine.
    output: String,
    /// Genetic code identifier, e.g. `Universal`.
    genetic_code: String,
    /// Nucleotide bias / model string, e.g. `HKY85` or `010010`.
    model: String,
    /// Engine installation root; the executable is looked up inside it.
    engine_base: PathBuf,

    /// TOML settings file; must exist when given. Defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Exit non-zero when the engine exits non-zero or times out.
    #[arg(long)]
    check_status: bool,
    /// Keep the batch file when a checked run fails (implies `--check-status`).
    #[arg(long)]
    keep_config: bool,
    /// Kill the engine after this many seconds (0 waits forever).
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,
    /// Print the batch file and command line without running anything.
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let base = match &cli.config {
        Some(path) => load_config(path)?,
        None => FitterConfig::default(),
    };
    let config = apply_cli_overrides(base, &cli)?;
    let request = FitRequest::new(
        &cli.input,
        &cli.output,
        &cli.genetic_code,
        &cli.model,
        cli.engine_base.clone(),
    )?;

    if cli.dry_run {
        let dry = render_fit(&request, &config)?;
        print!("{}", dry.document);
        println!("{}", dry.command_line);
        return Ok(exit_codes::OK);
    }

    let engine = HyphyEngine {
        timeout: config.engine.timeout(),
    };
    let report = run_fit(&request, &config, &engine)?;
    match report.status {
        FitStatus::Completed => Ok(exit_codes::OK),
        FitStatus::EngineFailed => {
            if report.engine.timed_out {
                eprintln!("engine timed out: {}", report.command_line);
            } else {
                eprintln!(
                    "engine failed with status {:?}: {}",
                    report.engine.exit_code, report.command_line
                );
            }
            if let Some(kept) = &report.kept_config {
                eprintln!("batch file kept at {}", kept.display());
            }
            Ok(exit_codes::ENGINE_FAILED)
        }
    }
}

/// Layer command-line flags over file settings.
fn apply_cli_overrides(mut config: FitterConfig, cli: &Cli) -> Result<FitterConfig> {
    if cli.check_status {
        config.check_exit_status = true;
    }
    if cli.keep_config {
        config.check_exit_status = true;
        config.keep_config_on_failure = true;
    }
    if let Some(secs) = cli.timeout_secs {
        config.engine.timeout_secs = secs;
    }
    config.validate()?;
    Ok(config)
}
