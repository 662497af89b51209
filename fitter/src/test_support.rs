//! Test-only helpers: sample inputs, document lookups and scripted engines.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::core::command::EngineCommand;
use crate::core::request::FitRequest;
use crate::io::engine::{Engine, EngineRun};
use crate::io::template::ConfigSlots;

/// `input.fasta out.csv Universal HKY85 /opt/tools/hyphy`, run from `/data`.
pub fn sample_request() -> FitRequest {
    FitRequest::resolve_in(
        Path::new("/data"),
        "input.fasta",
        "out.csv",
        "Universal",
        "HKY85",
        "/opt/tools/hyphy",
    )
}

/// Slots matching [`sample_request`] under the default layout.
pub fn sample_slots() -> ConfigSlots {
    ConfigSlots {
        analysis_module: "../AnalysisModules/SimpleGlobalFitter.bf".to_string(),
        writer_module: "../Writers/TAB.bf".to_string(),
        tree: String::new(),
        input: "/data/input.fasta".to_string(),
        output: "/data/out.csv".to_string(),
        genetic_code: "Universal".to_string(),
        model: "HKY85".to_string(),
        data_reader: "/opt/tools/hyphy/GenomeFitters/DataReaders/FastaReader.bf".to_string(),
    }
}

/// Value assigned to `_genomeScreenOptions ["<slot>"]` in a rendered document.
pub fn option_slot(document: &str, slot: &str) -> Option<String> {
    let prefix = format!("_genomeScreenOptions [\"{slot}\"] = \"");
    document.lines().find_map(|line| {
        line.strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_suffix("\";"))
            .map(str::to_string)
    })
}

/// Path given to `ExecuteAFile` in a rendered document.
pub fn execute_target(document: &str) -> Option<String> {
    document.lines().find_map(|line| {
        line.strip_prefix("ExecuteAFile (\"")
            .and_then(|rest| rest.strip_suffix("\", _genomeScreenOptions);"))
            .map(str::to_string)
    })
}

/// One observed engine call.
#[derive(Debug, Clone)]
pub struct SeenRun {
    pub command: EngineCommand,
    pub config_path: PathBuf,
    /// Whether the batch file was on disk when the engine was called.
    pub config_existed: bool,
    pub document: String,
}

#[derive(Debug, Clone)]
enum Script {
    Exit(EngineRun),
    SpawnError(String),
}

/// Engine that records each call instead of spawning a process.
pub struct ScriptedEngine {
    script: Script,
    delete_config: bool,
    seen: RefCell<Vec<SeenRun>>,
}

impl ScriptedEngine {
    pub fn exiting(run: EngineRun) -> Self {
        Self {
            script: Script::Exit(run),
            delete_config: false,
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn spawn_error(message: &str) -> Self {
        Self {
            script: Script::SpawnError(message.to_string()),
            delete_config: false,
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Delete the batch file during the call, like an engine that cleans up after itself.
    pub fn deleting_config(mut self) -> Self {
        self.delete_config = true;
        self
    }

    pub fn seen(&self) -> Vec<SeenRun> {
        self.seen.borrow().clone()
    }
}

impl Engine for ScriptedEngine {
    fn run(&self, command: &EngineCommand) -> Result<EngineRun> {
        let config_path = command
            .args
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("engine command has no batch file argument"))?;
        let document = fs::read_to_string(&config_path).unwrap_or_default();
        self.seen.borrow_mut().push(SeenRun {
            command: command.clone(),
            config_existed: config_path.exists(),
            config_path: config_path.clone(),
            document,
        });
        if self.delete_config {
            fs::remove_file(&config_path)?;
        }
        match &self.script {
            Script::Exit(run) => Ok(run.clone()),
            Script::SpawnError(message) => Err(anyhow!("{message}")),
        }
    }
}

/// Install a shell script standing in for the engine at `<base>/HYPHY`.
///
/// The script writes its argv (including `$0`) to `<base>/args.txt`, copies
/// the batch file to `<base>/seen.bf`, prints some stdout and exits with `exit_code`.
#[cfg(unix)]
pub fn install_fake_engine(base: &Path, exit_code: i32) -> std::io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(base)?;
    let path = base.join("HYPHY");
    let script = format!(
        "#!/bin/sh\n\
         dir=$(dirname \"$0\")\n\
         printf '%s\\n' \"$0\" \"$@\" > \"$dir/args.txt\"\n\
         cp \"$3\" \"$dir/seen.bf\"\n\
         echo 'Fitting model...'\n\
         echo 'engine stderr' >&2\n\
         exit {exit_code}\n"
    );
    fs::write(&path, script)?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path)
}
