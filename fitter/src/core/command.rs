//! Engine install layout and the command line used to launch it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Where the engine and its batch scripts live for one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLayout {
    /// Installation root, passed as `BASEPATH=`.
    pub base: PathBuf,
    /// Engine executable.
    pub executable: PathBuf,
    /// Batch script named in `ExecuteAFile`.
    pub data_reader: PathBuf,
}

impl EngineLayout {
    /// Resolve `executable` and `data_reader` under `base`.
    ///
    /// An absolute `data_reader` is used as is.
    pub fn new(base: &Path, executable: &str, data_reader: &str) -> Self {
        Self {
            base: base.to_path_buf(),
            executable: base.join(executable),
            data_reader: base.join(data_reader),
        }
    }
}

/// A fully resolved engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl EngineCommand {
    /// `<exe> BASEPATH=<base> USEPATH=<null_device> <config>`.
    ///
    /// `USEPATH` is a required positional slot of the engine; pointing it at
    /// the null device keeps the engine from reading or writing anything there.
    pub fn for_fit(layout: &EngineLayout, config_path: &Path, null_device: &str) -> Self {
        let mut basepath = OsString::from("BASEPATH=");
        basepath.push(layout.base.as_os_str());
        let mut usepath = OsString::from("USEPATH=");
        usepath.push(null_device);
        Self {
            program: layout.executable.clone(),
            args: vec![basepath, usepath, config_path.as_os_str().to_owned()],
        }
    }

    /// Single-line rendering, space separated, for logs and `--dry-run`.
    pub fn render(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Build the process command. The program is spawned directly, not via a shell.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}
