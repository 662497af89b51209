//! Blocking child process execution with a drained stdout.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// What is left of a finished child.
///
/// Stdout is counted, not stored. Stderr goes straight to ours.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout_bytes: usize,
    pub timed_out: bool,
}

/// Run `cmd` to completion, discarding its stdout.
///
/// Stdout is drained on a reader thread while the child runs so a chatty
/// child cannot block on a full pipe. Stderr is inherited. With
/// `timeout = None` this waits for as long as the child takes; with a
/// timeout the child runs in its own process group and the whole group is
/// killed when the limit passes, so wrapper scripts do not outlive it.
#[instrument(skip_all, fields(timeout_secs = timeout.map_or(0, |t| t.as_secs())))]
pub fn run_command(mut cmd: Command, timeout: Option<Duration>) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    if timeout.is_some() {
        isolate_group(&mut cmd);
    }

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, program = ?cmd.get_program(), "failed to spawn command");
            return Err(e)
                .with_context(|| format!("spawn {}", cmd.get_program().to_string_lossy()));
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stdout_handle = thread::spawn(move || drain_stream(stdout));

    let mut timed_out = false;
    let status = match timeout {
        None => child.wait().context("wait for command")?,
        Some(timeout) => match child.wait_timeout(timeout).context("wait for command")? {
            Some(status) => status,
            None => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "command timed out, killing"
                );
                timed_out = true;
                kill_group(&mut child)?;
                child.wait().context("wait command after kill")?
            }
        },
    };

    let stdout_bytes = join_output(stdout_handle).context("join stdout")?;

    debug!(exit_code = ?status.code(), timed_out, stdout_bytes, "command finished");
    Ok(CommandOutput {
        status,
        stdout_bytes,
        timed_out,
    })
}

#[cfg(unix)]
fn isolate_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate_group(_cmd: &mut Command) {}

/// Kill the child and everything it started in its process group.
#[cfg(unix)]
fn kill_group(child: &mut Child) -> Result<()> {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let pgid = i32::try_from(child.id()).context("child pid out of range")?;
    killpg(Pid::from_raw(pgid), Signal::SIGKILL).context("kill command process group")?;
    Ok(())
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) -> Result<()> {
    child.kill().context("kill command")
}

fn join_output(handle: thread::JoinHandle<Result<usize>>) -> Result<usize> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

/// Read `reader` to EOF, returning the byte count.
fn drain_stream<R: Read>(mut reader: R) -> Result<usize> {
    let mut total = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        total += n;
    }

    Ok(total)
}
