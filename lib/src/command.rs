//! Runs platform utilities (ping, arp, arp-scan, arping, nbtstat) under a
//! deadline
//!
//! Every external process the engine starts goes through a [`CommandRunner`]
//! so that it is bounded by a timeout, and so tests can substitute canned
//! output.

#[cfg(test)]
use mockall::automock;

use std::{
    env,
    ffi::OsStr,
    io::Read,
    path::Path,
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use crate::error::{QuietScanError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Everything the process wrote to stdout, lossily decoded
    pub stdout: String,
    /// Whether the process exited with a zero status
    pub success: bool,
}

/// Trait describing how external utilities are executed
#[cfg_attr(test, automock)]
pub trait CommandRunner: Send + Sync {
    /// Runs the program to completion or until the timeout expires. On
    /// timeout the process is killed and an error is returned.
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput>;

    /// Returns true if the program can be found on the search path
    fn exists(&self, program: &str) -> bool;
}

/// [`CommandRunner`] backed by [`std::process::Command`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    /// Returns a new instance of SystemCommandRunner
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
fn hide_window(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_window(_command: &mut Command) {}

/// Kills the child and reaps it so no zombie is left behind
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        hide_window(&mut command);

        log::debug!("running {} {:?}", program, args);

        let mut child = command.spawn()?;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            QuietScanError::ThreadError(format!(
                "failed to capture stdout of {}",
                program
            ))
        })?;

        // drain stdout concurrently so a chatty child never blocks on a full
        // pipe while we wait on it
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            buf
        });

        let deadline = Instant::now() + timeout;

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    terminate(&mut child);
                    return Err(e.into());
                }
            }

            let now = Instant::now();

            if now >= deadline {
                terminate(&mut child);
                // the reader is left detached: a grandchild (i.e. under sudo)
                // may still hold the pipe open
                return Err(QuietScanError::CommandTimeout {
                    program: program.to_string(),
                    timeout,
                });
            }

            thread::sleep(POLL_INTERVAL.min(deadline - now));
        };

        let stdout = reader.join()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            success: status.success(),
        })
    }

    fn exists(&self, program: &str) -> bool {
        let path = Path::new(program);

        if path.components().count() > 1 {
            return is_executable_file(path);
        }

        let Some(search_path) = env::var_os("PATH") else {
            return false;
        };

        env::split_paths(&search_path).any(|dir| {
            let candidate = dir.join(program);
            if is_executable_file(&candidate) {
                return true;
            }
            cfg!(windows)
                && candidate.extension().is_none()
                && is_executable_file(&candidate.with_extension(OsStr::new("exe")))
        })
    }
}

/// Converts a list of string-likes into owned command arguments
pub fn to_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter().map(Into::into).collect()
}

#[cfg(test)]
#[path = "./command_tests.rs"]
mod tests;
