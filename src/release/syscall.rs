// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External Git process calls.
//!
//! Publishing a release commits, tags, and pushes through the Git binary, so
//! the user's own credential helpers, hooks, and signing setup apply. Every
//! call targets an explicit directory through `git -C`.

use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, instrument};

/// Git binary bound to a directory.
#[derive(Debug, Clone)]
pub(crate) struct GitCall {
    workdir: PathBuf,
}

impl GitCall {
    /// Construct new Git caller for `workdir`.
    pub(crate) fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Run Git subcommand, returning its combined output.
    ///
    /// # Errors
    ///
    /// - Return [`SyscallError`] if Git cannot be spawned, or exits with
    ///   non-zero status.
    #[instrument(skip(self, args), level = "debug")]
    pub(crate) fn run(&self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Result<String> {
        let mut bin_args: Vec<OsString> = vec!["-C".into(), self.workdir.clone().into()];
        bin_args.extend(args.into_iter().map(Into::into));
        debug!("git {:?}", bin_args);

        syscall_non_interactive("git", bin_args)
    }

    /// Directory Git runs in.
    pub(crate) fn workdir(&self) -> &Path {
        &self.workdir
    }
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let args = args
        .into_iter()
        .map(|arg| arg.as_ref().to_os_string())
        .collect::<Vec<_>>();
    let command_line = std::iter::once(cmd.as_ref())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");

    let output = Command::new(cmd.as_ref())
        .args(&args)
        .output()
        .map_err(|err| SyscallError::Spawn {
            source: err,
            command: command_line.clone(),
        })?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(format!("stdout: {stdout}").as_str());
    }

    if !stderr.is_empty() {
        message.push_str(format!("stderr: {stderr}").as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        return Err(SyscallError::Failed {
            command: command_line,
            output: message,
        });
    }

    Ok(message)
}

/// External process error types.
#[derive(Debug, thiserror::Error)]
pub enum SyscallError {
    /// Process cannot be spawned.
    #[error("failed to run {command:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: String,
    },

    /// Process exits with non-zero status.
    #[error("command {command:?} failed:\n{output}")]
    Failed { command: String, output: String },
}

/// Friendly result alias :3
type Result<T, E = SyscallError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_test::prelude::*;

    #[sealed_test]
    fn run_reports_failing_command() {
        let dir = std::env::current_dir().unwrap();
        let result = GitCall::new(&dir).run(["rev-parse", "--verify", "no-such-ref"]);
        match result {
            Err(SyscallError::Failed { command, .. }) => {
                assert!(command.starts_with("git -C "));
                assert!(command.ends_with("rev-parse --verify no-such-ref"));
            }
            Err(SyscallError::Spawn { .. }) => {}
            Ok(output) => panic!("expected failure, got {output:?}"),
        }
    }
}
