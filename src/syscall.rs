// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External program invocation.
//!
//! Most of what this crate does boils down to calling some well-known
//! program with a fixed set of arguments: bleachbit, pacman, docker, pass,
//! and friends. All of them are reached through the [`Syscall`] trait, so the
//! higher level workflows never touch [`std::process`] themselves.

use std::{
    ffi::{OsStr, OsString},
    fmt::{Display, Formatter, Result as FmtResult},
    io::Write,
    process::{Command, Stdio},
};
use tracing::{debug, instrument};

/// Program call to make, along with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
}

impl Invocation {
    /// Construct new invocation of target program without arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append many arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the same call through sudo.
    pub fn sudo(self) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);

        Self {
            program: "sudo".into(),
            args,
        }
    }

    pub fn program(&self) -> &OsStr {
        self.program.as_os_str()
    }

    pub fn arguments(&self) -> &[OsString] {
        self.args.as_slice()
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl Display for Invocation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.program.to_string_lossy().as_ref())?;
        for arg in &self.args {
            write!(fmt, " {}", arg.to_string_lossy())?;
        }

        Ok(())
    }
}

/// Layer of indirection for external program calls.
pub trait Syscall {
    /// Run program with inherited stdio, blocking until it exits.
    fn interactive(&self, call: &Invocation) -> Result<()>;

    /// Run program and capture its stdout.
    ///
    /// Stderr is captured too, but only reported on failure.
    fn capture(&self, call: &Invocation) -> Result<String>;

    /// Run program with target input piped into its stdin.
    fn feed(&self, call: &Invocation, input: &str) -> Result<()>;
}

/// Program calls through processes spawned on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostSyscall;

impl Syscall for HostSyscall {
    #[instrument(skip(self, call), fields(call = %call), level = "debug")]
    fn interactive(&self, call: &Invocation) -> Result<()> {
        let status = call
            .command()
            .spawn()
            .map_err(|source| SyscallError::Spawn {
                source,
                command: call.to_string(),
            })?
            .wait()
            .map_err(SyscallError::Io)?;

        if !status.success() {
            return Err(SyscallError::Failed {
                command: call.to_string(),
                code: status.code(),
                message: String::new(),
            });
        }

        Ok(())
    }

    #[instrument(skip(self, call), fields(call = %call), level = "debug")]
    fn capture(&self, call: &Invocation) -> Result<String> {
        let output = call
            .command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SyscallError::Spawn {
                source,
                command: call.to_string(),
            })?;
        let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
        let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

        if !output.status.success() {
            return Err(SyscallError::Failed {
                command: call.to_string(),
                code: output.status.code(),
                message: chomp(stderr),
            });
        }

        debug!("captured {} bytes", stdout.len());
        Ok(stdout)
    }

    #[instrument(skip(self, call, input), fields(call = %call), level = "debug")]
    fn feed(&self, call: &Invocation, input: &str) -> Result<()> {
        let mut child = call
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| SyscallError::Spawn {
                source,
                command: call.to_string(),
            })?;

        // INVARIANT: Drop stdin handle before waiting so the child sees EOF.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).map_err(SyscallError::Io)?;
        }

        let status = child.wait().map_err(SyscallError::Io)?;
        if !status.success() {
            return Err(SyscallError::Failed {
                command: call.to_string(),
                code: status.code(),
                message: String::new(),
            });
        }

        Ok(())
    }
}

/// Split captured program output into its whitespace separated tokens.
pub fn tokens(output: &str) -> Vec<String> {
    output.split_whitespace().map(ToString::to_string).collect()
}

// INVARIANT: Chomp trailing newlines.
fn chomp(message: String) -> String {
    message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message)
}

/// Program call error types.
#[derive(Debug, thiserror::Error)]
pub enum SyscallError {
    /// Program could not be started at all.
    #[error("failed to run {command:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: String,
    },

    /// Program exited unsuccessfully.
    #[error("command {command:?} failed with exit code {code:?}: {message}")]
    Failed {
        command: String,
        code: Option<i32>,
        message: String,
    },

    /// Talking to program failed midway.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Friendly result alias :3
pub type Result<T, E = SyscallError> = std::result::Result<T, E>;
