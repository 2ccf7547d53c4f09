//! External process delegation.
//!
//! Launches are synchronous: the calling pane, and with it the whole event
//! loop, waits for the child to exit. The system launcher hands the terminal
//! to the child for the duration.

use std::io;
use std::process::Command;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub argv: Vec<String>,
}

impl LaunchRequest {
    /// `program` may carry its own arguments (`"code -w"`); `target` is appended.
    pub fn for_item(program: &str, target: &str) -> Self {
        let mut argv: Vec<String> = program.split_whitespace().map(str::to_string).collect();
        argv.push(target.to_string());
        Self { argv }
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOutput {
    /// `None` when the child was killed by a signal.
    pub status_code: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExternalProcessError {
    #[error("empty command line")]
    EmptyCommand,
    #[error("failed to launch {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("terminal not restored after {program}: {reason}")]
    TerminalRestore { program: String, reason: String },
}

pub trait ProcessLauncher {
    fn spawn(&mut self, request: &LaunchRequest) -> Result<LaunchOutput, ExternalProcessError>;
}

/// Runs children with `std::process::Command` while the terminal is suspended.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn spawn(&mut self, request: &LaunchRequest) -> Result<LaunchOutput, ExternalProcessError> {
        let Some((program, args)) = request.argv.split_first() else {
            return Err(ExternalProcessError::EmptyCommand);
        };
        info!(target: "process", argv = ?request.argv, "spawn");
        // The child inherits the terminal; pagers and editors need it.
        let run = || {
            Command::new(program).args(args).status().map(|status| LaunchOutput {
                status_code: status.code(),
            })
        };
        let result = core_terminal::with_terminal_suspended(run).map_err(|e| {
            ExternalProcessError::TerminalRestore {
                program: program.clone(),
                reason: e.to_string(),
            }
        })?;
        match result {
            Ok(out) => {
                info!(target: "process", program, status = ?out.status_code, "exited");
                Ok(out)
            }
            Err(source) => {
                warn!(target: "process", program, error = %source, "spawn failed");
                Err(ExternalProcessError::SpawnFailed {
                    program: program.clone(),
                    source,
                })
            }
        }
    }
}

/// Launcher that records requests instead of running anything. Clones share
/// the same log, so a test can keep one while the pane owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    calls: Arc<Mutex<Vec<LaunchRequest>>>,
    fail: bool,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every spawn fails as if the program did not exist.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<LaunchRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn spawn(&mut self, request: &LaunchRequest) -> Result<LaunchOutput, ExternalProcessError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        if self.fail {
            return Err(ExternalProcessError::SpawnFailed {
                program: request.program().to_string(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }
        Ok(LaunchOutput {
            status_code: Some(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_with_arguments_is_split() {
        let req = LaunchRequest::for_item("code -w", "notes.md");
        assert_eq!(req.argv, vec!["code", "-w", "notes.md"]);
        assert_eq!(req.program(), "code");
    }

    #[test]
    fn empty_command_is_rejected() {
        let req = LaunchRequest { argv: Vec::new() };
        assert!(matches!(
            SystemLauncher.spawn(&req),
            Err(ExternalProcessError::EmptyCommand)
        ));
    }

    #[test]
    fn missing_program_reports_spawn_failure() {
        let req = LaunchRequest::for_item("definitely-not-a-real-program-4c1e", "x");
        let err = SystemLauncher.spawn(&req).unwrap_err();
        assert!(matches!(err, ExternalProcessError::SpawnFailed { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_is_reported() {
        // Not entered, so the terminal is not suspended around the child.
        let ok = SystemLauncher.spawn(&LaunchRequest::for_item("test -e", "/")).unwrap();
        assert_eq!(ok, LaunchOutput { status_code: Some(0) });
        let missing = LaunchRequest::for_item("test -e", "/definitely/not/here-4c1e");
        assert_eq!(SystemLauncher.spawn(&missing).unwrap().status_code, Some(1));
    }
}
