//! @acp:module "Execution Result"
//! @acp:summary "Outcome of a single process invocation"
//! @acp:domain execution
//! @acp:layer model

use std::fmt;

use crate::error::{Result, SoError};

/// Immutable result of one `run`: exit code plus captured output.
///
/// A nonzero exit is ordinary data here. Callers that treat it as fatal
/// escalate with [`ExecutionResult::raise_on_failure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    command: String,
    exit_code: i32,
    stdout: String,
    stderr: String,
    output: String,
}

impl ExecutionResult {
    /// Build a result from separately captured streams
    pub fn new(
        command: impl Into<String>,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            output: output.into(),
        }
    }

    /// Build a result whose only output went to stdout
    pub fn from_stdout(command: impl Into<String>, exit_code: i32, stdout: impl Into<String>) -> Self {
        let stdout = stdout.into();
        Self::new(command, exit_code, stdout.clone(), String::new(), stdout)
    }

    /// The rendered command line that produced this result
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Combined stdout and stderr, in the order it arrived
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Whether the command exited with status 0
    pub fn ok(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a nonzero exit into [`SoError::NonZeroExit`]; pass success through
    pub fn raise_on_failure(self) -> Result<Self> {
        if self.ok() {
            return Ok(self);
        }

        Err(SoError::NonZeroExit {
            command: self.command,
            exit_code: self.exit_code,
            output: self.output,
        })
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output)
    }
}
