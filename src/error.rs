//! @acp:module "Errors"
//! @acp:summary "Error types for the so library"
//! @acp:domain cli
//! @acp:layer types

use std::path::PathBuf;

use thiserror::Error;

use crate::template::RenderError;

/// Errors raised by command execution, DNS setup and configuration
#[derive(Debug, Error)]
pub enum SoError {
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The child process could not be created (binary missing, permission denied)
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Only produced by explicit escalation of a failed result
    #[error("command `{command}` exited with code {exit_code}")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl SoError {
    /// Captured output of a failed command, if this is an escalated exit
    pub fn command_output(&self) -> Option<&str> {
        match self {
            SoError::NonZeroExit { output, .. } => Some(output),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SoError>;
