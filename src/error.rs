/*!
 * Error types for Tether
 */

use std::io;
use std::path::PathBuf;
use tether_connect::ConnectError;
use tether_spec::SpecError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TetherError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Error, Debug)]
pub enum TetherError {
    /// Specification could not be loaded
    #[error("Specification error: {0}")]
    Spec(#[from] SpecError),

    /// Host launch, transport or remote call failure
    #[error("{0}")]
    Connect(#[from] ConnectError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Script file missing or malformed
    #[error("Script error in {path}: {message}")]
    Script { path: PathBuf, message: String },

    /// A script step names a binding no earlier step created
    #[error("Step {step} refers to unknown binding {name}")]
    UnknownBinding { step: usize, name: String },

    /// A script step failed
    #[error("Step {step} ({call}) failed: {source}")]
    Step {
        step: usize,
        call: String,
        #[source]
        source: ConnectError,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TetherError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // Nothing ran: bad input or the host never came up
            TetherError::Spec(_)
            | TetherError::Config(_)
            | TetherError::Script { .. }
            | TetherError::Io(_) => EXIT_FATAL,
            TetherError::UnknownBinding { .. } => EXIT_PARTIAL,
            TetherError::Connect(e) if e.is_startup() => EXIT_FATAL,
            // A session ran but something in it failed
            TetherError::Connect(_) | TetherError::Step { .. } => EXIT_PARTIAL,
        }
    }

    /// Check if this error is fatal (the session could not be used at all)
    pub fn is_fatal(&self) -> bool {
        self.exit_code() == EXIT_FATAL
    }

    /// Check if this error is a failure reported by the host
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            TetherError::Connect(ConnectError::Remote(_))
                | TetherError::Step {
                    source: ConnectError::Remote(_),
                    ..
                }
        )
    }
}
