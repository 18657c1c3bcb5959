//! Error types for specification loading

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for specification operations
pub type Result<T> = std::result::Result<T, SpecError>;

/// A specification that is absent or malformed.
///
/// Every variant is fatal at startup: nothing can be dispatched without a
/// valid specification.
#[derive(Error, Debug)]
pub enum SpecError {
    /// Specification file does not exist
    #[error("Specification not found: {path}")]
    NotFound { path: PathBuf },

    /// I/O error while reading the specification
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON document could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML document could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The same class is declared twice
    #[error("Class declared more than once: {0}")]
    DuplicateClass(String),

    /// A member name is repeated within one class
    #[error("Member {member} declared more than once in class {class}")]
    DuplicateMember { class: String, member: String },

    /// A class or member has an empty name
    #[error("Empty name in class {0:?}")]
    EmptyName(String),
}
