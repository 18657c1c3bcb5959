//! Error types for the host

use thiserror::Error;

/// Why a single request could not be served.
///
/// None of these stop the host: the dispatcher renders them into an
/// error-flagged response and keeps serving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown object: {0}")]
    UnknownObject(String),

    #[error("Missing object guid in command {0}")]
    MissingObject(String),

    #[error("Request names type {named} but {guid} is a {actual}")]
    TypeMismatch {
        named: String,
        guid: String,
        actual: String,
    },

    #[error("Command {command} is not declared for type {class}")]
    UnsupportedCommand { class: String, command: String },

    #[error("Scope member {member} of {class} cannot be called directly")]
    ScopeNotCallable { class: String, member: String },

    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    #[error("Result of type {0} has no identity and is not addressable")]
    UnaddressableResult(String),

    #[error("{0}")]
    Invocation(#[from] InvocationError),
}

/// Failure raised by a remote object while executing a member.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("{class} has no member {member}")]
    NoSuchMember { class: String, member: String },

    #[error("Invalid arguments for {member}: {reason}")]
    BadArguments { member: String, reason: String },

    #[error("{0}")]
    Failed(String),
}

impl InvocationError {
    pub fn no_such_member(class: &str, member: &str) -> Self {
        InvocationError::NoSuchMember {
            class: class.to_string(),
            member: member.to_string(),
        }
    }

    pub fn bad_arguments(member: &str, reason: impl Into<String>) -> Self {
        InvocationError::BadArguments {
            member: member.to_string(),
            reason: reason.into(),
        }
    }
}

/// Startup failures of the host process.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Specification error: {0}")]
    Spec(#[from] tether_spec::SpecError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Target {0} is not served by this host")]
    UnknownTarget(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
