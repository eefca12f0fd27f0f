//! Error taxonomy shared by the binding engine
//!
//! Nothing here is fatal to the host: profile errors degrade to the default
//! profile and dispatch errors degrade to a notice.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, saving or resolving profiles
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Persisted profile could not be parsed or failed validation
    #[error("profile '{name}' is corrupt: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("profile '{0}' not found")]
    NotFound(String),

    #[error("profile '{0}' already exists")]
    AlreadyExists(String),

    /// The store always keeps at least one profile
    #[error("cannot delete '{0}': it is the last remaining profile")]
    LastProfile(String),

    /// Profile references a device model that is not in the registry tables
    #[error("profile '{profile}' references unknown device model '{model}'")]
    UnknownModel { profile: String, model: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize profile '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors raised while parsing action identifiers and payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionParseError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("command '{command}' {reason}")]
    BadParameter { command: String, reason: String },

    #[error("invalid key sequence '{0}'")]
    BadKeySequence(String),
}

/// Errors raised while parsing a textual input reference (`btn:3`, `hat0:up`)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid input reference '{input}': {reason}")]
pub struct InputRefParseError {
    pub input: String,
    pub reason: String,
}

impl InputRefParseError {
    pub(crate) fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors produced by the action dispatcher
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The host raised an error while running a command
    #[error("{action} failed: {source}")]
    Host {
        action: String,
        #[source]
        source: anyhow::Error,
    },

    /// Action kind is handled by the engine, not the host
    #[error("action '{0}' cannot be dispatched to the host")]
    Unsupported(String),
}
