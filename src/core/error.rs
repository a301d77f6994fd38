//! Engine error types

use thiserror::Error;

/// Errors that can occur while executing a single command
///
/// None of these are surfaced to the caller of `RlvEngine::process_chat`;
/// they are logged and the offending command is skipped.
#[derive(Error, Debug)]
pub enum RlvError {
    /// Reply channel did not parse or is not a positive channel
    #[error("Invalid reply channel: {0}")]
    InvalidChannel(String),

    /// Teleport coordinates did not parse
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Generic malformed argument (uuid, angle, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Folder path did not resolve under the shared folder
    #[error("Folder not found: {0}")]
    UnknownFolder(String),

    /// Attachment point name is not recognized
    #[error("Unknown attachment point: {0}")]
    UnknownAttachmentPoint(String),

    /// Wearable layer name is not recognized
    #[error("Unknown wearable layer: {0}")]
    UnknownWearable(String),

    /// The shared folder could not be fetched from the outfit collaborator
    #[error("Shared folder unavailable")]
    FolderUnavailable,

    /// An awaited collaborator call exceeded its bound
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The caller cancelled the command
    #[error("Command cancelled")]
    Cancelled,

    /// An external collaborator reported a failure
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The command grammar failed to compile
    #[error("Grammar error: {0}")]
    Grammar(#[from] regex::Error),
}

impl RlvError {
    /// Create an invalid argument error
    pub fn invalid(msg: impl Into<String>) -> Self {
        RlvError::InvalidArgument(msg.into())
    }

    /// Whether this error comes from bad input rather than from a collaborator
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            RlvError::InvalidChannel(_)
                | RlvError::InvalidCoordinates(_)
                | RlvError::InvalidArgument(_)
                | RlvError::UnknownFolder(_)
                | RlvError::UnknownAttachmentPoint(_)
                | RlvError::UnknownWearable(_)
        )
    }
}

/// Result type alias for engine operations
pub type RlvResult<T> = Result<T, RlvError>;
