//! Error types for the rotating file channel

pub type Result<T> = std::result::Result<T, ChannelError>;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Unparseable size or interval attribute value
    #[error("invalid configuration for {component}: {message}")]
    InvalidConfig { component: String, message: String },

    /// Primary path is a directory or otherwise unopenable
    #[error("not a file: '{path}'")]
    NotAFile { path: String },

    /// Underlying write/flush/rename/unlink/stat failure
    #[error("IO error while {operation} on '{path}': {message}")]
    IoOperation {
        operation: String,
        path: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error without extra path/operation context
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Codec finalization or internal-state failure
    #[error("compression error for '{path}': {message}")]
    CompressionError { path: String, message: String },
}

impl ChannelError {
    pub fn invalid_config(component: impl Into<String>, message: impl Into<String>) -> Self {
        ChannelError::InvalidConfig {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn not_a_file(path: impl Into<String>) -> Self {
        ChannelError::NotAFile { path: path.into() }
    }

    pub fn io_operation(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ChannelError::IoOperation {
            operation: operation.into(),
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    pub fn compression(path: impl Into<String>, message: impl Into<String>) -> Self {
        ChannelError::CompressionError {
            path: path.into(),
            message: message.into(),
        }
    }
}
