//! Error types for control plane operations.
//!
//! [`Error`] covers the failure modes of the translation and discovery
//! pipeline and converts to [`tonic::Status`] for gRPC responses.

/// Error type for isobar operations.
///
/// Soft input errors (malformed annotations, dangling references) are not
/// represented here; those are logged at the point of observation and the
/// offending contribution is skipped. `Error` is reserved for conditions
/// that terminate a stream or the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid start-up configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// gRPC transport failure, including listener bind errors.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failing operation.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A discovery stream terminated.
    #[error("stream closed: {reason}")]
    StreamClosed {
        /// Reason for stream closure.
        reason: String,
    },

    /// A slow consumer overflowed its outbound queue.
    #[error("stream overloaded: {message}")]
    Overloaded {
        /// Description of the overloaded queue.
        message: String,
    },

    /// The shared stop signal fired.
    #[error("shutting down")]
    Shutdown,

    /// A supervised task failed outside of its own error path.
    #[error("task failed: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },

    /// Unexpected internal error.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a transport error from any error type.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error from any error type.
    pub fn internal<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        match &err {
            Error::Configuration(_) => tonic::Status::invalid_argument(err.to_string()),
            Error::Transport { .. } | Error::StreamClosed { .. } => {
                tonic::Status::unavailable(err.to_string())
            }
            Error::Overloaded { .. } => tonic::Status::resource_exhausted(err.to_string()),
            Error::Shutdown => tonic::Status::unavailable(err.to_string()),
            Error::Task { .. } | Error::Internal { .. } => tonic::Status::internal(err.to_string()),
        }
    }
}
