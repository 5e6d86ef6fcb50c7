//! Snapshot error types.

use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// A fault reported by the snapshot service boundary.
///
/// `code` is the symbolic error name used by the service (for snapper this is
/// the D-Bus error name, e.g. `error.unknown_config`), `message` is the raw
/// diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ServiceFault {
    pub code: String,
    pub message: String,
}

impl ServiceFault {
    /// Code reported when the requested configuration does not exist.
    pub const UNKNOWN_CONFIG: &'static str = "error.unknown_config";

    /// Code reported when a snapshot number does not exist.
    pub const ILLEGAL_SNAPSHOT: &'static str = "error.illegal_snapshot";

    /// Code used when the boundary failed without naming an error.
    pub const UNKNOWN: &'static str = "error.unknown";

    /// Create a fault with the given code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot service does not know the configuration.
    #[error("Unknown configuration '{0}'")]
    UnknownConfig(String),

    /// The snapshot service rejected a snapshot number.
    #[error("Invalid snapshot in configuration '{config}'")]
    InvalidSnapshot { config: String },

    /// Any other service fault, with the raw diagnostic.
    #[error("Error encountered while {context}: {fault}")]
    Service {
        context: String,
        #[source]
        fault: ServiceFault,
    },

    /// The configuration has no snapshots to default to.
    #[error("No snapshots found in configuration '{0}'")]
    NoSnapshots(String),

    /// Bad argument combination.
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// An undo request named files outside the changed set.
    #[error(
        "Given file list contains files that are not present in the changed file list: {}",
        .0.join(", ")
    )]
    FilesNotChanged(Vec<String>),

    /// No pre/post pair is tagged with the job.
    #[error("No snapshot found for job '{job_id}' in configuration '{config}'")]
    JobNotFound { job_id: String, config: String },

    /// More than one pre or post snapshot is tagged with the job.
    #[error("Job '{job_id}' is ambiguous: pre snapshots {pre:?}, post snapshots {post:?}")]
    AmbiguousJob {
        job_id: String,
        pre: Vec<u32>,
        post: Vec<u32>,
    },

    /// Malformed service record.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A snapshot owner uid has no account.
    #[error("Cannot resolve user id {0}")]
    UnknownUser(u32),

    /// The revert command printed a token that is not `key:value`.
    #[error("Malformed undo output token '{0}'")]
    MalformedUndoOutput(String),

    /// The revert command failed.
    #[error("Undo command failed: {0}")]
    UndoFailed(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SnapshotError {
    /// Map a service fault onto a typed error.
    ///
    /// `context` describes the operation ("listing snapshots") and is only
    /// used for faults that have no dedicated variant.
    pub fn from_fault(fault: ServiceFault, config: &str, context: &str) -> Self {
        match fault.code.as_str() {
            ServiceFault::UNKNOWN_CONFIG => Self::UnknownConfig(config.to_string()),
            ServiceFault::ILLEGAL_SNAPSHOT => Self::InvalidSnapshot {
                config: config.to_string(),
            },
            _ => Self::Service {
                context: context.to_string(),
                fault,
            },
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Check if this error came from the snapshot service.
    pub fn is_service(&self) -> bool {
        matches!(
            self,
            Self::UnknownConfig(_) | Self::InvalidSnapshot { .. } | Self::Service { .. }
        )
    }

    /// Check if this error is an argument validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::FilesNotChanged(_) | Self::NoSnapshots(_)
        )
    }

    /// Check if this error is a job correlation failure.
    pub fn is_correlation(&self) -> bool {
        matches!(self, Self::JobNotFound { .. } | Self::AmbiguousJob { .. })
    }

    /// Check if this error is a decode failure.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::UnknownUser(_) | Self::MalformedUndoOutput(_)
        )
    }
}

/// Extension for attaching config context to raw service results.
pub(crate) trait FaultContext<T> {
    fn in_config(self, config: &str, context: &str) -> SnapshotResult<T>;
}

impl<T> FaultContext<T> for Result<T, ServiceFault> {
    fn in_config(self, config: &str, context: &str) -> SnapshotResult<T> {
        self.map_err(|fault| SnapshotError::from_fault(fault, config, context))
    }
}
