//! Error types for frame decoding and persistence.
//!
//! Almost every error in this crate is local: a malformed frame or a failed store call
//! is logged and the stream keeps going, so most variants are only ever observed through
//! [`Frame::fault`](crate::Frame::fault) or the worker's report. The one exception is
//! [`TelemetryError::ConfigurationFatal`], returned when the storage backend cannot be
//! opened at startup.
//!
//! ## Error Categories
//!
//! - **Frame Errors**: unknown spacecraft, unknown frame type, missing layouts, overruns
//! - **Segment Errors**: raw-to-field materialization failures
//! - **Storage Errors**: backend rejected a write, or could not be opened
//! - **Configuration Errors**: directory or decoder configuration could not be parsed
//!
//! ```rust
//! use foxtlm::TelemetryError;
//!
//! let error = TelemetryError::storage_failed("insert rttelemetry");
//! assert!(error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Spacecraft id {id} is not configured in the spacecraft directory")]
    UnknownSpacecraft { id: u32 },

    #[error("Frame type {frame_type} is not valid for spacecraft {spacecraft_id}")]
    UnknownFrameType { spacecraft_id: u32, frame_type: u8 },

    #[error("Spacecraft {spacecraft_id} has no '{layout}' layout")]
    MissingLayout { spacecraft_id: u32, layout: String },

    #[error("Byte offered past the end of a {frame_size} byte frame")]
    ProtocolOverrun { frame_size: usize },

    #[error("Failed to decode {segment} segment: {details}")]
    SegmentDecode { segment: String, details: String },

    #[error("Storage write failed: {operation}")]
    Storage {
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Storage backend unavailable: {reason}")]
    ConfigurationFatal {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error in {context}: {details}")]
    Config { context: String, details: String },

    #[error("Telemetry file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Background task '{task}' failed: {details}")]
    TaskFailed { task: String, details: String },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Storage { .. } => true,
            TelemetryError::Timeout { .. } => true,
            TelemetryError::UnknownSpacecraft { .. } => false,
            TelemetryError::UnknownFrameType { .. } => false,
            TelemetryError::MissingLayout { .. } => false,
            TelemetryError::ProtocolOverrun { .. } => false,
            TelemetryError::SegmentDecode { .. } => false,
            TelemetryError::ConfigurationFatal { .. } => false,
            TelemetryError::Config { .. } => false,
            TelemetryError::File { .. } => false,
            TelemetryError::TaskFailed { .. } => false,
        }
    }

    /// Returns whether the decode path can keep running after this error.
    ///
    /// Only a backend that cannot be reached at startup stops the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TelemetryError::ConfigurationFatal { .. })
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::UnknownSpacecraft { .. } => vec![
                "Add the spacecraft to the spacecraft directory",
                "Check the receiver is tuned to the expected spacecraft",
            ],
            TelemetryError::UnknownFrameType { .. } => vec![
                "Check the spacecraft kind in the spacecraft directory",
                "Verify the frame format matches the downlink mode",
            ],
            TelemetryError::MissingLayout { .. } => vec![
                "Add the missing layout to the spacecraft directory",
                "Check the layout name spelling",
            ],
            TelemetryError::ProtocolOverrun { .. } => vec![
                "Start a new frame once the declared frame size is reached",
                "Check the deframer is using the right frame format",
            ],
            TelemetryError::SegmentDecode { .. } => vec![
                "Check layout field widths fit the segment size",
                "Verify source data integrity",
            ],
            TelemetryError::Storage { .. } => vec![
                "Check storage backend health",
                "Ensure sufficient disk space",
                "Replay the recording once storage is available",
            ],
            TelemetryError::ConfigurationFatal { .. } => vec![
                "Check no other decoder instance holds the store",
                "Verify storage location permissions",
                "Restart the application",
            ],
            TelemetryError::Config { .. } => vec![
                "Check the YAML syntax",
                "Compare against the documented configuration fields",
            ],
            TelemetryError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            TelemetryError::Timeout { .. } => vec![
                "Increase timeout duration",
                "Check system performance",
            ],
            TelemetryError::TaskFailed { .. } => vec![
                "Check the log for a panic in the decode or store task",
                "Restart the session",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::File { path, source }
    }

    /// Helper constructor for storage write failures.
    pub fn storage_failed(operation: impl Into<String>) -> Self {
        TelemetryError::Storage { operation: operation.into(), source: None }
    }

    /// Helper constructor for storage write failures with source.
    pub fn storage_failed_with_source(
        operation: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Storage { operation: operation.into(), source: Some(source) }
    }

    /// Helper constructor for a backend that could not be opened.
    pub fn backend_unavailable(reason: impl Into<String>) -> Self {
        TelemetryError::ConfigurationFatal { reason: reason.into(), source: None }
    }

    /// Helper constructor for segment decode failures.
    pub fn segment_decode(segment: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::SegmentDecode { segment: segment.into(), details: details.into() }
    }

    /// Helper constructor for a background task that panicked or was aborted.
    pub fn task_failed(task: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::TaskFailed { task: task.into(), details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Config { context: context.into(), details: details.into() }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for TelemetryError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TelemetryError::Config { context: "YAML".to_string(), details: err.to_string() }
    }
}
