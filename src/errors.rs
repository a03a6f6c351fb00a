//! Centralized error handling for dc_chunker
//!
//! Every fallible operation in the crate returns [`ChunkerError`] through the
//! [`Result`] alias. Failures are immediate input-validation errors; nothing is
//! retried.

use std::fmt;

/// Main error type for chunking and recombination operations
#[derive(Debug)]
pub enum ChunkerError {
    /// A required coordinate range was not supplied
    MissingRange { axis: String },

    /// A coordinate range endpoint is not a finite number
    InvalidRange { axis: String, message: String },

    /// Chunk size (geographic area or temporal batch size) is unusable
    InvalidChunkSize { message: String },

    /// The combiner was handed no chunks
    EmptyChunkSequence,

    /// Datasets disagree on which coordinate axes they carry
    AxisMismatch { message: String },

    /// A data variable does not match its dataset's coordinate axes
    ShapeMismatch {
        variable: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A coordinate axis repeats a label or holds NaN
    DuplicateCoordinate { axis: String },

    /// Month outside 1..=12
    InvalidMonth(u32),

    /// Sliding window length of zero
    InvalidWindowLength,

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// JSON rendering error
    JsonError(serde_json::Error),
}

impl fmt::Display for ChunkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkerError::MissingRange { axis } => {
                write!(f, "Missing {} range: longitude and latitude are both required", axis)
            }
            ChunkerError::InvalidRange { axis, message } => {
                write!(f, "Invalid {} range: {}", axis, message)
            }
            ChunkerError::InvalidChunkSize { message } => write!(f, "Invalid chunk size: {}", message),
            ChunkerError::EmptyChunkSequence => {
                write!(f, "Cannot combine an empty sequence of chunks")
            }
            ChunkerError::AxisMismatch { message } => write!(f, "Axis mismatch: {}", message),
            ChunkerError::ShapeMismatch {
                variable,
                expected,
                actual,
            } => write!(
                f,
                "Variable '{}' has shape {:?}, expected {:?} from its coordinates",
                variable, actual, expected
            ),
            ChunkerError::DuplicateCoordinate { axis } => {
                write!(f, "Coordinate '{}' contains duplicate or NaN labels", axis)
            }
            ChunkerError::InvalidMonth(month) => {
                write!(f, "Invalid month {}: expected a value in 1..=12", month)
            }
            ChunkerError::InvalidWindowLength => {
                write!(f, "Window length must be at least 1")
            }
            ChunkerError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            ChunkerError::JsonError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ChunkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChunkerError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ChunkerError {
    fn from(error: serde_json::Error) -> Self {
        ChunkerError::JsonError(error)
    }
}

/// Result type alias for dc_chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;
