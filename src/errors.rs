/*!
 * Error types for the lexiflow pipeline.
 *
 * This module contains custom error types for the different layers of the
 * annotation pipeline, using the thiserror crate for ergonomic error definitions.
 * Only `AnnotationError::Cancelled` and `AnnotationError::InvalidInput` ever
 * reach a caller of `AnnotationPipeline::annotate`; everything else is absorbed
 * into a degraded result.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors surfaced by a `TranslationPort` implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    /// The backend needs a user gesture (or credentials) before it can run
    #[error("Translation backend requires an interactive trigger: {0}")]
    InteractionRequired(String),

    /// The backend is down or the request failed
    #[error("Translation backend unavailable: {0}")]
    Unavailable(String),
}

impl From<ProviderError> for PortError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::AuthenticationError(msg) => Self::InteractionRequired(msg),
            ProviderError::ApiError { status_code, message } if status_code == 401 || status_code == 403 => {
                Self::InteractionRequired(format!("{} - {}", status_code, message))
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Errors produced while proposing phrase chunks for a segment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// The chunk source could not split the segment
    #[error("Chunking failed: {0}")]
    Failed(String),

    /// Cancellation was observed before the chunker ran
    #[error("Chunking cancelled")]
    Cancelled,
}

/// Errors produced by the annotation pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    /// The caller cancelled the run; progress already emitted stays valid
    #[error("Annotation cancelled")]
    Cancelled,

    /// The input was rejected before detection started
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single segment could not be processed; absorbed into a fallback chunk
    #[error("Segment {index} processing failed: {reason}")]
    SegmentProcessingFailed {
        /// Index of the segment in document order
        index: usize,
        /// Why processing failed
        reason: String,
    },
}

impl AnnotationError {
    /// Whether this error aborts the whole call
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::InvalidInput(_))
    }
}
