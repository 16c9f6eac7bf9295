//! Error taxonomy for the transcoding pipeline.
//!
//! Every variant is terminal for the request that raised it. Each one maps
//! to exactly one HTTP status and a short plain-text body; the body is what
//! the caller sees, the `Display` form is what ends up in the logs.
//!
//! | Error | Status | Raised by |
//! |-------|--------|-----------|
//! | [`MissingFilter`](PipelineError::MissingFilter) | 400 | request decoder |
//! | [`UnsupportedEncoding`](PipelineError::UnsupportedEncoding) | 415 | request decoder |
//! | [`MalformedEnvelope`](PipelineError::MalformedEnvelope) | 400 | request decoder |
//! | [`DecompressionFailed`](PipelineError::DecompressionFailed) | 400 | request decoder |
//! | [`PayloadTooLarge`](PipelineError::PayloadTooLarge) | 413 | request decoder |
//! | [`InvalidJson`](PipelineError::InvalidJson) | 400 | JSON validator |
//! | [`SerializationFailed`](PipelineError::SerializationFailed) | 500 | JSON validator |
//! | [`Transform`](PipelineError::Transform) | 500 / 504 | transform invoker |
//!
//! Failures while compressing the outgoing body are deliberately absent:
//! by then the status is committed, so they are logged and the body is
//! truncated instead.

use thiserror::Error;

use crate::encoding::ContentEncoding;
use crate::transform::TransformError;

/// Label prepended to every diagnostic coming back from the external tool.
pub const TRANSFORM_ERROR_LABEL: &str = "jq error: ";

/// Errors that stop a request somewhere between decode and transform.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The `filter` query parameter is absent or empty.
    #[error("missing 'filter' query parameter")]
    MissingFilter,

    /// The deployment mandates a body encoding the request did not declare.
    #[error("request Content-Encoding does not satisfy mandatory {required}")]
    UnsupportedEncoding { required: ContentEncoding },

    /// The base64 envelope around the body could not be decoded.
    #[error("failed to decode base64 body: {0}")]
    MalformedEnvelope(#[from] base64::DecodeError),

    /// The body claimed a compression codec but the stream is corrupt.
    #[error("failed to read {encoding}-compressed request body: {source}")]
    DecompressionFailed {
        encoding: ContentEncoding,
        #[source]
        source: std::io::Error,
    },

    /// The decoded body grew past the configured bound.
    #[error("decoded request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The decoded body is not well-formed JSON.
    #[error("invalid JSON input: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// A value that parsed successfully could not be written back out.
    #[error("failed to prepare JSON: {0}")]
    SerializationFailed(#[source] serde_json::Error),

    /// The external filter tool failed, timed out, or could not be started.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl PipelineError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::MissingFilter
            | PipelineError::MalformedEnvelope(_)
            | PipelineError::DecompressionFailed { .. }
            | PipelineError::InvalidJson(_) => 400,
            PipelineError::PayloadTooLarge { .. } => 413,
            PipelineError::UnsupportedEncoding { .. } => 415,
            PipelineError::SerializationFailed(_) => 500,
            PipelineError::Transform(TransformError::TimedOut { .. }) => 504,
            PipelineError::Transform(_) => 500,
        }
    }

    /// Short stable identifier, used as a structured log field.
    pub fn error_code(&self) -> &'static str {
        match self {
            PipelineError::MissingFilter => "MISSING_FILTER",
            PipelineError::UnsupportedEncoding { .. } => "UNSUPPORTED_ENCODING",
            PipelineError::MalformedEnvelope(_) => "MALFORMED_ENVELOPE",
            PipelineError::DecompressionFailed { .. } => "DECOMPRESSION_FAILED",
            PipelineError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            PipelineError::InvalidJson(_) => "INVALID_JSON",
            PipelineError::SerializationFailed(_) => "SERIALIZATION_FAILED",
            PipelineError::Transform(TransformError::Failed { .. }) => "TRANSFORM_FAILED",
            PipelineError::Transform(TransformError::TimedOut { .. }) => "TRANSFORM_TIMED_OUT",
            PipelineError::Transform(TransformError::Unavailable(_)) => "TRANSFORM_UNAVAILABLE",
        }
    }

    /// Plain-text body returned to the caller.
    pub fn response_body(&self) -> String {
        match self {
            PipelineError::MissingFilter => "Missing 'filter' query parameter".to_string(),
            PipelineError::UnsupportedEncoding { required } => format!(
                "Only {required}-compressed request bodies are accepted. \
                 Please set Content-Encoding: {required}."
            ),
            PipelineError::MalformedEnvelope(_) => "Failed to decode base64 body".to_string(),
            PipelineError::DecompressionFailed { encoding, .. } => {
                format!("Failed to read {encoding}-compressed request body")
            }
            PipelineError::PayloadTooLarge { limit } => {
                format!("Decoded request body exceeds {limit} bytes")
            }
            PipelineError::InvalidJson(err) => format!("Invalid JSON input: {err}"),
            PipelineError::SerializationFailed(_) => "Failed to prepare JSON".to_string(),
            PipelineError::Transform(TransformError::Failed { diagnostic, .. }) => {
                format!("{TRANSFORM_ERROR_LABEL}{diagnostic}")
            }
            PipelineError::Transform(err) => format!("{TRANSFORM_ERROR_LABEL}{err}"),
        }
    }
}
