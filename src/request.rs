//! Request decoder: filter extraction and transport-level body decoding.
//!
//! Order matters and matches what clients have always relied on: the filter
//! is checked first, then the mandatory encoding (if any), then the base64
//! envelope, then decompression. JSON structure is never looked at here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use crate::config::PipelineConfig;
use crate::encoding::{self, ContentEncoding, DecompressError};
use crate::error::PipelineError;

/// How the response body travels back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Raw bytes on an HTTP connection.
    #[default]
    Http,
    /// A text-only trigger envelope; binary bodies must be base64-encoded.
    Envelope,
}

/// Request exactly as a transport adapter observed it.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub filter: Option<String>,
    pub content_encoding: Option<String>,
    pub body: Bytes,
    pub is_base64_encoded: bool,
    pub transport: Transport,
}

impl RawRequest {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_content_encoding(mut self, value: impl Into<String>) -> Self {
        self.content_encoding = Some(value.into());
        self
    }

    pub fn base64_enveloped(mut self, enveloped: bool) -> Self {
        self.is_base64_encoded = enveloped;
        self
    }

    pub fn via(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }
}

/// Decoded request: filter plus the plain body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub filter: String,
    pub body: Bytes,
    pub content_encoding: ContentEncoding,
    /// `Content-Encoding` exactly as received, kept for the response policy.
    pub content_encoding_header: Option<String>,
    pub is_envelope_encoded: bool,
    pub transport: Transport,
}

/// Undo every transport-level transform applied to `raw`.
pub fn decode_request(
    raw: RawRequest,
    cfg: &PipelineConfig,
) -> Result<IncomingRequest, PipelineError> {
    let filter = match raw.filter {
        Some(filter) if !filter.is_empty() => filter,
        _ => return Err(PipelineError::MissingFilter),
    };

    let content_encoding = ContentEncoding::detect(raw.content_encoding.as_deref());
    if let Some(required) = cfg.policy.required_request_encoding() {
        if content_encoding != required {
            return Err(PipelineError::UnsupportedEncoding { required });
        }
    }

    let body = if raw.is_base64_encoded {
        Bytes::from(STANDARD.decode(&raw.body)?)
    } else {
        raw.body
    };

    let body = if content_encoding.is_compressed() {
        encoding::decompress(content_encoding, &body, cfg.max_decompressed_bytes)
            .map(Bytes::from)
            .map_err(|err| match err {
                DecompressError::Corrupt(source) => PipelineError::DecompressionFailed {
                    encoding: content_encoding,
                    source,
                },
                DecompressError::LimitExceeded { limit } => {
                    PipelineError::PayloadTooLarge { limit }
                }
            })?
    } else if body.len() > cfg.max_decompressed_bytes {
        return Err(PipelineError::PayloadTooLarge {
            limit: cfg.max_decompressed_bytes,
        });
    } else {
        body
    };

    Ok(IncomingRequest {
        filter,
        body,
        content_encoding,
        content_encoding_header: raw.content_encoding,
        is_envelope_encoded: raw.is_base64_encoded,
        transport: raw.transport,
    })
}
