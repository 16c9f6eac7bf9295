use bytes::Bytes;
use serde_json::Value;

use crate::error::PipelineError;

/// A parsed JSON value together with its compact serialization.
///
/// The canonical bytes always re-parse to a value equal to [`value`](Self::value);
/// only whitespace and object key order may differ from what the client sent.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDocument {
    pub value: Value,
    pub canonical: Bytes,
}

impl CanonicalDocument {
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

/// Parse `body` as any JSON value and re-serialize it compactly.
pub fn canonicalize_json(body: &[u8]) -> Result<CanonicalDocument, PipelineError> {
    let value: Value = serde_json::from_slice(body).map_err(PipelineError::InvalidJson)?;
    let canonical = serde_json::to_vec(&value).map_err(PipelineError::SerializationFailed)?;
    Ok(CanonicalDocument {
        value,
        canonical: Bytes::from(canonical),
    })
}
