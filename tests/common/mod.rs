//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use jqgate::{TransformError, Transformer};
use serde_json::Value;

/// Understands `.`, `.key` and `.[n]`; anything else is a syntax error,
/// reported the way jq reports it.
pub struct FakeJq;

pub const SYNTAX_ERROR: &str =
    "jq: error: syntax error, unexpected INVALID_CHARACTER (Unix shell quoting issues?) at <top-level>, line 1:\n";

#[async_trait]
impl Transformer for FakeJq {
    async fn transform(&self, filter: &str, input: Bytes) -> Result<Bytes, TransformError> {
        let value: Value = serde_json::from_slice(&input).map_err(|err| TransformError::Failed {
            exit_code: Some(2),
            diagnostic: format!("jq: error (at <stdin>:0): {err}\n"),
        })?;

        let selected = if filter == "." {
            value
        } else if let Some(index) = filter
            .strip_prefix(".[")
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(|n| n.parse::<usize>().ok())
        {
            value.get(index).cloned().unwrap_or(Value::Null)
        } else if let Some(key) = filter
            .strip_prefix('.')
            .filter(|key| !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        {
            value.get(key).cloned().unwrap_or(Value::Null)
        } else {
            return Err(TransformError::Failed {
                exit_code: Some(3),
                diagnostic: SYNTAX_ERROR.to_string(),
            });
        };

        let mut out = serde_json::to_vec(&selected).expect("value serializes");
        out.push(b'\n');
        Ok(Bytes::from(out))
    }
}
