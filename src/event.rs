//! Serverless trigger adapter.
//!
//! Converts an API-Gateway-style proxy event into a [`RawRequest`], runs the
//! pipeline, and converts the result back into the proxy response envelope.
//! The envelope is text-only, so compressed bodies come back base64-encoded
//! with `isBase64Encoded` set.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::Pipeline;
use crate::request::{RawRequest, Transport};
use crate::response::OutgoingResponse;

const FILTER_PARAM: &str = "filter";
const CONTENT_ENCODING_HEADER: &str = "content-encoding";

#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed proxy event: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize proxy response: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Incoming proxy event. Absent maps arrive as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequestEvent {
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ProxyRequestEvent {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()?
            .get(name)
            .map(String::as_str)
    }

    pub fn into_raw_request(self) -> RawRequest {
        RawRequest {
            filter: self.query_param(FILTER_PARAM).map(str::to_owned),
            content_encoding: self.header(CONTENT_ENCODING_HEADER).map(str::to_owned),
            body: self.body.map(Bytes::from).unwrap_or_default(),
            is_base64_encoded: self.is_base64_encoded,
            transport: Transport::Envelope,
        }
    }
}

/// Outgoing proxy response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponseEvent {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl From<OutgoingResponse> for ProxyResponseEvent {
    fn from(resp: OutgoingResponse) -> Self {
        Self {
            status_code: resp.status,
            headers: resp
                .headers
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            body: String::from_utf8_lossy(&resp.body).into_owned(),
            is_base64_encoded: resp.is_envelope_encoded,
        }
    }
}

/// Run one proxy event through `pipeline`.
pub async fn handle_event(pipeline: &Pipeline, event: ProxyRequestEvent) -> ProxyResponseEvent {
    pipeline.handle(event.into_raw_request()).await.into()
}

/// Same as [`handle_event`], reading and writing the event as JSON.
pub async fn handle_event_json(pipeline: &Pipeline, event: &[u8]) -> Result<Vec<u8>, EventError> {
    let event: ProxyRequestEvent = serde_json::from_slice(event).map_err(EventError::Parse)?;
    let response = handle_event(pipeline, event).await;
    serde_json::to_vec(&response).map_err(EventError::Serialize)
}
