use crate::state::ServerState;
use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::header::CONTENT_ENCODING;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use jqgate::{OutgoingResponse, RawRequest, Transport};
use serde::Deserialize;
use std::sync::Arc;

/// Query string accepted by the transform endpoint
#[derive(Debug, Default, Deserialize)]
pub struct TransformQuery {
    /// jq filter expression, passed to jq as a single argument
    #[serde(default)]
    pub filter: Option<String>,
}

/// Run the request body through the transcoding pipeline.
///
/// `POST /?filter=<expr>` (also mounted at `/transform`). The body is JSON,
/// optionally gzip- or Brotli-compressed as declared by `Content-Encoding`.
/// The response body is the filter output, compressed according to the
/// deployment's compression policy; errors come back as plain text.
pub async fn transform(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<TransformQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let raw = RawRequest {
        filter: query.filter,
        content_encoding: headers
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body,
        is_base64_encoded: false,
        transport: Transport::Http,
    };

    into_http_response(state.pipeline.handle(raw).await)
}

/// Convert a pipeline response into an axum response.
pub fn into_http_response(outgoing: OutgoingResponse) -> Response {
    let status =
        StatusCode::from_u16(outgoing.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = Response::new(Body::from(outgoing.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in outgoing.headers {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "dropping unrepresentable response header"),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;

    #[test]
    fn headers_and_status_are_carried_over() {
        let resp = into_http_response(OutgoingResponse {
            status: 415,
            headers: vec![("Content-Type", "text/plain; charset=utf-8".to_string())],
            body: Bytes::from_static(b"nope"),
            is_envelope_encoded: false,
        });
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
