//! Response encoder: applies the deployment's compression policy.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use crate::config::CompressionPolicy;
use crate::encoding;
use crate::error::PipelineError;
use crate::request::Transport;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Status, headers and body ready to hand back to a transport adapter.
///
/// When `is_envelope_encoded` is set the body holds base64 text of the
/// (compressed) payload rather than the payload itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
    pub is_envelope_encoded: bool,
}

impl OutgoingResponse {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Plain-text response for a pipeline error.
    pub fn from_error(err: &PipelineError) -> Self {
        Self {
            status: err.status_code(),
            headers: vec![(CONTENT_TYPE, TEXT_PLAIN.to_string())],
            body: Bytes::from(err.response_body()),
            is_envelope_encoded: false,
        }
    }
}

/// Build the success response for `output`.
///
/// Compression failures cannot change the status any more: they are logged
/// and whatever the encoder produced is sent as a truncated body.
pub fn encode_response(
    output: Bytes,
    policy: CompressionPolicy,
    request_header: Option<&str>,
    transport: Transport,
) -> OutgoingResponse {
    let encoding = policy.response_encoding(request_header);
    let mut headers = vec![(CONTENT_TYPE, APPLICATION_JSON.to_string())];

    let Some(token) = encoding.header_value() else {
        return OutgoingResponse {
            status: 200,
            headers,
            body: output,
            is_envelope_encoded: false,
        };
    };
    headers.push((CONTENT_ENCODING, token.to_string()));

    let compressed = match encoding::compress(encoding, &output) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(
                encoding = %encoding,
                error = %err.source,
                written = err.partial.len(),
                "response compression failed; body truncated"
            );
            err.partial
        }
    };

    match transport {
        Transport::Http => OutgoingResponse {
            status: 200,
            headers,
            body: Bytes::from(compressed),
            is_envelope_encoded: false,
        },
        Transport::Envelope => OutgoingResponse {
            status: 200,
            headers,
            body: Bytes::from(STANDARD.encode(compressed)),
            is_envelope_encoded: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::ContentEncoding;

    #[test]
    fn plain_policy_sets_only_content_type() {
        let resp = encode_response(
            Bytes::from_static(b"2\n"),
            CompressionPolicy::Plain,
            Some("gzip"),
            Transport::Http,
        );
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("content-type"), Some(APPLICATION_JSON));
        assert_eq!(resp.header("content-encoding"), None);
        assert_eq!(&resp.body[..], b"2\n");
        assert!(!resp.is_envelope_encoded);
    }

    #[test]
    fn mandatory_gzip_compresses_and_envelopes() {
        let resp = encode_response(
            Bytes::from_static(b"1\n"),
            CompressionPolicy::MandatoryGzip,
            Some("gzip"),
            Transport::Envelope,
        );
        assert_eq!(resp.header("Content-Encoding"), Some("gzip"));
        assert!(resp.is_envelope_encoded);
        let packed = STANDARD.decode(&resp.body).unwrap();
        let plain = encoding::decompress(ContentEncoding::Gzip, &packed, 1024).unwrap();
        assert_eq!(plain, b"1\n");
    }

    #[test]
    fn http_transport_sends_raw_compressed_bytes() {
        let resp = encode_response(
            Bytes::from_static(b"{\"k\":1}"),
            CompressionPolicy::MandatoryGzip,
            Some("gzip"),
            Transport::Http,
        );
        assert!(!resp.is_envelope_encoded);
        let plain = encoding::decompress(ContentEncoding::Gzip, &resp.body, 1024).unwrap();
        assert_eq!(plain, b"{\"k\":1}");
    }

    #[test]
    fn conditional_brotli_mirrors_request() {
        let resp = encode_response(
            Bytes::from_static(b"true\n"),
            CompressionPolicy::ConditionalBrotli,
            Some("br"),
            Transport::Http,
        );
        assert_eq!(resp.header("Content-Encoding"), Some("br"));
        let plain = encoding::decompress(ContentEncoding::Brotli, &resp.body, 1024).unwrap();
        assert_eq!(plain, b"true\n");

        let resp = encode_response(
            Bytes::from_static(b"true\n"),
            CompressionPolicy::ConditionalBrotli,
            None,
            Transport::Http,
        );
        assert_eq!(resp.header("Content-Encoding"), None);
        assert_eq!(&resp.body[..], b"true\n");
    }

    #[test]
    fn conditional_brotli_follows_marker_when_both_are_named() {
        let resp = encode_response(
            Bytes::from_static(b"[1]\n"),
            CompressionPolicy::ConditionalBrotli,
            Some("gzip, br"),
            Transport::Http,
        );
        assert_eq!(resp.header("Content-Encoding"), Some("br"));
        let plain = encoding::decompress(ContentEncoding::Brotli, &resp.body, 1024).unwrap();
        assert_eq!(plain, b"[1]\n");
    }

    #[test]
    fn error_response_is_plain_text() {
        let resp = OutgoingResponse::from_error(&PipelineError::MissingFilter);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.header("content-type"), Some(TEXT_PLAIN));
        assert_eq!(&resp.body[..], b"Missing 'filter' query parameter");
    }
}
