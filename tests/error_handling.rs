mod common;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use common::FakeJq;
use jqgate::encoding::compress;
use jqgate::{
    handle_event_json, CompressionPolicy, ContentEncoding, EventError, Pipeline, PipelineConfig,
    PipelineError, RawRequest, TransformError, Transformer,
};
use serde_json::{json, Value};

fn pipeline(policy: CompressionPolicy) -> Pipeline {
    Pipeline::with_transformer(PipelineConfig::new(policy), Arc::new(FakeJq)).unwrap()
}

async fn event_response(pipeline: &Pipeline, event: Value) -> Value {
    let bytes = handle_event_json(pipeline, &serde_json::to_vec(&event).unwrap())
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn malformed_event_json_is_reported() {
    let pipeline = pipeline(CompressionPolicy::Plain);
    let err = handle_event_json(&pipeline, b"{\"body\": ").await.unwrap_err();
    assert!(matches!(err, EventError::Parse(_)));
}

#[tokio::test]
async fn null_query_parameters_mean_missing_filter() {
    let pipeline = pipeline(CompressionPolicy::MandatoryGzip);
    let resp = event_response(
        &pipeline,
        json!({"queryStringParameters": null, "headers": null, "body": "{}"}),
    )
    .await;
    assert_eq!(resp["statusCode"], 400);
    assert_eq!(resp["body"], "Missing 'filter' query parameter");
    assert_eq!(resp["isBase64Encoded"], false);
}

#[tokio::test]
async fn bad_base64_envelope_is_400() {
    let pipeline = pipeline(CompressionPolicy::MandatoryGzip);
    let resp = event_response(
        &pipeline,
        json!({
            "queryStringParameters": {"filter": "."},
            "headers": {"content-encoding": "gzip"},
            "body": "***",
            "isBase64Encoded": true
        }),
    )
    .await;
    assert_eq!(resp["statusCode"], 400);
    assert_eq!(resp["body"], "Failed to decode base64 body");
}

#[tokio::test]
async fn envelope_without_gzip_header_is_415() {
    let pipeline = pipeline(CompressionPolicy::MandatoryGzip);
    let packed = compress(ContentEncoding::Gzip, b"{}").unwrap();
    let resp = event_response(
        &pipeline,
        json!({
            "queryStringParameters": {"filter": "."},
            "headers": {"content-type": "application/json"},
            "body": STANDARD.encode(packed),
            "isBase64Encoded": true
        }),
    )
    .await;
    assert_eq!(resp["statusCode"], 415);
    assert_eq!(
        resp["body"],
        "Only gzip-compressed request bodies are accepted. Please set Content-Encoding: gzip."
    );
}

#[tokio::test]
async fn gzip_marker_is_a_substring_match() {
    let pipeline = pipeline(CompressionPolicy::MandatoryGzip);
    let packed = compress(ContentEncoding::Gzip, br#"{"k":"v"}"#).unwrap();
    let resp = pipeline
        .handle(
            RawRequest::new(packed)
                .with_filter(".k")
                .with_content_encoding("x-gzip"),
        )
        .await;
    assert_eq!(resp.status, 200);
}

#[tokio::test]
async fn invalid_json_after_decompression_is_400() {
    let pipeline = pipeline(CompressionPolicy::MandatoryGzip);
    let packed = compress(ContentEncoding::Gzip, b"{\"a\": tru").unwrap();
    let err = pipeline
        .run(
            RawRequest::new(packed)
                .with_filter(".a")
                .with_content_encoding("gzip"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidJson(_)));
    assert_eq!(err.status_code(), 400);
}

struct Hang;

#[async_trait::async_trait]
impl Transformer for Hang {
    async fn transform(&self, _: &str, _: bytes::Bytes) -> Result<bytes::Bytes, TransformError> {
        Err(TransformError::TimedOut {
            after: std::time::Duration::from_secs(1),
        })
    }
}

#[tokio::test]
async fn transform_timeout_is_504() {
    let pipeline =
        Pipeline::with_transformer(PipelineConfig::default(), Arc::new(Hang)).unwrap();
    let resp = pipeline
        .handle(RawRequest::new(&b"{}"[..]).with_filter("."))
        .await;
    assert_eq!(resp.status, 504);
    assert!(std::str::from_utf8(&resp.body)
        .unwrap()
        .starts_with("jq error: "));
}

#[tokio::test]
async fn every_error_response_is_plain_text() {
    let pipeline = pipeline(CompressionPolicy::Plain);
    for raw in [
        RawRequest::new(&b"{}"[..]),
        RawRequest::new(&b"nope"[..]).with_filter("."),
        RawRequest::new(&b"{}"[..]).with_filter(".[["),
        RawRequest::new(&b"!!"[..]).with_filter(".").base64_enveloped(true),
    ] {
        let resp = pipeline.handle(raw).await;
        assert!(resp.status >= 400);
        assert_eq!(resp.header("Content-Type"), Some("text/plain; charset=utf-8"));
        assert_eq!(resp.header("Content-Encoding"), None);
    }
}
