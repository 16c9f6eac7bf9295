use std::sync::Arc;
use std::time::Instant;

use tracing::{field, Instrument, Span};

use crate::config::{ConfigError, PipelineConfig};
use crate::document::canonicalize_json;
use crate::error::PipelineError;
use crate::request::{decode_request, RawRequest};
use crate::response::{encode_response, OutgoingResponse};
use crate::transform::{CommandTransformer, Transformer};

/// Decode → validate → transform → encode, parameterised once at startup.
///
/// A `Pipeline` is cheap to clone and holds no per-request state, so one
/// instance serves every concurrent request. Log records are emitted inside
/// the span supplied at construction.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    transformer: Arc<dyn Transformer>,
    span: Span,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline that shells out to the program named in `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let transformer = Arc::new(CommandTransformer::from_config(&config));
        Self::with_transformer(config, transformer)
    }

    /// Pipeline with a caller-supplied transform capability.
    pub fn with_transformer(
        config: PipelineConfig,
        transformer: Arc<dyn Transformer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let span = tracing::info_span!("pipeline", policy = ?config.policy);
        Ok(Self {
            config: Arc::new(config),
            transformer,
            span,
        })
    }

    /// Replace the parent span under which requests are logged.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one request to completion. Errors become plain-text responses.
    pub async fn handle(&self, raw: RawRequest) -> OutgoingResponse {
        let span = tracing::info_span!(parent: &self.span, "transform_request", filter = field::Empty);
        if let Some(filter) = raw.filter.as_deref() {
            span.record("filter", filter);
        }
        async move {
            let start = Instant::now();
            match self.run(raw).await {
                Ok(response) => {
                    tracing::info!(
                        status = response.status,
                        bytes = response.body.len(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "request transformed"
                    );
                    response
                }
                Err(err) => {
                    let status = err.status_code();
                    if status >= 500 {
                        tracing::error!(status, code = err.error_code(), error = %err, "request failed");
                    } else {
                        tracing::warn!(status, code = err.error_code(), error = %err, "request rejected");
                    }
                    OutgoingResponse::from_error(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run one request, surfacing the first stage error.
    pub async fn run(&self, raw: RawRequest) -> Result<OutgoingResponse, PipelineError> {
        let request = decode_request(raw, &self.config)?;
        tracing::debug!(
            encoding = %request.content_encoding,
            enveloped = request.is_envelope_encoded,
            body_bytes = request.body.len(),
            "request decoded"
        );

        let document = canonicalize_json(&request.body)?;
        let output = self
            .transformer
            .transform(&request.filter, document.canonical)
            .await?;

        Ok(encode_response(
            output,
            self.config.policy,
            request.content_encoding_header.as_deref(),
            request.transport,
        ))
    }
}
