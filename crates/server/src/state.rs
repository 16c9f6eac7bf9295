use crate::config::ServerConfig;
use crate::error::ServerResult;
use jqgate::{Pipeline, Transformer};
use std::sync::Arc;

/// Shared application state
///
/// Read-only after startup: every request gets its own subordinate process,
/// nothing here is mutated per request.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Transcoding pipeline (shared across requests)
    pub pipeline: Pipeline,
}

impl ServerState {
    /// Create new server state backed by the configured `jq` binary
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let pipeline = Pipeline::new(config.pipeline.clone())?;
        Ok(Self::from_parts(config, pipeline))
    }

    /// Create server state around a caller-supplied transform capability
    pub fn with_transformer(
        config: ServerConfig,
        transformer: Arc<dyn Transformer>,
    ) -> ServerResult<Self> {
        let pipeline = Pipeline::with_transformer(config.pipeline.clone(), transformer)?;
        Ok(Self::from_parts(config, pipeline))
    }

    fn from_parts(config: ServerConfig, pipeline: Pipeline) -> Self {
        let pipeline = pipeline.with_span(tracing::info_span!(
            "jqgate",
            policy = ?config.pipeline.policy,
            jq = %config.pipeline.jq_path.display()
        ));
        Self {
            config: Arc::new(config),
            pipeline,
        }
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
