//! Pipeline configuration.
//!
//! A deployment picks one [`CompressionPolicy`] at startup; everything else
//! describes how to reach the external `jq` binary and how far to trust the
//! request body.
//!
//! ```toml
//! [pipeline]
//! policy = "mandatory_gzip"
//! jq_path = "/usr/bin/jq"
//! jq_args = []
//! transform_timeout_secs = 10
//! max_decompressed_bytes = 67108864
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoding::ContentEncoding;

/// Errors raised while validating a [`PipelineConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("jq_path must not be empty")]
    EmptyJqPath,

    #[error("transform_timeout_secs must be > 0 when set")]
    ZeroTimeout,

    #[error("max_decompressed_bytes must be > 0")]
    ZeroBodyLimit,
}

/// Request/response compression behaviour of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionPolicy {
    /// Bodies pass through uncompressed; compressed requests are still accepted.
    #[default]
    Plain,
    /// Requests must be gzip; responses are always gzip.
    MandatoryGzip,
    /// Responses are Brotli whenever the request's `Content-Encoding` names Brotli.
    ConditionalBrotli,
}

impl CompressionPolicy {
    /// Encoding a request must declare, if this policy mandates one.
    pub fn required_request_encoding(self) -> Option<ContentEncoding> {
        match self {
            CompressionPolicy::MandatoryGzip => Some(ContentEncoding::Gzip),
            CompressionPolicy::Plain | CompressionPolicy::ConditionalBrotli => None,
        }
    }

    /// Encoding applied to the response, given the request's raw
    /// `Content-Encoding` value. Only the marker matters here, not which
    /// codec the body was decoded with.
    pub fn response_encoding(self, request_header: Option<&str>) -> ContentEncoding {
        match self {
            CompressionPolicy::Plain => ContentEncoding::Identity,
            CompressionPolicy::MandatoryGzip => ContentEncoding::Gzip,
            CompressionPolicy::ConditionalBrotli
                if ContentEncoding::Brotli.is_named_in(request_header) =>
            {
                ContentEncoding::Brotli
            }
            CompressionPolicy::ConditionalBrotli => ContentEncoding::Identity,
        }
    }
}

/// Configuration for one [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Compression policy of this deployment.
    #[serde(default)]
    pub policy: CompressionPolicy,

    /// Program invoked for every request.
    #[serde(default = "default_jq_path")]
    pub jq_path: PathBuf,

    /// Arguments placed before the filter expression.
    #[serde(default)]
    pub jq_args: Vec<String>,

    /// Deadline for one transform; `None` lets the tool run to completion.
    #[serde(default)]
    pub transform_timeout_secs: Option<u64>,

    /// Upper bound on the decoded request body.
    #[serde(default = "default_max_decompressed_bytes")]
    pub max_decompressed_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy: CompressionPolicy::default(),
            jq_path: default_jq_path(),
            jq_args: Vec::new(),
            transform_timeout_secs: None,
            max_decompressed_bytes: default_max_decompressed_bytes(),
        }
    }
}

impl PipelineConfig {
    pub fn new(policy: CompressionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_transform_timeout(mut self, timeout: Duration) -> Self {
        self.transform_timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    pub fn transform_timeout(&self) -> Option<Duration> {
        self.transform_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jq_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyJqPath);
        }
        if self.transform_timeout_secs == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_decompressed_bytes == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }
        Ok(())
    }
}

fn default_jq_path() -> PathBuf {
    PathBuf::from("jq")
}

fn default_max_decompressed_bytes() -> usize {
    64 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.policy, CompressionPolicy::Plain);
        assert_eq!(cfg.jq_path, PathBuf::from("jq"));
        assert!(cfg.transform_timeout().is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let cfg = PipelineConfig {
            jq_path: PathBuf::new(),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyJqPath));

        let cfg = PipelineConfig {
            transform_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTimeout));

        let cfg = PipelineConfig {
            max_decompressed_bytes: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroBodyLimit));
    }

    #[test]
    fn policy_deserializes_from_snake_case() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"policy":"conditional_brotli"}"#).unwrap();
        assert_eq!(cfg.policy, CompressionPolicy::ConditionalBrotli);
        assert_eq!(cfg.max_decompressed_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn response_encoding_per_policy() {
        use ContentEncoding::*;
        let plain = CompressionPolicy::Plain;
        let gzip = CompressionPolicy::MandatoryGzip;
        let brotli = CompressionPolicy::ConditionalBrotli;

        assert_eq!(plain.response_encoding(Some("br")), Identity);
        assert_eq!(gzip.response_encoding(Some("gzip")), Gzip);
        assert_eq!(gzip.response_encoding(None), Gzip);
        assert_eq!(brotli.response_encoding(Some("br")), Brotli);
        assert_eq!(brotli.response_encoding(Some("gzip, br")), Brotli);
        assert_eq!(brotli.response_encoding(Some("gzip")), Identity);
        assert_eq!(brotli.response_encoding(None), Identity);

        assert_eq!(gzip.required_request_encoding(), Some(Gzip));
        assert_eq!(plain.required_request_encoding(), None);
    }
}
