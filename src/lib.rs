//! JSON transformation gateway core.
//!
//! This crate holds the request/response transcoding pipeline shared by every
//! deployment of the gateway, whether it runs behind the standalone HTTP
//! listener (`crates/server`) or a serverless trigger ([`event`]):
//!
//! 1. **Decode** ([`request`]): read the `filter`, undo the base64 envelope
//!    and gzip/Brotli body encoding.
//! 2. **Validate** ([`document`]): parse the body as JSON and re-serialize
//!    it compactly.
//! 3. **Transform** ([`transform`]): run `jq` with the filter as a single
//!    argument and the document on stdin.
//! 4. **Encode** ([`response`]): compress the output per the deployment's
//!    [`CompressionPolicy`].
//!
//! ```rust,no_run
//! use jqgate::{CompressionPolicy, Pipeline, PipelineConfig, RawRequest};
//!
//! # async fn demo() -> Result<(), jqgate::ConfigError> {
//! let pipeline = Pipeline::new(PipelineConfig::new(CompressionPolicy::Plain))?;
//! let response = pipeline
//!     .handle(RawRequest::new(&b"[1,2,3]"[..]).with_filter(".[1]"))
//!     .await;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod encoding;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod transform;

pub use config::{CompressionPolicy, ConfigError, PipelineConfig};
pub use document::{canonicalize_json, CanonicalDocument};
pub use encoding::ContentEncoding;
pub use error::{PipelineError, TRANSFORM_ERROR_LABEL};
pub use event::{handle_event, handle_event_json, EventError, ProxyRequestEvent, ProxyResponseEvent};
pub use pipeline::Pipeline;
pub use request::{decode_request, IncomingRequest, RawRequest, Transport};
pub use response::{encode_response, OutgoingResponse};
pub use transform::{CommandTransformer, TransformError, Transformer};
