//! jqgate Server - standalone HTTP listener for the JSON transcoding pipeline
//!
//! Every `POST /` (or `POST /transform`) request is run through one shared
//! [`jqgate::Pipeline`]: the body is decoded, validated as JSON, piped
//! through `jq` with the `filter` query parameter, and re-encoded according
//! to the configured compression policy.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! - `GET /` - API information
//! - `POST /?filter=<expr>` - Transform a JSON body
//! - `POST /transform?filter=<expr>` - Same as above
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe with pipeline settings
//!
//! # Configuration
//!
//! Settings come from an optional `server.{toml,yaml,json}` file and
//! `JQGATE_SERVER__*` environment variables, e.g.
//! `JQGATE_SERVER__PIPELINE__POLICY=mandatory_gzip`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
