//! jqgate Server - standalone HTTP listener
//!
//! Binds the configured port and dispatches every request to the shared
//! JSON transcoding pipeline.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;

    server::start_server(config).await?;

    Ok(())
}
