//! Relay server bootstrap.
//!
//! Binds the TypeRace relay on `0.0.0.0:$PORT` (default 3000). Failing
//! to bind is the only fatal error in the system; everything after that
//! is per-connection and logged, never fatal.

use tracing_subscriber::EnvFilter;
use typerace::RelayServerBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let server = RelayServerBuilder::new().bind(&addr).build().await?;
    tracing::info!(%addr, "TypeRace relay ready");

    server.run().await?;
    Ok(())
}
