use anyhow::Result;
use site_localizer::{config, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("site_localizer=info".parse()?),
        )
        .init();

    info!("Starting site localizer");

    // Load configuration from environment
    let config = config::Config::from_env()?;

    server::run(config).await
}
