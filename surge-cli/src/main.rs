use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("surge=info")),
        )
        .init();

    cli::SurgeCli::parse().run().await
}
