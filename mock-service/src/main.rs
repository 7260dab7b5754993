use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mock_service=info")),
        )
        .init();

    tokio::task::spawn(async { mock_service::tps_measure_task().await });

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    mock_service::run(addr).await;
}
