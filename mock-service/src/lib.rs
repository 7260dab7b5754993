use axum::{
    debug_handler,
    extract::Path,
    http::StatusCode,
    routing::get,
    Router,
};
#[allow(unused)]
use metrics::{counter, gauge, histogram};
use rand::Rng;
use std::net::SocketAddr;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

pub fn router() -> Router {
    Router::new()
        .route("/delay/ms/:delay_ms", get(delay).post(delay))
        .route(
            "/flaky/:error_percent/delay/ms/:delay_ms",
            get(flaky).post(flaky),
        )
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Unable to bind {addr}: {err}");
            return;
        }
    };
    if let Err(err) = axum::serve(listener, router()).await {
        tracing::error!("Mock service stopped: {err}");
    }
}

/// Total requests served since start.
pub fn served() -> u64 {
    SERVED.load(Ordering::Relaxed)
}

#[debug_handler]
pub async fn delay(Path(delay_ms): Path<u64>) {
    counter!("mock-service.requests").increment(1);
    SERVED.fetch_add(1, Ordering::Relaxed);
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

/// Fails with a 500 for roughly `error_percent`% of requests.
#[debug_handler]
pub async fn flaky(Path((error_percent, delay_ms)): Path<(u32, u64)>) -> Result<(), StatusCode> {
    counter!("mock-service.requests").increment(1);
    SERVED.fetch_add(1, Ordering::Relaxed);
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    if rand::thread_rng().gen_range(0..100) < error_percent {
        debug!("MOCK SERVER ___ ERR");
        counter!("mock-service.errors").increment(1);
        Err(StatusCode::INTERNAL_SERVER_ERROR)
    } else {
        Ok(())
    }
}

/** TPS Printer **/

static SERVED: AtomicU64 = AtomicU64::new(0);
static TPS_MEASURE: AtomicU64 = AtomicU64::new(0);

pub async fn tps_measure_task() {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let transactions = TPS_MEASURE.swap(0, Ordering::Relaxed);
        println!("{transactions} TPS");
    }
}
