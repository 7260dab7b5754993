use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use surge::prelude::*;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub const MOCK_ADDR: &str = "127.0.0.1:3013";

#[allow(unused)]
pub fn init_tracing() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let _ = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Starts the mock service once per test binary.
#[allow(unused)]
pub async fn init_mock_service() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    let wait = ONCE_LOCK.get().is_none();

    ONCE_LOCK.get_or_init(|| {
        init_tracing();

        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        tokio::spawn(async {
            let addr: SocketAddr = MOCK_ADDR.parse().unwrap();
            mock_service::run(addr).await;
        });
    });

    if wait {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// Sleeps for a fixed latency, optionally failing every `error_every`-th call.
#[allow(unused)]
#[derive(Default)]
pub struct StubRunner {
    pub latency: Duration,
    pub error_every: Option<u64>,
    pub started: AtomicU64,
    pub completed: AtomicU64,
}

#[allow(unused)]
impl StubRunner {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    pub fn failing_every(mut self, n: u64) -> Self {
        self.error_every = Some(n);
        self
    }

    pub fn started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }
}

impl RequestRunner for StubRunner {
    async fn run_request(&self, _cancel: &CancellationToken, sink: &StatSink) {
        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = self.error_every.is_some_and(|every| n % every == 0);

        let latency = self.latency;
        let (stat, _) = Stat::measure(async move {
            tokio::time::sleep(latency).await;
            if fail {
                Err(())
            } else {
                Ok(())
            }
        })
        .await;

        sink.push(stat).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}
