mod utils;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use surge::prelude::*;
use surge::report;
use utils::*;

fn params(threads: usize, max: u64, duration: Duration, tput: u32) -> RunParameters {
    RunParameters::new(threads, max, duration, tput)
        .unwrap()
        .with_seed(1234)
}

/// Open loop at 10/s for 2s against a 5ms backend.
#[tokio::test(start_paused = true)]
#[ntest::timeout(10_000)]
async fn open_loop_scenario() {
    init_tracing();
    let runner = Arc::new(StubRunner::new(Duration::from_millis(5)));

    let outcome = Engine::new(params(1, 0, Duration::from_secs(2), 10), runner.clone())
        .run(Mode::OpenLoop, CancellationToken::new())
        .await
        .unwrap();
    let report = outcome.report();

    assert!((17..=23).contains(&report.total), "total {}", report.total);
    assert_eq!(report.errors, 0);
    let avg = report.average_latency_nanos.unwrap();
    assert!((5_000_000. ..6_000_000.).contains(&avg), "average {avg}");
    assert_eq!(report.total, runner.completed());
    assert_eq!(outcome.dispatched, runner.started());

    let mut csv = vec![];
    report::write_csv(&mut csv, &outcome.stats).unwrap();
    let text = String::from_utf8(csv).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Start,Duration,IsError"));
    assert_eq!(lines.count() as u64, report.total);
    assert_eq!(report::read_csv(text.as_bytes()).unwrap(), outcome.stats);
}

/// Closed loop: 4 workers sharing a cap of 100 requests.
#[tokio::test(start_paused = true)]
#[ntest::timeout(10_000)]
async fn pool_request_cap_scenario() {
    init_tracing();
    let runner = Arc::new(StubRunner::new(Duration::from_millis(5)));

    let outcome = Engine::new(params(4, 100, Duration::from_secs(86_400), 40), runner.clone())
        .run(Mode::Pool, CancellationToken::new())
        .await
        .unwrap();

    let n = outcome.stats.len() as u64;
    assert!((100..=104).contains(&n), "collected {n}");
    assert_eq!(n, runner.completed());
    assert!(!outcome.cancelled);
    // 40 rps in aggregate reaches 100 requests in about 2.5s.
    assert!(outcome.elapsed < Duration::from_secs(5), "{:?}", outcome.elapsed);
}

#[tokio::test(start_paused = true)]
#[ntest::timeout(10_000)]
async fn pool_overshoot_is_bounded() {
    init_tracing();
    // Latency far above the pacing gap: every worker is mid-request when the cap is hit.
    let runner = Arc::new(StubRunner::new(Duration::from_millis(250)));

    let outcome = Engine::new(params(8, 20, Duration::from_secs(600), 800), runner.clone())
        .run(Mode::Pool, CancellationToken::new())
        .await
        .unwrap();

    let n = outcome.stats.len() as u64;
    assert!((20..=28).contains(&n), "collected {n}");
    assert_eq!(n, runner.completed());
}

#[tokio::test(start_paused = true)]
#[ntest::timeout(10_000)]
async fn errors_are_recorded_not_fatal() {
    init_tracing();
    let runner = Arc::new(StubRunner::new(Duration::from_millis(1)).failing_every(4));

    let outcome = Engine::new(params(2, 40, Duration::from_secs(60), 100), runner.clone())
        .run(Mode::Pool, CancellationToken::new())
        .await
        .unwrap();
    let report = outcome.report();

    assert_eq!(report.total, runner.completed());
    assert_eq!(report.errors, runner.completed() / 4);
    assert_eq!(report.successes + report.errors, report.total);
}

#[tokio::test(start_paused = true)]
#[ntest::timeout(10_000)]
async fn cancel_lets_in_flight_finish() {
    init_tracing();
    let runner = Arc::new(StubRunner::new(Duration::from_millis(800)));
    let cancel = CancellationToken::new();

    let engine = Engine::new(params(1, 0, Duration::from_secs(30), 20), runner.clone());
    let mut state = engine.subscribe();
    let handle = tokio::spawn(engine.run(Mode::OpenLoop, cancel.clone()));

    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();
    let outcome = handle.await.unwrap().unwrap();

    assert!(outcome.cancelled);
    assert!(outcome.elapsed >= Duration::from_millis(800));
    assert!(outcome.elapsed < Duration::from_secs(2));
    // Every dispatch started before cancellation ran to completion.
    assert_eq!(runner.started(), runner.completed());
    assert_eq!(outcome.stats.len() as u64, runner.completed());
    assert_eq!(*state.borrow_and_update(), EngineState::Stopped);
}

#[tokio::test(start_paused = true)]
#[ntest::timeout(10_000)]
async fn cancel_before_start_produces_nothing() {
    init_tracing();
    let runner = Arc::new(StubRunner::new(Duration::from_millis(1)));
    let cancel = CancellationToken::new();
    cancel.cancel();

    for mode in [Mode::OpenLoop, Mode::Pool] {
        let outcome = Engine::new(params(3, 0, Duration::from_secs(5), 30), runner.clone())
            .run(mode, cancel.clone())
            .await
            .unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.stats.len() as u64, outcome.dispatched);
    }
    assert_eq!(runner.started(), runner.completed());
}

/// Pushes a stat only for odd-numbered attempts.
#[derive(Default)]
struct Abstaining {
    attempts: AtomicU64,
    pushed: AtomicU64,
}

impl RequestRunner for Abstaining {
    async fn run_request(&self, _cancel: &CancellationToken, sink: &StatSink) {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if n % 2 == 0 {
            let (stat, _) = Stat::measure(async { Ok::<_, ()>(()) }).await;
            sink.push(stat).await;
            self.pushed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[tokio::test(start_paused = true)]
#[ntest::timeout(10_000)]
async fn abstaining_runner_contributes_nothing() {
    init_tracing();
    let runner = Arc::new(Abstaining::default());

    let outcome = Engine::new(params(1, 0, Duration::from_secs(3), 50), runner.clone())
        .run(Mode::OpenLoop, CancellationToken::new())
        .await
        .unwrap();

    let attempts = runner.attempts.load(Ordering::SeqCst);
    assert_eq!(outcome.dispatched, attempts);
    assert_eq!(outcome.stats.len() as u64, runner.pushed.load(Ordering::SeqCst));
    assert!(outcome.stats.len() as u64 <= attempts.div_ceil(2));
}

/// Many slow requests against a tiny sink: producers block on the full queue but nothing is
/// lost.
#[tokio::test(start_paused = true)]
#[ntest::timeout(10_000)]
async fn backpressure_loses_nothing() {
    init_tracing();
    let runner = Arc::new(StubRunner::new(Duration::from_millis(50)));

    let outcome = Engine::new(params(1, 0, Duration::from_secs(2), 2_000), runner.clone())
        .run(Mode::OpenLoop, CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.stats.len() > 3_000);
    assert_eq!(outcome.stats.len() as u64, runner.completed());
    assert_eq!(outcome.dispatched, runner.started());
}

#[tokio::test(start_paused = true)]
#[ntest::timeout(10_000)]
async fn bounded_fanout_caps_concurrency() {
    init_tracing();
    let runner = Arc::new(StubRunner::new(Duration::from_millis(200)));

    let outcome = Engine::new(params(1, 0, Duration::from_secs(2), 100), runner.clone())
        .max_in_flight(std::num::NonZeroUsize::new(5).unwrap())
        .run(Mode::OpenLoop, CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.skipped > 0);
    // 5 slots turning over every 200ms for 2s.
    assert!(outcome.dispatched <= 55, "dispatched {}", outcome.dispatched);
    assert_eq!(outcome.stats.len() as u64, outcome.dispatched);
}
