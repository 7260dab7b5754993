use crate::sink::StatSink;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Performs one request attempt against the system under test.
///
/// Each call should push exactly one [`Stat`](surge_core::Stat) into `sink` before returning.
/// A runner may also push nothing, for instance when it has no operation to issue; the engine
/// treats that attempt as never having happened. Retries, if any, belong in the runner.
///
/// `cancel` fires when the run is cancelled from the outside. Honouring it is optional: the
/// engine always waits for started attempts to return.
pub trait RequestRunner: Send + Sync + 'static {
    fn run_request(
        &self,
        cancel: &CancellationToken,
        sink: &StatSink,
    ) -> impl Future<Output = ()> + Send;
}

impl<R: RequestRunner> RequestRunner for Arc<R> {
    fn run_request(
        &self,
        cancel: &CancellationToken,
        sink: &StatSink,
    ) -> impl Future<Output = ()> + Send {
        (**self).run_request(cancel, sink)
    }
}
