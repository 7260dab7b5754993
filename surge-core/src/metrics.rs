/// Metric names recorded by the stat collector.
#[derive(Copy, Clone, Debug)]
pub struct StatLabels {
    pub success: &'static str,
    pub error: &'static str,
    pub latency: &'static str,
    pub dispatched: &'static str,
}

pub const DEFAULT_LABELS: StatLabels = StatLabels {
    success: "surge_requests_success",
    error: "surge_requests_error",
    latency: "surge_latency",
    dispatched: "surge_dispatched",
};
