//! Command line front end.
//!
//! Loads a JSON run configuration, applies flag overrides, runs the HTTP workload it describes
//! (an endpoint mix, or user workflows when any are configured) and writes one CSV row per
//! request.
use anyhow::Context;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use surge::workload::{HttpRunner, Registry, WorkflowRunner};
use surge::{Engine, Mode, RequestRunner, RunParameters};
use surge_core::{RunConfig, DEFAULT_OUTFILE};
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Open-loop / closed-loop load generator")]
pub(crate) struct SurgeCli {
    /// Path to the JSON run configuration.
    #[arg(long)]
    config: PathBuf,

    /// Target requests per second; overrides the configuration when non-zero.
    #[arg(long, default_value_t = 0)]
    tput: u32,

    /// Run duration such as `30s` or `2m`; overrides the configuration when given.
    #[arg(long, default_value = "")]
    duration: String,

    /// File the per-request stats are written to.
    #[arg(long, default_value = DEFAULT_OUTFILE)]
    outfile: PathBuf,

    #[arg(long, value_enum, default_value_t = Mode::Pool)]
    mode: Mode,

    /// Open loop only: skip ticks while this many requests are in flight.
    #[arg(long)]
    max_in_flight: Option<NonZeroUsize>,

    /// Seed for the arrival jitter; overrides the configuration.
    #[arg(long)]
    seed: Option<u64>,
}

impl SurgeCli {
    fn load(&self) -> anyhow::Result<(RunConfig, RunParameters)> {
        let mut config = RunConfig::from_path(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;
        config.override_tput(self.tput);
        config.override_duration(&self.duration);

        let mut params = config.parameters()?;
        if let Some(seed) = self.seed {
            params = params.with_seed(seed);
        }
        Ok((config, params))
    }

    #[instrument(name = "surge", skip_all, fields(mode = %self.mode))]
    pub async fn run(self) -> anyhow::Result<()> {
        let (config, params) = self.load()?;
        let workload = config
            .workload
            .as_ref()
            .context("configuration has no `workload` section")?;
        let registry = Registry::builtin();

        info!("Workers: {}", params.thread_count());
        info!("Output file: {}", self.outfile.display());

        if workload.workflows.is_empty() {
            let runner = HttpRunner::new(workload, &registry)?;
            self.drive(params, runner).await
        } else {
            info!("Simulating {} users", params.thread_count());
            let runner = WorkflowRunner::new(workload, &registry, params.thread_count())?;
            self.drive(params, runner).await
        }
    }

    async fn drive<R: RequestRunner>(&self, params: RunParameters, runner: R) -> anyhow::Result<()> {
        let mut engine = Engine::new(params, runner);
        if let Some(limit) = self.max_in_flight {
            engine = engine.max_in_flight(limit);
        }

        let cancel = CancellationToken::new();
        tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

        let outcome = engine.run(self.mode, cancel).await?;
        if outcome.skipped > 0 {
            warn!("{} dispatches skipped by the in-flight limit", outcome.skipped);
        }

        println!("{}", outcome.report());
        surge::report::write_csv_file(&self.outfile, &outcome.stats)
            .with_context(|| format!("writing {}", self.outfile.display()))?;
        println!("Stats written to: {}", self.outfile.display());

        Ok(())
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Interrupted; draining in-flight requests");
            cancel.cancel();
        }
        Err(err) => error!("Unable to listen for Ctrl-C: {err}"),
    }
}
