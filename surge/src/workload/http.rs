use super::registry::{ArgGenerator, Encoding, Params, Registry};
use crate::runner::RequestRunner;
use crate::sink::StatSink;
use rand::{Rng, RngCore};
use reqwest::{Client, StatusCode, Url};
use std::sync::Arc;
use surge_core::{ApiConfig, ApiMethod, ConfigError, Stat, WorkloadConfig};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Error)]
pub(super) enum RequestError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error {0}")]
    Status(StatusCode),
}

/// One endpoint, resolved against the registry.
#[derive(Debug)]
pub(super) struct Api {
    pub name: Arc<str>,
    /// Registry key of the argument generator.
    pub operation: Arc<str>,
    pub url: Url,
    pub method: ApiMethod,
    pub generator: Option<ArgGenerator>,
}

impl Api {
    /// Unknown generator names are not fatal: they are reported here, and requests that land
    /// on such an endpoint are skipped without producing a stat.
    pub fn resolve(base: &str, api: &ApiConfig, registry: &Registry) -> Result<Self, ConfigError> {
        let target = format!("{}/{}", base.trim_end_matches('/'), api.name);
        let url = Url::parse(&target).map_err(|_| ConfigError::InvalidUrl(target.clone()))?;
        let generator = registry.get(&api.generator);
        if generator.is_none() {
            warn!("No generator found for {} ({})", api.generator, api.name);
        }

        Ok(Self {
            name: Arc::from(api.name.as_str()),
            operation: Arc::from(api.generator.as_str()),
            url,
            method: api.method,
            generator,
        })
    }

    /// GET sends the arguments as a query string, POST as a form body.
    pub async fn send(&self, client: &Client, params: &Params) -> Result<(), RequestError> {
        let request = match self.method {
            ApiMethod::Get => client.get(self.url.clone()).query(params),
            ApiMethod::Post => client.post(self.url.clone()).form(params),
        };

        let response = request.send().await?;
        let status = response.status();
        // NOTE: Drain the body so the connection can be reused.
        let body = response.bytes().await?;
        if status.is_success() {
            Ok(())
        } else {
            debug!("{} responded {status}: {}", self.name, String::from_utf8_lossy(&body));
            Err(RequestError::Status(status))
        }
    }
}

/// Issues one HTTP request per attempt, choosing the endpoint by configured proportion.
#[derive(Debug)]
pub struct HttpRunner {
    client: Client,
    encoding: Encoding,
    apis: Vec<Api>,
    cumulative: Vec<u32>,
}

impl HttpRunner {
    /// Resolves every endpoint's generator up front.
    pub fn new(config: &WorkloadConfig, registry: &Registry) -> Result<Self, ConfigError> {
        let mut apis = vec![];
        let mut cumulative = vec![];
        let mut total = 0u32;

        for api in config.apis.iter().filter(|api| api.proportion > 0) {
            total = total.saturating_add(api.proportion);
            cumulative.push(total);
            apis.push(Api::resolve(&config.url, api, registry)?);
        }

        if apis.is_empty() {
            return Err(ConfigError::NoOperations);
        }

        Ok(Self {
            client: Client::new(),
            encoding: Encoding::new(config.is_original),
            apis,
            cumulative,
        })
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn pick(&self, rng: &mut dyn RngCore) -> &Api {
        let total = self.cumulative.last().copied().unwrap_or(1);
        let roll = rng.gen_range(0..total);
        let idx = self.cumulative.partition_point(|&c| c <= roll);
        &self.apis[idx.min(self.apis.len() - 1)]
    }
}

impl RequestRunner for HttpRunner {
    async fn run_request(&self, _cancel: &CancellationToken, sink: &StatSink) {
        let (api, params) = {
            let mut rng = rand::thread_rng();
            let api = self.pick(&mut rng);
            (api, api.generator.map(|generate| generate(&mut rng, self.encoding)))
        };

        let Some(params) = params else {
            warn!("No generator bound for {}; skipping request", api.name);
            return;
        };

        let (stat, res) = Stat::measure(api.send(&self.client, &params)).await;
        if let Err(error) = res {
            debug!("Request to {} failed: {error}", api.name);
        }
        sink.push(stat.named(api.name.clone())).await;
    }
}
