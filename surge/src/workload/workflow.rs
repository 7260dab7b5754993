//! Simulated users walking through multi-step workflows.
use super::http::Api;
use super::registry::{Encoding, Params, Registry};
use super::shop::object_id;
use crate::runner::RequestRunner;
use crate::sink::StatSink;
use async_channel::{Receiver, Sender};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use reqwest::Client;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use surge_core::{ConfigError, Stat, WorkloadConfig, STEP_THINK_TIME, WORKFLOW_THINK_TIME};
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[derive(Debug)]
struct Workflow {
    name: Arc<str>,
    steps: Vec<Api>,
}

/// What one simulated user knows about itself between requests.
#[derive(Debug)]
struct User {
    id: usize,
    user_id: String,
    session_id: String,
    username: String,
    password: String,
    cart_id: String,
    cart: Vec<String>,
    orders: Vec<String>,
    addresses: Vec<String>,
    cards: Vec<String>,
    logged_in: bool,
    /// Workflow and step to issue next. `None` starts a fresh workflow.
    cursor: Option<(usize, usize)>,
    requests: u64,
}

impl User {
    fn new(id: usize, rng: &mut dyn RngCore) -> Self {
        Self {
            id,
            user_id: object_id(rng),
            session_id: object_id(rng),
            username: format!("user_{id}_{}", &object_id(rng)[..8]),
            password: format!("pass_{}", &object_id(rng)[..8]),
            cart_id: object_id(rng),
            cart: vec![],
            orders: vec![],
            addresses: vec![],
            cards: vec![],
            logged_in: false,
            cursor: None,
            requests: 0,
        }
    }

    /// Returns the `(workflow, step)` to issue now and moves the cursor past it.
    fn next_step(&mut self, workflows: &[Workflow], rng: &mut dyn RngCore) -> (usize, usize) {
        let (workflow, step) = match self.cursor {
            Some(cursor) => cursor,
            None => (rng.gen_range(0..workflows.len()), 0),
        };
        self.cursor = (step + 1 < workflows[workflow].steps.len()).then_some((workflow, step + 1));
        (workflow, step)
    }

    fn finished_workflow(&self) -> bool {
        self.cursor.is_none()
    }

    /// Replaces generated identifiers with this user's own.
    fn overlay(&self, params: &mut Params, enc: Encoding, rng: &mut dyn RngCore) {
        for (key, value) in params.iter_mut() {
            let own = match *key {
                "sessionID" => Some(self.session_id.clone()),
                "userID" | "customerID" => Some(self.user_id.clone()),
                "cartID" => Some(self.cart_id.clone()),
                "username" => Some(self.username.clone()),
                "password" => Some(self.password.clone()),
                "email" => Some(format!("{}@sockshop.com", self.username)),
                "orderID" => self.orders.choose(&mut *rng).cloned(),
                "addressID" => self.addresses.choose(&mut *rng).cloned(),
                "cardID" => self.cards.choose(&mut *rng).cloned(),
                _ => None,
            };
            if let Some(own) = own {
                *value = enc.text(&own);
            }
        }
    }

    /// Applies the effect of a successful call.
    fn record(&mut self, operation: &str, params: &Params, rng: &mut dyn RngCore) {
        let item = || {
            params
                .iter()
                .find(|(key, _)| *key == "itemID")
                .map(|(_, value)| value.clone())
        };

        match operation {
            "sockshop_Login" | "sockshop_Register" | "hotel_UserHandler" => self.logged_in = true,
            "sockshop_AddItem" => self.cart.extend(item()),
            "sockshop_RemoveItem" => {
                if let Some(pos) = item().and_then(|item| self.cart.iter().position(|i| *i == item)) {
                    self.cart.remove(pos);
                }
            }
            "sockshop_DeleteCart" => self.cart.clear(),
            "sockshop_NewOrder" => {
                self.orders.push(object_id(rng));
                self.cart.clear();
            }
            "sockshop_PostAddress" => self.addresses.push(object_id(rng)),
            "sockshop_PostCard" => self.cards.push(object_id(rng)),
            _ => {}
        }
    }
}

fn sample(range: &Range<Duration>, rng: &mut dyn RngCore) -> Duration {
    if range.is_empty() {
        range.start
    } else {
        rng.gen_range(range.clone())
    }
}

/// Drives a fixed population of users, each repeatedly picking a random workflow and issuing
/// its steps in order with think time in between.
///
/// Every attempt checks out an idle user, issues that user's next step and hands the user back
/// once its think time has passed, so a user never has two requests in flight. Attempts wait
/// while every user is busy.
#[derive(Debug)]
pub struct WorkflowRunner {
    client: Client,
    encoding: Encoding,
    workflows: Vec<Workflow>,
    idle: (Sender<User>, Receiver<User>),
    step_think: Range<Duration>,
    workflow_think: Range<Duration>,
}

impl WorkflowRunner {
    pub fn new(
        config: &WorkloadConfig,
        registry: &Registry,
        users: NonZeroUsize,
    ) -> Result<Self, ConfigError> {
        let workflows = config
            .workflows
            .iter()
            .filter(|workflow| !workflow.steps.is_empty())
            .map(|workflow| {
                let steps = workflow
                    .steps
                    .iter()
                    .map(|step| Api::resolve(&config.url, step, registry))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Workflow {
                    name: Arc::from(workflow.name.as_str()),
                    steps,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        if workflows.is_empty() {
            return Err(ConfigError::NoWorkflows);
        }

        let (tx, rx) = async_channel::bounded(users.get());
        let mut rng = rand::thread_rng();
        for id in 0..users.get() {
            let user = User::new(id, &mut rng);
            debug!(user = id, "Created user {} with session {}", user.user_id, user.session_id);
            // NOTE: Cannot fail, the queue has room for every user and both ends are held.
            let _ = tx.try_send(user);
        }

        Ok(Self {
            client: Client::new(),
            encoding: Encoding::new(config.is_original),
            workflows,
            idle: (tx, rx),
            step_think: STEP_THINK_TIME,
            workflow_think: WORKFLOW_THINK_TIME,
        })
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Overrides the pauses between steps and between workflows.
    pub fn think_time(mut self, step: Range<Duration>, workflow: Range<Duration>) -> Self {
        self.step_think = step;
        self.workflow_think = workflow;
        self
    }

    /// Issues the user's next step and returns how long the user pauses afterwards.
    async fn step(&self, user: &mut User, sink: &StatSink) -> Duration {
        let (workflow, api, params, think) = {
            let mut rng = rand::thread_rng();
            let (w, s) = user.next_step(&self.workflows, &mut rng);
            let workflow = &self.workflows[w];
            let api = &workflow.steps[s];
            if s == 0 {
                debug!(
                    user = user.id,
                    "Starting workflow '{}' with {} steps",
                    workflow.name,
                    workflow.steps.len()
                );
            }

            let params = api.generator.map(|generate| {
                let mut params = generate(&mut rng, self.encoding);
                user.overlay(&mut params, self.encoding, &mut rng);
                params
            });
            let think = if user.finished_workflow() {
                sample(&self.workflow_think, &mut rng)
            } else {
                sample(&self.step_think, &mut rng)
            };
            (workflow, api, params, think)
        };

        let Some(params) = params else {
            warn!(user = user.id, "No generator bound for {}; skipping step", api.name);
            return if user.finished_workflow() {
                think
            } else {
                Duration::ZERO
            };
        };

        let (stat, res) = Stat::measure(api.send(&self.client, &params)).await;
        match res {
            Ok(()) => user.record(&api.operation, &params, &mut rand::thread_rng()),
            Err(error) => debug!(user = user.id, "Request to {} failed: {error}", api.name),
        }
        user.requests += 1;
        sink.push(stat.named(api.name.clone())).await;

        if user.finished_workflow() {
            debug!(
                user = user.id,
                requests = user.requests,
                "Completed workflow '{}'",
                workflow.name
            );
        }
        think
    }
}

impl RequestRunner for WorkflowRunner {
    async fn run_request(&self, cancel: &CancellationToken, sink: &StatSink) {
        let mut user = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            user = self.idle.1.recv() => match user {
                Ok(user) => user,
                Err(_) => return,
            },
        };

        let think = self.step(&mut user, sink).await;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(think) => {}
        }

        if self.idle.0.send(user).await.is_err() {
            error!("User queue closed; dropping user");
        }
    }
}
