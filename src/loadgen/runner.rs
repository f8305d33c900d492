// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Simulated-user load runner.
//!
//! Users are spawned at `spawn_rate` per second until `users` are running.
//! Each one loops over weighted task sets with a random pause in between,
//! until the run's cancellation token fires. Calls still in flight at that
//! point are recorded as cancelled failures.

use crate::config::{Config, NetworkCredentials};
use crate::loadgen::events::{EventSink, FanoutSink, StatsCollector, StatsEntry, TracingSink};
use crate::loadgen::instrument::InstrumentedClient;
use crate::loadgen::recorder::EventRecorder;
use crate::loadgen::session::{SessionClients, SharedState};
use crate::loadgen::wallet::Account;
use crate::rpc_core::constants::load;
use crate::rpc_core::errors::ProbeError;
use crate::transport::client::{build_http_client, RpcClient};
use crate::transport::faucet::FaucetClient;
use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSettings {
    pub users: usize,
    /// Users started per second
    pub spawn_rate: f64,
    pub duration: Duration,
}

impl LoadSettings {
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.users == 0 {
            return Err(ProbeError::Configuration("users must be at least 1".into()));
        }
        if !(self.spawn_rate.is_finite() && self.spawn_rate > 0.0) {
            return Err(ProbeError::Configuration(format!(
                "spawn rate must be positive, got {}",
                self.spawn_rate
            )));
        }
        Ok(())
    }

    fn spawn_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.spawn_rate)
    }
}

/// Weighted groups of calls a user picks from on every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSet {
    /// Send NEON to another user
    Transfers,
    /// Deploy token contracts or move tokens between users
    Erc20,
}

impl TaskSet {
    pub const ALL: [TaskSet; 2] = [TaskSet::Transfers, TaskSet::Erc20];

    pub fn weight(self) -> u32 {
        match self {
            TaskSet::Transfers => load::TRANSFERS_WEIGHT,
            TaskSet::Erc20 => load::ERC20_WEIGHT,
        }
    }

    /// Map a roll in `0..total_weight()` onto a task set.
    pub fn from_roll(roll: u32) -> TaskSet {
        weighted(&Self::ALL, roll, Self::weight)
    }

    pub fn total_weight() -> u32 {
        Self::ALL.iter().map(|s| s.weight()).sum()
    }

    pub fn pick() -> TaskSet {
        Self::from_roll(rand::rng().random_range(0..Self::total_weight()))
    }
}

/// Tasks of the ERC20 set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Erc20Task {
    Deploy,
    Send,
}

impl Erc20Task {
    pub const ALL: [Erc20Task; 2] = [Erc20Task::Deploy, Erc20Task::Send];

    pub fn weight(self) -> u32 {
        match self {
            Erc20Task::Deploy => load::ERC20_DEPLOY_WEIGHT,
            Erc20Task::Send => load::ERC20_SEND_WEIGHT,
        }
    }

    pub fn from_roll(roll: u32) -> Erc20Task {
        weighted(&Self::ALL, roll, Self::weight)
    }

    pub fn total_weight() -> u32 {
        Self::ALL.iter().map(|t| t.weight()).sum()
    }

    pub fn pick() -> Erc20Task {
        Self::from_roll(rand::rng().random_range(0..Self::total_weight()))
    }
}

/// Entry of `items` whose weight band contains `roll`; the last one past the end.
fn weighted<T: Copy>(items: &[T], mut roll: u32, weight: impl Fn(T) -> u32) -> T {
    let mut chosen = items[items.len() - 1];
    for &item in items {
        if roll < weight(item) {
            chosen = item;
            break;
        }
        roll -= weight(item);
    }
    chosen
}

/// Pause between two task sets
pub fn wait_time() -> Duration {
    let secs = rand::rng().random_range(load::MIN_WAIT_SECS..=load::MAX_WAIT_SECS);
    Duration::from_secs_f64(secs)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub users_spawned: usize,
    pub accounts: usize,
    pub contracts: usize,
    /// Recorder entries left open after every user stopped
    pub pending_tasks: usize,
    pub entries: Vec<StatsEntry>,
    pub total: StatsEntry,
}

impl LoadReport {
    /// Plain-text stats table, one row per request type plus the aggregate.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<28} {:>8} {:>8} {:>10} {:>10} {:>10}",
            "Type", "# reqs", "# fails", "Avg (ms)", "Min (ms)", "Max (ms)"
        );
        for entry in self.entries.iter().chain(std::iter::once(&self.total)) {
            let label = if entry.request_type.is_empty() {
                entry.name.as_str()
            } else {
                entry.request_type.as_str()
            };
            let min = if entry.requests == 0 {
                0.0
            } else {
                entry.min_response_time
            };
            let _ = writeln!(
                out,
                "{:<28} {:>8} {:>8} {:>10.1} {:>10.1} {:>10.1}",
                label,
                entry.requests,
                entry.failures,
                entry.avg_response_time(),
                min,
                entry.max_response_time
            );
        }
        let _ = writeln!(
            out,
            "\n{} users, {} accounts, {} token contracts, {} -> {}",
            self.users_spawned,
            self.accounts,
            self.contracts,
            self.started_at.to_rfc3339(),
            self.finished_at.to_rfc3339()
        );
        out
    }
}

/// Everything a user task needs, shared by all of them
struct UserContext {
    state: Arc<SharedState>,
    recorder: Arc<EventRecorder>,
    config: Config,
    network: NetworkCredentials,
    pool_size: usize,
}

impl UserContext {
    async fn clients(&self) -> Result<&SessionClients, ProbeError> {
        self.state
            .clients(|| async {
                info!(pool_size = self.pool_size, proxy = %self.network.proxy_url, "Initializing shared clients");
                let http = build_http_client(&self.config, self.pool_size)?;
                Ok(SessionClients {
                    rpc: RpcClient::with_http_client(
                        self.network.proxy_url.clone(),
                        http.clone(),
                        self.config.request_timeout(),
                    ),
                    faucet: FaucetClient::new(
                        &self.network.faucet_url,
                        http,
                        self.config.request_timeout(),
                    ),
                    chain_id: self.network.network_id,
                })
            })
            .await
    }
}

struct SimulatedUser {
    id: u64,
    account: Account,
    client: InstrumentedClient,
    state: Arc<SharedState>,
}

impl SimulatedUser {
    async fn run_set(&self, set: TaskSet) {
        debug!(user = self.id, task_set = ?set, "Running task set");
        match set {
            TaskSet::Transfers => self.send_neon().await,
            TaskSet::Erc20 => match Erc20Task::pick() {
                Erc20Task::Deploy => self.deploy_erc20().await,
                Erc20Task::Send => self.send_erc20().await,
            },
        }
    }

    async fn send_neon(&self) {
        self.client.block_number().await;
        self.keep_balance().await;
        if let Some(recipient) = self.state.random_recipient() {
            debug!(user = self.id, from = %self.account.short(), to = %recipient.short(), "Sending NEON");
            self.client
                .send_neon(&self.account, &recipient, load::NEON_TRANSFER_AMOUNT)
                .await;
        }
    }

    async fn deploy_erc20(&self) {
        self.client.block_number().await;
        self.keep_balance().await;
        if let Some(contract) = self
            .client
            .deploy_contract(&self.account, load::ERC20_INITIAL_SUPPLY)
            .await
        {
            debug!(user = self.id, contract = %contract, "Token contract deployed");
            self.state.register_contract(contract);
        }
    }

    async fn send_erc20(&self) {
        self.client.block_number().await;
        let Some(contract) = self.state.random_contract() else {
            debug!(user = self.id, "No token contracts yet, skipping send");
            return;
        };
        let amount = load::ERC20_TRANSFER_AMOUNT;
        match self.client.token_balance(contract, &self.account).await {
            Ok(balance) if balance >= U256::from(amount) => {
                if let Some(recipient) = self.state.random_recipient() {
                    self.client
                        .send_erc20(&self.account, &recipient, amount, contract)
                        .await;
                }
            }
            Ok(_) => debug!(user = self.id, contract = %contract, "No tokens on this contract, skipping send"),
            Err(e) => debug!(user = self.id, error = %e, "Token balance unavailable"),
        }
    }

    async fn keep_balance(&self) {
        let address = self.account.address();
        if let Some(balance) = self.client.get_balance(address).await {
            if balance < load::MIN_BALANCE_NEON {
                debug!(user = self.id, account = %self.account.short(), balance, "Topping up from faucet");
                self.client.request_funds(address).await;
            }
        }
    }
}

async fn user_loop(context: Arc<UserContext>, cancel: CancellationToken) {
    let id = context.state.next_consumer_id();
    let clients = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        clients = context.clients() => match clients {
            Ok(clients) => clients,
            Err(e) => {
                warn!(user = id, error = %e, "User could not initialize clients");
                return;
            }
        },
    };

    let client = InstrumentedClient::from_session(clients, context.recorder.clone());
    let user = SimulatedUser {
        id,
        account: client.create_account(),
        client,
        state: context.state.clone(),
    };
    context.state.register_account(user.account.clone());
    debug!(user = id, account = %user.account.short(), "User started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = user.run_set(TaskSet::pick()) => {}
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait_time()) => {}
        }
    }
    debug!(user = id, "User stopped");
}

pub struct LoadRunner {
    settings: LoadSettings,
    context: Arc<UserContext>,
    stats: Arc<StatsCollector>,
    cancel: CancellationToken,
}

impl LoadRunner {
    /// `sink` receives every event in addition to the runner's own stats.
    pub fn new(
        settings: LoadSettings,
        config: Config,
        network: NetworkCredentials,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let stats = Arc::new(StatsCollector::new());
        let fanout = FanoutSink::new()
            .with(stats.clone())
            .with(Arc::new(TracingSink))
            .with(sink);
        let context = UserContext {
            state: Arc::new(SharedState::new()),
            recorder: Arc::new(EventRecorder::new(Arc::new(fanout))),
            config,
            network,
            pool_size: settings.users,
        };
        Self {
            settings,
            context: Arc::new(context),
            stats,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancelling this token ends the run early.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.context.state
    }

    /// Measured calls that have started and not completed yet
    pub fn pending_count(&self) -> usize {
        self.context.recorder.pending_count()
    }

    pub async fn run(&self) -> Result<LoadReport, ProbeError> {
        self.settings.validate()?;
        let started_at = Utc::now();
        info!(
            users = self.settings.users,
            spawn_rate = self.settings.spawn_rate,
            duration_secs = self.settings.duration.as_secs_f64(),
            "Starting load run"
        );

        let timer = {
            let cancel = self.cancel.clone();
            let duration = self.settings.duration;
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(duration) => {
                        info!("Duration elapsed, stopping users");
                        cancel.cancel();
                    }
                }
            })
        };

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(self.settings.users);
        let mut ticker = tokio::time::interval(self.settings.spawn_interval());
        while handles.len() < self.settings.users {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    handles.push(tokio::spawn(user_loop(self.context.clone(), self.cancel.clone())));
                }
            }
        }
        let users_spawned = handles.len();
        info!(users_spawned, "Spawning finished");

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "User task ended abnormally");
            }
        }
        self.cancel.cancel();
        let _ = timer.await;

        let report = LoadReport {
            started_at,
            finished_at: Utc::now(),
            users_spawned,
            accounts: self.context.state.account_count(),
            contracts: self.context.state.contract_count(),
            pending_tasks: self.pending_count(),
            entries: self.stats.snapshot(),
            total: self.stats.total(),
        };
        info!(
            requests = report.total.requests,
            failures = report.total.failures,
            pending = report.pending_tasks,
            "Load run finished"
        );
        Ok(report)
    }
}
