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

//! Shared load-session state.
//!
//! Owned by the run root and handed to every simulated user as an `Arc`.
//! The account and token contract lists only grow; readers may see a
//! slightly stale list, which just means picking another existing entry.

use crate::loadgen::wallet::Account;
use crate::rpc_core::errors::ProbeError;
use crate::transport::client::RpcClient;
use crate::transport::faucet::FaucetClient;
use alloy_primitives::Address;
use rand::seq::IndexedRandom;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tokio::sync::OnceCell;

/// Pooled clients shared by every user of a run
#[derive(Debug, Clone)]
pub struct SessionClients {
    pub rpc: RpcClient,
    pub faucet: FaucetClient,
    /// EIP-155 chain id signed into every transaction
    pub chain_id: u64,
}

#[derive(Debug, Default)]
pub struct SharedState {
    accounts: RwLock<Vec<Account>>,
    contracts: RwLock<Vec<Address>>,
    last_consumer_id: AtomicU64,
    clients: OnceCell<SessionClients>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_account(&self, account: Account) {
        self.accounts
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push(account);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn random_recipient(&self) -> Option<Account> {
        let accounts = self.accounts.read().unwrap_or_else(|p| p.into_inner());
        accounts.choose(&mut rand::rng()).cloned()
    }

    /// Token contracts deployed by any user of the run
    pub fn register_contract(&self, contract: Address) {
        self.contracts
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push(contract);
    }

    pub fn contract_count(&self) -> usize {
        self.contracts.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn random_contract(&self) -> Option<Address> {
        let contracts = self.contracts.read().unwrap_or_else(|p| p.into_inner());
        contracts.choose(&mut rand::rng()).copied()
    }

    /// Ids start at 1, in spawn order.
    pub fn next_consumer_id(&self) -> u64 {
        self.last_consumer_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Build the shared clients on first use; later callers wait for and reuse them.
    pub async fn clients<F, Fut>(&self, init: F) -> Result<&SessionClients, ProbeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionClients, ProbeError>>,
    {
        self.clients.get_or_try_init(init).await
    }

    pub fn is_initialized(&self) -> bool {
        self.clients.initialized()
    }
}
