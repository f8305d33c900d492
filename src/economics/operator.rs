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

//! Operator balance snapshots.
//!
//! The operator pays Solana fees in lamports from its keys and collects gas
//! fees in NEON on its EVM addresses. Taking a snapshot before and after an
//! operation yields the two numbers `assess_profit` compares.

use crate::config::{Config, NetworkCredentials};
use crate::economics::profit::{assess_profit, Prices, ProfitReport};
use crate::rpc_core::errors::ProbeError;
use crate::transport::client::{build_http_client, RpcClient};
use crate::utils::quantity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Total balance of a set of accounts, in the chain's smallest unit.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn total(&self) -> Result<u128, ProbeError>;
}

/// Lamports held by the operator keys, read with Solana `getBalance`.
#[derive(Debug, Clone)]
pub struct SolanaBalance {
    client: RpcClient,
    keys: Vec<String>,
}

impl SolanaBalance {
    pub fn new(client: RpcClient, keys: Vec<String>) -> Self {
        Self { client, keys }
    }

    pub async fn balance_of(&self, key: &str) -> Result<u64, ProbeError> {
        let request = self
            .client
            .factory()
            .build_raw("getBalance", vec![json!(key)]);
        let result = self.client.call(&request).await?.into_result()?;
        // Solana wraps the value: {"context": {"slot": n}, "value": lamports}
        result
            .get("value")
            .and_then(Value::as_u64)
            .ok_or_else(|| ProbeError::Parse(format!("unexpected getBalance result: {}", result)))
    }
}

#[async_trait]
impl BalanceSource for SolanaBalance {
    async fn total(&self) -> Result<u128, ProbeError> {
        let mut sum = 0u128;
        for key in &self.keys {
            let lamports = self.balance_of(key).await?;
            debug!(key = %key, lamports, "Operator SOL balance");
            sum += u128::from(lamports);
        }
        Ok(sum)
    }
}

/// Wei held by the operator's EVM addresses.
#[derive(Debug, Clone)]
pub struct NeonBalance {
    client: RpcClient,
    addresses: Vec<String>,
}

impl NeonBalance {
    pub fn new(client: RpcClient, addresses: Vec<String>) -> Self {
        Self { client, addresses }
    }
}

#[async_trait]
impl BalanceSource for NeonBalance {
    async fn total(&self) -> Result<u128, ProbeError> {
        let mut sum = 0u128;
        for address in &self.addresses {
            let wei = self.client.get_balance(address).await?;
            debug!(address = %address, wei, "Operator NEON balance");
            sum += wei;
        }
        Ok(sum)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub sol_lamports: u128,
    pub neon_wei: u128,
    pub taken_at: DateTime<Utc>,
}

/// Change between two snapshots, from the operator's point of view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// Zero when the SOL balance did not go down
    pub sol_spent_lamports: u64,
    /// Negative when the NEON balance went down
    pub neon_gained: f64,
}

impl BalanceDelta {
    pub fn assess(&self, prices: Prices) -> Result<ProfitReport, ProbeError> {
        assess_profit(self.sol_spent_lamports, self.neon_gained, prices)
    }
}

impl BalanceSnapshot {
    pub fn delta(&self, later: &BalanceSnapshot) -> BalanceDelta {
        let spent = self.sol_lamports.saturating_sub(later.sol_lamports);
        let neon_gained = if later.neon_wei >= self.neon_wei {
            quantity::wei_to_neon(later.neon_wei - self.neon_wei)
        } else {
            -quantity::wei_to_neon(self.neon_wei - later.neon_wei)
        };
        BalanceDelta {
            sol_spent_lamports: u64::try_from(spent).unwrap_or(u64::MAX),
            neon_gained,
        }
    }
}

pub struct Operator {
    sol: Box<dyn BalanceSource>,
    neon: Box<dyn BalanceSource>,
}

impl Operator {
    pub fn new(sol: Box<dyn BalanceSource>, neon: Box<dyn BalanceSource>) -> Self {
        Self { sol, neon }
    }

    /// Operator for a network entry; needs `solana_url` to be set.
    pub fn from_network(network: &NetworkCredentials, config: &Config) -> Result<Self, ProbeError> {
        let solana_url = network.solana_url.as_deref().ok_or_else(|| {
            ProbeError::Credentials("network has no solana_url for operator balances".into())
        })?;
        let http = build_http_client(config, config.pool_size)?;
        let solana = RpcClient::with_http_client(solana_url, http.clone(), config.request_timeout());
        let proxy = RpcClient::with_http_client(
            network.proxy_url.clone(),
            http,
            config.request_timeout(),
        );
        Ok(Self::new(
            Box::new(SolanaBalance::new(solana, network.operator_keys.clone())),
            Box::new(NeonBalance::new(proxy, network.operator_addresses.clone())),
        ))
    }

    pub async fn snapshot(&self) -> Result<BalanceSnapshot, ProbeError> {
        let (sol_lamports, neon_wei) = tokio::try_join!(self.sol.total(), self.neon.total())?;
        Ok(BalanceSnapshot {
            sol_lamports,
            neon_wei,
            taken_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u128);

    #[async_trait]
    impl BalanceSource for Fixed {
        async fn total(&self) -> Result<u128, ProbeError> {
            Ok(self.0)
        }
    }

    fn snapshot(sol: u128, neon: u128) -> BalanceSnapshot {
        BalanceSnapshot {
            sol_lamports: sol,
            neon_wei: neon,
            taken_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_snapshot_reads_both_sources() {
        let operator = Operator::new(Box::new(Fixed(5_000)), Box::new(Fixed(7)));
        let snap = operator.snapshot().await.unwrap();
        assert_eq!(snap.sol_lamports, 5_000);
        assert_eq!(snap.neon_wei, 7);
    }

    #[test]
    fn test_delta_direction() {
        let before = snapshot(2_000_000, 1_000_000_000_000_000_000);
        let after = snapshot(1_000_000, 1_500_000_000_000_000_000);
        let delta = before.delta(&after);
        assert_eq!(delta.sol_spent_lamports, 1_000_000);
        assert!((delta.neon_gained - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_delta_negative_neon() {
        let before = snapshot(10, 2_000_000_000_000_000_000);
        let after = snapshot(20, 1_000_000_000_000_000_000);
        let delta = before.delta(&after);
        assert_eq!(delta.sol_spent_lamports, 0);
        assert!((delta.neon_gained + 1.0).abs() < 1e-12);
        assert!(matches!(
            delta.assess(Prices::with_sol(20.0)),
            Err(ProbeError::NegativeNeonDifference(_))
        ));
    }

    #[test]
    fn test_from_network_requires_solana_url() {
        let network = NetworkCredentials {
            proxy_url: "http://proxy".into(),
            faucet_url: "http://faucet".into(),
            network_id: 1,
            solana_url: None,
            operator_keys: vec![],
            operator_addresses: vec![],
        };
        assert!(matches!(
            Operator::from_network(&network, &Config::default()),
            Err(ProbeError::Credentials(_))
        ));
    }
}
