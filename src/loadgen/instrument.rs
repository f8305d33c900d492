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

//! Instrumented client.
//!
//! Wraps the plain clients and routes each exposed call through the event
//! recorder, one explicit method per operation. Failures are recorded and
//! come back as `None`.
//!
//! The transaction methods (`send_neon`, `deploy_contract`, `send_erc20`)
//! are measured end to end: nonce lookup, local signing, submission and
//! waiting for the receipt.

use crate::loadgen::erc20;
use crate::loadgen::recorder::EventRecorder;
use crate::loadgen::session::SessionClients;
use crate::loadgen::wallet::{Account, TxRequest};
use crate::rpc_core::constants::{faucet, tx};
use crate::rpc_core::errors::ProbeError;
use crate::rpc_core::models::TransactionReceipt;
use crate::transport::client::RpcClient;
use crate::transport::faucet::FaucetClient;
use crate::utils::quantity;
use alloy_primitives::{Address, U256};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct InstrumentedClient {
    rpc: RpcClient,
    faucet: FaucetClient,
    chain_id: u64,
    recorder: Arc<EventRecorder>,
}

impl InstrumentedClient {
    pub fn new(rpc: RpcClient, faucet: FaucetClient, chain_id: u64, recorder: Arc<EventRecorder>) -> Self {
        Self {
            rpc,
            faucet,
            chain_id,
            recorder,
        }
    }

    pub fn from_session(clients: &SessionClients, recorder: Arc<EventRecorder>) -> Self {
        Self::new(
            clients.rpc.clone(),
            clients.faucet.clone(),
            clients.chain_id,
            recorder,
        )
    }

    /// The undecorated client, for calls that should not be measured.
    pub fn inner(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn recorder(&self) -> &Arc<EventRecorder> {
        &self.recorder
    }

    /// Not measured: creating an account is local.
    pub fn create_account(&self) -> Account {
        Account::generate()
    }

    pub async fn block_number(&self) -> Option<u64> {
        self.recorder
            .instrument("get_block_number", self.rpc.block_number())
            .await
    }

    pub async fn gas_price(&self) -> Option<u128> {
        self.recorder
            .instrument("gas_price", self.rpc.gas_price())
            .await
    }

    /// Balance in NEON
    pub async fn get_balance(&self, address: &str) -> Option<f64> {
        self.recorder
            .instrument("get_balance", self.rpc.get_balance_neon(address))
            .await
    }

    pub async fn proxy_version(&self) -> Option<Value> {
        self.recorder
            .instrument("get_proxy_version", self.rpc.proxy_version())
            .await
    }

    pub async fn send_raw_transaction(&self, signed_tx_hex: &str) -> Option<String> {
        self.recorder
            .instrument(
                "send_raw_transaction",
                self.rpc.send_raw_transaction(signed_tx_hex),
            )
            .await
    }

    pub async fn request_funds(&self, address: &str) -> Option<()> {
        self.recorder
            .instrument(
                "request_neon",
                self.faucet.request_funds(address, faucet::DEFAULT_AMOUNT),
            )
            .await
    }

    /// Transfer `amount` NEON and wait for it to be mined.
    pub async fn send_neon(&self, from: &Account, to: &Account, amount: f64) -> Option<TransactionReceipt> {
        let value = quantity::neon_to_wei(amount);
        let chain_id = self.chain_id;
        let recipient = to.evm_address();
        self.recorder
            .instrument(
                "send_neon",
                self.submit(from, |nonce| TxRequest::transfer(chain_id, nonce, recipient, value)),
            )
            .await
            .map(|(_, receipt)| receipt)
    }

    /// Deploy a token contract minting `initial_supply` to `from`.
    /// Returns the contract address.
    pub async fn deploy_contract(&self, from: &Account, initial_supply: u64) -> Option<Address> {
        self.recorder
            .instrument("deploy_contract", self.deploy(from, initial_supply))
            .await
    }

    pub async fn send_erc20(
        &self,
        from: &Account,
        to: &Account,
        amount: u64,
        contract: Address,
    ) -> Option<TransactionReceipt> {
        let chain_id = self.chain_id;
        let data = erc20::transfer_data(to.evm_address(), U256::from(amount));
        self.recorder
            .instrument(
                "send_erc20",
                self.submit(from, |nonce| TxRequest::contract_call(chain_id, nonce, contract, data)),
            )
            .await
            .map(|(_, receipt)| receipt)
    }

    /// Not measured: token balance of `owner`, read with `eth_call`.
    pub async fn token_balance(&self, contract: Address, owner: &Account) -> Result<U256, ProbeError> {
        let data = erc20::to_hex(&erc20::balance_of_data(owner.evm_address()));
        let returned = self
            .rpc
            .call_contract(&contract.to_checksum(None), &data)
            .await?;
        erc20::decode_uint(&returned)
    }

    async fn deploy(&self, from: &Account, initial_supply: u64) -> Result<Address, ProbeError> {
        let chain_id = self.chain_id;
        let init_code = erc20::deploy_data(U256::from(initial_supply));
        let (nonce, receipt) = self
            .submit(from, |nonce| TxRequest::deploy(chain_id, nonce, init_code))
            .await?;
        match receipt.contract_address.as_deref() {
            Some(address) => Address::from_str(address)
                .map_err(|e| ProbeError::Parse(format!("contract address {}: {}", address, e))),
            None => Ok(from.contract_address(nonce)),
        }
    }

    /// Sign a transaction at the account's current nonce, send it and wait
    /// for a successful receipt.
    async fn submit(
        &self,
        from: &Account,
        build: impl FnOnce(u64) -> TxRequest,
    ) -> Result<(u64, TransactionReceipt), ProbeError> {
        let nonce = self.rpc.get_transaction_count(from.address()).await?;
        let signed = from.sign(&build(nonce))?;
        let hash = self.rpc.send_raw_transaction(&signed.raw).await?;
        debug!(from = %from.short(), nonce, hash = %hash, "Transaction sent");
        let receipt = self
            .rpc
            .wait_for_receipt(
                &hash,
                Duration::from_secs(tx::RECEIPT_TIMEOUT_SECS),
                Duration::from_millis(tx::RECEIPT_POLL_INTERVAL_MS),
            )
            .await?;
        Ok((nonce, receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loadgen::events::{EventKind, EventSink, RequestEvent, StatsCollector};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<RequestEvent>>);

    impl EventSink for Capture {
        fn fire(&self, event: &RequestEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn client_for(url: &str, sink: Arc<dyn EventSink>) -> InstrumentedClient {
        let http = reqwest::Client::new();
        InstrumentedClient::new(
            RpcClient::with_http_client(url, http.clone(), Duration::from_secs(5)),
            FaucetClient::new(url, http, Duration::from_secs(5)),
            111,
            Arc::new(EventRecorder::new(sink)),
        )
    }

    async fn mock_method(server: &mut mockito::ServerGuard, method: &str, result: serde_json::Value) -> mockito::Mock {
        server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({"method": method})))
            .with_body(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_block_number_records_success() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#)
            .create_async()
            .await;

        let capture = Arc::new(Capture::default());
        let client = client_for(&server.url(), capture.clone());
        assert_eq!(client.block_number().await, Some(16));

        let events = capture.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Success);
        assert_eq!(events[0].request_type, "`get block number`");
        assert_eq!(events[0].name, "");
    }

    #[tokio::test]
    async fn test_rpc_error_is_recorded_and_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"insufficient funds"}}"#)
            .create_async()
            .await;

        let stats = Arc::new(StatsCollector::new());
        let client = client_for(&server.url(), stats.clone());
        assert_eq!(client.get_balance("0x00").await, None);

        let total = stats.total();
        assert_eq!(total.failures, 1);
        assert!(total
            .last_exception
            .unwrap_or_default()
            .contains("insufficient funds"));
        assert_eq!(client.recorder().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_faucet_rejection_is_failure_event() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/request")
            .with_status(500)
            .with_body("faucet drained")
            .create_async()
            .await;

        let stats = Arc::new(StatsCollector::new());
        let client = client_for(&server.url(), stats.clone());
        assert_eq!(client.request_funds("0xabc").await, None);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot[0].request_type, "`request neon`");
        assert_eq!(snapshot[0].failures, 1);
    }

    #[test]
    fn test_account_creation_not_measured() {
        let stats = Arc::new(StatsCollector::new());
        let client = client_for("http://127.0.0.1:1", stats.clone());
        let _ = client.create_account();
        assert_eq!(stats.total().requests, 0);
    }

    #[tokio::test]
    async fn test_send_neon_signs_and_waits_for_receipt() {
        let mut server = mockito::Server::new_async().await;
        let _nonce = mock_method(&mut server, "eth_getTransactionCount", serde_json::json!("0x5")).await;
        let sent = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"method": "eth_sendRawTransaction"}),
            ))
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0xabc1"}"#)
            .expect(1)
            .create_async()
            .await;
        let _receipt = mock_method(
            &mut server,
            "eth_getTransactionReceipt",
            serde_json::json!({"transactionHash": "0xabc1", "status": "0x1"}),
        )
        .await;

        let capture = Arc::new(Capture::default());
        let client = client_for(&server.url(), capture.clone());
        let receipt = client
            .send_neon(&Account::generate(), &Account::generate(), 1.0)
            .await
            .unwrap();
        assert_eq!(receipt.transaction_hash, "0xabc1");
        sent.assert_async().await;

        let events = capture.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].request_type, "`send neon`");
        assert_eq!(events[0].kind, EventKind::Success);
    }

    #[tokio::test]
    async fn test_deploy_falls_back_to_derived_address() {
        let mut server = mockito::Server::new_async().await;
        let _nonce = mock_method(&mut server, "eth_getTransactionCount", serde_json::json!("0x2")).await;
        let _sent = mock_method(&mut server, "eth_sendRawTransaction", serde_json::json!("0xd1")).await;
        let _receipt = mock_method(
            &mut server,
            "eth_getTransactionReceipt",
            serde_json::json!({"transactionHash": "0xd1", "status": "0x1", "contractAddress": null}),
        )
        .await;

        let stats = Arc::new(StatsCollector::new());
        let client = client_for(&server.url(), stats.clone());
        let deployer = Account::generate();
        let contract = client.deploy_contract(&deployer, 1000).await;
        assert_eq!(contract, Some(deployer.contract_address(2)));
        assert_eq!(stats.snapshot()[0].request_type, "`deploy contract`");
    }

    #[tokio::test]
    async fn test_reverted_erc20_transfer_is_failure() {
        let mut server = mockito::Server::new_async().await;
        let _nonce = mock_method(&mut server, "eth_getTransactionCount", serde_json::json!("0x0")).await;
        let _sent = mock_method(&mut server, "eth_sendRawTransaction", serde_json::json!("0xe1")).await;
        let _receipt = mock_method(
            &mut server,
            "eth_getTransactionReceipt",
            serde_json::json!({"transactionHash": "0xe1", "status": "0x0"}),
        )
        .await;

        let stats = Arc::new(StatsCollector::new());
        let client = client_for(&server.url(), stats.clone());
        let sent = client
            .send_erc20(&Account::generate(), &Account::generate(), 1, Address::repeat_byte(0x42))
            .await;
        assert!(sent.is_none());
        let total = stats.total();
        assert_eq!(total.failures, 1);
        assert!(total.last_exception.unwrap_or_default().contains("reverted"));
    }

    #[tokio::test]
    async fn test_token_balance_not_measured() {
        let mut server = mockito::Server::new_async().await;
        let _call = mock_method(
            &mut server,
            "eth_call",
            serde_json::json!(format!("0x{:064x}", 1000)),
        )
        .await;

        let stats = Arc::new(StatsCollector::new());
        let client = client_for(&server.url(), stats.clone());
        let balance = client
            .token_balance(Address::repeat_byte(0x42), &Account::generate())
            .await
            .unwrap();
        assert_eq!(balance, U256::from(1000u64));
        assert_eq!(stats.total().requests, 0);
    }
}
