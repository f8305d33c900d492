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

//! Method catalog and request factory.
//!
//! `RpcMethod` names every call the probes know how to build. The factory
//! turns a method plus positional params into a `JsonRpcRequest`, assigning
//! ids from a shared counter unless the caller supplies one. Parameter shapes
//! are not checked here: the proxy is the judge of what is malformed.

use crate::rpc_core::constants::jsonrpc;
use crate::rpc_core::errors::ProbeError;
use crate::rpc_core::models::{BlockSelector, CallRequest, GetLogsRequest, JsonRpcRequest};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    GetBlockByHash,
    GetBlockByNumber,
    Call,
    EstimateGas,
    GasPrice,
    GetLogs,
    GetBalance,
    GetTransactionCount,
    GetCode,
    SendRawTransaction,
    GetTransactionByHash,
    GetTransactionReceipt,
    GetStorageAt,
    ClientVersion,
    NetVersion,
    BlockNumber,
    Mining,
    Syncing,
    PeerCount,
    Sha3,
    ProxyVersion,
    CliVersion,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 22] = [
        RpcMethod::GetBlockByHash,
        RpcMethod::GetBlockByNumber,
        RpcMethod::Call,
        RpcMethod::EstimateGas,
        RpcMethod::GasPrice,
        RpcMethod::GetLogs,
        RpcMethod::GetBalance,
        RpcMethod::GetTransactionCount,
        RpcMethod::GetCode,
        RpcMethod::SendRawTransaction,
        RpcMethod::GetTransactionByHash,
        RpcMethod::GetTransactionReceipt,
        RpcMethod::GetStorageAt,
        RpcMethod::ClientVersion,
        RpcMethod::NetVersion,
        RpcMethod::BlockNumber,
        RpcMethod::Mining,
        RpcMethod::Syncing,
        RpcMethod::PeerCount,
        RpcMethod::Sha3,
        RpcMethod::ProxyVersion,
        RpcMethod::CliVersion,
    ];

    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::GetBlockByHash => "eth_getBlockByHash",
            RpcMethod::GetBlockByNumber => "eth_getBlockByNumber",
            RpcMethod::Call => "eth_call",
            RpcMethod::EstimateGas => "eth_estimateGas",
            RpcMethod::GasPrice => "eth_gasPrice",
            RpcMethod::GetLogs => "eth_getLogs",
            RpcMethod::GetBalance => "eth_getBalance",
            RpcMethod::GetTransactionCount => "eth_getTransactionCount",
            RpcMethod::GetCode => "eth_getCode",
            RpcMethod::SendRawTransaction => "eth_sendRawTransaction",
            RpcMethod::GetTransactionByHash => "eth_getTransactionByHash",
            RpcMethod::GetTransactionReceipt => "eth_getTransactionReceipt",
            RpcMethod::GetStorageAt => "eth_getStorageAt",
            RpcMethod::ClientVersion => "web3_clientVersion",
            RpcMethod::NetVersion => "net_version",
            RpcMethod::BlockNumber => "eth_blockNumber",
            RpcMethod::Mining => "eth_mining",
            RpcMethod::Syncing => "eth_syncing",
            RpcMethod::PeerCount => "net_peerCount",
            RpcMethod::Sha3 => "web3_sha3",
            RpcMethod::ProxyVersion => "neon_proxy_version",
            RpcMethod::CliVersion => "neon_cli_version",
        }
    }
}

impl std::fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RpcMethod {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RpcMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ProbeError::UnknownMethod(s.to_string()))
    }
}

/// Builds requests with unique ids. Shareable across tasks.
#[derive(Debug)]
pub struct RequestFactory {
    next_id: AtomicU64,
}

impl Default for RequestFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestFactory {
    pub fn new() -> Self {
        Self::starting_at(jsonrpc::FIRST_REQUEST_ID)
    }

    pub fn starting_at(first_id: u64) -> Self {
        Self {
            next_id: AtomicU64::new(first_id),
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn build(&self, method: RpcMethod, params: Vec<Value>) -> JsonRpcRequest {
        JsonRpcRequest::new(method.as_str(), params, self.allocate_id())
    }

    pub fn build_with_id(&self, method: RpcMethod, params: Vec<Value>, id: u64) -> JsonRpcRequest {
        JsonRpcRequest::new(method.as_str(), params, id)
    }

    /// Build from a wire name, e.g. from the CLI.
    pub fn build_named(&self, method: &str, params: Vec<Value>) -> Result<JsonRpcRequest, ProbeError> {
        Ok(self.build(method.parse()?, params))
    }

    /// Build a call outside the proxy catalog, e.g. for a Solana node.
    pub fn build_raw(&self, method: &str, params: Vec<Value>) -> JsonRpcRequest {
        JsonRpcRequest::new(method, params, self.allocate_id())
    }

    pub fn block_number(&self) -> JsonRpcRequest {
        self.build(RpcMethod::BlockNumber, vec![])
    }

    pub fn gas_price(&self) -> JsonRpcRequest {
        self.build(RpcMethod::GasPrice, vec![])
    }

    pub fn client_version(&self) -> JsonRpcRequest {
        self.build(RpcMethod::ClientVersion, vec![])
    }

    pub fn net_version(&self) -> JsonRpcRequest {
        self.build(RpcMethod::NetVersion, vec![])
    }

    pub fn proxy_version(&self) -> JsonRpcRequest {
        self.build(RpcMethod::ProxyVersion, vec![])
    }

    pub fn cli_version(&self) -> JsonRpcRequest {
        self.build(RpcMethod::CliVersion, vec![])
    }

    pub fn get_balance(&self, address: &str, block: BlockSelector) -> JsonRpcRequest {
        self.build(RpcMethod::GetBalance, vec![json!(address), json!(block)])
    }

    pub fn get_transaction_count(&self, address: &str, block: BlockSelector) -> JsonRpcRequest {
        self.build(
            RpcMethod::GetTransactionCount,
            vec![json!(address), json!(block)],
        )
    }

    pub fn get_code(&self, address: &str, block: BlockSelector) -> JsonRpcRequest {
        self.build(RpcMethod::GetCode, vec![json!(address), json!(block)])
    }

    pub fn get_storage_at(&self, address: &str, position: u128, block: BlockSelector) -> JsonRpcRequest {
        self.build(
            RpcMethod::GetStorageAt,
            vec![
                json!(address),
                json!(crate::utils::quantity::to_hex(position)),
                json!(block),
            ],
        )
    }

    pub fn get_block_by_hash(&self, hash: &str, full_transactions: bool) -> JsonRpcRequest {
        self.build(
            RpcMethod::GetBlockByHash,
            vec![json!(hash), json!(full_transactions)],
        )
    }

    pub fn get_block_by_number(&self, block: BlockSelector, full_transactions: bool) -> JsonRpcRequest {
        self.build(
            RpcMethod::GetBlockByNumber,
            vec![json!(block), json!(full_transactions)],
        )
    }

    pub fn call(&self, call: &CallRequest, block: BlockSelector) -> JsonRpcRequest {
        self.build(RpcMethod::Call, vec![json!(call), json!(block)])
    }

    pub fn estimate_gas(&self, call: &CallRequest) -> JsonRpcRequest {
        self.build(RpcMethod::EstimateGas, vec![json!(call)])
    }

    pub fn get_logs(&self, filter: &GetLogsRequest) -> JsonRpcRequest {
        self.build(RpcMethod::GetLogs, vec![json!(filter)])
    }

    pub fn send_raw_transaction(&self, signed_tx_hex: &str) -> JsonRpcRequest {
        self.build(RpcMethod::SendRawTransaction, vec![json!(signed_tx_hex)])
    }

    pub fn get_transaction_by_hash(&self, hash: &str) -> JsonRpcRequest {
        self.build(RpcMethod::GetTransactionByHash, vec![json!(hash)])
    }

    pub fn get_transaction_receipt(&self, hash: &str) -> JsonRpcRequest {
        self.build(RpcMethod::GetTransactionReceipt, vec![json!(hash)])
    }

    pub fn sha3(&self, data: &str) -> JsonRpcRequest {
        self.build(RpcMethod::Sha3, vec![json!(data)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc_core::models::{BlockTag, Tristate};

    #[test]
    fn test_catalog_round_trip() {
        for method in RpcMethod::ALL {
            assert_eq!(method.as_str().parse::<RpcMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_unknown_method() {
        let err = "eth_sendTransaction".parse::<RpcMethod>().unwrap_err();
        assert!(matches!(err, ProbeError::UnknownMethod(m) if m == "eth_sendTransaction"));
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let factory = RequestFactory::new();
        let a = factory.block_number();
        let b = factory.gas_price();
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
    }

    #[test]
    fn test_caller_supplied_id() {
        let factory = RequestFactory::new();
        let req = factory.build_with_id(RpcMethod::Mining, vec![], 42);
        assert_eq!(req.id(), 42);
        // caller ids do not consume the counter
        assert_eq!(factory.block_number().id(), 1);
    }

    #[test]
    fn test_storage_at_params() {
        let factory = RequestFactory::new();
        let req = factory.get_storage_at("0xabc", 1, BlockTag::Latest.into());
        assert_eq!(req.method(), "eth_getStorageAt");
        assert_eq!(req.params(), &[json!("0xabc"), json!("0x1"), json!("latest")]);
    }

    #[test]
    fn test_call_with_null_fields() {
        let factory = RequestFactory::new();
        let call = CallRequest::new()
            .with_to(Tristate::Null)
            .with_data(Tristate::Null);
        let req = factory.call(&call, BlockTag::Latest.into());
        assert_eq!(
            req.params(),
            &[json!({"to": null, "data": null}), json!("latest")]
        );
    }

    #[test]
    fn test_build_named() {
        let factory = RequestFactory::new();
        let req = factory.build_named("web3_sha3", vec![json!("0x6865")]).unwrap();
        assert_eq!(req.method(), "web3_sha3");
        assert!(factory.build_named("nope", vec![]).is_err());
    }
}
