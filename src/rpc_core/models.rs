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

//! Domain models for proxy-probe.
//!
//! JSON-RPC 2.0 envelopes plus the Ethereum parameter objects the probes
//! send. Pure data, no I/O.

use crate::rpc_core::constants::jsonrpc;
use crate::rpc_core::errors::ProbeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;

fn protocol_version() -> String {
    jsonrpc::VERSION.to_string()
}

/// Outgoing JSON-RPC 2.0 request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Vec<Value>, id: u64) -> Self {
        Self {
            jsonrpc: protocol_version(),
            method: method.into(),
            params,
            id,
        }
    }

    pub fn jsonrpc(&self) -> &str {
        &self.jsonrpc
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Successful JSON-RPC 2.0 response. `result` may legitimately be `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default = "protocol_version")]
    pub jsonrpc: String,
    pub id: u64,
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC 2.0 error response. `id` is `None` when the server could not
/// read the request id (e.g. a parse error on its side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    #[serde(default = "protocol_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<u64>,
    pub error: JsonRpcError,
}

/// A parsed reply: exactly one of success or error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RpcReply {
    Success(JsonRpcResponse),
    Error(JsonRpcErrorResponse),
}

impl RpcReply {
    pub fn id(&self) -> Option<u64> {
        match self {
            RpcReply::Success(r) => Some(r.id),
            RpcReply::Error(e) => e.id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RpcReply::Success(_))
    }

    pub fn as_success(&self) -> Option<&JsonRpcResponse> {
        match self {
            RpcReply::Success(r) => Some(r),
            RpcReply::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&JsonRpcErrorResponse> {
        match self {
            RpcReply::Success(_) => None,
            RpcReply::Error(e) => Some(e),
        }
    }

    /// Collapse into the `result` value, turning an error envelope into `ProbeError::Rpc`.
    pub fn into_result(self) -> Result<Value, ProbeError> {
        match self {
            RpcReply::Success(r) => Ok(r.result),
            RpcReply::Error(e) => Err(ProbeError::Rpc {
                code: e.error.code,
                message: e.error.message,
            }),
        }
    }
}

/// Named block selectors accepted by the block-parameterised methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    Earliest,
    Latest,
    Pending,
}

impl BlockTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockTag::Earliest => "earliest",
            BlockTag::Latest => "latest",
            BlockTag::Pending => "pending",
        }
    }
}

impl std::fmt::Display for BlockTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockTag {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earliest" => Ok(BlockTag::Earliest),
            "latest" => Ok(BlockTag::Latest),
            "pending" => Ok(BlockTag::Pending),
            other => Err(ProbeError::InvalidQuantity(format!(
                "not a block tag: {}",
                other
            ))),
        }
    }
}

/// Block tag or explicit block number; numbers travel as `0x`-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BlockSelector {
    Tag(BlockTag),
    Number(u64),
}

impl From<BlockTag> for BlockSelector {
    fn from(tag: BlockTag) -> Self {
        BlockSelector::Tag(tag)
    }
}

impl From<u64> for BlockSelector {
    fn from(n: u64) -> Self {
        BlockSelector::Number(n)
    }
}

impl From<BlockSelector> for String {
    fn from(sel: BlockSelector) -> Self {
        match sel {
            BlockSelector::Tag(tag) => tag.as_str().to_string(),
            BlockSelector::Number(n) => crate::utils::quantity::to_hex(n as u128),
        }
    }
}

impl TryFrom<String> for BlockSelector {
    type Error = ProbeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if let Ok(tag) = s.parse::<BlockTag>() {
            return Ok(BlockSelector::Tag(tag));
        }
        let n = crate::utils::quantity::parse_u128(&s)?;
        u64::try_from(n)
            .map(BlockSelector::Number)
            .map_err(|_| ProbeError::InvalidQuantity(format!("block number too large: {}", s)))
    }
}

impl std::fmt::Display for BlockSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from(*self))
    }
}

/// Field that can be left out of the payload, sent as `null`, or carry a value.
/// The proxy treats "absent" and "null" differently, so both must be expressible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Tristate<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Tristate<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Tristate::Absent)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Tristate::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Tristate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Tristate::Value(v),
            None => Tristate::Null,
        }
    }
}

impl<T: Serialize> Serialize for Tristate<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tristate::Value(v) => v.serialize(serializer),
            Tristate::Absent | Tristate::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Tristate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A missing key never reaches here (`#[serde(default)]` yields Absent).
        Option::<T>::deserialize(deserializer).map(Tristate::from)
    }
}

/// Parameter object of `eth_call` and `eth_estimateGas`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    #[serde(default, skip_serializing_if = "Tristate::is_absent")]
    pub from: Tristate<String>,
    #[serde(default, skip_serializing_if = "Tristate::is_absent")]
    pub to: Tristate<String>,
    #[serde(default, skip_serializing_if = "Tristate::is_absent")]
    pub data: Tristate<String>,
    #[serde(default, skip_serializing_if = "Tristate::is_absent")]
    pub value: Tristate<String>,
}

impl CallRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_from(mut self, from: impl Into<Tristate<String>>) -> Self {
        self.from = from.into();
        self
    }

    pub fn with_to(mut self, to: impl Into<Tristate<String>>) -> Self {
        self.to = to.into();
        self
    }

    pub fn with_data(mut self, data: impl Into<Tristate<String>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<Tristate<String>>) -> Self {
        self.value = value.into();
        self
    }
}

impl From<String> for Tristate<String> {
    fn from(value: String) -> Self {
        Tristate::Value(value)
    }
}

impl From<&str> for Tristate<String> {
    fn from(value: &str) -> Self {
        Tristate::Value(value.to_string())
    }
}

/// Filter object of `eth_getLogs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLogsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_block: Option<BlockSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<BlockSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
}

/// The parts of an `eth_getTransactionReceipt` result the load users read.
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    /// `0x1` on success, `0x0` when reverted
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
}

impl TransactionReceipt {
    /// Receipts without a status field predate Byzantium and count as success.
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() != Some("0x0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let req = JsonRpcRequest::new("eth_blockNumber", vec![], 1);
        let wire = serde_json::to_value(&req).unwrap();
        assert_eq!(
            wire,
            json!({"jsonrpc": "2.0", "method": "eth_blockNumber", "params": [], "id": 1})
        );
    }

    #[test]
    fn test_block_selector_encoding() {
        assert_eq!(
            serde_json::to_value(BlockSelector::Number(255)).unwrap(),
            json!("0xff")
        );
        assert_eq!(
            serde_json::to_value(BlockSelector::from(BlockTag::Pending)).unwrap(),
            json!("pending")
        );
        let parsed: BlockSelector = serde_json::from_value(json!("0x10")).unwrap();
        assert_eq!(parsed, BlockSelector::Number(16));
        let parsed: BlockSelector = serde_json::from_value(json!("earliest")).unwrap();
        assert_eq!(parsed, BlockSelector::Tag(BlockTag::Earliest));
        assert!(serde_json::from_value::<BlockSelector>(json!("finalized-ish")).is_err());
    }

    #[test]
    fn test_call_request_absent_vs_null() {
        let absent = CallRequest::new();
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({}));

        let nulls = CallRequest::new()
            .with_to(Tristate::Null)
            .with_data(Tristate::Null);
        assert_eq!(
            serde_json::to_value(&nulls).unwrap(),
            json!({"to": null, "data": null})
        );

        let values = CallRequest::new()
            .with_from("0xaa")
            .with_to("0xbb")
            .with_value("0x1");
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            json!({"from": "0xaa", "to": "0xbb", "value": "0x1"})
        );
    }

    #[test]
    fn test_call_request_deserialize_keeps_null() {
        let req: CallRequest = serde_json::from_value(json!({"to": null})).unwrap();
        assert_eq!(req.to, Tristate::Null);
        assert_eq!(req.data, Tristate::Absent);
    }

    #[test]
    fn test_get_logs_camel_case() {
        let filter = GetLogsRequest {
            from_block: Some(BlockTag::Latest.into()),
            to_block: Some(BlockSelector::Number(1)),
            address: Some("0xabc".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"fromBlock": "latest", "toBlock": "0x1", "address": "0xabc"})
        );
    }

    #[test]
    fn test_reply_into_result() {
        let err = RpcReply::Error(JsonRpcErrorResponse {
            jsonrpc: "2.0".to_string(),
            id: Some(3),
            error: JsonRpcError {
                code: -32000,
                message: "execution reverted".to_string(),
                data: None,
            },
        });
        assert_eq!(err.id(), Some(3));
        assert!(matches!(
            err.into_result(),
            Err(ProbeError::Rpc { code: -32000, .. })
        ));
    }

    #[test]
    fn test_receipt_status() {
        let receipt: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": "0xab",
            "status": "0x0",
            "contractAddress": null,
            "logs": []
        }))
        .unwrap();
        assert!(!receipt.succeeded());
        assert_eq!(receipt.contract_address, None);

        let legacy: TransactionReceipt =
            serde_json::from_value(json!({"transactionHash": "0xcd"})).unwrap();
        assert!(legacy.succeeded());
    }
}
