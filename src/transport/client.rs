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

// HTTP dispatcher for JSON-RPC 2.0 calls against the proxy

use crate::config::Config;
use crate::rpc_core::constants::limits;
use crate::rpc_core::errors::ProbeError;
use crate::rpc_core::methods::{RequestFactory, RpcMethod};
use crate::rpc_core::models::{BlockTag, CallRequest, JsonRpcRequest, RpcReply, TransactionReceipt};
use crate::transport::codec;
use crate::utils::quantity;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Build the pooled HTTP client shared by every dispatcher of a session.
///
/// `pool_size` bounds idle connections kept per host, so a load run with
/// hundreds of users should pass its user count here.
pub fn build_http_client(config: &Config, pool_size: usize) -> Result<Client, ProbeError> {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .tcp_nodelay(true)
        .pool_max_idle_per_host(pool_size)
        .pool_idle_timeout(Duration::from_secs(limits::POOL_IDLE_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProbeError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

pub(crate) fn map_transport_error(e: reqwest::Error, timeout: Duration) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout(timeout.as_secs())
    } else {
        ProbeError::Transport(e.to_string())
    }
}

fn oversized(length: u64) -> ProbeError {
    ProbeError::Parse(format!(
        "Response length {} exceeds max limit {}",
        length,
        limits::MAX_RESPONSE_SIZE_BYTES
    ))
}

/// JSON-RPC client for one endpoint.
///
/// Cloning is cheap: clones share the connection pool and the id counter.
/// No retries are attempted; a transport failure goes straight back to the caller.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http_client: Client,
    url: String,
    factory: Arc<RequestFactory>,
    request_timeout: Duration,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, config: &Config) -> Result<Self, ProbeError> {
        let http_client = build_http_client(config, config.pool_size)?;
        Ok(Self::with_http_client(url, http_client, config.request_timeout()))
    }

    pub fn with_http_client(url: impl Into<String>, http_client: Client, request_timeout: Duration) -> Self {
        Self {
            http_client,
            url: url.into(),
            factory: Arc::new(RequestFactory::new()),
            request_timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn factory(&self) -> &RequestFactory {
        &self.factory
    }

    /// POST the envelope and hand back the raw HTTP response.
    pub async fn send(&self, request: &JsonRpcRequest) -> Result<reqwest::Response, ProbeError> {
        debug!(
            url = %self.url,
            method = %request.method(),
            request_id = request.id(),
            "Sending JSON-RPC request"
        );

        self.http_client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.request_timeout))
    }

    /// Send and parse. RPC-level errors come back as `RpcReply::Error`, not `Err`.
    pub async fn call(&self, request: &JsonRpcRequest) -> Result<RpcReply, ProbeError> {
        let response = self.send(request).await?;
        let status = response.status();
        let body = self.read_body(response).await?;

        match codec::parse_response(&body) {
            Ok(reply) => {
                if let RpcReply::Error(ref e) = reply {
                    debug!(
                        method = %request.method(),
                        code = e.error.code,
                        message = %e.error.message,
                        "Endpoint returned JSON-RPC error"
                    );
                }
                Ok(reply)
            }
            Err(_) if !status.is_success() => {
                error!(status = %status, url = %self.url, "Endpoint returned HTTP error");
                Err(ProbeError::Http {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                })
            }
            Err(parse_err) => {
                error!(error = %parse_err, url = %self.url, "Failed to parse JSON-RPC response");
                Err(parse_err)
            }
        }
    }

    /// Read the body, refusing anything over `MAX_RESPONSE_SIZE_BYTES`
    /// before it is fully buffered.
    async fn read_body(&self, mut response: reqwest::Response) -> Result<Vec<u8>, ProbeError> {
        let limit = limits::MAX_RESPONSE_SIZE_BYTES;
        if let Some(declared) = response.content_length() {
            if declared > limit {
                warn!(url = %self.url, declared, "Response too large, not reading body");
                return Err(oversized(declared));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_transport_error(e, self.request_timeout))?
        {
            let received = (body.len() + chunk.len()) as u64;
            if received > limit {
                warn!(url = %self.url, received, "Response too large, body abandoned");
                return Err(oversized(received));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    pub async fn call_method(&self, method: RpcMethod, params: Vec<Value>) -> Result<RpcReply, ProbeError> {
        let request = self.factory.build(method, params);
        self.call(&request).await
    }

    async fn call_for_result(&self, request: JsonRpcRequest) -> Result<Value, ProbeError> {
        self.call(&request).await?.into_result()
    }

    pub async fn block_number(&self) -> Result<u64, ProbeError> {
        let result = self.call_for_result(self.factory.block_number()).await?;
        let n = quantity::from_value(&result)?;
        u64::try_from(n).map_err(|_| ProbeError::InvalidQuantity(result.to_string()))
    }

    pub async fn gas_price(&self) -> Result<u128, ProbeError> {
        let result = self.call_for_result(self.factory.gas_price()).await?;
        quantity::from_value(&result)
    }

    /// Balance at the latest block, in wei.
    pub async fn get_balance(&self, address: &str) -> Result<u128, ProbeError> {
        let request = self.factory.get_balance(address, BlockTag::Latest.into());
        let result = self.call_for_result(request).await?;
        quantity::from_value(&result)
    }

    pub async fn get_balance_neon(&self, address: &str) -> Result<f64, ProbeError> {
        Ok(quantity::wei_to_neon(self.get_balance(address).await?))
    }

    pub async fn get_transaction_count(&self, address: &str) -> Result<u64, ProbeError> {
        let request = self
            .factory
            .get_transaction_count(address, BlockTag::Latest.into());
        let result = self.call_for_result(request).await?;
        let n = quantity::from_value(&result)?;
        u64::try_from(n).map_err(|_| ProbeError::InvalidQuantity(result.to_string()))
    }

    /// `net_version` carries the chain id as a decimal string.
    pub async fn chain_id_via_net_version(&self) -> Result<u64, ProbeError> {
        let result = self.call_for_result(self.factory.net_version()).await?;
        result
            .as_str()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| ProbeError::InvalidQuantity(result.to_string()))
    }

    pub async fn evm_version(&self) -> Result<Value, ProbeError> {
        self.call_for_result(self.factory.client_version()).await
    }

    pub async fn proxy_version(&self) -> Result<Value, ProbeError> {
        self.call_for_result(self.factory.proxy_version()).await
    }

    pub async fn cli_version(&self) -> Result<Value, ProbeError> {
        self.call_for_result(self.factory.cli_version()).await
    }

    /// Submit a pre-signed transaction; returns the transaction hash.
    pub async fn send_raw_transaction(&self, signed_tx_hex: &str) -> Result<String, ProbeError> {
        let result = self
            .call_for_result(self.factory.send_raw_transaction(signed_tx_hex))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProbeError::Parse(format!("expected tx hash, got {}", result)))
    }

    /// `eth_call` against the latest block; returns the hex-encoded return data.
    pub async fn call_contract(&self, to: &str, data: &str) -> Result<String, ProbeError> {
        let call = CallRequest::new().with_to(to).with_data(data);
        let result = self
            .call_for_result(self.factory.call(&call, BlockTag::Latest.into()))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProbeError::Parse(format!("expected return data, got {}", result)))
    }

    /// `None` while the transaction is not mined yet.
    pub async fn get_transaction_receipt(&self, hash: &str) -> Result<Option<TransactionReceipt>, ProbeError> {
        let result = self
            .call_for_result(self.factory.get_transaction_receipt(hash))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(result)?))
    }

    /// Poll for the receipt of `hash` until it shows up or `timeout` passes.
    /// A reverted transaction is an error.
    pub async fn wait_for_receipt(
        &self,
        hash: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TransactionReceipt, ProbeError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(receipt) = self.get_transaction_receipt(hash).await? {
                if !receipt.succeeded() {
                    return Err(ProbeError::Transaction {
                        hash: hash.to_string(),
                        reason: "reverted".to_string(),
                    });
                }
                return Ok(receipt);
            }
            if tokio::time::Instant::now() + poll_interval > deadline {
                return Err(ProbeError::Transaction {
                    hash: hash.to_string(),
                    reason: format!("no receipt after {}s", timeout.as_secs()),
                });
            }
            debug!(hash = %hash, "Receipt not available yet");
            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = RpcClient::new("http://127.0.0.1:9090/solana", &Config::default()).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:9090/solana");
        assert_eq!(client.request_timeout.as_secs(), 30);
    }

    #[test]
    fn test_clones_share_id_counter() {
        let client = RpcClient::new("http://127.0.0.1:1", &Config::default()).unwrap();
        let other = client.clone();
        assert_eq!(client.factory().block_number().id(), 1);
        assert_eq!(other.factory().block_number().id(), 2);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let config = Config {
            connect_timeout_secs: 1,
            request_timeout_secs: 2,
            ..Config::default()
        };
        // Port 1 is reserved and closed on test hosts.
        let client = RpcClient::new("http://127.0.0.1:1", &config).unwrap();
        let err = client.block_number().await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {:?}", err);
    }

    #[tokio::test]
    async fn test_declared_oversized_body_rejected() {
        let mut server = mockito::Server::new_async().await;
        let body = "x".repeat(limits::MAX_RESPONSE_SIZE_BYTES as usize + 1);
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = RpcClient::new(server.url(), &Config::default()).unwrap();
        let err = client.block_number().await.unwrap_err();
        assert!(
            matches!(&err, ProbeError::Parse(m) if m.contains("exceeds max limit")),
            "unexpected error: {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_chunked_oversized_body_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_chunked_body(|w| {
                use std::io::Write;
                let block = vec![b' '; 1024 * 1024];
                for _ in 0..11 {
                    w.write_all(&block)?;
                }
                Ok(())
            })
            .create_async()
            .await;

        let client = RpcClient::new(server.url(), &Config::default()).unwrap();
        let err = client.block_number().await.unwrap_err();
        assert!(matches!(err, ProbeError::Parse(_)), "unexpected error: {:?}", err);
    }

    #[tokio::test]
    async fn test_wait_for_receipt_reports_revert() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"transactionHash":"0xfeed","status":"0x0"}}"#)
            .create_async()
            .await;

        let client = RpcClient::new(server.url(), &Config::default()).unwrap();
        let err = client
            .wait_for_receipt("0xfeed", Duration::from_secs(1), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Transaction { ref reason, .. } if reason == "reverted"));
    }

    #[tokio::test]
    async fn test_wait_for_receipt_gives_up() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
            .expect_at_least(2)
            .create_async()
            .await;

        let client = RpcClient::new(server.url(), &Config::default()).unwrap();
        let err = client
            .wait_for_receipt("0xbeef", Duration::from_millis(100), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Transaction { .. }));
        mock.assert_async().await;
    }
}
