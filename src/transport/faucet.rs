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

// Faucet client: grants native-token balance to test accounts

use crate::rpc_core::constants::faucet;
use crate::rpc_core::errors::ProbeError;
use crate::transport::client::map_transport_error;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct FundingRequest<'a> {
    address: &'a str,
    amount: u64,
}

#[derive(Debug, Clone)]
pub struct FaucetClient {
    http_client: Client,
    endpoint: String,
    request_timeout: Duration,
}

impl FaucetClient {
    /// `base_url` is the faucet root; the request path is appended.
    pub fn new(base_url: &str, http_client: Client, request_timeout: Duration) -> Self {
        let endpoint = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            faucet::REQUEST_PATH
        );
        Self {
            http_client,
            endpoint,
            request_timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn request_funds(&self, address: &str, amount: u64) -> Result<(), ProbeError> {
        debug!(endpoint = %self.endpoint, address = %address, amount, "Requesting faucet funds");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&FundingRequest { address, amount })
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.request_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProbeError::Faucet(format!("HTTP {} - {}", status, body)));
        }

        info!(address = %address, amount, "Faucet request accepted");
        Ok(())
    }

    pub async fn request_default(&self, address: &str) -> Result<(), ProbeError> {
        self.request_funds(address, faucet::DEFAULT_AMOUNT).await
    }
}
