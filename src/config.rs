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

use crate::rpc_core::constants::config as keys;
use crate::rpc_core::errors::ProbeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Process configuration loaded from environment variables.
/// CLI flags are applied on top by the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub log_level: String,
    pub log_format: String, // "json" or "text"
    pub credentials_path: PathBuf,
    pub network: String,
    pub pool_size: usize,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ProbeError> {
        Ok(Self {
            log_level: env::var(keys::ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string()),
            log_format: env::var(keys::ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string()),
            credentials_path: env::var(keys::ENV_CREDENTIALS)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(keys::DEFAULT_CREDENTIALS_FILE)),
            network: env::var(keys::ENV_NETWORK)
                .unwrap_or_else(|_| keys::DEFAULT_NETWORK.to_string()),
            pool_size: parse_or_default(keys::ENV_POOL_SIZE, keys::DEFAULT_POOL_SIZE)?,
            request_timeout_secs: parse_or_default(
                keys::ENV_REQUEST_TIMEOUT_SECS,
                keys::DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            connect_timeout_secs: parse_or_default(
                keys::ENV_CONNECT_TIMEOUT_SECS,
                keys::DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            credentials_path: PathBuf::from(keys::DEFAULT_CREDENTIALS_FILE),
            network: keys::DEFAULT_NETWORK.to_string(),
            pool_size: keys::DEFAULT_POOL_SIZE,
            request_timeout_secs: keys::DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: keys::DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

fn parse_or_default<T: FromStr>(key: &str, default: T) -> Result<T, ProbeError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| {
            ProbeError::Configuration(format!("{} has invalid value '{}': {}", key, raw, e))
        }),
        _ => Ok(default),
    }
}

/// Endpoints of one test network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkCredentials {
    pub proxy_url: String,
    pub faucet_url: String,
    pub network_id: u64,
    /// Solana RPC used to read operator balances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solana_url: Option<String>,
    /// Operator Solana public keys (base58)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operator_keys: Vec<String>,
    /// Operator EVM addresses that collect gas fees
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operator_addresses: Vec<String>,
}

/// Credentials file: network name -> endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials {
    networks: HashMap<String, NetworkCredentials>,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self, ProbeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
            .map_err(|e| ProbeError::Credentials(format!("{}: {}", path.display(), e)))
    }

    /// Load `requested`, falling back to `fallback` when the first one does not exist.
    pub fn load_with_fallback(requested: &Path, fallback: &Path) -> Result<Self, ProbeError> {
        if requested.is_file() {
            Self::load(requested)
        } else {
            tracing::warn!(
                requested = %requested.display(),
                fallback = %fallback.display(),
                "Credentials file not found, using fallback"
            );
            Self::load(fallback)
        }
    }

    pub fn from_json(content: &str) -> Result<Self, ProbeError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, network: NetworkCredentials) {
        self.networks.insert(name.into(), network);
    }

    /// Entry for `network`, or the default network's entry if it is unknown.
    pub fn select(&self, network: &str) -> Result<&NetworkCredentials, ProbeError> {
        self.networks
            .get(network)
            .or_else(|| self.networks.get(keys::DEFAULT_NETWORK))
            .ok_or_else(|| {
                ProbeError::Credentials(format!(
                    "network '{}' not found and no '{}' default",
                    network,
                    keys::DEFAULT_NETWORK
                ))
            })
    }

    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}
