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

//! proxy-probe constants - single source of truth for protocol values and defaults.
//!
//! Magic numbers, env var names and wire strings live here so the transport,
//! load generator and economics checks agree on them.

/// JSON-RPC 2.0 protocol values
pub mod jsonrpc {
    /// Protocol version tag carried by every envelope
    pub const VERSION: &str = "2.0";
    /// Parse error (standard JSON-RPC)
    pub const ERROR_PARSE: i32 = -32700;
    /// Invalid request (standard JSON-RPC)
    pub const ERROR_INVALID_REQUEST: i32 = -32600;
    /// Method not found (standard JSON-RPC)
    pub const ERROR_METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params (standard JSON-RPC)
    pub const ERROR_INVALID_PARAMS: i32 = -32602;
    /// Internal error (standard JSON-RPC)
    pub const ERROR_INTERNAL: i32 = -32603;
    /// First id handed out by the request factory
    pub const FIRST_REQUEST_ID: u64 = 1;
}

/// Configuration environment variables
pub mod config {
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
    pub const ENV_CREDENTIALS: &str = "PROBE_CREDENTIALS";
    pub const ENV_NETWORK: &str = "PROBE_NETWORK";
    pub const ENV_POOL_SIZE: &str = "PROBE_POOL_SIZE";
    pub const ENV_REQUEST_TIMEOUT_SECS: &str = "PROBE_REQUEST_TIMEOUT_SECS";
    pub const ENV_CONNECT_TIMEOUT_SECS: &str = "PROBE_CONNECT_TIMEOUT_SECS";

    /// Network used when the requested one is missing from the credentials file
    pub const DEFAULT_NETWORK: &str = "night-stand";
    /// Credentials file looked up when nothing else is configured
    pub const DEFAULT_CREDENTIALS_FILE: &str = "envs.json";
    pub const DEFAULT_POOL_SIZE: usize = 10;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
}

/// Transport limits
pub mod limits {
    /// Maximum accepted response body (10 MB)
    pub const MAX_RESPONSE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    /// Idle pooled connections are dropped after this many seconds
    pub const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
}

/// Faucet service
pub mod faucet {
    /// Path appended to the faucet base URL
    pub const REQUEST_PATH: &str = "request";
    /// Default amount of native tokens requested per call
    pub const DEFAULT_AMOUNT: u64 = 1000;
}

/// Unit conversions and pricing used by the economics checks
pub mod units {
    pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;
    pub const WEI_PER_NEON: f64 = 1_000_000_000_000_000_000.0;
    /// USD price of one NEON used when none is configured
    pub const DEFAULT_NEON_PRICE_USD: f64 = 0.25;
    /// Gas price the proxy currently charges, in wei
    pub const DEFAULT_GAS_PRICE_WEI: u64 = 1_000_000_000;
}

/// Load generator defaults
pub mod load {
    /// Simulated users sleep a random time in this range between task sets
    pub const MIN_WAIT_SECS: f64 = 1.0;
    pub const MAX_WAIT_SECS: f64 = 3.0;
    /// A user tops up from the faucet when its balance drops below this (NEON)
    pub const MIN_BALANCE_NEON: f64 = 100.0;
    /// Relative weights of the built-in task sets
    pub const TRANSFERS_WEIGHT: u32 = 2;
    pub const ERC20_WEIGHT: u32 = 1;
    /// Relative weights of the two tasks inside the ERC20 set
    pub const ERC20_DEPLOY_WEIGHT: u32 = 1;
    pub const ERC20_SEND_WEIGHT: u32 = 5;
    /// NEON sent per native transfer
    pub const NEON_TRANSFER_AMOUNT: f64 = 1.0;
    /// Token supply minted to the deployer of a load-test token
    pub const ERC20_INITIAL_SUPPLY: u64 = 1000;
    /// Tokens moved per token transfer
    pub const ERC20_TRANSFER_AMOUNT: u64 = 1;
    /// Start time offset used when a completed task has no recorded start
    pub const MISSING_START_OFFSET_SECS: f64 = 1.0;
    /// Exception recorded for a measured call dropped before it finished
    pub const CANCELLED_EXCEPTION: &str = "cancelled";
}

/// Signed transaction parameters
pub mod tx {
    /// Gas limit of a plain value transfer
    pub const TRANSFER_GAS_LIMIT: u64 = 21_000;
    /// Gas limit of a token contract deployment
    pub const DEPLOY_GAS_LIMIT: u64 = 300_000;
    /// Gas limit of a token contract call
    pub const CONTRACT_CALL_GAS_LIMIT: u64 = 100_000;
    /// How long to wait for a sent transaction to be mined
    pub const RECEIPT_TIMEOUT_SECS: u64 = 120;
    pub const RECEIPT_POLL_INTERVAL_MS: u64 = 500;
}
