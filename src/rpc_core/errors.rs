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

// Domain error types for probing, load generation and economics checks

use thiserror::Error;

/// Main error type for proxy-probe
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Connection refused, DNS failure, broken pipe
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Non-success HTTP status with a body that is not a JSON-RPC envelope
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Body is not a JSON-RPC 2.0 success or error envelope
    #[error("Parse error: {0}")]
    Parse(String),

    /// Method name outside the supported catalog
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// Remote endpoint answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Credentials file missing, malformed or without a usable network
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// I/O Error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Faucet refused or failed the funding request
    #[error("Faucet error: {0}")]
    Faucet(String),

    /// Operator spent more on Solana than it collected in gas fees
    #[error("Operator loss: {0}")]
    OperatorLoss(String),

    /// Operator NEON balance went down during the measured operation
    #[error("NEON has negative difference {0}")]
    NegativeNeonDifference(f64),

    /// Hex quantity could not be decoded
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Local key failed to sign a transaction
    #[error("Signing error: {0}")]
    Signing(String),

    /// Transaction reverted or its receipt never showed up
    #[error("Transaction {hash} failed: {reason}")]
    Transaction { hash: String, reason: String },
}

impl From<serde_json::Error> for ProbeError {
    fn from(e: serde_json::Error) -> Self {
        ProbeError::Parse(e.to_string())
    }
}

impl ProbeError {
    /// Whether the failure happened below the JSON-RPC layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProbeError::Transport(_) | ProbeError::Timeout(_) | ProbeError::Http { .. }
        )
    }
}
