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

//! Hex quantity helpers.
//!
//! Ethereum JSON-RPC encodes integers as `0x`-prefixed hex without leading
//! zeros; balances are wei and have to be scaled down for display.

use crate::rpc_core::constants::units;
use crate::rpc_core::errors::ProbeError;
use serde_json::Value;

pub fn to_hex(n: u128) -> String {
    format!("0x{:x}", n)
}

pub fn parse_u128(s: &str) -> Result<u128, ProbeError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| ProbeError::InvalidQuantity(format!("missing 0x prefix: {}", s)))?;
    if digits.is_empty() {
        return Err(ProbeError::InvalidQuantity(format!("empty quantity: {}", s)));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ProbeError::InvalidQuantity(format!("{}: {}", s, e)))
}

/// Read a quantity out of a JSON `result` value.
pub fn from_value(value: &Value) -> Result<u128, ProbeError> {
    match value {
        Value::String(s) => parse_u128(s),
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| ProbeError::InvalidQuantity(n.to_string())),
        other => Err(ProbeError::InvalidQuantity(other.to_string())),
    }
}

pub fn wei_to_neon(wei: u128) -> f64 {
    wei as f64 / units::WEI_PER_NEON
}

pub fn neon_to_wei(neon: f64) -> u128 {
    (neon * units::WEI_PER_NEON) as u128
}

pub fn is_hex(s: &str) -> bool {
    parse_u128(s).is_ok()
}
