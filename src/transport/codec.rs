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

//! JSON-RPC response codec.
//!
//! Turns a raw HTTP body into an `RpcReply`. The variant is decided by key
//! presence on the decoded object: `result` means success, otherwise `error`
//! means an error envelope. Nothing is inferred from the text of the body.

use crate::rpc_core::constants::limits;
use crate::rpc_core::errors::ProbeError;
use crate::rpc_core::models::{JsonRpcErrorResponse, JsonRpcResponse, RpcReply};
use serde_json::Value;
use tracing::trace;

pub fn parse_response(body: &[u8]) -> Result<RpcReply, ProbeError> {
    if body.len() as u64 > limits::MAX_RESPONSE_SIZE_BYTES {
        return Err(ProbeError::Parse(format!(
            "Response length {} exceeds max limit",
            body.len()
        )));
    }
    let value: Value = serde_json::from_slice(body)?;
    trace!("Decoded response: {:?}", value);
    parse_value(value)
}

pub fn parse_value(value: Value) -> Result<RpcReply, ProbeError> {
    let object = value
        .as_object()
        .ok_or_else(|| ProbeError::Parse(format!("expected a JSON object, got {}", value)))?;

    if object.contains_key("result") {
        let response: JsonRpcResponse = serde_json::from_value(value)?;
        Ok(RpcReply::Success(response))
    } else if object.contains_key("error") {
        let response: JsonRpcErrorResponse = serde_json::from_value(value)?;
        Ok(RpcReply::Error(response))
    } else {
        Err(ProbeError::Parse(
            "response carries neither `result` nor `error`".to_string(),
        ))
    }
}
