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

//! proxy-probe: a JSON-RPC 2.0 test client for an EVM-compatible proxy.
//!
//! The library builds catalogued requests, dispatches them over pooled HTTP,
//! decodes replies into a success/error sum type, times calls for load
//! reports and checks operator economics. The `proxy-probe` binary wires
//! these together behind a small CLI.

pub mod config;
pub mod economics;
pub mod loadgen;
pub mod rpc_core;
pub mod transport;
pub mod utils;
