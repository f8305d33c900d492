//! HTTP transport: the JSON-RPC dispatcher, its response codec and the faucet.

pub mod client;
pub mod codec;
pub mod faucet;
