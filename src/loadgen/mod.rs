//! Load generation: simulated users, per-call timing and event aggregation.

pub mod erc20;
pub mod events;
pub mod instrument;
pub mod recorder;
pub mod runner;
pub mod session;
pub mod wallet;
