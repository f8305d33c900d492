//! Operator economics: does the proxy operator earn more in NEON gas fees
//! than it spends on Solana?

pub mod operator;
pub mod profit;
