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

use crate::rpc_core::constants::units;
use crate::rpc_core::errors::ProbeError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// USD prices used to compare both sides of an operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    pub sol_usd: f64,
    pub neon_usd: f64,
}

impl Prices {
    /// `sol_usd` with the default NEON price
    pub fn with_sol(sol_usd: f64) -> Self {
        Self {
            sol_usd,
            neon_usd: units::DEFAULT_NEON_PRICE_USD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitReport {
    pub sol_spent_lamports: u64,
    pub neon_gained: f64,
    pub sol_cost_usd: f64,
    pub neon_income_usd: f64,
    /// `(income - cost) / cost * 100`
    pub profit_percent: f64,
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / units::LAMPORTS_PER_SOL
}

/// Compare what the operator spent on Solana with what it collected in NEON.
///
/// Fails with `NegativeNeonDifference` when the NEON side went down, and with
/// `OperatorLoss` when the collected fees do not exceed the Solana cost.
pub fn assess_profit(
    sol_spent_lamports: u64,
    neon_gained: f64,
    prices: Prices,
) -> Result<ProfitReport, ProbeError> {
    if neon_gained < 0.0 {
        return Err(ProbeError::NegativeNeonDifference(neon_gained));
    }

    let sol_cost_usd = lamports_to_sol(sol_spent_lamports) * prices.sol_usd;
    let neon_income_usd = neon_gained * prices.neon_usd;
    debug!(sol_cost_usd, neon_income_usd, "Operator balance comparison");

    if neon_income_usd <= sol_cost_usd {
        return Err(ProbeError::OperatorLoss(format!(
            "operator gained ${:.6} in NEON but spent ${:.6} in SOL",
            neon_income_usd, sol_cost_usd
        )));
    }

    let profit_percent = if sol_cost_usd > 0.0 {
        (neon_income_usd - sol_cost_usd) / sol_cost_usd * 100.0
    } else {
        f64::INFINITY
    };
    info!(profit_percent, "Operator is profitable");

    Ok(ProfitReport {
        sol_spent_lamports,
        neon_gained,
        sol_cost_usd,
        neon_income_usd,
        profit_percent,
    })
}
