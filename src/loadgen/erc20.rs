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

//! Token contract used by the ERC20 task set.
//!
//! A pre-assembled contract that implements the two ERC20 entry points the
//! load users call, `balanceOf(address)` and `transfer(address,uint256)`.
//! The constructor takes the initial supply and credits it to the deployer.
//! Balances live at the storage slot equal to the holder's address.

use crate::rpc_core::errors::ProbeError;
use alloy_primitives::{Address, U256};
use std::str::FromStr;

pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Stores the supply argument under the caller, then returns the runtime code.
/// Byte 3 is the offset of the argument, byte 13 the runtime length and
/// byte 15 the runtime offset.
const INIT_CODE: [u8; 24] = [
    0x60, 0x20, 0x60, 0x6b, 0x60, 0x00, 0x39, // codecopy(0, 107, 32)
    0x60, 0x00, 0x51, 0x33, 0x55, // sstore(caller, mload(0))
    0x60, 0x53, 0x60, 0x18, 0x60, 0x00, 0x39, // codecopy(0, 24, 83)
    0x60, 0x53, 0x60, 0x00, 0xf3, // return(0, 83)
];

const RUNTIME_CODE: [u8; 83] = [
    // selector dispatch
    0x60, 0x00, 0x35, 0x60, 0xe0, 0x1c, 0x80, 0x63, 0x70, 0xa0, 0x82, 0x31, 0x14, 0x60, 0x1d,
    0x57, 0x63, 0xa9, 0x05, 0x9c, 0xbb, 0x14, 0x60, 0x2b, 0x57, 0x60, 0x00, 0x80, 0xfd,
    // 0x1d: balanceOf
    0x5b, 0x50, 0x60, 0x04, 0x35, 0x54, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
    // 0x2b: transfer, reverts when the sender balance is short
    0x5b, 0x60, 0x24, 0x35, 0x33, 0x54, 0x81, 0x81, 0x10, 0x60, 0x4e, 0x57, 0x03, 0x33, 0x55,
    0x60, 0x04, 0x35, 0x80, 0x54, 0x82, 0x01, 0x90, 0x55, 0x50, 0x60, 0x01, 0x60, 0x00, 0x52,
    0x60, 0x20, 0x60, 0x00, 0xf3,
    // 0x4e: revert
    0x5b, 0x60, 0x00, 0x80, 0xfd,
];

/// Init code plus the ABI-encoded constructor argument.
pub fn deploy_data(initial_supply: U256) -> Vec<u8> {
    let mut data = Vec::with_capacity(INIT_CODE.len() + RUNTIME_CODE.len() + 32);
    data.extend_from_slice(&INIT_CODE);
    data.extend_from_slice(&RUNTIME_CODE);
    data.extend_from_slice(&initial_supply.to_be_bytes::<32>());
    data
}

pub fn balance_of_data(owner: Address) -> Vec<u8> {
    let mut data = BALANCE_OF_SELECTOR.to_vec();
    data.extend_from_slice(owner.into_word().as_slice());
    data
}

pub fn transfer_data(to: Address, amount: U256) -> Vec<u8> {
    let mut data = TRANSFER_SELECTOR.to_vec();
    data.extend_from_slice(to.into_word().as_slice());
    data.extend_from_slice(&amount.to_be_bytes::<32>());
    data
}

/// Decode a single `uint256` return value.
pub fn decode_uint(return_data: &str) -> Result<U256, ProbeError> {
    U256::from_str(return_data)
        .map_err(|e| ProbeError::InvalidQuantity(format!("{}: {}", return_data, e)))
}

pub fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;

    #[test]
    fn test_selectors_match_signatures() {
        assert_eq!(keccak256("balanceOf(address)")[..4], BALANCE_OF_SELECTOR);
        assert_eq!(keccak256("transfer(address,uint256)")[..4], TRANSFER_SELECTOR);
    }

    #[test]
    fn test_init_code_offsets() {
        assert_eq!(usize::from(INIT_CODE[3]), INIT_CODE.len() + RUNTIME_CODE.len());
        assert_eq!(usize::from(INIT_CODE[13]), RUNTIME_CODE.len());
        assert_eq!(usize::from(INIT_CODE[15]), INIT_CODE.len());
        assert_eq!(usize::from(INIT_CODE[20]), RUNTIME_CODE.len());
        // jump targets land on JUMPDEST
        for target in [0x1d, 0x2b, 0x4e] {
            assert_eq!(RUNTIME_CODE[target], 0x5b);
        }
    }

    #[test]
    fn test_deploy_data_ends_with_supply() {
        let data = deploy_data(U256::from(1000u64));
        assert_eq!(data.len(), 24 + 83 + 32);
        assert_eq!(&data[data.len() - 2..], &[0x03u8, 0xe8]);
    }

    #[test]
    fn test_transfer_calldata_layout() {
        let to = Address::repeat_byte(0x11);
        let data = transfer_data(to, U256::from(1u64));
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[..4], &TRANSFER_SELECTOR);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..36], to.as_slice());
        assert_eq!(data[67], 1);
        assert_eq!(balance_of_data(to).len(), 36);
    }

    #[test]
    fn test_decode_uint() {
        let word = format!("0x{:064x}", 1000);
        assert_eq!(decode_uint(&word).unwrap(), U256::from(1000u64));
        assert!(decode_uint("0xzz").is_err());
    }
}
