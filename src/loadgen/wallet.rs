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

//! Load-user accounts and signed transactions.
//!
//! Every simulated user owns a fresh secp256k1 key. Transactions are legacy
//! (pre-EIP-1559) with an EIP-155 chain id and a fixed gas price, signed
//! locally and submitted with `eth_sendRawTransaction`.

use crate::rpc_core::constants::{tx, units};
use crate::rpc_core::errors::ProbeError;
use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, Bytes, TxKind, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

/// Unsigned legacy transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    /// `None` creates a contract
    pub to: Option<Address>,
    pub value: U256,
    pub input: Vec<u8>,
}

impl TxRequest {
    /// Plain value transfer with the 21000 gas limit.
    pub fn transfer(chain_id: u64, nonce: u64, to: Address, value_wei: u128) -> Self {
        Self {
            chain_id,
            nonce,
            gas_price: u128::from(units::DEFAULT_GAS_PRICE_WEI),
            gas_limit: tx::TRANSFER_GAS_LIMIT,
            to: Some(to),
            value: U256::from(value_wei),
            input: Vec::new(),
        }
    }

    pub fn deploy(chain_id: u64, nonce: u64, init_code: Vec<u8>) -> Self {
        Self {
            chain_id,
            nonce,
            gas_price: u128::from(units::DEFAULT_GAS_PRICE_WEI),
            gas_limit: tx::DEPLOY_GAS_LIMIT,
            to: None,
            value: U256::ZERO,
            input: init_code,
        }
    }

    pub fn contract_call(chain_id: u64, nonce: u64, contract: Address, data: Vec<u8>) -> Self {
        Self {
            chain_id,
            nonce,
            gas_price: u128::from(units::DEFAULT_GAS_PRICE_WEI),
            gas_limit: tx::CONTRACT_CALL_GAS_LIMIT,
            to: Some(contract),
            value: U256::ZERO,
            input: data,
        }
    }

    fn to_legacy(&self) -> TxLegacy {
        TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to.map_or(TxKind::Create, TxKind::Call),
            value: self.value,
            input: Bytes::from(self.input.clone()),
        }
    }
}

/// Signed transaction ready for `eth_sendRawTransaction`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    /// 0x-prefixed EIP-2718 encoding
    pub raw: String,
    pub hash: String,
}

/// A simulated user's EVM account.
#[derive(Debug, Clone)]
pub struct Account {
    signer: PrivateKeySigner,
    address: String,
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Account {}

impl Account {
    /// Fresh random key
    pub fn generate() -> Self {
        Self::from_signer(PrivateKeySigner::random())
    }

    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        let address = signer.address().to_checksum(None);
        Self { signer, address }
    }

    /// Checksummed 0x address
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn evm_address(&self) -> Address {
        self.signer.address()
    }

    /// Abbreviated form for log lines
    pub fn short(&self) -> &str {
        &self.address[..self.address.len().min(8)]
    }

    /// Address a contract deployed by this account at `nonce` ends up at.
    pub fn contract_address(&self, nonce: u64) -> Address {
        self.evm_address().create(nonce)
    }

    pub fn sign(&self, request: &TxRequest) -> Result<SignedTx, ProbeError> {
        let legacy = request.to_legacy();
        let signature = self
            .signer
            .sign_hash_sync(&legacy.signature_hash())
            .map_err(|e| ProbeError::Signing(e.to_string()))?;
        let signed = legacy.into_signed(signature);
        let hash = format!("{}", signed.hash());
        let envelope = TxEnvelope::from(signed);
        Ok(SignedTx {
            raw: format!("0x{}", hex::encode(envelope.encoded_2718())),
            hash,
        })
    }
}
