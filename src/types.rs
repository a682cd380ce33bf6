// src/types.rs
use ethers::types::{Address, Bytes, H256, U256, U64};
use ethers::utils::parse_ether;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Default verification gas limit substituted into new user operations.
pub const DEFAULT_VERIFICATION_GAS_LIMIT: u64 = 50;
/// Default pre-verification gas substituted into new user operations.
pub const DEFAULT_PRE_VERIFICATION_GAS: u64 = 50;
/// 1 gwei.
pub const DEFAULT_MAX_PRIORITY_FEE_PER_GAS: u64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl Default for UserOperation {
    fn default() -> Self {
        Self {
            sender: Address::zero(),
            nonce: U256::zero(),
            init_code: Bytes::default(),
            call_data: Bytes::default(),
            call_gas_limit: U256::zero(),
            verification_gas_limit: U256::from(DEFAULT_VERIFICATION_GAS_LIMIT),
            pre_verification_gas: U256::from(DEFAULT_PRE_VERIFICATION_GAS),
            max_fee_per_gas: U256::zero(),
            max_priority_fee_per_gas: U256::from(DEFAULT_MAX_PRIORITY_FEE_PER_GAS),
            paymaster_and_data: Bytes::default(),
            signature: Bytes::default(),
        }
    }
}

impl UserOperation {
    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = sender;
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn call_data(mut self, call_data: Bytes) -> Self {
        self.call_data = call_data;
        self
    }

    pub fn call_gas_limit(mut self, call_gas_limit: U256) -> Self {
        self.call_gas_limit = call_gas_limit;
        self
    }

    pub fn max_fee_per_gas(mut self, max_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = max_fee_per_gas;
        self
    }

    pub fn signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    Checking,
    NotDeployed,
    Deployed,
}

impl From<bool> for DeployStatus {
    fn from(deployed: bool) -> Self {
        if deployed {
            DeployStatus::Deployed
        } else {
            DeployStatus::NotDeployed
        }
    }
}

/// Snapshot of the smart account belonging to an EOA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AaInfo {
    pub owner: Address,
    pub address: Address,
    pub balance: Option<U256>,
    pub deploy_status: DeployStatus,
    pub deposited_gas: Option<U256>,
}

/// A validated transfer request. `amount` is in wei (or token base units).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub receiver: Address,
    pub amount: U256,
}

impl Transfer {
    /// Parses raw user input; `amount` is a decimal in ether units.
    pub fn parse(receiver: &str, amount: &str) -> Result<Self, WalletError> {
        let receiver = receiver.trim();
        if receiver.is_empty() {
            return Err(WalletError::MissingReceiver);
        }
        let receiver = receiver
            .parse::<Address>()
            .map_err(|e| WalletError::InvalidParameters(format!("receiver {receiver}: {e}")))?;

        let amount = parse_amount(amount)?;

        Ok(Self { receiver, amount })
    }
}

/// Parses a positive decimal ether amount into wei.
pub fn parse_amount(amount: &str) -> Result<U256, WalletError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(WalletError::InvalidAmount("amount is empty".to_string()));
    }
    // parse_ether accepts signed input and wraps it into a U256
    if amount.starts_with('-') {
        return Err(WalletError::InvalidAmount("amount must be positive".to_string()));
    }
    let amount = parse_ether(amount).map_err(|e| WalletError::InvalidAmount(e.to_string()))?;
    if amount.is_zero() {
        return Err(WalletError::InvalidAmount("amount must be positive".to_string()));
    }
    Ok(amount)
}

/// Result of handing a user operation off for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "hash", rename_all = "snake_case")]
pub enum Submitted {
    /// Sent straight to the entry point; the hash is the transaction hash.
    Transaction(H256),
    /// Accepted by a bundler; the hash is the user operation hash.
    UserOperation(H256),
}

/// A mined EOA transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutcome {
    pub tx_hash: H256,
    pub block_number: Option<U64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_operation_substitutes_gas_defaults() {
        let op = UserOperation::default();

        assert_eq!(op.sender, Address::zero());
        assert_eq!(op.verification_gas_limit, U256::from(50));
        assert_eq!(op.pre_verification_gas, U256::from(50));
        assert_eq!(op.max_priority_fee_per_gas, U256::exp10(9));
        assert!(op.call_data.is_empty());
        assert!(op.signature.is_empty());
    }

    #[test]
    fn user_operation_serializes_camel_case() {
        let op = UserOperation::default().nonce(U256::from(7));
        let value = serde_json::to_value(&op).unwrap();

        assert_eq!(value["nonce"], "0x7");
        assert_eq!(value["callData"], "0x");
        assert!(value.get("maxPriorityFeePerGas").is_some());
        assert!(value.get("call_data").is_none());
    }

    #[test]
    fn transfer_requires_receiver() {
        assert!(matches!(
            Transfer::parse("  ", "1"),
            Err(WalletError::MissingReceiver)
        ));
    }

    #[test]
    fn transfer_requires_amount() {
        let receiver = "0x21A14e061fe67A3060ef238DDD8Bf90c81829F7d";

        assert!(matches!(
            Transfer::parse(receiver, ""),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            Transfer::parse(receiver, "abc"),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            Transfer::parse(receiver, "0"),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn transfer_rejects_negative_amount() {
        let receiver = "0x21A14e061fe67A3060ef238DDD8Bf90c81829F7d";

        assert!(matches!(
            Transfer::parse(receiver, "-1"),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            Transfer::parse(receiver, " -0.01"),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn parse_amount_accepts_positive_decimals() {
        assert_eq!(parse_amount("0.01").unwrap(), U256::exp10(16));
        assert!(matches!(
            parse_amount("-0.01"),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn transfer_parses_ether_amount() {
        let transfer =
            Transfer::parse("0x21A14e061fe67A3060ef238DDD8Bf90c81829F7d", "0.5").unwrap();

        assert_eq!(transfer.amount, U256::exp10(17) * 5);
    }

    #[test]
    fn transfer_rejects_malformed_receiver() {
        assert!(matches!(
            Transfer::parse("0x1234", "1"),
            Err(WalletError::InvalidParameters(_))
        ));
    }

    #[test]
    fn deploy_status_from_code_check() {
        assert_eq!(DeployStatus::from(true), DeployStatus::Deployed);
        assert_eq!(DeployStatus::from(false), DeployStatus::NotDeployed);
    }
}
