// src/error.rs
use ethers::types::{Address, H256, U256};
use thiserror::Error;

use crate::pending::Action;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wrong network: expected chain {expected}, connected to chain {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("{0} is already in progress")]
    Busy(Action),

    #[error("Please deploy the account contract! ({0:?} has no code)")]
    NotDeployed(Address),

    #[error("Account contract {0:?} is already deployed")]
    AlreadyDeployed(Address),

    #[error("Please input receiver address")]
    MissingReceiver,

    #[error("Please input correct transfer amount: {0}")]
    InvalidAmount(String),

    #[error("{asset} insufficient funds: need {needed}, have {available}")]
    InsufficientFunds {
        asset: &'static str,
        needed: U256,
        available: U256,
    },

    #[error("Invalid UserOperation: {0}")]
    InvalidUserOperation(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Transaction reverted: {0:?}")]
    TransactionReverted(H256),

    #[error("Transaction dropped from mempool: {0:?}")]
    TransactionDropped(H256),

    #[error("Ethereum provider error: {0}")]
    EthereumProviderError(String),

    #[error("Contract call failed: {0}")]
    ContractError(String),

    #[error("Bundler error: {0}")]
    BundlerError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}
