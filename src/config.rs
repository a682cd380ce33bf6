// src/config.rs
use ethers::types::{Address, U256};
use ethers::utils::WEI_IN_ETHER;

/// Goerli, where the factory, entry point and test token live.
pub const DEFAULT_DEPLOY_CHAIN_ID: u64 = 5;
/// Network that executes user operations.
pub const DEFAULT_AA_CHAIN_ID: u64 = 0x4337;
pub const DEFAULT_BUNDLER_RPC: &str = "http://127.0.0.1:4337";
pub const DEFAULT_EXPLORER_URL: &str = "https://goerli.etherscan.io";

#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub entry_point: Address,
    pub account_factory: Address,
    pub token: Address,
    /// Salt passed to the factory when deriving and creating the account.
    pub salt: U256,
    pub deploy_chain_id: u64,
    pub aa_chain_id: u64,
    /// Value used by `deposit` and `fund` when none is given (0.01 ETH).
    pub default_value: U256,
    /// Tokens minted per faucet request (100 tokens, 18 decimals).
    pub faucet_amount: U256,
}

impl WalletConfig {
    pub fn new(entry_point: Address, account_factory: Address, token: Address) -> Self {
        Self {
            entry_point,
            account_factory,
            token,
            salt: U256::zero(),
            deploy_chain_id: DEFAULT_DEPLOY_CHAIN_ID,
            aa_chain_id: DEFAULT_AA_CHAIN_ID,
            default_value: WEI_IN_ETHER / 100,
            faucet_amount: WEI_IN_ETHER * 100,
        }
    }

    pub fn with_salt(mut self, salt: U256) -> Self {
        self.salt = salt;
        self
    }

    pub fn with_chains(mut self, deploy_chain_id: u64, aa_chain_id: u64) -> Self {
        self.deploy_chain_id = deploy_chain_id;
        self.aa_chain_id = aa_chain_id;
        self
    }
}
