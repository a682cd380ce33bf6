// src/wallet.rs
use std::sync::Arc;

use ethers::abi::AbiEncode;
use ethers::prelude::*;
use tracing::{debug, info, warn};

use crate::config::WalletConfig;
use crate::contracts::{AccountFactory, EntryPoint, ExecuteCall, SimpleAccount, TestToken, TransferCall};
use crate::error::WalletError;
use crate::format::{format_ether_fixed, DEPOSIT_DECIMALS};
use crate::pending::{Action, InFlight};
use crate::submit::SubmitUserOperation;
use crate::types::{AaInfo, DeployStatus, Submitted, Transfer, TxOutcome, UserOperation};
use crate::user_operation::{self, GAS_PRICE_BUFFER_PERCENT};

/// An EOA together with the smart account the factory derives for it.
pub struct AaWallet<M> {
    client: Arc<M>,
    signer: LocalWallet,
    config: WalletConfig,
    in_flight: InFlight,
}

impl<M: Middleware + 'static> AaWallet<M> {
    pub fn new(client: Arc<M>, signer: LocalWallet, config: WalletConfig) -> Self {
        info!("Initialized wallet for EOA {:?}", signer.address());

        Self {
            client,
            signer,
            config,
            in_flight: InFlight::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn client(&self) -> Arc<M> {
        self.client.clone()
    }

    fn factory(&self) -> AccountFactory<M> {
        AccountFactory::new(self.config.account_factory, self.client.clone())
    }

    fn entry_point(&self) -> EntryPoint<M> {
        EntryPoint::new(self.config.entry_point, self.client.clone())
    }

    fn token(&self) -> TestToken<M> {
        TestToken::new(self.config.token, self.client.clone())
    }

    /// Fails unless the provider is connected to `expected`.
    pub async fn ensure_network(&self, expected: u64) -> Result<(), WalletError> {
        let actual = self
            .client
            .get_chainid()
            .await
            .map_err(|e| WalletError::EthereumProviderError(e.to_string()))?
            .as_u64();

        if actual != expected {
            return Err(WalletError::WrongNetwork { expected, actual });
        }
        Ok(())
    }

    /// The counterfactual account address for the owner and configured salt.
    pub async fn derive_address(&self) -> Result<Address, WalletError> {
        let address = self
            .factory()
            .get_address(self.owner(), self.config.salt)
            .call()
            .await
            .map_err(|e| WalletError::ContractError(e.to_string()))?;

        if address.is_zero() {
            return Err(WalletError::ContractError(
                "factory returned the zero address".to_string(),
            ));
        }

        debug!("Derived account {:?} for owner {:?}", address, self.owner());
        Ok(address)
    }

    pub async fn is_deployed(&self, address: Address) -> Result<bool, WalletError> {
        let code = self
            .client
            .get_code(address, None)
            .await
            .map_err(|e| WalletError::EthereumProviderError(e.to_string()))?;

        Ok(!code.is_empty())
    }

    /// Derives the account address, then reads its balance, deployment
    /// status and entry point deposit concurrently. A failed read leaves its
    /// field unset.
    pub async fn fetch_info(&self) -> Result<AaInfo, WalletError> {
        let address = self.derive_address().await?;

        let entry_point = self.entry_point();
        let deposit_call = entry_point.balance_of(address);
        let (balance, deployed, deposit) = tokio::join!(
            self.client.get_balance(address, None),
            self.is_deployed(address),
            deposit_call.call(),
        );

        let balance = balance
            .map_err(|e| warn!("Failed to fetch balance of {:?}: {}", address, e))
            .ok();
        let deploy_status = match deployed {
            Ok(flag) => DeployStatus::from(flag),
            Err(e) => {
                warn!("Failed to check deployment of {:?}: {}", address, e);
                DeployStatus::Checking
            }
        };
        let deposited_gas = deposit
            .map_err(|e| warn!("Failed to fetch deposit of {:?}: {}", address, e))
            .ok();

        Ok(AaInfo {
            owner: self.owner(),
            address,
            balance,
            deploy_status,
            deposited_gas,
        })
    }

    /// Creates the account through the factory and waits for it to be mined.
    pub async fn deploy(&self) -> Result<TxOutcome, WalletError> {
        let _guard = self.in_flight.begin(Action::Deploy)?;
        self.ensure_network(self.config.deploy_chain_id).await?;

        let address = self.derive_address().await?;
        if self.is_deployed(address).await? {
            return Err(WalletError::AlreadyDeployed(address));
        }

        let factory = self.factory();
        let call = factory.create_account(self.owner(), self.config.salt);
        let pending = call
            .send()
            .await
            .map_err(|e| WalletError::ContractError(e.to_string()))?;
        info!("Deploying account {:?} in tx {:?}", address, *pending);

        let outcome = confirm(pending).await?;
        info!("Account {:?} deployed", address);
        Ok(outcome)
    }

    /// Deposits gas for the account into the entry point.
    pub async fn deposit_gas(&self, value: Option<U256>) -> Result<TxOutcome, WalletError> {
        let _guard = self.in_flight.begin(Action::DepositGas)?;
        self.ensure_network(self.config.deploy_chain_id).await?;

        let address = self.derive_address().await?;
        let call = self.deposit_call(address, value);
        let pending = call
            .send()
            .await
            .map_err(|e| WalletError::ContractError(e.to_string()))?;
        info!("Depositing gas for {:?} in tx {:?}", address, *pending);

        confirm(pending).await
    }

    fn deposit_call(&self, account: Address, value: Option<U256>) -> ContractCall<M, ()> {
        self.entry_point()
            .deposit_to(account)
            .value(value.unwrap_or(self.config.default_value))
    }

    /// Sends plain ETH from the EOA to the account.
    pub async fn fund_eth(&self, value: Option<U256>) -> Result<TxOutcome, WalletError> {
        let _guard = self.in_flight.begin(Action::FundEth)?;
        self.ensure_network(self.config.deploy_chain_id).await?;

        let address = self.derive_address().await?;
        let tx = self.fund_request(address, value);
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| WalletError::EthereumProviderError(e.to_string()))?;
        info!("Funding {:?} in tx {:?}", address, *pending);

        confirm(pending).await
    }

    fn fund_request(&self, account: Address, value: Option<U256>) -> TransactionRequest {
        TransactionRequest::new()
            .from(self.owner())
            .to(account)
            .value(value.unwrap_or(self.config.default_value))
    }

    /// Mints test tokens to the EOA, or to the account when `to_account` is set.
    pub async fn faucet_token(&self, to_account: bool) -> Result<(Address, TxOutcome), WalletError> {
        let _guard = self.in_flight.begin(Action::Faucet)?;
        self.ensure_network(self.config.deploy_chain_id).await?;

        let to = self.faucet_recipient(to_account).await?;
        let call = self.mint_call(to);
        let pending = call
            .send()
            .await
            .map_err(|e| WalletError::ContractError(e.to_string()))?;
        info!("Minting tokens to {:?} in tx {:?}", to, *pending);

        let outcome = confirm(pending).await?;
        Ok((to, outcome))
    }

    async fn faucet_recipient(&self, to_account: bool) -> Result<Address, WalletError> {
        if to_account {
            self.derive_address().await
        } else {
            Ok(self.owner())
        }
    }

    fn mint_call(&self, to: Address) -> ContractCall<M, ()> {
        self.token().mint(to, self.config.faucet_amount)
    }

    pub async fn token_balance(&self, address: Address) -> Result<U256, WalletError> {
        self.token()
            .balance_of(address)
            .call()
            .await
            .map_err(|e| WalletError::ContractError(e.to_string()))
    }

    /// Transfers test tokens out of the account through a user operation.
    pub async fn send_erc20(
        &self,
        transfer: &Transfer,
        submitter: &dyn SubmitUserOperation,
    ) -> Result<Submitted, WalletError> {
        let _guard = self.in_flight.begin(Action::SendErc20)?;
        self.ensure_network(self.config.aa_chain_id).await?;
        let sender = self.deployed_account().await?;

        let available = self.token_balance(sender).await?;
        if transfer.amount > available {
            return Err(WalletError::InsufficientFunds {
                asset: "ZPB",
                needed: transfer.amount,
                available,
            });
        }

        let transfer_call = TransferCall {
            to: transfer.receiver,
            amount: transfer.amount,
        };
        let user_op = self
            .prepare_execute(
                sender,
                self.config.token,
                U256::zero(),
                Bytes::from(transfer_call.encode()),
            )
            .await?;
        let estimated_gas = user_operation::max_cost(&user_op, GAS_PRICE_BUFFER_PERCENT)?;

        self.sign_and_submit(user_op, estimated_gas, submitter).await
    }

    /// Transfers ETH out of the account through a user operation.
    pub async fn send_eth(
        &self,
        transfer: &Transfer,
        submitter: &dyn SubmitUserOperation,
    ) -> Result<Submitted, WalletError> {
        let _guard = self.in_flight.begin(Action::SendEth)?;
        self.ensure_network(self.config.aa_chain_id).await?;
        let sender = self.deployed_account().await?;

        let user_op = self
            .prepare_execute(sender, transfer.receiver, transfer.amount, Bytes::default())
            .await?;

        let estimated_gas = user_operation::max_cost(&user_op, GAS_PRICE_BUFFER_PERCENT)?;
        let needed = transfer
            .amount
            .checked_add(estimated_gas)
            .ok_or_else(|| WalletError::InvalidAmount("amount overflow".to_string()))?;
        let available = self
            .client
            .get_balance(sender, None)
            .await
            .map_err(|e| WalletError::EthereumProviderError(e.to_string()))?;
        if needed > available {
            return Err(WalletError::InsufficientFunds {
                asset: "ETH (including estimated gas)",
                needed,
                available,
            });
        }

        self.sign_and_submit(user_op, estimated_gas, submitter).await
    }

    /// The account address, provided it has been deployed.
    async fn deployed_account(&self) -> Result<Address, WalletError> {
        let address = self.derive_address().await?;
        if !self.is_deployed(address).await? {
            return Err(WalletError::NotDeployed(address));
        }
        Ok(address)
    }

    /// Builds an unsigned operation that makes `sender` call `dest`.
    async fn prepare_execute(
        &self,
        sender: Address,
        dest: Address,
        value: U256,
        func: Bytes,
    ) -> Result<UserOperation, WalletError> {
        let nonce = SimpleAccount::new(sender, self.client.clone())
            .nonce()
            .call()
            .await
            .map_err(|e| WalletError::ContractError(e.to_string()))?;

        let call_data = ExecuteCall { dest, value, func }.encode();
        Ok(user_operation::transfer_operation(
            sender,
            nonce,
            Bytes::from(call_data),
        ))
    }

    async fn sign_and_submit(
        &self,
        user_op: UserOperation,
        estimated_gas: U256,
        submitter: &dyn SubmitUserOperation,
    ) -> Result<Submitted, WalletError> {
        info!(
            "Estimate gas: {} ETH",
            format_ether_fixed(estimated_gas, DEPOSIT_DECIMALS)
        );

        let user_op = user_operation::sign(
            user_op,
            &self.signer,
            self.config.entry_point,
            self.config.aa_chain_id,
        )
        .await?;

        debug!(
            "Submitting user operation {:?} (nonce {}) for {:?}",
            user_operation::hash(&user_op, self.config.entry_point, self.config.aa_chain_id),
            user_op.nonce,
            user_op.sender
        );
        submitter.submit(user_op).await
    }
}

/// Waits for a transaction to be mined and checks that it succeeded.
async fn confirm<P: JsonRpcClient>(pending: PendingTransaction<'_, P>) -> Result<TxOutcome, WalletError> {
    let tx_hash = *pending;
    let receipt = pending
        .await
        .map_err(|e| WalletError::EthereumProviderError(e.to_string()))?
        .ok_or(WalletError::TransactionDropped(tx_hash))?;

    if receipt.status == Some(U64::zero()) {
        return Err(WalletError::TransactionReverted(tx_hash));
    }

    Ok(TxOutcome {
        tx_hash,
        block_number: receipt.block_number,
    })
}
