// src/submit.rs
use std::sync::Arc;

use async_trait::async_trait;
use ethers::prelude::*;
use jsonrpsee::http_client::HttpClient;
use tracing::{debug, info, warn};

use crate::contracts::EntryPoint;
use crate::error::WalletError;
use crate::rpc::{bundler_client, BundlerApiClient};
use crate::types::{Submitted, UserOperation};

/// Somewhere a signed user operation can be sent for execution.
#[async_trait]
pub trait SubmitUserOperation: Send + Sync {
    async fn submit(&self, user_op: UserOperation) -> Result<Submitted, WalletError>;
}

/// Calls `handleOps` on the entry point directly from the EOA.
pub struct EntryPointSubmitter<M> {
    entry_point: EntryPoint<M>,
    beneficiary: Address,
}

impl<M: Middleware + 'static> EntryPointSubmitter<M> {
    pub fn new(entry_point: Address, client: Arc<M>, beneficiary: Address) -> Self {
        Self {
            entry_point: EntryPoint::new(entry_point, client),
            beneficiary,
        }
    }

    /// `handleOps([user_op], beneficiary)` as a legacy transaction.
    fn handle_ops_call(&self, user_op: UserOperation) -> ContractCall<M, ()> {
        self.entry_point
            .handle_ops(vec![user_op.into()], self.beneficiary)
            .legacy()
    }
}

#[async_trait]
impl<M: Middleware + 'static> SubmitUserOperation for EntryPointSubmitter<M> {
    async fn submit(&self, user_op: UserOperation) -> Result<Submitted, WalletError> {
        let sender = user_op.sender;
        let call = self.handle_ops_call(user_op);

        let pending = call
            .send()
            .await
            .map_err(|e| WalletError::ContractError(e.to_string()))?;
        let tx_hash = *pending;

        info!("Submitted handleOps for {:?} in tx {:?}", sender, tx_hash);
        Ok(Submitted::Transaction(tx_hash))
    }
}

/// Sends user operations to an ERC-4337 bundler over JSON-RPC.
pub struct BundlerSubmitter {
    client: HttpClient,
    entry_point: Address,
}

impl BundlerSubmitter {
    pub async fn connect(url: &str, entry_point: Address) -> Result<Self, WalletError> {
        let client = bundler_client(url)?;

        match client.supported_entry_points().await {
            Ok(supported) if supported.contains(&entry_point) => {
                debug!("Bundler at {} supports entry point {:?}", url, entry_point);
            }
            Ok(supported) => {
                warn!(
                    "Bundler at {} does not list entry point {:?} (supported: {:?})",
                    url, entry_point, supported
                );
            }
            Err(e) => {
                warn!("Could not query supported entry points from {}: {}", url, e);
            }
        }

        Ok(Self { client, entry_point })
    }
}

#[async_trait]
impl SubmitUserOperation for BundlerSubmitter {
    async fn submit(&self, user_op: UserOperation) -> Result<Submitted, WalletError> {
        let sender = user_op.sender;
        let user_op_hash = self
            .client
            .send_user_operation(user_op, self.entry_point)
            .await
            .map_err(|e| WalletError::BundlerError(e.to_string()))?;

        info!(
            "Bundler accepted user operation {:?} from {:?}",
            user_op_hash, sender
        );
        Ok(Submitted::UserOperation(user_op_hash))
    }
}
