// src/rpc.rs
use ethers::types::{Address, H256, U64};
use jsonrpsee::core::RpcResult;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::proc_macros::rpc;

use crate::error::WalletError;
use crate::types::UserOperation;

/// Bundler-facing subset of the ERC-4337 `eth` namespace.
#[rpc(client, namespace = "eth")]
pub trait BundlerApi {
    /// Hands a signed user operation to the bundler's mempool.
    #[method(name = "sendUserOperation")]
    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<H256>;

    #[method(name = "supportedEntryPoints")]
    async fn supported_entry_points(&self) -> RpcResult<Vec<Address>>;

    #[method(name = "chainId")]
    async fn chain_id(&self) -> RpcResult<U64>;
}

pub fn bundler_client(url: &str) -> Result<HttpClient, WalletError> {
    HttpClientBuilder::default()
        .build(url)
        .map_err(|e| WalletError::BundlerError(format!("cannot connect to {url}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_client_for_http_url() {
        assert!(bundler_client("http://127.0.0.1:4337").is_ok());
    }

    #[tokio::test]
    async fn rejects_malformed_url() {
        assert!(matches!(
            bundler_client("not a url"),
            Err(WalletError::BundlerError(_))
        ));
    }
}
