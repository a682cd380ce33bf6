// src/user_operation.rs
use ethers::abi::{self, Token};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;

use crate::error::WalletError;
use crate::types::UserOperation;

/// Gas allotted to the account's `execute` call for transfers.
pub const TRANSFER_CALL_GAS_LIMIT: u64 = 10_000_000;
/// Fee cap used for transfers, in wei.
pub const TRANSFER_MAX_FEE_PER_GAS: u64 = 1_016_982_020;
/// Percentage added on top of the fee cap when estimating the gas cost.
pub const GAS_PRICE_BUFFER_PERCENT: u64 = 10;

/// ABI-encodes every field except the signature. Dynamic byte fields are
/// replaced by their keccak256 so the encoding has a fixed size.
pub fn pack_without_signature(user_op: &UserOperation) -> Vec<u8> {
    abi::encode(&[
        Token::Address(user_op.sender),
        Token::Uint(user_op.nonce),
        Token::FixedBytes(keccak256(&user_op.init_code).to_vec()),
        Token::FixedBytes(keccak256(&user_op.call_data).to_vec()),
        Token::Uint(user_op.call_gas_limit),
        Token::Uint(user_op.verification_gas_limit),
        Token::Uint(user_op.pre_verification_gas),
        Token::Uint(user_op.max_fee_per_gas),
        Token::Uint(user_op.max_priority_fee_per_gas),
        Token::FixedBytes(keccak256(&user_op.paymaster_and_data).to_vec()),
    ])
}

/// The user operation hash the entry point computes in `getUserOpHash`.
pub fn hash(user_op: &UserOperation, entry_point: Address, chain_id: u64) -> H256 {
    let inner = keccak256(pack_without_signature(user_op));
    let encoded = abi::encode(&[
        Token::FixedBytes(inner.to_vec()),
        Token::Address(entry_point),
        Token::Uint(U256::from(chain_id)),
    ]);
    H256::from(keccak256(encoded))
}

/// Signs the operation hash as a personal message with the owner key.
pub async fn sign(
    user_op: UserOperation,
    signer: &LocalWallet,
    entry_point: Address,
    chain_id: u64,
) -> Result<UserOperation, WalletError> {
    let user_op_hash = hash(&user_op, entry_point, chain_id);
    let signature = signer
        .sign_message(user_op_hash.as_bytes())
        .await
        .map_err(|e| WalletError::SigningFailed(e.to_string()))?;

    Ok(user_op.signature(Bytes::from(signature.to_vec())))
}

/// Upper bound on what the operation can charge: total gas times the
/// buffered fee cap.
pub fn max_cost(user_op: &UserOperation, buffer_percent: u64) -> Result<U256, WalletError> {
    let total_gas = user_op
        .call_gas_limit
        .checked_add(user_op.verification_gas_limit)
        .and_then(|sum| sum.checked_add(user_op.pre_verification_gas))
        .ok_or_else(|| WalletError::InvalidUserOperation("Gas limit overflow".to_string()))?;

    let buffered_gas_price = user_op
        .max_fee_per_gas
        .checked_mul(U256::from(100 + buffer_percent))
        .and_then(|product| product.checked_div(U256::from(100)))
        .ok_or_else(|| {
            WalletError::InvalidUserOperation("Gas price calculation error".to_string())
        })?;

    total_gas
        .checked_mul(buffered_gas_price)
        .ok_or_else(|| WalletError::InvalidUserOperation("Max cost calculation overflow".to_string()))
}

/// A transfer operation for `sender` with the fixed transfer gas settings.
pub fn transfer_operation(sender: Address, nonce: U256, call_data: Bytes) -> UserOperation {
    UserOperation::default()
        .sender(sender)
        .nonce(nonce)
        .call_data(call_data)
        .call_gas_limit(U256::from(TRANSFER_CALL_GAS_LIMIT))
        .max_fee_per_gas(U256::from(TRANSFER_MAX_FEE_PER_GAS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Signature;

    const ENTRY_POINT: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    // anvil account #0
    const OWNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn entry_point() -> Address {
        ENTRY_POINT.parse().unwrap()
    }

    fn sample_op() -> UserOperation {
        transfer_operation(
            "0x9406Cc6185a346906296840746125a0E44976454".parse().unwrap(),
            U256::from(3),
            Bytes::from(vec![0xb6, 0x1d, 0x27, 0xf6]),
        )
    }

    #[test]
    fn packed_operation_has_fixed_width() {
        assert_eq!(pack_without_signature(&sample_op()).len(), 10 * 32);
    }

    #[test]
    fn hash_matches_entry_point_vector() {
        let op = UserOperation {
            sender: "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap(),
            nonce: U256::zero(),
            init_code: "0x9406cc6185a346906296840746125a0e449764545fbfb9cf000000000000000000000000ce0fefa6f7979c4c9b5373e0f5105b7259092c6d0000000000000000000000000000000000000000000000000000000000000000".parse().unwrap(),
            call_data: "0xb61d27f60000000000000000000000009c5754de1443984659e1b3a8d1931d83475ba29c00000000000000000000000000000000000000000000000000005af3107a400000000000000000000000000000000000000000000000000000000000000000600000000000000000000000000000000000000000000000000000000000000000".parse().unwrap(),
            call_gas_limit: U256::from(33_100),
            verification_gas_limit: U256::from(361_460),
            pre_verification_gas: U256::from(44_980),
            max_fee_per_gas: U256::from(1_695_000_030u64),
            max_priority_fee_per_gas: U256::from(1_695_000_000u64),
            paymaster_and_data: Bytes::default(),
            signature: "0xebfd4657afe1f1c05c1ec65f3f9cc992a3ac083c424454ba61eab93152195e1400d74df01fc9fa53caadcb83a891d478b713016bcc0c64307c1ad3d7ea2e2d921b".parse().unwrap(),
        };

        assert_eq!(
            hash(&op, entry_point(), 80_001),
            "0x7c1b8c9df49a9e09ecef0f0fe6841d895850d29820f9a4b494097764085dcd7e"
                .parse::<H256>()
                .unwrap()
        );
    }

    #[test]
    fn hash_ignores_signature() {
        let op = sample_op();
        let signed = op.clone().signature(Bytes::from(vec![1u8; 65]));

        assert_eq!(hash(&op, entry_point(), 5), hash(&signed, entry_point(), 5));
    }

    #[test]
    fn hash_binds_entry_point_and_chain() {
        let op = sample_op();
        let base = hash(&op, entry_point(), 5);

        assert_ne!(base, hash(&op, entry_point(), 0x4337));
        assert_ne!(base, hash(&op, Address::repeat_byte(0x11), 5));
    }

    #[test]
    fn hash_covers_call_data() {
        let op = sample_op();
        let other = op.clone().call_data(Bytes::from(vec![0xde, 0xad]));

        assert_ne!(hash(&op, entry_point(), 5), hash(&other, entry_point(), 5));
    }

    #[tokio::test]
    async fn signature_recovers_to_owner() {
        let wallet: LocalWallet = OWNER_KEY.parse().unwrap();
        let signed = sign(sample_op(), &wallet, entry_point(), 5).await.unwrap();

        assert_eq!(signed.signature.len(), 65);
        let signature = Signature::try_from(signed.signature.to_vec().as_slice()).unwrap();
        let user_op_hash = hash(&signed, entry_point(), 5);
        let recovered = signature.recover(user_op_hash.as_bytes()).unwrap();
        assert_eq!(recovered, wallet.address());
    }

    #[test]
    fn transfer_operation_keeps_other_defaults() {
        let op = sample_op();

        assert_eq!(op.call_gas_limit, U256::from(TRANSFER_CALL_GAS_LIMIT));
        assert_eq!(op.max_fee_per_gas, U256::from(TRANSFER_MAX_FEE_PER_GAS));
        assert_eq!(op.verification_gas_limit, U256::from(50));
        assert!(op.init_code.is_empty());
        assert!(op.paymaster_and_data.is_empty());
    }

    #[test]
    fn max_cost_applies_buffer() {
        let op = UserOperation::default()
            .call_gas_limit(U256::from(900))
            .max_fee_per_gas(U256::from(100));

        // (900 + 50 + 50) * 110
        assert_eq!(max_cost(&op, 10).unwrap(), U256::from(110_000));
    }

    #[test]
    fn max_cost_reports_overflow() {
        let op = UserOperation::default()
            .call_gas_limit(U256::MAX)
            .max_fee_per_gas(U256::from(1));

        assert!(matches!(
            max_cost(&op, 10),
            Err(WalletError::InvalidUserOperation(_))
        ));
    }
}
