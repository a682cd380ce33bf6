// src/contracts.rs
use ethers::prelude::abigen;

abigen!(
    AccountFactory,
    r#"[
        function getAddress(address owner, uint256 salt) public view returns (address)
        function createAccount(address owner, uint256 salt) public returns (address ret)
    ]"#
);

abigen!(
    EntryPoint,
    r#"[
        struct UserOperation { address sender; uint256 nonce; bytes initCode; bytes callData; uint256 callGasLimit; uint256 verificationGasLimit; uint256 preVerificationGas; uint256 maxFeePerGas; uint256 maxPriorityFeePerGas; bytes paymasterAndData; bytes signature; }
        function handleOps(UserOperation[] ops, address beneficiary) external
        function depositTo(address account) public payable
        function balanceOf(address account) public view returns (uint256)
    ]"#
);

abigen!(
    SimpleAccount,
    r#"[
        function execute(address dest, uint256 value, bytes func) external
        function nonce() public view returns (uint256)
    ]"#
);

abigen!(
    TestToken,
    r#"[
        function balanceOf(address account) public view returns (uint256)
        function mint(address to, uint256 amount) public
        function transfer(address to, uint256 amount) public returns (bool)
    ]"#
);

impl From<crate::types::UserOperation> for entry_point::UserOperation {
    fn from(op: crate::types::UserOperation) -> Self {
        Self {
            sender: op.sender,
            nonce: op.nonce,
            init_code: op.init_code,
            call_data: op.call_data,
            call_gas_limit: op.call_gas_limit,
            verification_gas_limit: op.verification_gas_limit,
            pre_verification_gas: op.pre_verification_gas,
            max_fee_per_gas: op.max_fee_per_gas,
            max_priority_fee_per_gas: op.max_priority_fee_per_gas,
            paymaster_and_data: op.paymaster_and_data,
            signature: op.signature,
        }
    }
}
