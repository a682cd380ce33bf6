// src/main.rs
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use ethers::prelude::*;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod contracts;
mod error;
mod format;
mod pending;
mod rpc;
mod submit;
mod types;
mod user_operation;
mod wallet;

use crate::config::{
    WalletConfig, DEFAULT_AA_CHAIN_ID, DEFAULT_BUNDLER_RPC, DEFAULT_DEPLOY_CHAIN_ID,
    DEFAULT_EXPLORER_URL,
};
use crate::format::{display_amount, shorten, Explorer, BALANCE_DECIMALS, DEPOSIT_DECIMALS};
use crate::submit::{BundlerSubmitter, EntryPointSubmitter, SubmitUserOperation};
use crate::types::{parse_amount, AaInfo, DeployStatus, Submitted, Transfer, TxOutcome};
use crate::wallet::AaWallet;

type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Account abstraction wallet client", long_about = None)]
struct Args {
    #[clap(short, long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    #[clap(short, long, env = "ETH_RPC_URL")]
    eth_rpc_url: String,

    #[clap(long, env = "ADDRESS_ENTRY_POINT", value_parser = parse_address)]
    entry_point: Address,

    #[clap(long, env = "ADDRESS_ACCOUNT_FACTORY", value_parser = parse_address)]
    account_factory: Address,

    #[clap(long, env = "ADDRESS_TOKEN_ZPB", value_parser = parse_address)]
    token: Address,

    /// Salt for the factory's account derivation
    #[clap(long, default_value_t = 0)]
    salt: u64,

    #[clap(long, default_value_t = DEFAULT_DEPLOY_CHAIN_ID)]
    deploy_chain_id: u64,

    #[clap(long, default_value_t = DEFAULT_AA_CHAIN_ID)]
    aa_chain_id: u64,

    #[clap(long, env = "EXPLORER_URL", default_value = DEFAULT_EXPLORER_URL)]
    explorer_url: String,

    #[clap(long, env = "BUNDLER_RPC", default_value = DEFAULT_BUNDLER_RPC)]
    bundler_rpc: String,

    /// Submit user operations to the bundler instead of calling handleOps directly
    #[clap(long)]
    use_bundler: bool,

    #[clap(short, long)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the EOA and its smart account
    Info {
        /// Refresh every SECS seconds until interrupted
        #[clap(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Deploy the smart account through the factory
    Deploy,
    /// Deposit gas for the smart account into the entry point
    Deposit {
        /// Amount in ETH, defaults to 0.01
        #[clap(long)]
        value: Option<String>,
    },
    /// Send ETH from the EOA to the smart account
    Fund {
        /// Amount in ETH, defaults to 0.01
        #[clap(long)]
        value: Option<String>,
    },
    /// Mint test tokens to the EOA, or to the smart account with --aa
    Faucet {
        #[clap(long)]
        aa: bool,
    },
    /// Transfer test tokens from the smart account
    SendErc20 { receiver: String, amount: String },
    /// Transfer ETH from the smart account
    SendEth { receiver: String, amount: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let signer = args.private_key.parse::<LocalWallet>()?;
    let provider = Provider::<Http>::try_from(args.eth_rpc_url.as_str())?;
    let client = Arc::new(SignerMiddleware::new_with_provider_chain(provider, signer.clone()).await?);

    let config = WalletConfig::new(args.entry_point, args.account_factory, args.token)
        .with_salt(U256::from(args.salt))
        .with_chains(args.deploy_chain_id, args.aa_chain_id);
    let wallet = AaWallet::new(client, signer, config);
    let explorer = Explorer::new(args.explorer_url.as_str());

    match args.command {
        Command::Info { watch: None } => {
            print_info(&wallet, &explorer).await?;
        }
        Command::Info { watch: Some(secs) } => {
            watch_info(&wallet, &explorer, Duration::from_secs(secs.max(1))).await?;
        }
        Command::Deploy => {
            let outcome = wallet.deploy().await?;
            print_outcome("DeployTxHash", &outcome, &explorer);
        }
        Command::Deposit { value } => {
            let outcome = wallet.deposit_gas(parse_value(value)?).await?;
            print_outcome("DepositTxHash", &outcome, &explorer);
        }
        Command::Fund { value } => {
            let outcome = wallet.fund_eth(parse_value(value)?).await?;
            print_outcome("ReceiveTxHash", &outcome, &explorer);
        }
        Command::Faucet { aa } => {
            let (to, outcome) = wallet.faucet_token(aa).await?;
            print_outcome("FaucetTxHash", &outcome, &explorer);
            let balance = wallet.token_balance(to).await?;
            println!("Balance ZPB: {}", display_amount(Some(balance), BALANCE_DECIMALS));
        }
        Command::SendErc20 { receiver, amount } => {
            let transfer = Transfer::parse(&receiver, &amount)?;
            let submitter = make_submitter(&args.bundler_rpc, args.use_bundler, &wallet).await?;
            let submitted = wallet.send_erc20(&transfer, submitter.as_ref()).await?;
            print_submitted(&submitted, &explorer);
            let account = wallet.derive_address().await?;
            println!("View: {}", explorer.token_transfers(account));
        }
        Command::SendEth { receiver, amount } => {
            let transfer = Transfer::parse(&receiver, &amount)?;
            let submitter = make_submitter(&args.bundler_rpc, args.use_bundler, &wallet).await?;
            let submitted = wallet.send_eth(&transfer, submitter.as_ref()).await?;
            print_submitted(&submitted, &explorer);
            let account = wallet.derive_address().await?;
            println!("View: {}", explorer.internal_transfers(account));
        }
    }

    Ok(())
}

fn parse_address(s: &str) -> Result<Address, String> {
    s.parse().map_err(|_| format!("{s} is not a valid address"))
}

fn parse_value(value: Option<String>) -> anyhow::Result<Option<U256>> {
    Ok(value.as_deref().map(parse_amount).transpose()?)
}

async fn make_submitter(
    bundler_rpc: &str,
    use_bundler: bool,
    wallet: &AaWallet<Client>,
) -> anyhow::Result<Box<dyn SubmitUserOperation>> {
    let entry_point = wallet.config().entry_point;
    if use_bundler {
        info!("Submitting through bundler at {}", bundler_rpc);
        Ok(Box::new(BundlerSubmitter::connect(bundler_rpc, entry_point).await?))
    } else {
        Ok(Box::new(EntryPointSubmitter::new(
            entry_point,
            wallet.client(),
            wallet.owner(),
        )))
    }
}

async fn print_info(wallet: &AaWallet<Client>, explorer: &Explorer) -> anyhow::Result<()> {
    let info = wallet.fetch_info().await?;
    let balance = owner_balance(wallet, info.owner).await;
    render_info(&info, balance, explorer);
    Ok(())
}

async fn owner_balance(wallet: &AaWallet<Client>, owner: Address) -> Option<U256> {
    wallet
        .client()
        .get_balance(owner, None)
        .await
        .map_err(|e| warn!("Failed to fetch balance of {:?}: {}", owner, e))
        .ok()
}

async fn watch_info(
    wallet: &AaWallet<Client>,
    explorer: &Explorer,
    period: Duration,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(period);
    let mut last_status = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let info = match wallet.fetch_info().await {
                    Ok(info) => info,
                    Err(e) => {
                        warn!("Refresh failed, retrying next tick: {}", e);
                        continue;
                    }
                };
                if last_status != Some(info.deploy_status) {
                    info!("Account {:?} status: {:?}", info.address, info.deploy_status);
                    last_status = Some(info.deploy_status);
                }
                let balance = owner_balance(wallet, info.owner).await;
                render_info(&info, balance, explorer);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopped watching");
                return Ok(());
            }
        }
    }
}

fn render_info(info: &AaInfo, owner_balance: Option<U256>, explorer: &Explorer) {
    let owner = format!("{:?}", info.owner);
    let account = format!("{:?}", info.address);

    println!("EOA Address: {} ({})", shorten(&owner, 6, 6), explorer.address(info.owner));
    println!("  Balance ETH: {}", display_amount(owner_balance, BALANCE_DECIMALS));
    println!("AA Address: {} ({})", shorten(&account, 6, 6), explorer.address(info.address));
    println!("  Balance ETH: {}", display_amount(info.balance, BALANCE_DECIMALS));
    println!(
        "  Deposited gas: {} ETH",
        display_amount(info.deposited_gas, DEPOSIT_DECIMALS)
    );
    let status = match info.deploy_status {
        DeployStatus::Checking => "unknown",
        DeployStatus::NotDeployed => "not deployed",
        DeployStatus::Deployed => "deployed",
    };
    println!("  Contract: {}", status);
}

fn print_outcome(label: &str, outcome: &TxOutcome, explorer: &Explorer) {
    let hash = format!("{:?}", outcome.tx_hash);
    println!("{}: {} ({})", label, shorten(&hash, 10, 8), explorer.tx(outcome.tx_hash));
}

fn print_submitted(submitted: &Submitted, explorer: &Explorer) {
    match submitted {
        Submitted::Transaction(hash) => {
            println!("TxHash: {:?} ({})", hash, explorer.tx(*hash));
        }
        Submitted::UserOperation(hash) => {
            println!("UserOpHash: {:?}", hash);
        }
    }
}
