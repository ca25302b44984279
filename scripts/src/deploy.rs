//! Deploy a HashLock contract to the test network.
//!
//! The private key funding the deployment is read from the PRIVATE_KEY
//! environment variable (WIF or hex).

use clap::Parser;
use scrypt_bsv::artifact::ArtifactStore;
use scrypt_bsv::contract::{HashLock, SmartContract};
use scrypt_bsv::provider::WocProvider;
use scrypt_bsv::wallet::{key_from_env, TestWallet};
use scrypt_bsv::Result;

const HASH_LOCK_ARTIFACT: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/../scrypt/artifacts/hash_lock.json");

#[derive(Parser)]
#[command(about = "Deploy a HashLock contract to the BSV testnet")]
struct Args {
    /// Message whose SHA-256 digest locks the output
    #[arg(long, default_value = "hello world")]
    message: String,

    /// Satoshis to lock in the contract
    #[arg(long, default_value_t = 1000)]
    amount: u64,
}

async fn run(args: Args) -> Result<()> {
    let key = key_from_env("PRIVATE_KEY")?;
    let wallet = TestWallet::new(key, WocProvider::new());
    println!("wallet address: {}", wallet.address());

    let mut store = ArtifactStore::new();
    let artifact = store.load_file(HASH_LOCK_ARTIFACT)?;
    let contract = HashLock::from_message(artifact, args.message.as_bytes());

    let balance = wallet.balance().await?;
    println!("wallet balance: {} sats", balance);

    let (_tx, txid) = wallet
        .deploy(contract.locking_script()?, args.amount)
        .await?;
    println!("HashLock deployed in tx {}", txid);
    println!("commitment: {}", hex::encode(contract.commitment()));
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
