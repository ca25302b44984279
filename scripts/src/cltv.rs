//! Deploy a time-locked contract and spend it once the height has passed.

use clap::Parser;
use scrypt_bsv::artifact::ArtifactStore;
use scrypt_bsv::assemble::CallTxBuilder;
use scrypt_bsv::bitcoin::{Outpoint, SighashType, TxOutput};
use scrypt_bsv::contract::{Cltv, CltvCall, InputContext, SmartContract};
use scrypt_bsv::provider::{Utxo, WocProvider};
use scrypt_bsv::wallet::{key_from_env, TestWallet};
use scrypt_bsv::{Error, Result};

const CLTV_ARTIFACT: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/../scrypt/artifacts/cltv.json");

const FEE: u64 = 500;

/// A sequence that keeps the input non-final so lock time is enforced.
const SEQUENCE_NON_FINAL: u32 = 0xfffffffe;

#[derive(Parser)]
#[command(about = "Deploy and spend a CLTV contract on the BSV testnet")]
struct Args {
    /// Block height the output is locked until
    #[arg(long)]
    height: u32,

    /// Lock time of the spending transaction; must be past the height
    #[arg(long)]
    locktime: u32,

    /// Satoshis to lock in the contract
    #[arg(long, default_value_t = 2000)]
    amount: u64,
}

async fn run(args: Args) -> Result<()> {
    let key = key_from_env("PRIVATE_KEY")?;
    let wallet = TestWallet::new(key, WocProvider::new());

    let mut store = ArtifactStore::new();
    let artifact = store.load_file(CLTV_ARTIFACT)?;
    let contract = Cltv::new(artifact, args.height);
    let lock = contract.locking_script()?;

    let (_tx, deploy_id) = wallet.deploy(lock.clone(), args.amount).await?;
    println!(
        "Cltv locked until height {} deployed in tx {}",
        args.height, deploy_id
    );

    if args.amount <= FEE {
        return Err(Error::InsufficientFunds {
            needed: FEE + 1,
            available: args.amount,
        });
    }
    let utxo = Utxo {
        outpoint: Outpoint::new(deploy_id, 0),
        value: args.amount,
        script: lock.clone(),
    };

    let spend_contract = contract.clone();
    let prev_script = lock.clone();
    let prev_value = args.amount;
    let mut builder = CallTxBuilder::new();
    builder
        .add_contract_input_with_sequence(utxo, SEQUENCE_NON_FINAL, move |tx, index| {
            let ctx = InputContext {
                tx,
                input_index: index,
                prev_script: prev_script.clone(),
                prev_value,
            };
            spend_contract.unlocking_script(&CltvCall::Spend {
                preimage: ctx.preimage(SighashType::ALL)?,
            })
        })
        .add_output(TxOutput::new(
            args.amount - FEE,
            wallet.address().lock_script()?,
        ))
        .lock_time(args.locktime);
    let tx = builder.build()?;

    let ctx = InputContext {
        tx: &tx,
        input_index: 0,
        prev_script: lock,
        prev_value,
    };
    let call = CltvCall::Spend {
        preimage: ctx.preimage(SighashType::ALL)?,
    };
    let result = contract.verify(&call, &ctx);
    if !result.success {
        return Err(Error::Internal(
            result.error.unwrap_or_else(|| "verification failed".to_string()),
        ));
    }
    println!("local verification passed");

    let spend_id = wallet.broadcast(&tx).await?;
    println!("spent in tx {}", spend_id);
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
