//! Unlock a deployed HashLock output by revealing the committed message.

use clap::Parser;
use scrypt_bsv::artifact::ArtifactStore;
use scrypt_bsv::assemble::CallTxBuilder;
use scrypt_bsv::bitcoin::{FromHex, Outpoint, TxHash, TxOutput};
use scrypt_bsv::contract::{HashLock, HashLockCall, InputContext, SmartContract};
use scrypt_bsv::provider::{Utxo, WocProvider};
use scrypt_bsv::wallet::{key_from_env, TestWallet};
use scrypt_bsv::{Error, Result};

const HASH_LOCK_ARTIFACT: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/../scrypt/artifacts/hash_lock.json");

/// Fee paid by the unlocking transaction, in satoshis.
const FEE: u64 = 500;

#[derive(Parser)]
#[command(about = "Unlock a HashLock output on the BSV testnet")]
struct Args {
    /// Transaction id of the deployment
    txid: String,

    /// Output index of the contract within the deployment transaction
    #[arg(long, default_value_t = 0)]
    vout: u32,

    /// The committed message
    #[arg(long, default_value = "hello world")]
    message: String,
}

async fn run(args: Args) -> Result<()> {
    let key = key_from_env("PRIVATE_KEY")?;
    let wallet = TestWallet::new(key, WocProvider::new());

    let deploy_id = TxHash::from_hex(&args.txid)?;
    let deploy_tx = wallet.fetch_tx(&deploy_id).await?;
    let output = deploy_tx
        .outputs
        .get(args.vout as usize)
        .ok_or_else(|| Error::BadArgument(format!("tx has no output {}", args.vout)))?;
    println!(
        "spending output {}:{} of {} sats",
        deploy_id, args.vout, output.value
    );
    if output.value <= FEE {
        return Err(Error::InsufficientFunds {
            needed: FEE + 1,
            available: output.value,
        });
    }

    let mut store = ArtifactStore::new();
    let artifact = store.load_file(HASH_LOCK_ARTIFACT)?;
    let contract = HashLock::from_message(artifact, args.message.as_bytes());
    let lock = contract.locking_script()?;
    if lock != output.script {
        return Err(Error::AbiMismatch(
            "output is not a HashLock for this message".to_string(),
        ));
    }

    let utxo = Utxo {
        outpoint: Outpoint::new(deploy_id, args.vout),
        value: output.value,
        script: lock.clone(),
    };
    let call = HashLockCall::Unlock {
        message: args.message.clone().into_bytes().into(),
    };
    let unlock_contract = contract.clone();
    let unlock_call = call.clone();

    let mut builder = CallTxBuilder::new();
    builder
        .add_contract_input(utxo.clone(), move |_, _| {
            unlock_contract.unlocking_script(&unlock_call)
        })
        .add_output(TxOutput::new(
            output.value - FEE,
            wallet.address().lock_script()?,
        ));
    let tx = builder.build()?;

    let ctx = InputContext {
        tx: &tx,
        input_index: 0,
        prev_script: lock,
        prev_value: utxo.value,
    };
    let result = contract.verify(&call, &ctx);
    if !result.success {
        return Err(Error::Internal(
            result.error.unwrap_or_else(|| "verification failed".to_string()),
        ));
    }
    println!("local verification passed");

    let txid = wallet.broadcast(&tx).await?;
    println!("unlocked in tx {}", txid);
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
