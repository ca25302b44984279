//! Deploy an AnyoneCanSpend contract and immediately spend it.
//!
//! The spend signs with ANYONECANPAY | ALL, so anyone can merge additional
//! funding inputs into the transaction; the contract only insists that
//! output 0 pays the committed key hash.

use clap::Parser;
use scrypt_bsv::artifact::ArtifactStore;
use scrypt_bsv::assemble::CallTxBuilder;
use scrypt_bsv::bitcoin::{
    Address, KeyAddressKind, Outpoint, PrivateKey, PublicKey, SighashType, TxOutput,
};
use scrypt_bsv::contract::{AnyoneCanSpend, AnyoneCanSpendCall, InputContext, SmartContract};
use scrypt_bsv::provider::{Utxo, WocProvider};
use scrypt_bsv::wallet::{key_from_env, TestWallet};
use scrypt_bsv::{Error, Result};

const ACS_ARTIFACT: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../scrypt/artifacts/anyone_can_spend.json"
);

const FEE: u64 = 500;

#[derive(Parser)]
#[command(about = "Deploy and spend an AnyoneCanSpend contract on the BSV testnet")]
struct Args {
    /// Satoshis to lock in the contract
    #[arg(long, default_value_t = 2000)]
    amount: u64,
}

async fn run(args: Args) -> Result<()> {
    let key = key_from_env("PRIVATE_KEY")?;
    let wallet = TestWallet::new(key, WocProvider::new());

    // the contract commits to a freshly generated key, and the spend pays it out
    let receiver_key = PrivateKey::generate();
    let receiver = Address::from_pv(&receiver_key, KeyAddressKind::NotMain);
    println!(
        "receiver key {} address {}",
        receiver_key.to_wif(KeyAddressKind::NotMain),
        receiver
    );
    let pkh = PublicKey::from(&receiver_key).pubkey_hash();

    let mut store = ArtifactStore::new();
    let artifact = store.load_file(ACS_ARTIFACT)?;
    let contract = AnyoneCanSpend::new(artifact, pkh);
    let lock = contract.locking_script()?;

    let (_tx, deploy_id) = wallet.deploy(lock.clone(), args.amount).await?;
    println!("AnyoneCanSpend deployed in tx {}", deploy_id);

    if args.amount <= FEE {
        return Err(Error::InsufficientFunds {
            needed: FEE + 1,
            available: args.amount,
        });
    }
    let payout = args.amount - FEE;
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
        .add_contract_input(utxo, move |tx, index| {
            let ctx = InputContext {
                tx,
                input_index: index,
                prev_script: prev_script.clone(),
                prev_value,
            };
            spend_contract.unlocking_script(&AnyoneCanSpendCall::Spend {
                preimage: ctx.preimage(SighashType::ANYONECANPAY_ALL)?,
                output_amount: payout,
            })
        })
        .add_output(TxOutput::new(payout, receiver.lock_script()?));
    let tx = builder.build()?;

    let ctx = InputContext {
        tx: &tx,
        input_index: 0,
        prev_script: lock,
        prev_value,
    };
    let call = AnyoneCanSpendCall::Spend {
        preimage: ctx.preimage(SighashType::ANYONECANPAY_ALL)?,
        output_amount: payout,
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
