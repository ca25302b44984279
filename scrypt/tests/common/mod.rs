// Shared helpers for the contract orchestration integration tests.

use scrypt_bsv::artifact::{ArtifactStore, ContractArtifact};
use scrypt_bsv::bitcoin::{Outpoint, PrivateKey, TxHash};
use scrypt_bsv::provider::{MemoryProvider, Utxo};
use scrypt_bsv::wallet::TestWallet;
use std::sync::Arc;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn load_artifact(name: &str) -> Arc<ContractArtifact> {
    let path = format!("{}/artifacts/{}.json", env!("CARGO_MANIFEST_DIR"), name);
    let mut store = ArtifactStore::new();
    store.load_file(path).unwrap()
}

/// A wallet on an in-memory chain, seeded with one spendable output.
pub fn funded_wallet(value: u64) -> TestWallet<MemoryProvider> {
    let wallet = TestWallet::new(PrivateKey::generate(), MemoryProvider::new());
    wallet.provider().add_utxo(Utxo {
        outpoint: Outpoint::new(
            TxHash::from("755f816c02d01c9c0a2f80079132d7b05a1891dc0c860afc6b13e27adc2e058a"),
            0,
        ),
        value,
        script: wallet.address().lock_script().unwrap(),
    });
    wallet
}
