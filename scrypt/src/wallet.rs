//! A single-key wallet for the test network.

use crate::assemble::{deploy_tx, DEFAULT_FEE_RATE};
use crate::bitcoin::{Address, KeyAddressKind, PrivateKey, Script, Tx, TxHash};
use crate::provider::{Provider, Utxo};
use crate::{Error, Result};

/// Read a private key from an environment variable, in WIF or raw hex.
///
/// A missing variable is a configuration error, reported before any network
/// activity takes place.
pub fn key_from_env(var: &str) -> Result<PrivateKey> {
    let value = std::env::var(var).map_err(|_| Error::MissingConfig(var.to_string()))?;
    let value = value.trim();
    if let Ok((key, _kind)) = PrivateKey::from_wif(value) {
        return Ok(key);
    }
    let raw = hex::decode(value)?;
    PrivateKey::from_slice(&raw)
}

/// Funds deployments and standard spends from one private key.
pub struct TestWallet<P: Provider> {
    key: PrivateKey,
    address: Address,
    provider: P,
}

impl<P: Provider> TestWallet<P> {
    pub fn new(key: PrivateKey, provider: P) -> TestWallet<P> {
        let address = Address::from_pv(&key, KeyAddressKind::NotMain);
        TestWallet {
            key,
            address,
            provider,
        }
    }

    pub fn from_wif(wif: &str, provider: P) -> Result<TestWallet<P>> {
        let (key, _kind) = PrivateKey::from_wif(wif)?;
        Ok(Self::new(key, provider))
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn utxos(&self) -> Result<Vec<Utxo>> {
        self.provider.get_utxos(&self.address).await
    }

    /// Total value of the wallet's unspent outputs, in satoshis.
    pub async fn balance(&self) -> Result<u64> {
        Ok(self.utxos().await?.iter().map(|u| u.value).sum())
    }

    /// Lock `amount` satoshis under `lock_script`, funded from this wallet,
    /// with change back to it. Returns the broadcast transaction and its id.
    pub async fn deploy(&self, lock_script: Script, amount: u64) -> Result<(Tx, TxHash)> {
        let utxos = self.utxos().await?;
        log::debug!(
            "deploying {} sats from {} utxos at {}",
            amount,
            utxos.len(),
            self.address
        );
        let tx = deploy_tx(
            &utxos,
            &self.key,
            lock_script,
            amount,
            &self.address,
            DEFAULT_FEE_RATE,
        )?;
        let hash = self.provider.broadcast(&tx).await?;
        log::info!("deployed in tx {}", hash);
        Ok((tx, hash))
    }

    pub async fn broadcast(&self, tx: &Tx) -> Result<TxHash> {
        self.provider.broadcast(tx).await
    }

    pub async fn fetch_tx(&self, tx_hash: &TxHash) -> Result<Tx> {
        self.provider.fetch_tx(tx_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitcoin::{Outpoint, TxHash};
    use crate::provider::MemoryProvider;
    use hex::FromHex;

    fn funded_wallet(value: u64) -> TestWallet<MemoryProvider> {
        let provider = MemoryProvider::new();
        let wallet = TestWallet::new(PrivateKey::generate(), provider);
        wallet.provider().add_utxo(Utxo {
            outpoint: Outpoint::new(
                TxHash::from_hex(
                    "755f816c02d01c9c0a2f80079132d7b05a1891dc0c860afc6b13e27adc2e058a",
                )
                .unwrap(),
                0,
            ),
            value,
            script: wallet.address().lock_script().unwrap(),
        });
        wallet
    }

    #[tokio::test]
    async fn balance_and_deploy() {
        let wallet = funded_wallet(50000);
        assert_eq!(50000, wallet.balance().await.unwrap());
        let lock = Script::from_hex("51").unwrap();
        let (tx, hash) = wallet.deploy(lock.clone(), 10000).await.unwrap();
        assert_eq!(tx.hash(), hash);
        assert_eq!(lock, tx.outputs[0].script);
        // change returned to the wallet, minus fee
        let balance = wallet.balance().await.unwrap();
        assert!(balance < 40000);
        assert!(balance > 39000);
    }

    #[tokio::test]
    async fn deploy_without_funds_fails() {
        let wallet = funded_wallet(100);
        let lock = Script::from_hex("51").unwrap();
        assert!(wallet.deploy(lock, 10000).await.is_err());
    }

    #[test]
    fn missing_key_env_is_config_error() {
        assert!(matches!(
            key_from_env("SCRYPT_BSV_NO_SUCH_VAR"),
            Err(crate::Error::MissingConfig(_))
        ));
    }
}
