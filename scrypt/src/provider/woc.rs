use crate::bitcoin::{Address, Outpoint, Tx, TxHash};
use crate::provider::{Provider, Utxo};
use crate::{Error, Result};
use async_trait::async_trait;
use hex::{FromHex, ToHex};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.whatsonchain.com/v1/bsv/test";

/// A [Provider] backed by the WhatsOnChain REST API.
pub struct WocProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct WocUtxo {
    tx_hash: String,
    tx_pos: u32,
    value: u64,
}

impl WocProvider {
    /// A provider for the test network.
    pub fn new() -> WocProvider {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> WocProvider {
        WocProvider {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for WocProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for WocProvider {
    async fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>> {
        let url = format!("{}/address/{}/unspent", self.base_url, address);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let entries: Vec<WocUtxo> = response.json().await?;
        let lock_script = address.lock_script()?;
        let mut utxos = Vec::with_capacity(entries.len());
        for entry in entries {
            utxos.push(Utxo {
                outpoint: Outpoint::new(TxHash::from_hex(&entry.tx_hash)?, entry.tx_pos),
                value: entry.value,
                script: lock_script.clone(),
            });
        }
        Ok(utxos)
    }

    async fn broadcast(&self, tx: &Tx) -> Result<TxHash> {
        let url = format!("{}/tx/raw", self.base_url);
        let body = serde_json::json!({ "txhex": tx.encode_hex::<String>() });
        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(Error::BroadcastRejected(reason));
        }
        // the API returns the txid as a JSON string
        let txid: String = response.json().await?;
        TxHash::from_hex(txid.trim())
    }

    async fn fetch_tx(&self, tx_hash: &TxHash) -> Result<Tx> {
        let url = format!("{}/tx/{}/hex", self.base_url, tx_hash);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let tx_hex = response.text().await?;
        Tx::from_hex(tx_hex.trim())
    }
}
