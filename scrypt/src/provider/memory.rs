use crate::bitcoin::{Address, Outpoint, Tx, TxHash};
use crate::provider::{Provider, Utxo};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-process chain. Broadcast transactions are checked against the UTXO
/// set, applied to it, and remembered.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    utxos: HashMap<Outpoint, Utxo>,
    txs: HashMap<TxHash, Tx>,
}

impl MemoryProvider {
    pub fn new() -> MemoryProvider {
        MemoryProvider::default()
    }

    /// Seed the UTXO set with an output that does not come from a broadcast
    /// transaction. Used to fund test wallets.
    pub fn add_utxo(&self, utxo: Utxo) {
        let mut state = self.state.lock().unwrap();
        state.utxos.insert(utxo.outpoint.clone(), utxo);
    }

    /// The number of transactions accepted so far.
    pub fn broadcast_count(&self) -> usize {
        self.state.lock().unwrap().txs.len()
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    async fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>> {
        let lock_script = address.lock_script()?;
        let state = self.state.lock().unwrap();
        let mut utxos: Vec<Utxo> = state
            .utxos
            .values()
            .filter(|u| u.script == lock_script)
            .cloned()
            .collect();
        // deterministic order for tests
        utxos.sort_by(|a, b| {
            (a.outpoint.tx_hash.raw, a.outpoint.index)
                .cmp(&(b.outpoint.tx_hash.raw, b.outpoint.index))
        });
        Ok(utxos)
    }

    async fn broadcast(&self, tx: &Tx) -> Result<TxHash> {
        let hash = tx.hash();
        let mut state = self.state.lock().unwrap();
        if tx.inputs.is_empty() || tx.outputs.is_empty() {
            return Err(Error::BroadcastRejected(
                "transaction has no inputs or no outputs".to_string(),
            ));
        }
        for input in &tx.inputs {
            if !state.utxos.contains_key(&input.outpoint) {
                return Err(Error::BroadcastRejected(format!(
                    "missing or spent input {}:{}",
                    input.outpoint.tx_hash, input.outpoint.index
                )));
            }
        }
        for input in &tx.inputs {
            state.utxos.remove(&input.outpoint);
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            let outpoint = Outpoint::new(hash, index as u32);
            state.utxos.insert(
                outpoint.clone(),
                Utxo {
                    outpoint,
                    value: output.value,
                    script: output.script.clone(),
                },
            );
        }
        state.txs.insert(hash, tx.clone());
        Ok(hash)
    }

    async fn fetch_tx(&self, tx_hash: &TxHash) -> Result<Tx> {
        let state = self.state.lock().unwrap();
        state
            .txs
            .get(tx_hash)
            .cloned()
            .ok_or_else(|| Error::BadData(format!("unknown transaction {}", tx_hash)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitcoin::{KeyAddressKind, PrivateKey, Script, TxInput, TxOutput};
    use hex::FromHex;

    fn funded(provider: &MemoryProvider, address: &Address, value: u64) -> Utxo {
        let utxo = Utxo {
            outpoint: Outpoint::new(
                TxHash::from_hex(
                    "755f816c02d01c9c0a2f80079132d7b05a1891dc0c860afc6b13e27adc2e058a",
                )
                .unwrap(),
                0,
            ),
            value,
            script: address.lock_script().unwrap(),
        };
        provider.add_utxo(utxo.clone());
        utxo
    }

    #[tokio::test]
    async fn broadcast_moves_utxos() {
        let provider = MemoryProvider::new();
        let address = Address::from_pv(&PrivateKey::generate(), KeyAddressKind::NotMain);
        let utxo = funded(&provider, &address, 10000);
        assert_eq!(1, provider.get_utxos(&address).await.unwrap().len());

        let tx = Tx {
            version: 1,
            inputs: vec![TxInput {
                outpoint: utxo.outpoint.clone(),
                script: Script::empty(),
                sequence: 0xffffffff,
            }],
            outputs: vec![TxOutput::new(9000, address.lock_script().unwrap())],
            lock_time: 0,
        };
        let hash = provider.broadcast(&tx).await.unwrap();
        assert_eq!(tx.hash(), hash);
        assert_eq!(1, provider.broadcast_count());
        // the old output is gone, the new one is spendable
        let utxos = provider.get_utxos(&address).await.unwrap();
        assert_eq!(1, utxos.len());
        assert_eq!(9000, utxos[0].value);
        assert_eq!(hash, utxos[0].outpoint.tx_hash);
        // double spend rejected
        assert!(matches!(
            provider.broadcast(&tx).await,
            Err(Error::BroadcastRejected(_))
        ));
        assert_eq!(tx, provider.fetch_tx(&hash).await.unwrap());
    }
}
