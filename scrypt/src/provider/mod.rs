//! Blockchain access.
//!
//! A [Provider] answers UTXO queries, accepts transactions for broadcast and
//! fetches transactions by id. [WocProvider] talks to the WhatsOnChain API,
//! [MemoryProvider] is a deterministic in-process chain for tests.

mod memory;
mod woc;

pub use memory::MemoryProvider;
pub use woc::WocProvider;

use crate::bitcoin::{Address, Outpoint, Script, Tx, TxHash};
use crate::Result;
use async_trait::async_trait;

/// An unspent transaction output, together with what is needed to spend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub outpoint: Outpoint,
    pub value: u64,
    pub script: Script,
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// All unspent outputs paying the address.
    async fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>>;

    /// Submit a transaction to the network, returning its id.
    async fn broadcast(&self, tx: &Tx) -> Result<TxHash>;

    /// Fetch a transaction by id.
    async fn fetch_tx(&self, tx_hash: &TxHash) -> Result<Tx>;
}
