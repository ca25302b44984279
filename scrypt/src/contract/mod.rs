//! Typed smart contract instances.
//!
//! A contract instance pairs a compiled artifact with its constructor state.
//! Calls are checked locally by executing the method semantics in Rust against
//! the spending transaction, rather than by interpreting the compiled body.
//! This catches stale preimages, wrong arguments and broken state transitions
//! before a transaction is ever broadcast.

mod anyone_can_spend;
mod cltv;
mod counter;
mod hash_lock;
mod nft;

pub use anyone_can_spend::{AnyoneCanSpend, AnyoneCanSpendCall};
pub use cltv::{Cltv, CltvCall};
pub use counter::{Counter, CounterCall};
pub use hash_lock::{HashLock, HashLockCall};
pub use nft::{Nft, NftCall, ASSET_ID_SIZE};

use crate::bitcoin::{preimage, Preimage, Script, SighashType, Tx};
use crate::Result;

/// The outcome of locally verifying a contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    pub success: bool,
    pub error: Option<String>,
}

impl VerifyResult {
    pub fn ok() -> VerifyResult {
        VerifyResult {
            success: true,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> VerifyResult {
        VerifyResult {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// The context in which one input of a transaction is being verified.
///
/// `prev_script` and `prev_value` describe the output being spent by the
/// input at `input_index`. The transaction must be in its final form.
pub struct InputContext<'a> {
    pub tx: &'a Tx,
    pub input_index: usize,
    pub prev_script: Script,
    pub prev_value: u64,
}

impl InputContext<'_> {
    /// The digest preimage for this input as it stands now.
    pub fn preimage(&self, sighash: SighashType) -> Result<Preimage> {
        preimage(
            self.tx,
            self.input_index,
            &self.prev_script,
            self.prev_value,
            sighash,
        )
    }

    /// Does a supplied preimage match the transaction in its final form?
    ///
    /// A preimage computed before the transaction was fully assembled, for
    /// example before another party's input was added, will not match.
    pub fn is_fresh(&self, supplied: &Preimage) -> Result<bool> {
        let sighash = supplied.sighash_type()?;
        let recomputed = self.preimage(sighash)?;
        Ok(recomputed == *supplied)
    }
}

/// A contract instance that can lock an output and check calls against it.
pub trait SmartContract {
    /// A typed description of a call to one of the contract's public methods.
    type Call;

    /// The locking script for this instance.
    fn locking_script(&self) -> Result<Script>;

    /// The unlocking script carrying the call's arguments.
    fn unlocking_script(&self, call: &Self::Call) -> Result<Script>;

    /// Execute the method semantics locally against the spending transaction.
    fn verify(&self, call: &Self::Call, ctx: &InputContext) -> VerifyResult;
}

/// A contract whose state evolves from one output to the next.
pub trait Stateful: SmartContract + Clone {
    /// The instance expected in the next output when this one is spent.
    fn successor(&self) -> Self;
}
