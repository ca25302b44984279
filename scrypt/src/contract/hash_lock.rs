use crate::artifact::{Arg, ContractArtifact};
use crate::bitcoin::{sha256, Script, ScriptBuilder};
use crate::contract::{InputContext, SmartContract, VerifyResult};
use crate::Result;
use bytes::Bytes;
use std::sync::Arc;

/// A hash puzzle. The output can be spent by whoever reveals a message whose
/// SHA-256 digest equals the committed value.
#[derive(Debug, Clone)]
pub struct HashLock {
    artifact: Arc<ContractArtifact>,
    commitment: [u8; 32],
}

#[derive(Debug, Clone)]
pub enum HashLockCall {
    Unlock { message: Bytes },
}

impl HashLock {
    pub fn new(artifact: Arc<ContractArtifact>, commitment: [u8; 32]) -> HashLock {
        HashLock {
            artifact,
            commitment,
        }
    }

    /// Commit to a known message.
    pub fn from_message(artifact: Arc<ContractArtifact>, message: &[u8]) -> HashLock {
        HashLock {
            artifact,
            commitment: sha256(message),
        }
    }

    pub fn commitment(&self) -> [u8; 32] {
        self.commitment
    }
}

impl SmartContract for HashLock {
    type Call = HashLockCall;

    fn locking_script(&self) -> Result<Script> {
        self.artifact.locking_script(&[Arg::Sha256(self.commitment)])
    }

    fn unlocking_script(&self, call: &Self::Call) -> Result<Script> {
        let HashLockCall::Unlock { message } = call;
        ScriptBuilder::new().push_data(message.clone()).build()
    }

    fn verify(&self, call: &Self::Call, _ctx: &InputContext) -> VerifyResult {
        let HashLockCall::Unlock { message } = call;
        if sha256(message) == self.commitment {
            VerifyResult::ok()
        } else {
            VerifyResult::fail("hash of message does not match commitment")
        }
    }
}
