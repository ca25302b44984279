use crate::artifact::{Arg, ContractArtifact};
use crate::bitcoin::{Preimage, Script, ScriptBuilder};
use crate::contract::{InputContext, SmartContract, VerifyResult};
use crate::Result;
use std::sync::Arc;

/// A time lock. The output can only be spent by a transaction whose lock time
/// is past the committed block height, mirroring OP_CHECKLOCKTIMEVERIFY.
#[derive(Debug, Clone)]
pub struct Cltv {
    artifact: Arc<ContractArtifact>,
    match_height: u32,
}

#[derive(Debug, Clone)]
pub enum CltvCall {
    Spend { preimage: Preimage },
}

impl Cltv {
    pub fn new(artifact: Arc<ContractArtifact>, match_height: u32) -> Cltv {
        Cltv {
            artifact,
            match_height,
        }
    }

    pub fn match_height(&self) -> u32 {
        self.match_height
    }
}

impl SmartContract for Cltv {
    type Call = CltvCall;

    fn locking_script(&self) -> Result<Script> {
        self.artifact
            .locking_script(&[Arg::Int(self.match_height as i64)])
    }

    fn unlocking_script(&self, call: &Self::Call) -> Result<Script> {
        let CltvCall::Spend { preimage } = call;
        ScriptBuilder::new().push_data(preimage.to_bytes()).build()
    }

    fn verify(&self, call: &Self::Call, ctx: &InputContext) -> VerifyResult {
        let CltvCall::Spend { preimage } = call;
        match ctx.is_fresh(preimage) {
            Ok(true) => {}
            Ok(false) => return VerifyResult::fail("preimage does not match final transaction"),
            Err(e) => return VerifyResult::fail(format!("preimage malformed: {}", e)),
        }
        // lock time is only consulted when the sequence is not final
        let sequence = match preimage.n_sequence() {
            Ok(s) => s,
            Err(e) => return VerifyResult::fail(format!("preimage malformed: {}", e)),
        };
        if sequence == 0xffffffff {
            return VerifyResult::fail("input sequence must not be final");
        }
        match preimage.n_locktime() {
            Ok(lt) if lt > self.match_height => VerifyResult::ok(),
            Ok(lt) => VerifyResult::fail(format!(
                "lock time {} has not passed height {}",
                lt, self.match_height
            )),
            Err(e) => VerifyResult::fail(format!("preimage malformed: {}", e)),
        }
    }
}
