use crate::artifact::{Arg, ContractArtifact};
use crate::bitcoin::hash::Hash160;
use crate::bitcoin::{
    Address, BaseSigHash, KeyAddressKind, Preimage, Script, ScriptBuilder,
};
use crate::contract::{InputContext, SmartContract, VerifyResult};
use crate::Result;
use std::sync::Arc;

/// An output that anyone may spend, provided output 0 of the spending
/// transaction pays the committed public key hash.
///
/// The spender signs with ANYONECANPAY so further inputs can be merged in
/// without invalidating the call.
#[derive(Debug, Clone)]
pub struct AnyoneCanSpend {
    artifact: Arc<ContractArtifact>,
    pkh: Hash160,
}

#[derive(Debug, Clone)]
pub enum AnyoneCanSpendCall {
    Spend {
        preimage: Preimage,
        output_amount: u64,
    },
}

impl AnyoneCanSpend {
    pub fn new(artifact: Arc<ContractArtifact>, pkh: Hash160) -> AnyoneCanSpend {
        AnyoneCanSpend { artifact, pkh }
    }

    fn payout_script(&self) -> Result<Script> {
        Address {
            hash160: self.pkh.clone(),
            kind: KeyAddressKind::NotMain,
        }
        .lock_script()
    }
}

impl SmartContract for AnyoneCanSpend {
    type Call = AnyoneCanSpendCall;

    fn locking_script(&self) -> Result<Script> {
        self.artifact
            .locking_script(&[Arg::Ripemd160(self.pkh.hash)])
    }

    fn unlocking_script(&self, call: &Self::Call) -> Result<Script> {
        let AnyoneCanSpendCall::Spend {
            preimage,
            output_amount,
        } = call;
        ScriptBuilder::new()
            .push_data(preimage.to_bytes())
            .push_int(*output_amount as i64)
            .build()
    }

    fn verify(&self, call: &Self::Call, ctx: &InputContext) -> VerifyResult {
        let AnyoneCanSpendCall::Spend {
            preimage,
            output_amount,
        } = call;
        let sighash = match preimage.sighash_type() {
            Ok(s) => s,
            Err(e) => return VerifyResult::fail(format!("preimage malformed: {}", e)),
        };
        if !sighash.anyone_can_pay || sighash.base != BaseSigHash::All {
            return VerifyResult::fail("call must sign with ANYONECANPAY | ALL");
        }
        match ctx.is_fresh(preimage) {
            Ok(true) => {}
            Ok(false) => return VerifyResult::fail("preimage does not match final transaction"),
            Err(e) => return VerifyResult::fail(format!("preimage malformed: {}", e)),
        }
        // output 0 must pay the committed key hash
        let payout = match self.payout_script() {
            Ok(s) => s,
            Err(e) => return VerifyResult::fail(format!("payout script: {}", e)),
        };
        match ctx.tx.outputs.first() {
            Some(output) if output.script == payout && output.value == *output_amount => {
                VerifyResult::ok()
            }
            Some(_) => VerifyResult::fail("output 0 does not pay the committed key hash"),
            None => VerifyResult::fail("transaction has no outputs"),
        }
    }
}
