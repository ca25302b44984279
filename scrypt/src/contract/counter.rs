use crate::artifact::{Arg, ContractArtifact};
use crate::bitcoin::hash::sha256d;
use crate::bitcoin::tx::TxOutput;
use crate::bitcoin::{BaseSigHash, Encodable, Preimage, Script, ScriptBuilder};
use crate::contract::{InputContext, SmartContract, Stateful, VerifyResult};
use crate::Result;
use std::sync::Arc;

/// A stateful counter. Each spend must recreate the contract in output 0 with
/// the count incremented by one, enforced through preimage introspection.
#[derive(Debug, Clone)]
pub struct Counter {
    artifact: Arc<ContractArtifact>,
    count: i64,
}

#[derive(Debug, Clone)]
pub enum CounterCall {
    /// `preimage` must be computed against the final transaction, and
    /// `new_amount` is the value of the successor output.
    Increment { preimage: Preimage, new_amount: u64 },
}

impl Counter {
    pub fn new(artifact: Arc<ContractArtifact>, count: i64) -> Counter {
        Counter { artifact, count }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    /// Recover an instance from a deployed locking script.
    pub fn from_script(artifact: Arc<ContractArtifact>, script: &Script) -> Result<Counter> {
        let args = artifact.parse_constructor_args(script)?;
        match args.as_slice() {
            [Arg::Int(count)] => Ok(Counter {
                artifact,
                count: *count,
            }),
            _ => Err(crate::Error::AbiMismatch(
                "Counter constructor takes one int".to_string(),
            )),
        }
    }
}

impl SmartContract for Counter {
    type Call = CounterCall;

    fn locking_script(&self) -> Result<Script> {
        self.artifact.locking_script(&[Arg::Int(self.count)])
    }

    fn unlocking_script(&self, call: &Self::Call) -> Result<Script> {
        let CounterCall::Increment {
            preimage,
            new_amount,
        } = call;
        ScriptBuilder::new()
            .push_data(preimage.to_bytes())
            .push_int(*new_amount as i64)
            .build()
    }

    fn verify(&self, call: &Self::Call, ctx: &InputContext) -> VerifyResult {
        let CounterCall::Increment {
            preimage,
            new_amount,
        } = call;
        // hash_outputs must cover every output, otherwise a spend could carry
        // extra outputs that fork the state
        match preimage.sighash_type() {
            Ok(s) if s.base == BaseSigHash::All => {}
            Ok(_) => return VerifyResult::fail("call must sign all outputs"),
            Err(e) => return VerifyResult::fail(format!("preimage malformed: {}", e)),
        }
        match ctx.is_fresh(preimage) {
            Ok(true) => {}
            Ok(false) => return VerifyResult::fail("preimage does not match final transaction"),
            Err(e) => return VerifyResult::fail(format!("preimage malformed: {}", e)),
        }
        let script_code = match preimage.script_code() {
            Ok(s) => s,
            Err(e) => return VerifyResult::fail(format!("preimage malformed: {}", e)),
        };
        let current = match self.locking_script() {
            Ok(s) => s,
            Err(e) => return VerifyResult::fail(format!("locking script: {}", e)),
        };
        if script_code != current {
            return VerifyResult::fail("preimage script code is not this instance");
        }
        // the spending transaction must commit to exactly the successor output
        let successor_script = match self.successor().locking_script() {
            Ok(s) => s,
            Err(e) => return VerifyResult::fail(format!("successor script: {}", e)),
        };
        let expected = TxOutput::new(*new_amount, successor_script);
        let mut v = Vec::with_capacity(expected.encoded_size() as usize);
        if let Err(e) = expected.to_binary(&mut v) {
            return VerifyResult::fail(format!("output encoding: {}", e));
        }
        match preimage.hash_outputs() {
            Ok(h) if h == sha256d(&v) => VerifyResult::ok(),
            Ok(_) => VerifyResult::fail("outputs do not recreate the incremented counter"),
            Err(e) => VerifyResult::fail(format!("preimage malformed: {}", e)),
        }
    }
}

impl Stateful for Counter {
    fn successor(&self) -> Self {
        Counter {
            artifact: Arc::clone(&self.artifact),
            count: self.count + 1,
        }
    }
}
