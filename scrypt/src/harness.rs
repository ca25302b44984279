//! Local simulation of a stateful contract chain.

use crate::bitcoin::{Outpoint, Script, Tx, TxHash, TxInput, TxOutput};
use crate::contract::{InputContext, Stateful, VerifyResult};
use crate::{Error, Result};

const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Drives a [Stateful] contract through a chain of calls, verifying each
/// transition locally before accepting it.
///
/// The harness builds each call transaction in its final form, hands the
/// caller an [InputContext] against it to produce the call, and only advances
/// the chain when the current instance accepts the call.
pub struct ChainHarness<C: Stateful> {
    current: C,
    outpoint: Outpoint,
    balance: u64,
    txs: Vec<Tx>,
}

impl<C: Stateful> ChainHarness<C> {
    /// Deploy `instance` with `balance` satoshis locked in a synthetic
    /// genesis transaction.
    pub fn genesis(instance: C, balance: u64) -> Result<ChainHarness<C>> {
        let lock = instance.locking_script()?;
        let tx = Tx {
            version: 1,
            inputs: vec![TxInput {
                outpoint: Outpoint::new(TxHash::from([0u8; 32]), 0),
                script: Script::empty(),
                sequence: SEQUENCE_FINAL,
            }],
            outputs: vec![TxOutput::new(balance, lock)],
            lock_time: 0,
        };
        let outpoint = Outpoint::new(tx.hash(), 0);
        Ok(ChainHarness {
            current: instance,
            outpoint,
            balance,
            txs: vec![tx],
        })
    }

    pub fn current(&self) -> &C {
        &self.current
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// The number of accepted calls.
    pub fn steps(&self) -> usize {
        self.txs.len() - 1
    }

    pub fn txs(&self) -> &[Tx] {
        &self.txs
    }

    /// Build the next call transaction, paying `fee` from the contract's
    /// balance, and verify it against the current instance. The chain only
    /// advances when verification succeeds.
    ///
    /// `make_call` receives the final transaction's input context and the
    /// current instance.
    pub fn evolve<F>(&mut self, fee: u64, make_call: F) -> Result<VerifyResult>
    where
        F: FnOnce(&InputContext, &C) -> Result<C::Call>,
    {
        if fee >= self.balance {
            return Err(Error::InsufficientFunds {
                needed: fee,
                available: self.balance,
            });
        }
        let new_balance = self.balance - fee;
        let successor = self.current.successor();
        let mut tx = Tx {
            version: 1,
            inputs: vec![TxInput {
                outpoint: self.outpoint.clone(),
                script: Script::empty(),
                sequence: SEQUENCE_FINAL,
            }],
            outputs: vec![TxOutput::new(new_balance, successor.locking_script()?)],
            lock_time: 0,
        };
        let (result, unlock) = {
            let ctx = InputContext {
                tx: &tx,
                input_index: 0,
                prev_script: self.current.locking_script()?,
                prev_value: self.balance,
            };
            let call = make_call(&ctx, &self.current)?;
            let result = self.current.verify(&call, &ctx);
            let unlock = self.current.unlocking_script(&call)?;
            (result, unlock)
        };
        if !result.success {
            return Ok(result);
        }
        tx.inputs[0].script = unlock;
        log::debug!("accepted call in tx {}", tx.hash());
        self.outpoint = Outpoint::new(tx.hash(), 0);
        self.balance = new_balance;
        self.current = successor;
        self.txs.push(tx);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ContractArtifact;
    use crate::bitcoin::SighashType;
    use crate::contract::{Counter, CounterCall, SmartContract};
    use std::sync::Arc;

    const COUNTER_JSON: &str = r#"{
        "contract": "Counter",
        "version": 1,
        "constructor": { "params": [{ "name": "count", "type": "int" }] },
        "methods": [
            { "name": "increment", "params": [
                { "name": "preimage", "type": "bytes" },
                { "name": "amount", "type": "int" }
            ] }
        ],
        "bytecode": "766b8c7f77816960"
    }"#;

    fn counter(count: i64) -> Counter {
        let artifact = Arc::new(ContractArtifact::from_json(COUNTER_JSON).unwrap());
        Counter::new(artifact, count)
    }

    #[test]
    fn chain_of_increments() {
        let mut harness = ChainHarness::genesis(counter(0), 100_000).unwrap();
        for _ in 0..3 {
            let balance = harness.balance();
            let result = harness
                .evolve(500, |ctx, _| {
                    Ok(CounterCall::Increment {
                        preimage: ctx.preimage(SighashType::ALL)?,
                        new_amount: balance - 500,
                    })
                })
                .unwrap();
            assert!(result.success, "{:?}", result.error);
        }
        assert_eq!(3, harness.current().count());
        assert_eq!(3, harness.steps());
        assert_eq!(98_500, harness.balance());
    }

    #[test]
    fn rejected_call_does_not_advance() {
        let mut harness = ChainHarness::genesis(counter(0), 100_000).unwrap();
        // stale preimage from the genesis transaction rather than the call
        let stale = {
            let genesis = &harness.txs()[0];
            let ctx = InputContext {
                tx: genesis,
                input_index: 0,
                prev_script: harness.current().locking_script().unwrap(),
                prev_value: 100_000,
            };
            ctx.preimage(SighashType::ALL).unwrap()
        };
        let result = harness
            .evolve(500, |_, _| {
                Ok(CounterCall::Increment {
                    preimage: stale,
                    new_amount: 99_500,
                })
            })
            .unwrap();
        assert!(!result.success);
        assert_eq!(0, harness.current().count());
        assert_eq!(0, harness.steps());
    }

    #[test]
    fn fee_larger_than_balance_rejected() {
        let mut harness = ChainHarness::genesis(counter(0), 1000).unwrap();
        let result = harness.evolve(1000, |ctx, _| {
            Ok(CounterCall::Increment {
                preimage: ctx.preimage(SighashType::ALL)?,
                new_amount: 0,
            })
        });
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
    }
}
