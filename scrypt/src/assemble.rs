//! Transaction assembly.
//!
//! Deployments are plain funding transactions. Calls are assembled in two
//! phases: the complete skeleton first, with every input and output in its
//! final position, and only then the unlocking scripts, each computed against
//! that final skeleton. Computing an unlocking script before all inputs and
//! outputs are present would bake a stale preimage into the transaction.

use crate::bitcoin::script::push_of;
use crate::bitcoin::{
    sign_input, Address, Encodable, Outpoint, PrivateKey, PublicKey, Script, SighashType, Tx,
    TxInput, TxOutput,
};
use crate::provider::Utxo;
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};

/// Fee rate in satoshis per byte.
pub const DEFAULT_FEE_RATE: u64 = 1;

/// Encoded size of a P2PKH input once its unlocking script is present.
const P2PKH_INPUT_SIZE: u64 = 148;

const TX_VERSION: u32 = 1;
const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Build the unlocking script for a P2PKH input: signature then public key.
pub fn p2pkh_unlock(
    tx: &Tx,
    input_index: usize,
    utxo: &Utxo,
    key: &PrivateKey,
) -> Result<Script> {
    let sig = sign_input(
        tx,
        input_index,
        &utxo.script,
        utxo.value,
        key,
        SighashType::ALL,
    )?;
    let pubkey = PublicKey::from(key);
    let mut buffer = BytesMut::new();
    push_of(sig).to_binary(&mut buffer)?;
    push_of(Bytes::from(pubkey.to_bytes())).to_binary(&mut buffer)?;
    Ok(Script {
        raw: buffer.freeze(),
    })
}

fn estimated_size(num_inputs: usize, outputs: &[TxOutput]) -> u64 {
    let mut size = 8 + 2; // version + lock_time + the two count varints
    size += num_inputs as u64 * P2PKH_INPUT_SIZE;
    for output in outputs {
        size += output.encoded_size();
    }
    size
}

/// Build and sign a deployment transaction: one output carrying `amount` under
/// `lock_script`, change back to `change_address`, funded from `utxos`.
///
/// All supplied utxos must be spendable with `key`.
pub fn deploy_tx(
    utxos: &[Utxo],
    key: &PrivateKey,
    lock_script: Script,
    amount: u64,
    change_address: &Address,
    fee_rate: u64,
) -> Result<Tx> {
    let mut outputs = vec![TxOutput::new(amount, lock_script)];
    let change_script = change_address.lock_script()?;
    outputs.push(TxOutput::new(0, change_script));

    let available: u64 = utxos.iter().map(|u| u.value).sum();
    let mut selected: Vec<&Utxo> = Vec::new();
    let mut total = 0u64;
    let mut fee = 0u64;
    for utxo in utxos {
        selected.push(utxo);
        total += utxo.value;
        fee = estimated_size(selected.len(), &outputs) * fee_rate;
        if total >= amount + fee {
            break;
        }
    }
    if total < amount + fee {
        return Err(Error::InsufficientFunds {
            needed: amount + fee,
            available,
        });
    }
    let change = total - amount - fee;
    if change > 0 {
        outputs[1].value = change;
    } else {
        outputs.pop();
    }

    let mut builder = CallTxBuilder::new();
    for utxo in selected {
        builder.add_p2pkh_input(utxo.clone(), key.clone());
    }
    for output in outputs {
        builder.add_output(output);
    }
    builder.build()
}

type UnlockFn = Box<dyn Fn(&Tx, usize) -> Result<Script>>;

enum InputPlan {
    /// Unlocking script computed from the final transaction by the contract.
    Contract { utxo: Utxo, unlock: UnlockFn },
    /// Standard key spend.
    P2pkh { utxo: Utxo, key: PrivateKey },
}

/// Assembles a contract call transaction.
///
/// Inputs and outputs are declared up front; [CallTxBuilder::build] lays out
/// the complete skeleton and only then computes every unlocking script
/// against it. Inputs from several contracts can be merged into one
/// transaction and each will see the final form.
pub struct CallTxBuilder {
    inputs: Vec<(InputPlan, u32)>,
    outputs: Vec<TxOutput>,
    lock_time: u32,
}

impl CallTxBuilder {
    pub fn new() -> CallTxBuilder {
        CallTxBuilder {
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    /// Add an input spending a contract output. `unlock` receives the final
    /// transaction and this input's index.
    pub fn add_contract_input<F>(&mut self, utxo: Utxo, unlock: F) -> &mut CallTxBuilder
    where
        F: Fn(&Tx, usize) -> Result<Script> + 'static,
    {
        self.inputs.push((
            InputPlan::Contract {
                utxo,
                unlock: Box::new(unlock),
            },
            SEQUENCE_FINAL,
        ));
        self
    }

    /// As [CallTxBuilder::add_contract_input], with an explicit sequence.
    pub fn add_contract_input_with_sequence<F>(
        &mut self,
        utxo: Utxo,
        sequence: u32,
        unlock: F,
    ) -> &mut CallTxBuilder
    where
        F: Fn(&Tx, usize) -> Result<Script> + 'static,
    {
        self.inputs.push((
            InputPlan::Contract {
                utxo,
                unlock: Box::new(unlock),
            },
            sequence,
        ));
        self
    }

    /// Add a standard key-spend input, signed during build.
    pub fn add_p2pkh_input(&mut self, utxo: Utxo, key: PrivateKey) -> &mut CallTxBuilder {
        self.inputs
            .push((InputPlan::P2pkh { utxo, key }, SEQUENCE_FINAL));
        self
    }

    pub fn add_output(&mut self, output: TxOutput) -> &mut CallTxBuilder {
        self.outputs.push(output);
        self
    }

    pub fn lock_time(&mut self, lock_time: u32) -> &mut CallTxBuilder {
        self.lock_time = lock_time;
        self
    }

    /// The outpoints this transaction will spend, in input order.
    pub fn outpoints(&self) -> Vec<Outpoint> {
        self.inputs
            .iter()
            .map(|(plan, _)| match plan {
                InputPlan::Contract { utxo, .. } => utxo.outpoint.clone(),
                InputPlan::P2pkh { utxo, .. } => utxo.outpoint.clone(),
            })
            .collect()
    }

    pub fn build(&self) -> Result<Tx> {
        if self.inputs.is_empty() {
            return Err(Error::BadArgument(
                "call transaction needs at least one input".to_string(),
            ));
        }
        // phase one: the complete skeleton
        let mut tx = Tx {
            version: TX_VERSION,
            inputs: self
                .inputs
                .iter()
                .map(|(plan, sequence)| {
                    let utxo = match plan {
                        InputPlan::Contract { utxo, .. } => utxo,
                        InputPlan::P2pkh { utxo, .. } => utxo,
                    };
                    TxInput {
                        outpoint: utxo.outpoint.clone(),
                        script: Script::empty(),
                        sequence: *sequence,
                    }
                })
                .collect(),
            outputs: self.outputs.clone(),
            lock_time: self.lock_time,
        };
        // phase two: unlocking scripts, all against the same skeleton
        let mut scripts = Vec::with_capacity(self.inputs.len());
        for (index, (plan, _)) in self.inputs.iter().enumerate() {
            let script = match plan {
                InputPlan::Contract { unlock, .. } => unlock(&tx, index)?,
                InputPlan::P2pkh { utxo, key } => p2pkh_unlock(&tx, index, utxo, key)?,
            };
            scripts.push(script);
        }
        for (input, script) in tx.inputs.iter_mut().zip(scripts) {
            input.script = script;
        }
        Ok(tx)
    }
}

impl Default for CallTxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitcoin::{verify_signature, KeyAddressKind, TxHash};
    use hex::FromHex;

    fn test_utxo(key: &PrivateKey, value: u64, index: u32) -> Utxo {
        let address = Address::from_pv(key, KeyAddressKind::NotMain);
        Utxo {
            outpoint: Outpoint::new(
                TxHash::from_hex(
                    "755f816c02d01c9c0a2f80079132d7b05a1891dc0c860afc6b13e27adc2e058a",
                )
                .unwrap(),
                index,
            ),
            value,
            script: address.lock_script().unwrap(),
        }
    }

    #[test]
    fn deploy_selects_and_signs() {
        let key = PrivateKey::generate();
        let change = Address::from_pv(&key, KeyAddressKind::NotMain);
        let utxos = vec![test_utxo(&key, 5000, 0), test_utxo(&key, 20000, 1)];
        let lock = Script::from_hex("51").unwrap();
        let tx = deploy_tx(&utxos, &key, lock.clone(), 10000, &change, DEFAULT_FEE_RATE).unwrap();
        // both utxos are needed to cover 10000 plus fee
        assert_eq!(2, tx.inputs.len());
        assert_eq!(2, tx.outputs.len());
        assert_eq!(10000, tx.outputs[0].value);
        assert_eq!(lock, tx.outputs[0].script);
        // fee is the difference between in and out
        let out_total: u64 = tx.outputs.iter().map(|o| o.value).sum();
        assert!(out_total < 25000);
        assert!(25000 - out_total < 1000);
        // each input carries a valid signature
        let pubkey = PublicKey::from(&key);
        for (i, utxo) in utxos.iter().enumerate() {
            let ops = tx.inputs[i].script.decode().unwrap();
            let sig = ops[0].pushed_data().unwrap();
            assert!(
                verify_signature(&sig, &pubkey, &tx, i, &utxo.script, utxo.value).unwrap()
            );
        }
    }

    #[test]
    fn deploy_insufficient_funds() {
        let key = PrivateKey::generate();
        let change = Address::from_pv(&key, KeyAddressKind::NotMain);
        let utxos = vec![test_utxo(&key, 5000, 0)];
        let lock = Script::from_hex("51").unwrap();
        let result = deploy_tx(&utxos, &key, lock, 10000, &change, DEFAULT_FEE_RATE);
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
    }

    /// Every unlock closure sees the transaction with all inputs and outputs
    /// already in place.
    #[test]
    fn unlock_sees_final_skeleton() {
        let key = PrivateKey::generate();
        let utxo_a = test_utxo(&key, 5000, 0);
        let utxo_b = test_utxo(&key, 6000, 1);
        let payout = Address::from_pv(&key, KeyAddressKind::NotMain);
        let mut builder = CallTxBuilder::new();
        builder
            .add_contract_input(utxo_a, |tx, index| {
                assert_eq!(2, tx.inputs.len());
                assert_eq!(1, tx.outputs.len());
                assert_eq!(0, index);
                Ok(Script::from_hex("51").unwrap())
            })
            .add_p2pkh_input(utxo_b, key.clone())
            .add_output(TxOutput::new(10000, payout.lock_script().unwrap()));
        let tx = builder.build().unwrap();
        assert_eq!(Script::from_hex("51").unwrap(), tx.inputs[0].script);
        assert!(!tx.inputs[1].script.is_empty());
    }

    #[test]
    fn empty_builder_rejected() {
        assert!(CallTxBuilder::new().build().is_err());
    }

    #[test]
    fn lock_time_applied() {
        let key = PrivateKey::generate();
        let utxo = test_utxo(&key, 5000, 0);
        let payout = Address::from_pv(&key, KeyAddressKind::NotMain);
        let mut builder = CallTxBuilder::new();
        builder
            .add_contract_input_with_sequence(utxo, 0xfffffffe, |_, _| Ok(Script::empty()))
            .add_output(TxOutput::new(4000, payout.lock_script().unwrap()))
            .lock_time(1_600_001);
        let tx = builder.build().unwrap();
        assert_eq!(1_600_001, tx.lock_time);
        assert_eq!(0xfffffffe, tx.inputs[0].sequence);
    }
}
