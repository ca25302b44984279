use crate::artifact::{Arg, ContractArtifact};
use crate::bitcoin::hash::Hash160;
use crate::bitcoin::tx::Outpoint;
use crate::bitcoin::{
    verify_signature, BaseSigHash, Encodable, Preimage, PublicKey, Script, ScriptBuilder,
};
use crate::contract::{InputContext, SmartContract, VerifyResult};
use crate::Result;
use bytes::Bytes;
use std::sync::Arc;

/// An asset id is the serialized outpoint of the minting transaction.
pub const ASSET_ID_SIZE: usize = 36;

/// A non-fungible token. The locking script commits to an asset id and the
/// current owner's public key hash. A transfer must be signed by the owner's
/// key and recreate the token for the receiver in the output at the same
/// index as the spent input.
///
/// Calls sign with ANYONECANPAY | SINGLE, so other parties can attach
/// further inputs and outputs, for example fee funding or metadata, without
/// invalidating the owner's signature.
#[derive(Debug, Clone)]
pub struct Nft {
    artifact: Arc<ContractArtifact>,
    asset_id: [u8; ASSET_ID_SIZE],
    owner: Hash160,
}

#[derive(Debug, Clone)]
pub enum NftCall {
    Transfer {
        /// Computed against the final transaction with ANYONECANPAY | SINGLE.
        preimage: Preimage,
        /// The value of the output carrying the token after the transfer.
        output_value: u64,
        /// The public key hash of the new owner.
        receiver: Hash160,
        /// When set, the covered output is not required to recreate the
        /// token. Used to melt the token or change its shape.
        transform: bool,
        sig: Bytes,
        pubkey: PublicKey,
    },
}

impl Nft {
    pub fn new(artifact: Arc<ContractArtifact>, asset_id: [u8; ASSET_ID_SIZE], owner: Hash160) -> Nft {
        Nft {
            artifact,
            asset_id,
            owner,
        }
    }

    /// The asset id a token takes on when minted from the given outpoint.
    pub fn asset_from_outpoint(outpoint: &Outpoint) -> Result<[u8; ASSET_ID_SIZE]> {
        let mut v = Vec::with_capacity(ASSET_ID_SIZE);
        outpoint.to_binary(&mut v)?;
        let mut id = [0u8; ASSET_ID_SIZE];
        id.copy_from_slice(&v);
        Ok(id)
    }

    pub fn owner(&self) -> Hash160 {
        self.owner
    }

    /// The instance expected in the covered output after a transfer.
    pub fn transferred_to(&self, receiver: Hash160) -> Nft {
        Nft {
            artifact: Arc::clone(&self.artifact),
            asset_id: self.asset_id,
            owner: receiver,
        }
    }
}

impl SmartContract for Nft {
    type Call = NftCall;

    fn locking_script(&self) -> Result<Script> {
        self.artifact.locking_script(&[
            Arg::Bytes(Bytes::copy_from_slice(&self.asset_id)),
            Arg::Ripemd160(self.owner.hash),
        ])
    }

    fn unlocking_script(&self, call: &Self::Call) -> Result<Script> {
        let NftCall::Transfer {
            preimage,
            output_value,
            receiver,
            transform,
            sig,
            pubkey,
        } = call;
        ScriptBuilder::new()
            .push_data(preimage.to_bytes())
            .push_int(*output_value as i64)
            .push_data(Bytes::copy_from_slice(&receiver.hash))
            .push_int(*transform as i64)
            .push_data(sig.clone())
            .push_data(Bytes::from(pubkey.to_bytes()))
            .build()
    }

    fn verify(&self, call: &Self::Call, ctx: &InputContext) -> VerifyResult {
        let NftCall::Transfer {
            preimage,
            output_value,
            receiver,
            transform,
            sig,
            pubkey,
        } = call;
        match preimage.sighash_type() {
            Ok(s) if s.anyone_can_pay && s.base == BaseSigHash::Single => {}
            Ok(_) => return VerifyResult::fail("call must sign with ANYONECANPAY | SINGLE"),
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
        if pubkey.pubkey_hash() != self.owner {
            return VerifyResult::fail("public key is not the committed owner");
        }
        match verify_signature(
            sig,
            pubkey,
            ctx.tx,
            ctx.input_index,
            &ctx.prev_script,
            ctx.prev_value,
        ) {
            Ok(true) => {}
            Ok(false) => return VerifyResult::fail("signature check failed"),
            Err(e) => return VerifyResult::fail(format!("signature malformed: {}", e)),
        }
        if *transform {
            return VerifyResult::ok();
        }
        // SINGLE covers the output at the input's own index, which must carry
        // the token on to the receiver
        let successor_script = match self.transferred_to(*receiver).locking_script() {
            Ok(s) => s,
            Err(e) => return VerifyResult::fail(format!("successor script: {}", e)),
        };
        match ctx.tx.outputs.get(ctx.input_index) {
            Some(output) if output.script == successor_script && output.value == *output_value => {
                VerifyResult::ok()
            }
            Some(_) => VerifyResult::fail("covered output does not carry the token to the receiver"),
            None => VerifyResult::fail("no output at the input's index"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitcoin::tx::{Tx, TxHash, TxInput, TxOutput};
    use crate::bitcoin::{sign_input, PrivateKey, SighashType};
    use hex::FromHex;

    const ARTIFACT_JSON: &str = r#"{
        "contract": "SuperAssetNFT",
        "version": 1,
        "constructor": { "params": [
            { "name": "assetId", "type": "bytes" },
            { "name": "pubKeyHash", "type": "PubKeyHash" }
        ] },
        "methods": [
            { "name": "unlock", "params": [
                { "name": "preimage", "type": "bytes" },
                { "name": "outputSats", "type": "int" },
                { "name": "receiver", "type": "PubKeyHash" },
                { "name": "isTransform", "type": "int" },
                { "name": "sig", "type": "bytes" },
                { "name": "pubKey", "type": "bytes" }
            ] }
        ],
        "bytecode": "5779a98858795879ac69"
    }"#;

    fn mint_outpoint() -> Outpoint {
        Outpoint::new(
            TxHash::from_hex("8709ff8d2452897beacabc174e06654b6b1753116c44e37924c7cc1e0c93732d")
                .unwrap(),
            0,
        )
    }

    fn instance(owner: Hash160) -> Nft {
        let artifact = Arc::new(ContractArtifact::from_json(ARTIFACT_JSON).unwrap());
        let asset_id = Nft::asset_from_outpoint(&mint_outpoint()).unwrap();
        Nft::new(artifact, asset_id, owner)
    }

    fn op_return_output() -> TxOutput {
        TxOutput::new(0, Script::from(vec![0x00, 0x6a]))
    }

    /// The spending transaction: the token moves on in output 0, and an
    /// unrelated metadata output rides along at index 1.
    fn transfer_tx(nft: &Nft, receiver: Hash160, value: u64) -> (Tx, Script, u64) {
        let lock = nft.locking_script().unwrap();
        let successor_lock = nft.transferred_to(receiver).locking_script().unwrap();
        let tx = Tx {
            version: 1,
            inputs: vec![TxInput {
                outpoint: mint_outpoint(),
                script: Script::empty(),
                sequence: 0xffffffff,
            }],
            outputs: vec![TxOutput::new(value, successor_lock), op_return_output()],
            lock_time: 0,
        };
        (tx, lock, 10000)
    }

    fn transfer_call(
        tx: &Tx,
        prev_script: &Script,
        prev_value: u64,
        key: &PrivateKey,
        receiver: Hash160,
        value: u64,
        sighash: SighashType,
    ) -> NftCall {
        let ctx = InputContext {
            tx,
            input_index: 0,
            prev_script: prev_script.clone(),
            prev_value,
        };
        NftCall::Transfer {
            preimage: ctx.preimage(sighash).unwrap(),
            output_value: value,
            receiver,
            transform: false,
            sig: sign_input(tx, 0, prev_script, prev_value, key, sighash).unwrap(),
            pubkey: PublicKey::from(key),
        }
    }

    #[test]
    fn transfer_accepted() {
        let key = PrivateKey::generate();
        let receiver = PublicKey::from(&PrivateKey::generate()).pubkey_hash();
        let nft = instance(PublicKey::from(&key).pubkey_hash());
        let (tx, prev_script, prev_value) = transfer_tx(&nft, receiver, 10000);
        let call = transfer_call(
            &tx,
            &prev_script,
            prev_value,
            &key,
            receiver,
            10000,
            SighashType::ANYONECANPAY_SINGLE,
        );
        let ctx = InputContext {
            tx: &tx,
            input_index: 0,
            prev_script,
            prev_value,
        };
        let result = nft.verify(&call, &ctx);
        assert!(result.success, "{:?}", result.error);
    }

    /// Outputs beyond the covered one are not committed, so mutating the
    /// metadata output after signing does not invalidate the call.
    #[test]
    fn uncovered_output_mutation_tolerated() {
        let key = PrivateKey::generate();
        let receiver = PublicKey::from(&PrivateKey::generate()).pubkey_hash();
        let nft = instance(PublicKey::from(&key).pubkey_hash());
        let (mut tx, prev_script, prev_value) = transfer_tx(&nft, receiver, 10000);
        let call = transfer_call(
            &tx,
            &prev_script,
            prev_value,
            &key,
            receiver,
            10000,
            SighashType::ANYONECANPAY_SINGLE,
        );
        tx.outputs[1] = TxOutput::new(0, Script::from(vec![0x00, 0x6a, 0x01, 0x42]));
        let ctx = InputContext {
            tx: &tx,
            input_index: 0,
            prev_script,
            prev_value,
        };
        let result = nft.verify(&call, &ctx);
        assert!(result.success, "{:?}", result.error);
    }

    /// A signature by a key other than the committed owner must fail, even
    /// when the call presents the owner's public key.
    #[test]
    fn wrong_key_rejected() {
        let key = PrivateKey::generate();
        let other = PrivateKey::generate();
        let receiver = PublicKey::from(&PrivateKey::generate()).pubkey_hash();
        let nft = instance(PublicKey::from(&key).pubkey_hash());
        let (tx, prev_script, prev_value) = transfer_tx(&nft, receiver, 10000);
        let mut call = transfer_call(
            &tx,
            &prev_script,
            prev_value,
            &other,
            receiver,
            10000,
            SighashType::ANYONECANPAY_SINGLE,
        );
        let NftCall::Transfer { pubkey, .. } = &mut call;
        *pubkey = PublicKey::from(&key);
        let ctx = InputContext {
            tx: &tx,
            input_index: 0,
            prev_script,
            prev_value,
        };
        let result = nft.verify(&call, &ctx);
        assert!(!result.success);
        assert_eq!(Some("signature check failed".to_string()), result.error);
    }

    /// A public key that does not hash to the committed owner is rejected
    /// before the signature is even checked.
    #[test]
    fn wrong_owner_commitment_rejected() {
        let key = PrivateKey::generate();
        let receiver = PublicKey::from(&PrivateKey::generate()).pubkey_hash();
        // committed to somebody else entirely
        let nft = instance(PublicKey::from(&PrivateKey::generate()).pubkey_hash());
        let (tx, prev_script, prev_value) = transfer_tx(&nft, receiver, 10000);
        let call = transfer_call(
            &tx,
            &prev_script,
            prev_value,
            &key,
            receiver,
            10000,
            SighashType::ANYONECANPAY_SINGLE,
        );
        let ctx = InputContext {
            tx: &tx,
            input_index: 0,
            prev_script,
            prev_value,
        };
        let result = nft.verify(&call, &ctx);
        assert!(!result.success);
        assert_eq!(
            Some("public key is not the committed owner".to_string()),
            result.error
        );
    }

    /// When the transaction carries other outputs the call must use SINGLE;
    /// an ALL preimage is refused outright.
    #[test]
    fn all_flag_rejected() {
        let key = PrivateKey::generate();
        let receiver = PublicKey::from(&PrivateKey::generate()).pubkey_hash();
        let nft = instance(PublicKey::from(&key).pubkey_hash());
        let (tx, prev_script, prev_value) = transfer_tx(&nft, receiver, 10000);
        let call = transfer_call(
            &tx,
            &prev_script,
            prev_value,
            &key,
            receiver,
            10000,
            SighashType::ANYONECANPAY_ALL,
        );
        let ctx = InputContext {
            tx: &tx,
            input_index: 0,
            prev_script,
            prev_value,
        };
        let result = nft.verify(&call, &ctx);
        assert!(!result.success);
        assert_eq!(
            Some("call must sign with ANYONECANPAY | SINGLE".to_string()),
            result.error
        );
    }

    /// A transform drops the successor constraint, so arbitrary outputs are
    /// accepted as long as the owner signed.
    #[test]
    fn transform_allows_arbitrary_outputs() {
        let key = PrivateKey::generate();
        let nft = instance(PublicKey::from(&key).pubkey_hash());
        let lock = nft.locking_script().unwrap();
        let tx = Tx {
            version: 1,
            inputs: vec![TxInput {
                outpoint: mint_outpoint(),
                script: Script::empty(),
                sequence: 0xffffffff,
            }],
            outputs: vec![op_return_output(), TxOutput::new(10, op_return_output().script)],
            lock_time: 0,
        };
        let ctx = InputContext {
            tx: &tx,
            input_index: 0,
            prev_script: lock.clone(),
            prev_value: 10000,
        };
        let sighash = SighashType::ANYONECANPAY_SINGLE;
        let call = NftCall::Transfer {
            preimage: ctx.preimage(sighash).unwrap(),
            output_value: 0,
            receiver: nft.owner(),
            transform: true,
            sig: sign_input(&tx, 0, &lock, 10000, &key, sighash).unwrap(),
            pubkey: PublicKey::from(&key),
        };
        let result = nft.verify(&call, &ctx);
        assert!(result.success, "{:?}", result.error);
    }
}
