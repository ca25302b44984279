//! BIP-143 style signature hashing with the FORKID extension.
//!
//! Every signature on the network commits to the FORKID digest. The digest
//! preimage is also the introspection surface for stateful contracts, which
//! receive it as an argument and read the committed fields back out.

use crate::bitcoin::hash::{sha256d, Hash};
use crate::bitcoin::keys::{PrivateKey, PublicKey};
use crate::bitcoin::tx::Tx;
use crate::bitcoin::{varint_decode, varint_encode, Encodable, Script};
use crate::{Error, Result};
use bytes::{Buf, BufMut, Bytes};
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, Secp256k1};

pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_NONE: u8 = 0x02;
pub const SIGHASH_SINGLE: u8 = 0x03;
pub const SIGHASH_FORKID: u8 = 0x40;
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;
const BASE_MASK: u8 = 0x1f;

/// The base output-commitment mode of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSigHash {
    /// Commit to all outputs.
    All,
    /// Commit to no outputs.
    None,
    /// Commit only to the output at the same index as the signed input.
    Single,
}

/// A sighash flag combination. The FORKID bit is always set on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SighashType {
    pub base: BaseSigHash,
    pub anyone_can_pay: bool,
}

impl SighashType {
    /// Commit to every input and every output. The default for most spends.
    pub const ALL: SighashType = SighashType {
        base: BaseSigHash::All,
        anyone_can_pay: false,
    };

    /// Commit to all outputs but only this input. Other parties can add
    /// further inputs without invalidating the signature.
    pub const ANYONECANPAY_ALL: SighashType = SighashType {
        base: BaseSigHash::All,
        anyone_can_pay: true,
    };

    /// Commit only to this input and the output at the same index. Used by
    /// token contracts whose spends are assembled by multiple parties.
    pub const ANYONECANPAY_SINGLE: SighashType = SighashType {
        base: BaseSigHash::Single,
        anyone_can_pay: true,
    };

    pub fn as_byte(&self) -> u8 {
        let mut b = match self.base {
            BaseSigHash::All => SIGHASH_ALL,
            BaseSigHash::None => SIGHASH_NONE,
            BaseSigHash::Single => SIGHASH_SINGLE,
        };
        b |= SIGHASH_FORKID;
        if self.anyone_can_pay {
            b |= SIGHASH_ANYONECANPAY;
        }
        b
    }

    pub fn from_byte(b: u8) -> Result<SighashType> {
        if b & SIGHASH_FORKID == 0 {
            return Err(Error::BadArgument("FORKID bit not set".to_string()));
        }
        let base = match b & BASE_MASK {
            SIGHASH_ALL => BaseSigHash::All,
            SIGHASH_NONE => BaseSigHash::None,
            SIGHASH_SINGLE => BaseSigHash::Single,
            _ => return Err(Error::BadArgument(format!("unknown sighash base {:#x}", b))),
        };
        Ok(SighashType {
            base,
            anyone_can_pay: b & SIGHASH_ANYONECANPAY != 0,
        })
    }
}

/// A FORKID digest preimage for one input of a transaction.
///
/// Field layout:
/// nVersion, hashPrevouts, hashSequence, outpoint, scriptCode (with length),
/// value, nSequence, hashOutputs, nLocktime, sighash type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preimage {
    raw: Bytes,
}

impl Preimage {
    pub fn from_bytes(raw: Bytes) -> Self {
        Self { raw }
    }

    pub fn to_bytes(&self) -> Bytes {
        self.raw.clone()
    }

    pub fn n_version(&self) -> Result<u32> {
        if self.raw.len() < 4 {
            return Err(Error::DataTooSmall);
        }
        let mut s = &self.raw[0..4];
        Ok(s.get_u32_le())
    }

    pub fn hash_prevouts(&self) -> Result<[u8; 32]> {
        if self.raw.len() < 36 {
            return Err(Error::DataTooSmall);
        }
        let mut h = [0u8; 32];
        h.copy_from_slice(&self.raw[4..36]);
        Ok(h)
    }

    /// The locking script being spent, as committed by the signer.
    pub fn script_code(&self) -> Result<Script> {
        if self.raw.len() < 104 {
            return Err(Error::DataTooSmall);
        }
        let mut buf = self.raw.slice(104..);
        Script::from_binary(&mut buf)
    }

    /// The value in satoshis of the output being spent.
    pub fn value(&self) -> Result<u64> {
        if self.raw.len() < 104 {
            return Err(Error::DataTooSmall);
        }
        let mut buf = self.raw.slice(104..);
        let script_len = varint_decode(&mut buf)? as usize;
        if buf.remaining() < script_len + 8 {
            return Err(Error::DataTooSmall);
        }
        buf.advance(script_len);
        Ok(buf.get_u64_le())
    }

    pub fn n_sequence(&self) -> Result<u32> {
        let l = self.raw.len();
        if l < 44 {
            return Err(Error::DataTooSmall);
        }
        let mut s = &self.raw[l - 44..l - 40];
        Ok(s.get_u32_le())
    }

    pub fn hash_outputs(&self) -> Result<[u8; 32]> {
        let l = self.raw.len();
        if l < 44 {
            return Err(Error::DataTooSmall);
        }
        let mut h = [0u8; 32];
        h.copy_from_slice(&self.raw[l - 40..l - 8]);
        Ok(h)
    }

    pub fn n_locktime(&self) -> Result<u32> {
        let l = self.raw.len();
        if l < 44 {
            return Err(Error::DataTooSmall);
        }
        let mut s = &self.raw[l - 8..l - 4];
        Ok(s.get_u32_le())
    }

    pub fn sighash_type(&self) -> Result<SighashType> {
        let l = self.raw.len();
        if l < 4 {
            return Err(Error::DataTooSmall);
        }
        let mut s = &self.raw[l - 4..];
        let flags = s.get_u32_le();
        SighashType::from_byte((flags & 0xff) as u8)
    }
}

fn hash_prevouts(tx: &Tx) -> Result<[u8; 32]> {
    let mut v = Vec::with_capacity(tx.inputs.len() * 36);
    for input in &tx.inputs {
        input.outpoint.to_binary(&mut v)?;
    }
    Ok(sha256d(&v))
}

fn hash_sequence(tx: &Tx) -> [u8; 32] {
    let mut v = Vec::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        v.put_u32_le(input.sequence);
    }
    sha256d(&v)
}

fn hash_outputs_all(tx: &Tx) -> Result<[u8; 32]> {
    let mut v = Vec::new();
    for output in &tx.outputs {
        output.to_binary(&mut v)?;
    }
    Ok(sha256d(&v))
}

/// Compute the FORKID digest preimage for one input.
///
/// `prev_script` and `prev_value` describe the output being spent. The
/// transaction must be in its final form; unlocking scripts of other inputs
/// are not committed and may still be empty.
pub fn preimage(
    tx: &Tx,
    input_index: usize,
    prev_script: &Script,
    prev_value: u64,
    sighash: SighashType,
) -> Result<Preimage> {
    let input = tx
        .inputs
        .get(input_index)
        .ok_or_else(|| Error::BadArgument(format!("no input at index {}", input_index)))?;
    let mut v = Vec::with_capacity(156 + prev_script.len());
    v.put_u32_le(tx.version);
    if sighash.anyone_can_pay {
        v.put_slice(&[0u8; 32]);
    } else {
        v.put_slice(&hash_prevouts(tx)?);
    }
    if sighash.anyone_can_pay || sighash.base != BaseSigHash::All {
        v.put_slice(&[0u8; 32]);
    } else {
        v.put_slice(&hash_sequence(tx));
    }
    input.outpoint.to_binary(&mut v)?;
    varint_encode(&mut v, prev_script.len() as u64)?;
    v.put_slice(&prev_script.raw);
    v.put_u64_le(prev_value);
    v.put_u32_le(input.sequence);
    match sighash.base {
        BaseSigHash::All => v.put_slice(&hash_outputs_all(tx)?),
        BaseSigHash::Single => {
            if let Some(output) = tx.outputs.get(input_index) {
                let mut o = Vec::with_capacity(output.encoded_size() as usize);
                output.to_binary(&mut o)?;
                v.put_slice(&sha256d(&o));
            } else {
                v.put_slice(&[0u8; 32]);
            }
        }
        BaseSigHash::None => v.put_slice(&[0u8; 32]),
    }
    v.put_u32_le(tx.lock_time);
    v.put_u32_le(sighash.as_byte() as u32);
    Ok(Preimage {
        raw: Bytes::from(v),
    })
}

/// The double SHA-256 digest that is actually signed.
pub fn signature_hash(
    tx: &Tx,
    input_index: usize,
    prev_script: &Script,
    prev_value: u64,
    sighash: SighashType,
) -> Result<Hash> {
    let p = preimage(tx, input_index, prev_script, prev_value, sighash)?;
    Ok(Hash::sha256d(&p.to_bytes()))
}

/// Sign one input, producing a DER signature with the sighash byte appended,
/// ready to be pushed in an unlocking script.
pub fn sign_input(
    tx: &Tx,
    input_index: usize,
    prev_script: &Script,
    prev_value: u64,
    key: &PrivateKey,
    sighash: SighashType,
) -> Result<Bytes> {
    let h = signature_hash(tx, input_index, prev_script, prev_value, sighash)?;
    let message = Message::from_digest(h.raw);
    let secp = Secp256k1::new();
    let signature = secp.sign_ecdsa(&message, &key.inner);
    let mut v = signature.serialize_der().to_vec();
    v.push(sighash.as_byte());
    Ok(Bytes::from(v))
}

/// Check a signature produced by [sign_input] against a public key. The
/// sighash type is taken from the trailing byte of the signature.
pub fn verify_signature(
    sig: &[u8],
    pubkey: &PublicKey,
    tx: &Tx,
    input_index: usize,
    prev_script: &Script,
    prev_value: u64,
) -> Result<bool> {
    let (flag, der) = sig
        .split_last()
        .ok_or_else(|| Error::BadArgument("empty signature".to_string()))?;
    let sighash = SighashType::from_byte(*flag)?;
    let h = signature_hash(tx, input_index, prev_script, prev_value, sighash)?;
    let message = Message::from_digest(h.raw);
    let signature = Signature::from_der(der)?;
    let secp = Secp256k1::new();
    Ok(secp
        .verify_ecdsa(&message, &signature, &pubkey.inner)
        .is_ok())
}
