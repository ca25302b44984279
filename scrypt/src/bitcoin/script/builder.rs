use crate::bitcoin::script::{push_of, ByteSequence, Operation, Script};
use crate::bitcoin::Encodable;
use crate::Result;
use bytes::{Bytes, BytesMut};

/// Builds a [Script] from [Operation]s.
///
/// Example:
/// ```
/// use scrypt_bsv::bitcoin::{Operation, ScriptBuilder};
/// let script = ScriptBuilder::new()
///     .add(Operation::OP_DUP)
///     .add(Operation::OP_HASH160)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    ops: Vec<Operation>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn add(&mut self, op: Operation) -> &mut ScriptBuilder {
        self.ops.push(op);
        self
    }

    /// Add the smallest push operation for the given data.
    pub fn push_data(&mut self, data: Bytes) -> &mut ScriptBuilder {
        self.ops.push(push_of(data));
        self
    }

    /// Add a push of a number in its canonical encoding.
    pub fn push_int(&mut self, num: i64) -> &mut ScriptBuilder {
        let seq = ByteSequence::from_small_number(num);
        self.ops.push(push_of(seq.get_bytes()));
        self
    }

    pub fn build(&self) -> Result<Script> {
        let sz: u64 = self.ops.iter().map(|o| o.encoded_size()).sum();
        let mut buffer = BytesMut::with_capacity(sz as usize);
        for op in self.ops.iter() {
            op.to_binary(&mut buffer)?;
        }
        Ok(Script {
            raw: buffer.freeze(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex::ToHex;

    /// Build a P2PKH locking script and check against a known encoding.
    #[test]
    fn build_p2pkh() {
        let pkh = hex::decode("2a717dea82e3040b606daf6afc4f94a54a2b37b7").unwrap();
        let script = ScriptBuilder::new()
            .add(Operation::OP_DUP)
            .add(Operation::OP_HASH160)
            .add(Operation::OP_PUSH(Bytes::from(pkh)))
            .add(Operation::OP_EQUALVERIFY)
            .add(Operation::OP_CHECKSIG)
            .build()
            .unwrap();
        let h: String = script.encode_hex();
        assert_eq!("76a9142a717dea82e3040b606daf6afc4f94a54a2b37b788ac", h);
    }

    #[test]
    fn push_int_encodings() {
        // zero pushes the empty sequence
        let s = ScriptBuilder::new().push_int(0).build().unwrap();
        assert_eq!(vec![0u8], s.raw.to_vec());
        let s = ScriptBuilder::new().push_int(17).build().unwrap();
        assert_eq!(vec![0x01, 0x11], s.raw.to_vec());
    }
}
