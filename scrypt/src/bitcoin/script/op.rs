use crate::bitcoin::encoding::Encodable;
use crate::{Error, Result};
use bytes::{Buf, BufMut, Bytes};

/// An Operation is an opcode plus relevant data.
///
/// Compiled contract bodies are treated as opaque bytes, so this enum only needs to
/// cover the opcodes that the orchestration layer itself emits or decodes: data
/// pushes (constructor and method arguments) and the P2PKH template.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(non_camel_case_types)] // we want to keep the Bitcoin standard naming convention
pub enum Operation {
    /// Pushes 0 (the empty byte sequence) onto the stack.
    OP_0,
    /// Pushes data onto the stack where the data must be 1-75 bytes long.
    OP_PUSH(Bytes),
    /// The next byte sets the number of bytes to push onto the stack
    OP_PUSHDATA1(Bytes),
    /// The next two bytes sets the number of bytes to push onto the stack
    OP_PUSHDATA2(Bytes),
    /// The next four bytes sets the number of bytes to push onto the stack
    OP_PUSHDATA4(Bytes),
    /// Pushes -1 onto the stack
    OP_1NEGATE,
    /// Pushes the number 1 - 16 onto the stack
    OP_N(u8),
    /// Does nothing
    OP_NOP,
    /// Marks a statement as invalid if the top stack value is false. Top stack value is removed.
    OP_VERIFY,
    /// Marks a statement as invalid
    OP_RETURN,
    /// Drops the top stack value
    OP_DROP,
    /// Duplicates the top stack item
    OP_DUP,
    /// Removes the second-to-top stack item
    OP_NIP,
    /// The top two items on the stack are swapped
    OP_SWAP,
    /// Concatenates two byte sequences
    OP_CAT,
    /// Splits a byte sequence at the given index
    OP_SPLIT,
    /// Pushes the length of the top stack item
    OP_SIZE,
    /// Returns 1 if the inputs are exactly equal, 0 otherwise
    OP_EQUAL,
    /// Same as OP_EQUAL, but runs OP_VERIFY afterward
    OP_EQUALVERIFY,
    /// Adds one to the input
    OP_1ADD,
    /// Adds a to b
    OP_ADD,
    /// Subtracts b from a
    OP_SUB,
    /// Returns 1 if the numbers are equal, 0 otherwise
    OP_NUMEQUAL,
    /// Same as OP_NUMEQUAL, but runs OP_VERIFY afterward
    OP_NUMEQUALVERIFY,
    /// Returns 1 if a is less than b, 0 otherwise
    OP_LESSTHAN,
    /// Returns 1 if a is greater than b, 0 otherwise
    OP_GREATERTHAN,
    /// The input is hashed with RIPEMD160(SHA256())
    OP_HASH160,
    /// The input is hashed with SHA-256
    OP_SHA256,
    /// The input is hashed twice with SHA-256
    OP_HASH256,
    /// Checks a signature against a public key and the transaction preimage
    OP_CHECKSIG,
    /// Same as OP_CHECKSIG, but OP_VERIFY is executed afterward
    OP_CHECKSIGVERIFY,
    /// Marks the transaction as invalid if the top stack item is greater than the
    /// transaction's lock_time
    OP_CHECKLOCKTIMEVERIFY,
}

impl Operation {
    // helper function to get pushdata of a particular size from the buffer
    fn get_pushdata(size: usize, buffer: &mut dyn Buf) -> Result<Bytes> {
        if size > buffer.remaining() {
            Err(Error::DataTooSmall)
        } else {
            Ok(buffer.copy_to_bytes(size))
        }
    }

    /// The byte sequence this operation pushes, if it is a data push.
    pub fn pushed_data(&self) -> Option<Bytes> {
        match self {
            Operation::OP_0 => Some(Bytes::new()),
            Operation::OP_PUSH(data)
            | Operation::OP_PUSHDATA1(data)
            | Operation::OP_PUSHDATA2(data)
            | Operation::OP_PUSHDATA4(data) => Some(data.clone()),
            Operation::OP_N(n) => Some(Bytes::copy_from_slice(&[*n])),
            _ => None,
        }
    }
}

impl Encodable for Operation {
    fn from_binary(buffer: &mut dyn Buf) -> Result<Self>
    where
        Self: Sized,
    {
        if !buffer.has_remaining() {
            return Err(Error::DataTooSmall);
        }
        match buffer.get_u8() {
            0 => Ok(Operation::OP_0),
            n @ 1..=75 => Ok(Operation::OP_PUSH(Self::get_pushdata(n as usize, buffer)?)),
            76 => {
                if buffer.has_remaining() {
                    let size = buffer.get_u8() as usize;
                    Ok(Operation::OP_PUSHDATA1(Self::get_pushdata(size, buffer)?))
                } else {
                    Err(Error::DataTooSmall)
                }
            }
            77 => {
                if buffer.remaining() >= 2 {
                    let size = buffer.get_u16_le() as usize;
                    Ok(Operation::OP_PUSHDATA2(Self::get_pushdata(size, buffer)?))
                } else {
                    Err(Error::DataTooSmall)
                }
            }
            78 => {
                if buffer.remaining() >= 4 {
                    let size = buffer.get_u32_le() as usize;
                    Ok(Operation::OP_PUSHDATA4(Self::get_pushdata(size, buffer)?))
                } else {
                    Err(Error::DataTooSmall)
                }
            }
            79 => Ok(Operation::OP_1NEGATE),
            n @ 81..=96 => Ok(Operation::OP_N(n - 80)),
            97 => Ok(Operation::OP_NOP),
            105 => Ok(Operation::OP_VERIFY),
            106 => Ok(Operation::OP_RETURN),
            117 => Ok(Operation::OP_DROP),
            118 => Ok(Operation::OP_DUP),
            119 => Ok(Operation::OP_NIP),
            124 => Ok(Operation::OP_SWAP),
            126 => Ok(Operation::OP_CAT),
            127 => Ok(Operation::OP_SPLIT),
            130 => Ok(Operation::OP_SIZE),
            135 => Ok(Operation::OP_EQUAL),
            136 => Ok(Operation::OP_EQUALVERIFY),
            139 => Ok(Operation::OP_1ADD),
            147 => Ok(Operation::OP_ADD),
            148 => Ok(Operation::OP_SUB),
            156 => Ok(Operation::OP_NUMEQUAL),
            157 => Ok(Operation::OP_NUMEQUALVERIFY),
            159 => Ok(Operation::OP_LESSTHAN),
            160 => Ok(Operation::OP_GREATERTHAN),
            169 => Ok(Operation::OP_HASH160),
            168 => Ok(Operation::OP_SHA256),
            170 => Ok(Operation::OP_HASH256),
            172 => Ok(Operation::OP_CHECKSIG),
            173 => Ok(Operation::OP_CHECKSIGVERIFY),
            177 => Ok(Operation::OP_CHECKLOCKTIMEVERIFY),
            _ => Err(Error::UnrecognizedOpCode),
        }
    }

    fn to_binary(&self, buffer: &mut dyn BufMut) -> Result<()> {
        match self {
            Operation::OP_0 => buffer.put_u8(0),
            Operation::OP_PUSH(data) => {
                if data.is_empty() || data.len() > 75 {
                    return Err(Error::BadArgument(format!(
                        "OP_PUSH data must be 1-75 bytes, got {}",
                        data.len()
                    )));
                }
                buffer.put_u8(data.len() as u8);
                buffer.put_slice(data);
            }
            Operation::OP_PUSHDATA1(data) => {
                if data.len() > 0xff {
                    return Err(Error::DataTooLarge);
                }
                buffer.put_u8(76);
                buffer.put_u8(data.len() as u8);
                buffer.put_slice(data);
            }
            Operation::OP_PUSHDATA2(data) => {
                if data.len() > 0xffff {
                    return Err(Error::DataTooLarge);
                }
                buffer.put_u8(77);
                buffer.put_u16_le(data.len() as u16);
                buffer.put_slice(data);
            }
            Operation::OP_PUSHDATA4(data) => {
                if data.len() > 0xffffffff {
                    return Err(Error::DataTooLarge);
                }
                buffer.put_u8(78);
                buffer.put_u32_le(data.len() as u32);
                buffer.put_slice(data);
            }
            Operation::OP_1NEGATE => buffer.put_u8(79),
            Operation::OP_N(n) => {
                if *n < 1 || *n > 16 {
                    return Err(Error::BadArgument(format!("OP_N out of range: {}", n)));
                }
                buffer.put_u8(80 + n);
            }
            Operation::OP_NOP => buffer.put_u8(97),
            Operation::OP_VERIFY => buffer.put_u8(105),
            Operation::OP_RETURN => buffer.put_u8(106),
            Operation::OP_DROP => buffer.put_u8(117),
            Operation::OP_DUP => buffer.put_u8(118),
            Operation::OP_NIP => buffer.put_u8(119),
            Operation::OP_SWAP => buffer.put_u8(124),
            Operation::OP_CAT => buffer.put_u8(126),
            Operation::OP_SPLIT => buffer.put_u8(127),
            Operation::OP_SIZE => buffer.put_u8(130),
            Operation::OP_EQUAL => buffer.put_u8(135),
            Operation::OP_EQUALVERIFY => buffer.put_u8(136),
            Operation::OP_1ADD => buffer.put_u8(139),
            Operation::OP_ADD => buffer.put_u8(147),
            Operation::OP_SUB => buffer.put_u8(148),
            Operation::OP_NUMEQUAL => buffer.put_u8(156),
            Operation::OP_NUMEQUALVERIFY => buffer.put_u8(157),
            Operation::OP_LESSTHAN => buffer.put_u8(159),
            Operation::OP_GREATERTHAN => buffer.put_u8(160),
            Operation::OP_SHA256 => buffer.put_u8(168),
            Operation::OP_HASH160 => buffer.put_u8(169),
            Operation::OP_HASH256 => buffer.put_u8(170),
            Operation::OP_CHECKSIG => buffer.put_u8(172),
            Operation::OP_CHECKSIGVERIFY => buffer.put_u8(173),
            Operation::OP_CHECKLOCKTIMEVERIFY => buffer.put_u8(177),
        }
        Ok(())
    }

    fn encoded_size(&self) -> u64 {
        match self {
            Operation::OP_PUSH(data) => 1 + data.len() as u64,
            Operation::OP_PUSHDATA1(data) => 2 + data.len() as u64,
            Operation::OP_PUSHDATA2(data) => 3 + data.len() as u64,
            Operation::OP_PUSHDATA4(data) => 5 + data.len() as u64,
            _ => 1,
        }
    }
}

/// Choose the smallest push operation that can hold the data.
pub fn push_of(data: Bytes) -> Operation {
    match data.len() {
        0 => Operation::OP_0,
        1..=75 => Operation::OP_PUSH(data),
        76..=0xff => Operation::OP_PUSHDATA1(data),
        0x100..=0xffff => Operation::OP_PUSHDATA2(data),
        _ => Operation::OP_PUSHDATA4(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    /// Decode the two pushes of a P2PKH unlocking script.
    #[test]
    fn decode_pushes() {
        // input 0 from tx 60dcda63c57420077d67e3ae6684a1654cf9f9cc1b8edd569a847f2b5109b739
        let raw = hex!("47304402207df65c96172de240e6232daeeeccccf8655cb4aba38d968f784e34c6cc047cd30220078216eefaddb915ce55170348c3363d013693c543517ad59188901a0e7f8e50412103be56e90fb443f554140e8d260d7214c3b330cfb7da83b3dd5624f85578497841");
        let mut buf = Bytes::from(raw.to_vec());
        let op1 = Operation::from_binary(&mut buf).unwrap();
        let op2 = Operation::from_binary(&mut buf).unwrap();
        assert!(matches!(op1, Operation::OP_PUSH(ref d) if d.len() == 0x47));
        assert!(matches!(op2, Operation::OP_PUSH(ref d) if d.len() == 0x21));
        assert!(!buf.has_remaining());
    }

    #[test]
    fn push_round_trip() {
        let data = Bytes::from(vec![7u8; 80]);
        let op = push_of(data.clone());
        assert!(matches!(op, Operation::OP_PUSHDATA1(_)));
        let mut v = Vec::new();
        op.to_binary(&mut v).unwrap();
        assert_eq!(v.len() as u64, op.encoded_size());
        let mut buf = Bytes::from(v);
        let decoded = Operation::from_binary(&mut buf).unwrap();
        assert_eq!(decoded, Operation::OP_PUSHDATA1(data));
    }

    #[test]
    fn op_n_range() {
        let mut v = Vec::new();
        Operation::OP_N(16).to_binary(&mut v).unwrap();
        assert_eq!(v, vec![96]);
        assert!(Operation::OP_N(17).to_binary(&mut Vec::new()).is_err());
    }

    #[test]
    fn unknown_opcode() {
        let mut buf = Bytes::from(vec![0xbau8]);
        assert!(Operation::from_binary(&mut buf).is_err());
    }
}
