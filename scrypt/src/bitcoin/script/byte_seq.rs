use bytes::Bytes;
use num::bigint::BigInt;

/// A sequence of bytes on the stack, as pushed by a script operation.
///
/// Numbers are encoded as two's-complement little-endian byte sequences, with
/// zero encoded as the empty sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ByteSequence {
    bytes: Bytes,
}

/// Maximum size in bytes of a "small" number that can be used in arithmetic operations.
pub const MAX_SMALL_NUM_SIZE: usize = 8;

impl ByteSequence {
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes }
    }

    pub fn get_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Can this byte sequence be used as a number in arithmetic operations?
    pub fn is_small_num(&self) -> bool {
        self.bytes.len() <= MAX_SMALL_NUM_SIZE
    }

    /// Interpret the byte sequence as a number.
    pub fn to_small_number(&self) -> i64 {
        if self.bytes.is_empty() {
            return 0;
        }
        let b = BigInt::from_signed_bytes_le(&self.bytes);
        // value fits by is_small_num contract
        b.try_into().unwrap_or(0)
    }

    /// Encode a number as a byte sequence.
    pub fn from_small_number(num: i64) -> Self {
        if num == 0 {
            Self { bytes: Bytes::new() }
        } else {
            let b = BigInt::from(num);
            Self {
                bytes: Bytes::from(b.to_signed_bytes_le()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_empty() {
        let b = ByteSequence::from_small_number(0);
        assert!(b.is_empty());
        assert_eq!(0, b.to_small_number());
    }

    #[test]
    fn number_round_trip() {
        for v in [1i64, 2, 16, 17, 127, 128, 255, 256, 1000, 500_000] {
            let b = ByteSequence::from_small_number(v);
            assert!(b.is_small_num());
            assert_eq!(v, b.to_small_number(), "value {}", v);
        }
    }

    #[test]
    fn sign_byte_added() {
        // 128 needs a trailing zero byte to keep the sign bit clear
        let b = ByteSequence::from_small_number(128);
        assert_eq!(vec![0x80, 0x00], b.get_bytes().to_vec());
    }
}
