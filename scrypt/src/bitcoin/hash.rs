use crate::bitcoin::Encodable;
use crate::Error;
use bytes::{Buf, BufMut};
use hex::{FromHex, ToHex};
use ring::digest::{digest, SHA256};
use ripemd::digest::Update;
use ripemd::{Digest, Ripemd160};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Single SHA-256 of the given data.
///
/// This is the digest used by hash-commitment contracts, where the committed
/// value is not a transaction hash and is not byte-reversed for display.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let d = digest(&SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(d.as_ref());
    out
}

/// Double SHA-256 of the given data.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// A struct representing a hash, specifically a SHA256d hash.
///
/// This is the hash type that is generally used within the Bitcoin
/// infrastructure. [TxHash] is a type alias for this struct and should
/// generally be used instead.
///
/// [TxHash]: crate::bitcoin::TxHash
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash {
    pub raw: [u8; 32],
}

impl Hash {
    pub const SIZE: u64 = 32;
    pub const HEX_SIZE: u64 = Hash::SIZE * 2;
    pub const ZERO: Hash = Hash {
        raw: [0; Self::SIZE as usize],
    };

    /// Double SHA256 hash the given data.
    pub fn sha256d(data: &[u8]) -> Hash {
        Hash { raw: sha256d(data) }
    }

    // helper for ToHex trait implementation
    fn generic_encode_hex<T, F>(&self, mut encode_fn: F) -> T
    where
        T: FromIterator<char>,
        F: FnMut(&[u8]) -> String,
    {
        let mut reversed_bytes = self.raw;
        reversed_bytes.reverse();
        encode_fn(&reversed_bytes).chars().collect()
    }
}

impl Encodable for Hash {
    fn from_binary(buffer: &mut dyn Buf) -> crate::Result<Self>
    where
        Self: Sized,
    {
        if buffer.remaining() < Self::SIZE as usize {
            Err(Error::DataTooSmall)
        } else {
            let mut hash = [0; 32];
            buffer.copy_to_slice(&mut hash);
            Ok(Self { raw: hash })
        }
    }

    fn to_binary(&self, buffer: &mut dyn BufMut) -> crate::Result<()> {
        buffer.put_slice(&self.raw);
        Ok(())
    }

    fn encoded_size(&self) -> u64 {
        Self::SIZE
    }
}

impl FromHex for Hash {
    type Error = Error;

    /// Converts a string of 64 hex characters into a hash. The bytes of the hex encoded form
    /// are reversed in accordance with Bitcoin standards.
    fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, Self::Error> {
        let hex = hex.as_ref();
        if hex.len() != Hash::HEX_SIZE as usize {
            let msg = format!(
                "Length of hex encoded hash must be 64. Len is {:}.",
                hex.len()
            );
            return Err(Error::BadArgument(msg));
        }
        let mut hash_bytes = hex::decode(hex)?;
        // Reverse bytes in place to match Bitcoin standard representation.
        hash_bytes.reverse();
        let mut hash_array = [0u8; Hash::SIZE as usize];
        hash_array.copy_from_slice(&hash_bytes);
        Ok(Hash { raw: hash_array })
    }
}

impl ToHex for Hash {
    /// Converts the hash into a hex string. The bytes are reversed in the hex string in
    /// accordance with Bitcoin standard representation.
    fn encode_hex<T: FromIterator<char>>(&self) -> T {
        self.generic_encode_hex(|bytes| hex::encode(bytes))
    }

    fn encode_hex_upper<T: FromIterator<char>>(&self) -> T {
        self.generic_encode_hex(|bytes| hex::encode_upper(bytes))
    }
}

impl From<[u8; 32]> for Hash {
    fn from(value: [u8; 32]) -> Self {
        Hash { raw: value }
    }
}

impl From<Hash> for [u8; 32] {
    fn from(value: Hash) -> Self {
        value.raw
    }
}

impl From<&str> for Hash {
    /// This converts a hex encoded hash into a Hash struct.
    fn from(hash_as_hex: &str) -> Hash {
        Hash::from_hex(hash_as_hex).unwrap()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode_hex::<String>())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode_hex::<String>())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.encode_hex::<String>().as_ref())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(s).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

/// A 160-bit hash, specifically the RIPEMD160(SHA256) hash.
///
/// This is the hash type used for Bitcoin addresses and public key commitments.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Hash160 {
    pub hash: [u8; Self::SIZE],
}

impl Hash160 {
    pub const SIZE: usize = 20;

    /// Generate the hash from the given data.
    pub fn generate(data: &[u8]) -> Hash160 {
        let first = sha256(data);
        let mut r_hasher = Ripemd160::new();
        Update::update(&mut r_hasher, &first);
        let ripemd = r_hasher.finalize();
        let mut hash = [0; Self::SIZE];
        hash.clone_from_slice(ripemd.as_ref());
        Hash160 { hash }
    }
}

impl FromHex for Hash160 {
    type Error = Error;

    /// Hash160 values appear in scripts in natural byte order, so no reversal here.
    fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, Self::Error> {
        let bytes = hex::decode(hex)?;
        if bytes.len() != Self::SIZE {
            return Err(Error::BadArgument(format!(
                "Length of hex encoded hash160 must be 40. Len is {:}.",
                bytes.len() * 2
            )));
        }
        let mut hash = [0u8; Self::SIZE];
        hash.copy_from_slice(&bytes);
        Ok(Hash160 { hash })
    }
}

impl From<[u8; 20]> for Hash160 {
    fn from(value: [u8; 20]) -> Self {
        Hash160 { hash: value }
    }
}

impl fmt::Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn sha256d_test() {
        let x = hex::decode("0123456789abcdef").unwrap();
        let e = hex::encode(Hash::sha256d(&x).raw);
        assert_eq!(
            e,
            "137ad663f79da06e282ed0abbec4d70523ced5ff8e39d5c2e5641d978c5925aa"
        );
    }

    /// sha256("abc"), the FIPS 180-2 test vector.
    #[test]
    fn sha256_single() {
        let d = sha256(b"abc");
        assert_eq!(
            hex::encode(d),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hash_decode() {
        // Valid
        let s1 = "0000000000000000000000000000000000000000000000000000000000000000";
        let s2 = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
        let s3 = "abcdef0000112233445566778899abcdef000011223344556677889912345678";
        assert!(Hash::from_hex(s1).is_ok());
        assert!(Hash::from_hex(s2).is_ok());
        assert!(Hash::from_hex(s3).is_ok());

        // Invalid
        let s1 = "000000000000000000000000000000000000000000000000000000000000000";
        let s2 = "00000000000000000000000000000000000000000000000000000000000000000";
        let s3 = "000000000000000000000000000000000000000000000000000000000000000g";
        assert!(Hash::from_hex(s1).is_err());
        assert!(Hash::from_hex(s2).is_err());
        assert!(Hash::from_hex(s3).is_err());
    }

    /// Test binary read of hash
    #[test]
    fn hash_read() {
        let mut b = Bytes::from(vec![
            0xbeu8, 0xc7, 0x7b, 0x08, 0x3c, 0xf7, 0xb7, 0x5c, 0x97, 0xcc, 0xfa, 0x0c, 0x4b, 0x0c,
            0x0c, 0x40, 0xa6, 0xe5, 0xae, 0x6b, 0x05, 0xab, 0x12, 0xc9, 0x38, 0x81, 0xaf, 0x7f,
            0x8a, 0x04, 0x53, 0xf2,
        ]);
        let h = Hash::from_binary(&mut b).unwrap();
        assert_eq!(
            h.encode_hex::<String>(),
            "f253048a7faf8138c912ab056baee5a6400c0c4b0cfacc975cb7f73c087bc7be"
        );
    }

    #[test]
    fn hash160_known_value() {
        // hash160 of the pubkey in tx d2bb697e3555cb0e4a82f0d4990d1c826eee9f648a5efc598f648bdb524093ff
        let pubkey =
            hex::decode("031adba39196c65be0e61c6ddf57b397aa246729f5b639bd5bc9b5c55cf14af107")
                .unwrap();
        let h = Hash160::generate(&pubkey);
        assert_eq!(h.hash.len(), 20);
        // round trip through hex
        let h2 = Hash160::from_hex(hex::encode(h.hash)).unwrap();
        assert_eq!(h, h2);
    }

    #[test]
    fn json_serialize_hash() {
        let hash =
            Hash::from_hex("0000000000000000069347185643c805ff7e00fae025316393e34fa67274df4e")
                .expect("Failed to decode test hash");
        let serialized = serde_json::to_string(&hash).expect("Failed to serialize");
        assert_eq!(
            serialized,
            "\"0000000000000000069347185643c805ff7e00fae025316393e34fa67274df4e\""
        );
    }
}
