use crate::bitcoin::base58ck;
use crate::bitcoin::hash::Hash160;
use crate::bitcoin::params::KeyAddressKind;
use crate::{Error, Result};
use secp256k1::Secp256k1;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A Bitcoin private key.
///
/// This is a wrapper around [secp256k1::SecretKey], providing some Bitcoin specific
/// functionality, primarily WIF encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKey {
    /// The actual ECDSA key.
    pub inner: secp256k1::SecretKey,
}

impl PrivateKey {
    /// Constructs a new compressed ECDSA private key using the secp256k1 algorithm and
    /// a secure random number generator.
    pub fn generate() -> PrivateKey {
        let secret_key = secp256k1::SecretKey::new(&mut rand::thread_rng());
        PrivateKey::new(secret_key)
    }

    /// Constructs a private key from the provided generic Secp256k1 private key.
    pub fn new(key: secp256k1::SecretKey) -> PrivateKey {
        PrivateKey { inner: key }
    }

    /// Deserializes a private key from a slice.
    pub fn from_slice(data: &[u8]) -> Result<PrivateKey> {
        Ok(PrivateKey::new(secp256k1::SecretKey::from_slice(data)?))
    }

    /// Gets the WIF encoding of this private key.
    pub fn to_wif(self, kind: KeyAddressKind) -> String {
        let mut ret = Vec::with_capacity(34);
        ret.push(kind.get_private_key_prefix());
        ret.extend_from_slice(&self.inner[..]);
        ret.push(1); // always use compressed public keys
        base58ck::encode_with_checksum(&ret)
    }

    /// Parses the WIF encoded private key.
    ///
    /// Returns a tuple of the private key and the kind of blockchain for which the
    /// private key is intended. The function can not distinguish between the
    /// non-production blockchains so it must return [KeyAddressKind].
    pub fn from_wif(wif: &str) -> Result<(PrivateKey, KeyAddressKind)> {
        let data = base58ck::decode_with_checksum(wif)?;

        let _compressed = match data.len() {
            33 => false,
            34 => true,
            _other => {
                return Err(Error::WifTooLong);
            }
        };

        let blockchain = match data[0] {
            0x80 => KeyAddressKind::Main,
            0xef => KeyAddressKind::NotMain,
            _ => {
                return Err(Error::InvalidBlockchainSpecifier);
            }
        };

        Ok((
            PrivateKey {
                inner: secp256k1::SecretKey::from_slice(&data[1..33])?,
            },
            blockchain,
        ))
    }
}

/// A Bitcoin ECDSA public key.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PublicKey {
    /// The actual ECDSA key.
    pub inner: secp256k1::PublicKey,
}

impl PublicKey {
    /// Constructs a compressed ECDSA public key from anything that can be converted into
    /// a Secp256k1 public key.
    pub fn new(key: impl Into<secp256k1::PublicKey>) -> PublicKey {
        PublicKey { inner: key.into() }
    }

    /// Returns the bitcoin 160-bit hash of the public key.
    pub fn pubkey_hash(&self) -> Hash160 {
        Hash160::generate(&self.inner.serialize())
    }

    /// Serializes the public key to bytes (compressed form, 33 bytes).
    pub fn to_bytes(self) -> Vec<u8> {
        self.inner.serialize().to_vec()
    }
}

impl From<secp256k1::PublicKey> for PublicKey {
    fn from(pk: secp256k1::PublicKey) -> PublicKey {
        PublicKey::new(pk)
    }
}

impl From<&PrivateKey> for PublicKey {
    fn from(value: &PrivateKey) -> Self {
        let secp = Secp256k1::new();
        PublicKey {
            inner: secp256k1::PublicKey::from_secret_key(&secp, &value.inner),
        }
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    /// Decode a public key from the hex representation as included in a script (e.g.
    /// from a P2PKH unlocking script).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(PublicKey {
            inner: secp256k1::PublicKey::from_str(s)?,
        })
    }
}
