use crate::bitcoin::hash::Hash160;
use crate::bitcoin::keys::{PrivateKey, PublicKey};
use crate::bitcoin::params::KeyAddressKind;
use crate::bitcoin::script::{Operation, Script, ScriptBuilder};
use crate::bitcoin::base58ck;
use crate::{Error, Result};
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

/// A Bitcoin Address is a destination for a Bitcoin payment, using the P2PKH script template.
///
/// The address is the 160-bit hash of the public key, encoded in base58check format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub hash160: Hash160,
    pub kind: KeyAddressKind,
}

impl Address {
    /// Create the address for a private key.
    pub fn from_pv(pv: &PrivateKey, kind: KeyAddressKind) -> Address {
        Address::from_pub(&PublicKey::from(pv), kind)
    }

    /// Create the address for a public key.
    pub fn from_pub(pubkey: &PublicKey, kind: KeyAddressKind) -> Address {
        Address {
            hash160: pubkey.pubkey_hash(),
            kind,
        }
    }

    /// The P2PKH locking script that pays to this address.
    pub fn lock_script(&self) -> Result<Script> {
        ScriptBuilder::new()
            .add(Operation::OP_DUP)
            .add(Operation::OP_HASH160)
            .add(Operation::OP_PUSH(Bytes::copy_from_slice(&self.hash160.hash)))
            .add(Operation::OP_EQUALVERIFY)
            .add(Operation::OP_CHECKSIG)
            .build()
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let data = base58ck::decode_with_checksum(s)?;
        if data.len() != Hash160::SIZE + 1 {
            return Err(Error::BadData(format!(
                "address must decode to 21 bytes, got {}",
                data.len()
            )));
        }
        let kind = match data[0] {
            0x00 => KeyAddressKind::Main,
            0x6f => KeyAddressKind::NotMain,
            _ => return Err(Error::InvalidBlockchainSpecifier),
        };
        let mut hash = [0u8; Hash160::SIZE];
        hash.copy_from_slice(&data[1..]);
        Ok(Address {
            hash160: Hash160 { hash },
            kind,
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut v = Vec::with_capacity(Hash160::SIZE + 1);
        v.push(self.kind.get_address_prefix());
        v.extend_from_slice(&self.hash160.hash);
        f.write_str(&base58ck::encode_with_checksum(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex::ToHex;

    /// A known mainnet address round trip.
    #[test]
    fn parse_and_print_mainnet() {
        // from output 0 of tx 1e155211334dfcf345cf257fabbf8fcc5f665f26cd5d612f1b5331ff3ec950fa
        let s = "154BHe8d7Dmm7pWLG8J9gceXiCfCRDtWAo";
        let a = Address::from_str(s).unwrap();
        assert_eq!(a.kind, KeyAddressKind::Main);
        assert_eq!(
            hex::encode(a.hash160.hash),
            "2c7a568d346629f5308a5b75d825d28b09297153"
        );
        assert_eq!(a.to_string(), s);
    }

    /// A known testnet address produces the expected P2PKH locking script.
    #[test]
    fn testnet_lock_script() {
        let a = Address::from_str("mjPNdfSRh44bxDmB7HkpnBRAF34GJ7wUnc").unwrap();
        assert_eq!(a.kind, KeyAddressKind::NotMain);
        let s = a.lock_script().unwrap();
        assert_eq!(
            s.raw.encode_hex::<String>(),
            "76a9142a717dea82e3040b606daf6afc4f94a54a2b37b788ac"
        );
    }

    /// A known testnet key produces a known address.
    #[test]
    fn test_known_addresses() {
        let stn_addr = "n2ziCHyDm8wr7owJwF3smicSBAcP17L8HS";
        let (privkey, bchain) =
            PrivateKey::from_wif("cU5N3pE6QnRd3rZFgv1KMvUkDwMY4Vnya3bLE5JtZG3Hb549pzDN")
                .expect("Failed to parse known STN WIF");
        let addr = Address::from_pv(&privkey, bchain);
        assert_eq!(addr.to_string(), stn_addr);
    }
}
