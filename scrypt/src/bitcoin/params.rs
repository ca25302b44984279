/// KeyAddressKind differentiates whether a Key or Address is for the production
/// blockchain (mainnet) or for a test blockchain.
///
/// Unfortunately, the standard does not differentiate between the different test
/// blockchains.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyAddressKind {
    Main = 0,
    NotMain = 1,
}

impl KeyAddressKind {
    /// The address prefix is used when encoding an Address.
    ///
    /// The prefix is prepended to the 160-bit hash of a public key before base-58
    /// (with checksum) encoding the value to produce the Address.
    pub fn get_address_prefix(&self) -> u8 {
        match self {
            KeyAddressKind::Main => 0x00,
            KeyAddressKind::NotMain => 0x6f,
        }
    }

    /// The private key prefix is used for the WIF encoding of a private key.
    pub fn get_private_key_prefix(&self) -> u8 {
        match self {
            KeyAddressKind::Main => 0x80,
            KeyAddressKind::NotMain => 0xef,
        }
    }
}
