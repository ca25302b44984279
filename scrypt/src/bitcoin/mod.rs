/// The bitcoin module contains the Bitcoin SV types used by the orchestration layer.
mod address;
mod base58ck;
mod encoding;
pub mod hash;
mod keys;
mod params;
pub mod script;
pub mod sighash;
pub mod tx;
mod var_int;

pub use self::address::Address;
pub use self::encoding::Encodable;
pub use self::hash::{sha256, sha256d, Hash, Hash160};
pub use self::keys::{PrivateKey, PublicKey};
pub use self::params::KeyAddressKind;
pub use self::script::{ByteSequence, Operation, Script, ScriptBuilder};
pub use self::sighash::{
    preimage, sign_input, signature_hash, verify_signature, BaseSigHash, Preimage, SighashType,
};
pub use self::tx::{Outpoint, Tx, TxHash, TxInput, TxOutput};
pub use self::var_int::{varint_decode, varint_encode, varint_size};
pub use hex::{FromHex, ToHex};
