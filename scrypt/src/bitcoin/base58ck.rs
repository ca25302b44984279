use crate::bitcoin::Hash;
use crate::{Error, Result};
use base58::{FromBase58, ToBase58};

/// Functions for base-58 encoding with checksum.
///
/// Some Bitcoin standards use base-58 encoding with an additional checksum. The checksum
/// is the first 4 bytes of the SHA256D hash of the value and is appended to the end.

/// Encodes `data` as a base58 string including the checksum.
pub fn encode_with_checksum(data: &[u8]) -> String {
    let mut ck_data = data.to_vec();
    ck_data.extend_from_slice(&Hash::sha256d(data).raw[0..4]);
    ck_data.to_base58()
}

/// Decode from base58 with checksum, verifying and removing the checksum.
pub fn decode_with_checksum(encoded: &str) -> Result<Vec<u8>> {
    let mut data = encoded.from_base58()?;
    let l = data.len();
    if l < 5 {
        Err(Error::BadData(
            "base58 string too short to contain checksum".to_string(),
        ))
    } else {
        let ck = Hash::sha256d(&data[..l - 4]);
        if ck.raw[0..4] != data[l - 4..] {
            Err(Error::ChecksumMismatch)
        } else {
            data.truncate(l - 4);
            Ok(data)
        }
    }
}
