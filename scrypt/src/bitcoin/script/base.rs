use crate::bitcoin::script::Operation;
use crate::bitcoin::{varint_decode, varint_encode, varint_size, Encodable};
use crate::Result;
use bytes::{Buf, BufMut, Bytes};
use hex::{FromHex, ToHex};
use serde::{Deserialize, Serialize};

/// Bitcoin Scripts are used to lock and unlock outputs.
///
/// This struct is a Script in its encoded form and is read-only. Use [Script::decode]
/// to examine a script or [ScriptBuilder] to build one.
///
/// [ScriptBuilder]: crate::bitcoin::ScriptBuilder
#[derive(PartialEq, Eq, Hash, Clone, Debug, Serialize, Deserialize)]
pub struct Script {
    pub raw: Bytes,
}

impl Script {
    /// Decode the script into its operations.
    ///
    /// Fails on opcodes outside the subset this library understands; compiled
    /// contract bodies are handled as opaque bytes and should not be decoded.
    pub fn decode(&self) -> Result<Vec<Operation>> {
        let mut result = Vec::new();
        let mut buf = self.raw.clone();
        while buf.has_remaining() {
            let o = Operation::from_binary(&mut buf)?;
            result.push(o);
        }
        Ok(result)
    }

    /// The length of the raw script in bytes, without the varint length prefix.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// An empty script, used as a placeholder for not-yet-computed unlocking scripts.
    pub fn empty() -> Script {
        Script { raw: Bytes::new() }
    }
}

impl From<Vec<u8>> for Script {
    fn from(value: Vec<u8>) -> Self {
        Self {
            raw: Bytes::from(value),
        }
    }
}

impl FromHex for Script {
    type Error = crate::Error;

    /// Hex encoding is not prefixed by the length.
    fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self> {
        let raw = hex::decode(hex)?;
        Ok(Self {
            raw: Bytes::from(raw),
        })
    }
}

impl ToHex for Script {
    fn encode_hex<T: FromIterator<char>>(&self) -> T {
        self.raw.as_ref().encode_hex()
    }

    fn encode_hex_upper<T: FromIterator<char>>(&self) -> T {
        self.raw.as_ref().encode_hex_upper()
    }
}

impl Encodable for Script {
    /// A script is always encoded with its size.
    fn from_binary(buffer: &mut dyn Buf) -> Result<Self>
    where
        Self: Sized,
    {
        let size = varint_decode(buffer)? as usize;
        if buffer.remaining() < size {
            return Err(crate::Error::DataTooSmall);
        }
        Ok(Self {
            raw: buffer.copy_to_bytes(size),
        })
    }

    fn to_binary(&self, buffer: &mut dyn BufMut) -> Result<()> {
        varint_encode(buffer, self.raw.len() as u64)?;
        buffer.put_slice(&self.raw);
        Ok(())
    }

    fn encoded_size(&self) -> u64 {
        let l = self.raw.len() as u64;
        varint_size(l) + l
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test reading a script from hex.
    #[test]
    fn script_read_hex() {
        // this script comes from input 0 from tx 60dcda63c57420077d67e3ae6684a1654cf9f9cc1b8edd569a847f2b5109b739
        let s = Script::from_hex("47304402207df65c96172de240e6232daeeeccccf8655cb4aba38d968f784e34c6cc047cd30220078216eefaddb915ce55170348c3363d013693c543517ad59188901a0e7f8e50412103be56e90fb443f554140e8d260d7214c3b330cfb7da83b3dd5624f85578497841").unwrap();
        assert_eq!(107, s.encoded_size()); // 106 bytes + 1 for size as varint
    }

    /// Test decoding a script.
    #[test]
    fn test_decode() {
        let s = Script::from_hex("47304402207df65c96172de240e6232daeeeccccf8655cb4aba38d968f784e34c6cc047cd30220078216eefaddb915ce55170348c3363d013693c543517ad59188901a0e7f8e50412103be56e90fb443f554140e8d260d7214c3b330cfb7da83b3dd5624f85578497841").unwrap();
        let ops = s.decode().unwrap();
        assert_eq!(2, ops.len());
    }

    /// Encoded form round-trips through Encodable.
    #[test]
    fn encode_round_trip() {
        let s = Script::from_hex("76a9142a717dea82e3040b606daf6afc4f94a54a2b37b788ac").unwrap();
        let v = s.to_binary_buf().unwrap();
        let mut buf = Bytes::from(v);
        let s2 = Script::from_binary(&mut buf).unwrap();
        assert_eq!(s, s2);
    }
}
