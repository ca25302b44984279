//! Compiled contract artifacts.
//!
//! An artifact is the JSON description of a compiled contract: its name, the
//! parameters of its constructor and public methods, and the compiled body as
//! opaque bytecode. A deployed instance is the constructor argument pushes
//! followed by the body.

use crate::bitcoin::script::push_of;
use crate::bitcoin::{ByteSequence, Script};
use crate::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Parameter types understood by the ABI.
const KNOWN_TYPES: [&str; 5] = ["int", "bytes", "Sha256", "Ripemd160", "PubKeyHash"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiParam {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiConstructor {
    pub params: Vec<AbiParam>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiMethod {
    pub name: String,
    pub params: Vec<AbiParam>,
}

/// A compiled contract description, loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractArtifact {
    pub contract: String,
    pub version: u32,
    pub constructor: AbiConstructor,
    pub methods: Vec<AbiMethod>,
    /// Compiled contract body as hex. Treated as opaque bytes.
    pub bytecode: String,
}

impl ContractArtifact {
    pub fn from_json(json: &str) -> Result<ContractArtifact> {
        let artifact: ContractArtifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check internal consistency. Called on load.
    pub fn validate(&self) -> Result<()> {
        if self.contract.is_empty() {
            return Err(Error::ArtifactInvalid("empty contract name".to_string()));
        }
        if hex::decode(&self.bytecode).is_err() {
            return Err(Error::ArtifactInvalid(format!(
                "{}: bytecode is not valid hex",
                self.contract
            )));
        }
        for param in self
            .constructor
            .params
            .iter()
            .chain(self.methods.iter().flat_map(|m| m.params.iter()))
        {
            if !KNOWN_TYPES.contains(&param.param_type.as_str()) {
                return Err(Error::ArtifactInvalid(format!(
                    "{}: unknown type {} for param {}",
                    self.contract, param.param_type, param.name
                )));
            }
        }
        Ok(())
    }

    /// The compiled body as bytes.
    pub fn body(&self) -> Bytes {
        // hex validity checked by validate()
        Bytes::from(hex::decode(&self.bytecode).unwrap_or_default())
    }

    pub fn method(&self, name: &str) -> Option<&AbiMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Build the locking script for an instance: one push per constructor
    /// argument, followed by the body.
    pub fn locking_script(&self, args: &[Arg]) -> Result<Script> {
        if args.len() != self.constructor.params.len() {
            return Err(Error::AbiMismatch(format!(
                "{}: constructor takes {} args, got {}",
                self.contract,
                self.constructor.params.len(),
                args.len()
            )));
        }
        let mut buffer = BytesMut::new();
        for (arg, param) in args.iter().zip(self.constructor.params.iter()) {
            if !arg.matches_type(&param.param_type) {
                return Err(Error::AbiMismatch(format!(
                    "{}: param {} expects {}",
                    self.contract, param.name, param.param_type
                )));
            }
            arg.encode_push(&mut buffer)?;
        }
        buffer.put_slice(&self.body());
        Ok(Script {
            raw: buffer.freeze(),
        })
    }

    /// Recover the constructor arguments from a deployed locking script.
    ///
    /// The script must end with this artifact's body; the leading pushes are
    /// decoded according to the declared constructor parameter types.
    pub fn parse_constructor_args(&self, script: &Script) -> Result<Vec<Arg>> {
        let body = self.body();
        if script.len() < body.len() || !script.raw.ends_with(&body) {
            return Err(Error::AbiMismatch(format!(
                "{}: script does not end with contract body",
                self.contract
            )));
        }
        let prefix = Script {
            raw: script.raw.slice(0..script.len() - body.len()),
        };
        let pushes = prefix.decode()?;
        if pushes.len() != self.constructor.params.len() {
            return Err(Error::AbiMismatch(format!(
                "{}: expected {} constructor pushes, found {}",
                self.contract,
                self.constructor.params.len(),
                pushes.len()
            )));
        }
        let mut args = Vec::with_capacity(pushes.len());
        for (op, param) in pushes.iter().zip(self.constructor.params.iter()) {
            let data = op
                .pushed_data()
                .ok_or_else(|| Error::AbiMismatch(format!(
                    "{}: non-push operation before contract body",
                    self.contract
                )))?;
            args.push(Arg::from_data(data, &param.param_type)?);
        }
        Ok(args)
    }
}

/// A typed ABI argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Int(i64),
    Bytes(Bytes),
    Sha256([u8; 32]),
    Ripemd160([u8; 20]),
}

impl Arg {
    pub fn matches_type(&self, param_type: &str) -> bool {
        match self {
            Arg::Int(_) => param_type == "int",
            Arg::Bytes(_) => param_type == "bytes",
            Arg::Sha256(_) => param_type == "Sha256",
            Arg::Ripemd160(_) => param_type == "Ripemd160" || param_type == "PubKeyHash",
        }
    }

    /// The stack bytes this argument pushes.
    pub fn to_byte_seq(&self) -> ByteSequence {
        match self {
            Arg::Int(v) => ByteSequence::from_small_number(*v),
            Arg::Bytes(b) => ByteSequence::new(b.clone()),
            Arg::Sha256(h) => ByteSequence::new(Bytes::copy_from_slice(h)),
            Arg::Ripemd160(h) => ByteSequence::new(Bytes::copy_from_slice(h)),
        }
    }

    fn encode_push(&self, buffer: &mut BytesMut) -> Result<()> {
        use crate::bitcoin::Encodable;
        push_of(self.to_byte_seq().get_bytes()).to_binary(buffer)
    }

    fn from_data(data: Bytes, param_type: &str) -> Result<Arg> {
        match param_type {
            "int" => {
                let seq = ByteSequence::new(data);
                if !seq.is_small_num() {
                    return Err(Error::AbiMismatch("int push too large".to_string()));
                }
                Ok(Arg::Int(seq.to_small_number()))
            }
            "bytes" => Ok(Arg::Bytes(data)),
            "Sha256" => {
                let h: [u8; 32] = data
                    .as_ref()
                    .try_into()
                    .map_err(|_| Error::AbiMismatch("Sha256 push must be 32 bytes".to_string()))?;
                Ok(Arg::Sha256(h))
            }
            "Ripemd160" | "PubKeyHash" => {
                let h: [u8; 20] = data
                    .as_ref()
                    .try_into()
                    .map_err(|_| {
                        Error::AbiMismatch("Ripemd160 push must be 20 bytes".to_string())
                    })?;
                Ok(Arg::Ripemd160(h))
            }
            _ => Err(Error::AbiMismatch(format!("unknown type {}", param_type))),
        }
    }
}

/// A cache of loaded artifacts, keyed by contract name.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    artifacts: HashMap<String, Arc<ContractArtifact>>,
}

impl ArtifactStore {
    pub fn new() -> ArtifactStore {
        ArtifactStore {
            artifacts: HashMap::new(),
        }
    }

    /// Load an artifact from a JSON string. Returns the cached copy if a
    /// contract of the same name has already been loaded.
    pub fn load_str(&mut self, json: &str) -> Result<Arc<ContractArtifact>> {
        let artifact = ContractArtifact::from_json(json)?;
        if let Some(existing) = self.artifacts.get(&artifact.contract) {
            return Ok(Arc::clone(existing));
        }
        let arc = Arc::new(artifact);
        self.artifacts.insert(arc.contract.clone(), Arc::clone(&arc));
        Ok(arc)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Arc<ContractArtifact>> {
        let json = std::fs::read_to_string(path)?;
        self.load_str(&json)
    }

    pub fn get(&self, contract: &str) -> Option<Arc<ContractArtifact>> {
        self.artifacts.get(contract).map(Arc::clone)
    }
}
