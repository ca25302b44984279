use base58::FromBase58Error;
use bytes::TryGetError;
use hex::FromHexError;
use std::io;
use std::string::FromUtf8Error;

/// Standard Result used in the library
pub type Result<T> = std::result::Result<T, Error>;

/// Standard error type used in the library
#[derive(Debug)]
pub enum Error {
    /// An argument provided is invalid
    BadArgument(String),
    /// The data provided is invalid
    BadData(String),
    /// The data did not match the checksum.
    ChecksumMismatch,
    /// The WIF provided was too long.
    WifTooLong,
    /// The blockchain specifier was not recognized.
    InvalidBlockchainSpecifier,
    /// Unrecognized Opcode
    UnrecognizedOpCode,
    /// The data provided is too small to perform the operation.
    DataTooSmall,
    /// The data provided is too large to perform the operation.
    DataTooLarge,
    /// A required environment variable is missing or unusable.
    MissingConfig(String),
    /// The build artifact is missing required metadata or is malformed.
    ArtifactInvalid(String),
    /// Constructor or method arguments do not match the compiled ABI.
    AbiMismatch(String),
    /// The transaction inputs do not cover the outputs plus fee.
    InsufficientFunds { needed: u64, available: u64 },
    /// The provider rejected a broadcast.
    BroadcastRejected(String),
    /// Internal error
    Internal(String),
    /// Hex string could not be decoded
    FromHexError(FromHexError),
    /// Base58 string could not be decoded
    FromBase58Error(FromBase58Error),
    /// secp256k1 library error
    Secp256k1Error(secp256k1::Error),
    /// Standard library IO error
    IOError(io::Error),
    /// String conversion error
    Utf8Error(FromUtf8Error),
    /// Error from TryGet
    TryGet(TryGetError),
    /// JSON (artifact or provider wire) error
    JsonError(serde_json::Error),
    /// HTTP transport error from the network provider
    HttpError(reqwest::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadArgument(s) => f.write_str(&format!("Bad argument: {}", s)),
            Error::BadData(s) => f.write_str(&format!("Bad data: {}", s)),
            Error::ChecksumMismatch => f.write_str("Checksum mismatch"),
            Error::WifTooLong => f.write_str("WIF too long"),
            Error::InvalidBlockchainSpecifier => f.write_str("Unknown blockchain"),
            Error::UnrecognizedOpCode => f.write_str("unrecognized opcode"),
            Error::DataTooSmall => f.write_str("data too small"),
            Error::DataTooLarge => f.write_str("data too large"),
            Error::MissingConfig(s) => f.write_str(&format!("Missing configuration: {}", s)),
            Error::ArtifactInvalid(s) => f.write_str(&format!("Invalid artifact: {}", s)),
            Error::AbiMismatch(s) => f.write_str(&format!("ABI mismatch: {}", s)),
            Error::InsufficientFunds { needed, available } => f.write_str(&format!(
                "Insufficient funds: needed {} satoshis, available {}",
                needed, available
            )),
            Error::BroadcastRejected(s) => f.write_str(&format!("Broadcast rejected: {}", s)),
            Error::Internal(s) => f.write_str(&format!("Internal error: {}", s)),
            Error::FromHexError(e) => f.write_str(&format!("Hex decoding error: {}", e)),
            Error::FromBase58Error(e) => f.write_str(&format!("Base58 decoding error: {:?}", e)),
            Error::Secp256k1Error(e) => f.write_str(&format!("secpk256k1 error: {:?}", e)),
            Error::IOError(e) => f.write_str(&format!("IO error: {}", e)),
            Error::Utf8Error(e) => f.write_str(&format!("UTF8 error: {}", e)),
            Error::TryGet(e) => f.write_str(&format!("Tryget error: {}", e)),
            Error::JsonError(e) => f.write_str(&format!("JSON error: {}", e)),
            Error::HttpError(e) => f.write_str(&format!("HTTP error: {}", e)),
        }
    }
}

impl std::error::Error for Error {}

impl From<FromHexError> for Error {
    fn from(e: FromHexError) -> Self {
        Error::FromHexError(e)
    }
}

impl From<FromBase58Error> for Error {
    fn from(e: FromBase58Error) -> Self {
        Error::FromBase58Error(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IOError(e)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(e: FromUtf8Error) -> Self {
        Error::Utf8Error(e)
    }
}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Error::Secp256k1Error(e)
    }
}

impl From<TryGetError> for Error {
    fn from(e: TryGetError) -> Self {
        Error::TryGet(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonError(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::HttpError(e)
    }
}
