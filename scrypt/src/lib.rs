//! Deployment and test orchestration for sCrypt contracts on Bitcoin SV.
//!
//! The contract compiler and the on-chain script engine are external; this
//! library consumes compiled build artifacts, binds them to typed contract
//! instances, assembles and signs the transactions that deploy and advance
//! those instances, and verifies contract calls by local simulation.

/// Bitcoin SV primitives needed by the orchestration: hashes, keys,
/// scripts, transactions and signature preimages.
pub mod bitcoin;

/// Compiled contract artifacts (the ABI produced by the external compiler).
pub mod artifact;

/// Contract instances and their locally-verifiable public methods.
pub mod contract;

/// Transaction assembly: deployment, contract calls, fees.
pub mod assemble;

/// The network provider capability and its implementations.
pub mod provider;

/// The wallet that owns the private key and the injected provider.
pub mod wallet;

/// Drives genesis/evolve/verify cycles for stateful contracts.
pub mod harness;

mod result;
pub use result::{Error, Result};

// re-export the secp256k1 crate
pub extern crate secp256k1;
