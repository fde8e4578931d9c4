//! # zk-minichain
//!
//! A single-node ledger whose chain tip only advances through proof-of-work
//! sealed blocks. Each block commits to its transactions with a Merkle root
//! and may carry a succinct proof that has to verify before the block is
//! admitted.
//!
//! ## Layout
//! - `core/`: hashing, Merkle trees, transactions, proof oracle seam,
//!   proof-of-work sealing and the chain-tip state machine
//! - `storage/`: the UTXO ledger and proof artifact loading
//! - `wallet/`: ECDSA P-256 signing behind the `Signer` trait
//! - `node/`: the caller surface that runs build, seal and accept end to end
//! - `config/`: defaults, TOML files and environment overrides
//! - `utils/`: cryptographic and serialization helpers
//! - `cli/`: command-line parsing for the binary
//!
//! ## Flow
//! 1. `TransactionBuilder` reads a ledger snapshot, signs, and optionally proves
//! 2. `merkle_root` commits to the block's transactions
//! 3. `BlockSealer` searches for a nonce meeting the difficulty target
//! 4. `Blockchain::accept_block` re-checks the tip, verifies any proof, and
//!    swaps tip and ledger together

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod node;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

pub use cli::{Command, Opt};
pub use config::{Config, GLOBAL_CONFIG};
pub use core::{
    empty_root, hash, hash_pair, merkle_root, Block, BlockHeader, BlockSealer, Blockchain,
    ChainTip, Difficulty, Digest, DigestOracle, MerkleProof, MerkleTree, Payment, ProofElement,
    ProofGate, ProofOfWork, ProofOracle, ProofPayload, ProofStatement, SealedBlock, Transaction,
    TransactionBody, TransactionBuilder, TxOutput, UtxoId, VerificationKey,
    HEADER_ENCODING_VERSION,
};
pub use error::{BlockchainError, Result};
pub use node::{Node, GENESIS_ORIGIN};
pub use storage::{
    write_dev_artifacts, ArtifactLoader, ArtifactStatus, FsArtifactLoader, Ledger, ProofArtifacts,
    Utxo,
};
pub use utils::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, ripemd160_digest,
};
pub use wallet::{
    convert_address, hash_pub_key, validate_address, Signer, Wallet, ADDRESS_CHECK_SUM_LEN,
};
