//! Core chain functionality
//!
//! Hashing and Merkle commitments, transactions and their builder, the proof
//! oracle seam, proof-of-work sealing, and the chain-tip state machine.

pub mod block;
pub mod blockchain;
pub mod hashing;
pub mod merkle;
pub mod proof;
pub mod proof_of_work;
pub mod transaction;

pub use block::{Block, BlockHeader, ChainTip, SealedBlock, HEADER_ENCODING_VERSION};
pub use blockchain::Blockchain;
pub use hashing::{hash, hash_pair, Digest, DIGEST_LEN};
pub use merkle::{empty_root, merkle_root, MerkleProof, MerkleTree, ProofElement};
pub use proof::{
    DigestOracle, ProofGate, ProofOracle, ProofPayload, ProofStatement, VerificationKey,
};
pub use proof_of_work::{BlockSealer, Difficulty, ProofOfWork, DEFAULT_MAX_NONCE};
pub use transaction::{
    Payment, Transaction, TransactionBody, TransactionBuilder, TxOutput, UtxoId,
};
