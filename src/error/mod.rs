//! Error handling for the chain
//!
//! Every rejection the core can produce is a variant here. None of them are
//! retried internally; the caller decides what to do next.

use std::fmt;

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger, sealing and tip transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// Header does not chain onto the current tip, or its Merkle root
    /// does not commit to the supplied transactions
    StructuralMismatch(String),
    /// An attached proof failed verification
    InvalidProof(String),
    /// Inputs are missing, already spent, or do not cover the outputs
    InsufficientFunds { required: u64, available: u64 },
    /// The ledger has nothing to spend
    NoSpendableFunds,
    /// A transaction inside a block could not be applied
    LedgerRejected { index: usize, reason: String },
    /// Artifact loading or a proof oracle call failed
    OracleUnavailable(String),
    /// The chain has not been given a genesis tip yet
    ChainUninitialized,
    /// Genesis was requested on a chain that already has a tip
    GenesisExists,
    /// The chain state lock was poisoned by a panicking writer
    StatePoisoned,
    /// Malformed transaction construction requests
    Transaction(String),
    /// Proof-of-work search errors
    Mining(String),
    /// Cryptographic operation errors
    Crypto(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::StructuralMismatch(msg) => write!(f, "Structural mismatch: {msg}"),
            BlockchainError::InvalidProof(msg) => write!(f, "Invalid proof: {msg}"),
            BlockchainError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            BlockchainError::NoSpendableFunds => write!(f, "No spendable funds in the ledger"),
            BlockchainError::LedgerRejected { index, reason } => {
                write!(f, "Ledger rejected transaction {index}: {reason}")
            }
            BlockchainError::OracleUnavailable(msg) => write!(f, "Proof oracle unavailable: {msg}"),
            BlockchainError::ChainUninitialized => write!(f, "Chain has no genesis tip"),
            BlockchainError::GenesisExists => write!(f, "Genesis tip already initialized"),
            BlockchainError::StatePoisoned => write!(f, "Chain state lock poisoned"),
            BlockchainError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            BlockchainError::Mining(msg) => write!(f, "Mining error: {msg}"),
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for BlockchainError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}
