use crate::core::hashing::{hash, Digest, DIGEST_LEN};
use crate::core::merkle::{merkle_root, MerkleProof, MerkleTree};
use crate::core::proof::ProofPayload;
use crate::core::Transaction;
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};

/// Version byte leading every canonical header encoding
pub const HEADER_ENCODING_VERSION: u8 = 1;

/// version(1) || previous_hash(32) || merkle_root(32) || timestamp(8, BE) || nonce(8, BE)
pub const HEADER_ENCODED_LEN: usize = 1 + DIGEST_LEN + DIGEST_LEN + 8 + 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub previous_hash: Digest,
    pub merkle_root: Digest,
    pub timestamp: i64,
    pub nonce: u64,
}

impl BlockHeader {
    /// Canonical bytes hashed for proof-of-work and block identity
    pub fn to_bytes(&self) -> [u8; HEADER_ENCODED_LEN] {
        let mut out = [0u8; HEADER_ENCODED_LEN];
        out[0] = HEADER_ENCODING_VERSION;
        out[1..33].copy_from_slice(self.previous_hash.as_bytes());
        out[33..65].copy_from_slice(self.merkle_root.as_bytes());
        out[65..73].copy_from_slice(&self.timestamp.to_be_bytes());
        out[73..81].copy_from_slice(&self.nonce.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<BlockHeader> {
        if bytes.len() != HEADER_ENCODED_LEN {
            return Err(BlockchainError::Serialization(format!(
                "Header must be {HEADER_ENCODED_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        if bytes[0] != HEADER_ENCODING_VERSION {
            return Err(BlockchainError::Serialization(format!(
                "Unsupported header encoding version {}",
                bytes[0]
            )));
        }

        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&bytes[65..73]);
        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(&bytes[73..81]);

        Ok(BlockHeader {
            previous_hash: Digest::from_slice(&bytes[1..33])?,
            merkle_root: Digest::from_slice(&bytes[33..65])?,
            timestamp: i64::from_be_bytes(timestamp),
            nonce: u64::from_be_bytes(nonce),
        })
    }

    pub fn hash(&self) -> Digest {
        hash(&self.to_bytes())
    }
}

/// A mined header and the transactions it commits to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlock {
    header: BlockHeader,
    transactions: Vec<Transaction>,
}

impl SealedBlock {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> SealedBlock {
        SealedBlock {
            header,
            transactions,
        }
    }

    pub fn get_header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get_hash(&self) -> Digest {
        self.header.hash()
    }

    /// Recomputes the root from the transactions; the header's claim is not trusted
    pub fn verify_merkle_root(&self) -> Result<bool> {
        Ok(merkle_root(&self.transactions)? == self.header.merkle_root)
    }

    pub fn generate_merkle_proof(&self, transaction_index: usize) -> Result<MerkleProof> {
        MerkleTree::new(&self.transactions)?.generate_proof(transaction_index)
    }

    pub fn verify_merkle_proof(&self, proof: &MerkleProof) -> bool {
        proof.merkle_root == self.header.merkle_root && MerkleTree::verify_proof(proof)
    }
}

/// A block submitted for acceptance, with or without a succinct proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Sealed(SealedBlock),
    Proven {
        block: SealedBlock,
        proof: ProofPayload,
    },
}

impl Block {
    pub fn sealed(&self) -> &SealedBlock {
        match self {
            Block::Sealed(block) | Block::Proven { block, .. } => block,
        }
    }

    pub fn get_header(&self) -> &BlockHeader {
        self.sealed().get_header()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.sealed().get_transactions()
    }

    pub fn get_proof(&self) -> Option<&ProofPayload> {
        match self {
            Block::Sealed(_) => None,
            Block::Proven { proof, .. } => Some(proof),
        }
    }

    pub fn into_parts(self) -> (SealedBlock, Option<ProofPayload>) {
        match self {
            Block::Sealed(block) => (block, None),
            Block::Proven { block, proof } => (block, Some(proof)),
        }
    }
}

/// The canonical head of the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTip {
    header: BlockHeader,
    hash: Digest,
    proof: Option<ProofPayload>,
}

impl ChainTip {
    pub fn new(header: BlockHeader, proof: Option<ProofPayload>) -> ChainTip {
        ChainTip {
            hash: header.hash(),
            header,
            proof,
        }
    }

    /// previous_hash = zero digest, merkle_root = hash(""), nonce = 0
    pub fn genesis(timestamp: i64) -> ChainTip {
        ChainTip::new(
            BlockHeader {
                previous_hash: Digest::ZERO,
                merkle_root: crate::core::merkle::empty_root(),
                timestamp,
                nonce: 0,
            },
            None,
        )
    }

    pub fn get_header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn get_hash(&self) -> Digest {
        self.hash
    }

    pub fn get_proof(&self) -> Option<&ProofPayload> {
        self.proof.as_ref()
    }
}
