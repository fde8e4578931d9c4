use crate::core::block::BlockHeader;
use crate::core::hashing::{Digest, DIGEST_LEN};
use crate::error::{BlockchainError, Result};
use crate::utils::current_timestamp;
use log::{debug, info};
use num_bigint::{BigInt, Sign};
use std::ops::ShlAssign;
use std::thread::{self, JoinHandle};

/// Default upper bound on the nonce search
pub const DEFAULT_MAX_NONCE: u64 = u64::MAX;

const MAX_NIBBLES: u32 = (DIGEST_LEN * 2) as u32;

/// Proof-of-work difficulty, expressed as required leading zero hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Difficulty(u32);

impl Difficulty {
    pub fn leading_zero_nibbles(nibbles: u32) -> Result<Difficulty> {
        if nibbles > MAX_NIBBLES {
            return Err(BlockchainError::Config(format!(
                "Difficulty must be between 0 and {MAX_NIBBLES} nibbles, got {nibbles}"
            )));
        }
        Ok(Difficulty(nibbles))
    }

    pub fn get_nibbles(&self) -> u32 {
        self.0
    }

    /// 2^(256 - 4n)
    pub fn target(&self) -> BigInt {
        let mut target = BigInt::from(1);
        target.shl_assign(256 - 4 * self.0);
        target
    }

    pub fn is_met_by(&self, digest: &Digest) -> bool {
        BigInt::from_bytes_be(Sign::Plus, digest.as_bytes()) < self.target()
    }
}

pub struct ProofOfWork;

impl ProofOfWork {
    /// Re-check a header against `difficulty`
    pub fn validate(header: &BlockHeader, difficulty: Difficulty) -> bool {
        difficulty.is_met_by(&header.hash())
    }
}

/// Searches for a nonce whose header hash meets the difficulty target
#[derive(Debug, Clone)]
pub struct BlockSealer {
    difficulty: Difficulty,
    max_nonce: u64,
}

impl BlockSealer {
    pub fn new(difficulty: Difficulty) -> BlockSealer {
        BlockSealer {
            difficulty,
            max_nonce: DEFAULT_MAX_NONCE,
        }
    }

    pub fn with_max_nonce(mut self, max_nonce: u64) -> BlockSealer {
        self.max_nonce = max_nonce;
        self
    }

    pub fn seal(&self, previous_hash: Digest, merkle_root: Digest) -> Result<BlockHeader> {
        let target = self.difficulty.target();
        info!(
            "Mining block on {} at difficulty {}",
            previous_hash,
            self.difficulty.get_nibbles()
        );

        let mut nonce: u64 = 0;
        loop {
            let header = BlockHeader {
                previous_hash,
                merkle_root,
                timestamp: current_timestamp()?,
                nonce,
            };
            let digest = header.hash();
            if BigInt::from_bytes_be(Sign::Plus, digest.as_bytes()) < target {
                info!("Sealed block {digest} after {} attempts", nonce as u128 + 1);
                return Ok(header);
            }
            if nonce >= self.max_nonce {
                debug!("Nonce space exhausted at {nonce}");
                return Err(BlockchainError::Mining(format!(
                    "No header met difficulty {} within {} nonces",
                    self.difficulty.get_nibbles(),
                    self.max_nonce as u128 + 1
                )));
            }
            nonce += 1;
        }
    }

    /// Run [`BlockSealer::seal`] on a dedicated thread
    pub fn seal_on_worker(
        &self,
        previous_hash: Digest,
        merkle_root: Digest,
    ) -> JoinHandle<Result<BlockHeader>> {
        let sealer = self.clone();
        thread::spawn(move || sealer.seal(previous_hash, merkle_root))
    }
}
