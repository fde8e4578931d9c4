// The chain-tip state machine. A Blockchain starts Uninitialized, becomes Ready
// once genesis is installed, and from then on only moves forward one accepted
// block at a time. The tip and the ledger live behind one mutex so they can
// never be observed out of step with each other.

use crate::core::block::{Block, ChainTip};
use crate::core::hashing::{hash, Digest};
use crate::core::proof::ProofGate;
use crate::core::proof_of_work::{Difficulty, ProofOfWork};
use crate::error::{BlockchainError, Result};
use crate::storage::{Ledger, Utxo};
use crate::utils::current_timestamp;
use log::{info, warn};
use std::sync::{Mutex, MutexGuard};

// Everything that changes when a block is accepted
#[derive(Debug, Clone)]
struct ChainState {
    tip: ChainTip,
    ledger: Ledger,
    // every accepted tip from genesis on, the last entry equals `tip`
    history: Vec<ChainTip>,
}

#[derive(Debug)]
pub struct Blockchain {
    difficulty: Difficulty,
    proof_gate: Option<ProofGate>,
    // None until init_genesis
    state: Mutex<Option<ChainState>>,
}

impl Blockchain {
    pub fn new(difficulty: Difficulty) -> Blockchain {
        Blockchain {
            difficulty,
            proof_gate: None,
            state: Mutex::new(None),
        }
    }

    /// Admit `Block::Proven` submissions by checking them against `gate`.
    /// Without a gate every proven block is refused.
    pub fn with_proof_gate(mut self, gate: ProofGate) -> Blockchain {
        self.proof_gate = Some(gate);
        self
    }

    pub fn get_difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn gate(&self) -> Result<&ProofGate> {
        self.proof_gate.as_ref().ok_or_else(|| {
            BlockchainError::OracleUnavailable(
                "no proof verifier configured for proven blocks".to_string(),
            )
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<ChainState>>> {
        self.state.lock().map_err(|_| BlockchainError::StatePoisoned)
    }

    /// Install the genesis tip and seed the ledger with `genesis_outputs`
    pub fn init_genesis(&self, genesis_outputs: Vec<Utxo>) -> Result<ChainTip> {
        let mut guard = self.lock()?;
        if guard.is_some() {
            return Err(BlockchainError::GenesisExists);
        }

        let ledger = Ledger::with_entries(genesis_outputs)?;
        let tip = ChainTip::genesis(current_timestamp()?);
        info!(
            "Genesis {} with {} outputs worth {}",
            tip.get_hash(),
            ledger.len(),
            ledger.balance()
        );

        *guard = Some(ChainState {
            tip: tip.clone(),
            ledger,
            history: vec![tip.clone()],
        });
        Ok(tip)
    }

    /// Validate `block` against the current tip and, if it passes every
    /// check, make it the new tip. A rejected block changes nothing.
    pub fn accept_block(&self, block: Block) -> Result<ChainTip> {
        let mut guard = self.lock()?;
        let state = guard.as_mut().ok_or(BlockchainError::ChainUninitialized)?;

        let header = *block.get_header();
        let current = state.tip.get_hash();
        if header.previous_hash != current {
            warn!(
                "Rejecting block on {} while tip is {current}",
                header.previous_hash
            );
            return Err(BlockchainError::StructuralMismatch(format!(
                "previous hash {} does not match tip {current}",
                header.previous_hash
            )));
        }
        if !block.sealed().verify_merkle_root()? {
            return Err(BlockchainError::StructuralMismatch(format!(
                "merkle root {} does not commit to the block's transactions",
                header.merkle_root
            )));
        }
        if !ProofOfWork::validate(&header, self.difficulty) {
            return Err(BlockchainError::StructuralMismatch(format!(
                "header hash {} does not meet difficulty {}",
                header.hash(),
                self.difficulty.get_nibbles()
            )));
        }

        if let Some(proof) = block.get_proof() {
            let gate = self.gate()?;
            if gate.binds_transition() {
                let new_roots = block
                    .get_transactions()
                    .iter()
                    .map(|tx| tx.get_body().encode().map(|body| hash(&body)))
                    .collect::<Result<Vec<Digest>>>()?;
                gate.check_binding(
                    proof,
                    &state.tip.get_header().merkle_root,
                    Some(new_roots.as_slice()),
                )?;
            }
            gate.check(proof)?;
        }

        // Stage every transaction on a copy; the live ledger is only swapped on success
        let block_hash = header.hash();
        let mut staged = state.ledger.clone();
        let mut next_output_index: u32 = 0;
        for (index, tx) in block.get_transactions().iter().enumerate() {
            staged
                .apply(tx, &block_hash, next_output_index)
                .map_err(|e| BlockchainError::LedgerRejected {
                    index,
                    reason: e.to_string(),
                })?;
            next_output_index = u32::try_from(tx.get_outputs().len())
                .ok()
                .and_then(|count| next_output_index.checked_add(count))
                .ok_or_else(|| BlockchainError::LedgerRejected {
                    index,
                    reason: "output index overflow".to_string(),
                })?;
        }

        let transaction_count = block.get_transactions().len();
        let (_, proof) = block.into_parts();
        let tip = ChainTip::new(header, proof);
        state.tip = tip.clone();
        state.ledger = staged;
        state.history.push(tip.clone());

        info!(
            "Accepted block {} with {transaction_count} transactions{}",
            tip.get_hash(),
            if tip.get_proof().is_some() { " (proven)" } else { "" }
        );
        Ok(tip)
    }

    pub fn current_tip(&self) -> Result<ChainTip> {
        let guard = self.lock()?;
        guard
            .as_ref()
            .map(|state| state.tip.clone())
            .ok_or(BlockchainError::ChainUninitialized)
    }

    /// Every tip since genesis, oldest first
    pub fn history(&self) -> Result<Vec<ChainTip>> {
        let guard = self.lock()?;
        guard
            .as_ref()
            .map(|state| state.history.clone())
            .ok_or(BlockchainError::ChainUninitialized)
    }

    /// Re-check the whole accepted history: each tip's hash, its link to the
    /// one before it, its difficulty and any proof it carries. Genesis is
    /// only checked for its hash.
    pub fn validate_chain(&self) -> Result<()> {
        let guard = self.lock()?;
        let state = guard.as_ref().ok_or(BlockchainError::ChainUninitialized)?;

        for (height, tip) in state.history.iter().enumerate() {
            let header = tip.get_header();
            if tip.get_hash() != header.hash() {
                return Err(BlockchainError::StructuralMismatch(format!(
                    "block {height} stores hash {} for a header hashing to {}",
                    tip.get_hash(),
                    header.hash()
                )));
            }
            if height == 0 {
                continue;
            }

            let parent = &state.history[height - 1];
            if header.previous_hash != parent.get_hash() {
                return Err(BlockchainError::StructuralMismatch(format!(
                    "block {height} links to {} instead of {}",
                    header.previous_hash,
                    parent.get_hash()
                )));
            }
            if !ProofOfWork::validate(header, self.difficulty) {
                return Err(BlockchainError::StructuralMismatch(format!(
                    "block {height} does not meet difficulty {}",
                    self.difficulty.get_nibbles()
                )));
            }
            if let Some(proof) = tip.get_proof() {
                let gate = self.gate()?;
                gate.check_binding(proof, &parent.get_header().merkle_root, None)?;
                gate.check(proof)?;
            }
        }

        info!("Validated chain of {} blocks", state.history.len());
        Ok(())
    }

    pub fn spendable_entries(&self) -> Result<Vec<Utxo>> {
        let guard = self.lock()?;
        guard
            .as_ref()
            .map(|state| state.ledger.spendable_entries())
            .ok_or(BlockchainError::ChainUninitialized)
    }

    pub fn balance(&self) -> Result<u64> {
        let guard = self.lock()?;
        guard
            .as_ref()
            .map(|state| state.ledger.balance())
            .ok_or(BlockchainError::ChainUninitialized)
    }
}
