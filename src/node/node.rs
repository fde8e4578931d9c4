// The node ties the pieces together for a caller: it owns the chain, knows
// how to build the next transaction, and runs build -> commit -> seal -> accept
// in one call. Everything slow (proving, sealing) happens outside the chain's
// lock; the chain re-checks the tip when the block finally arrives.

use crate::config::Config;
use crate::core::{
    merkle_root, Block, BlockHeader, BlockSealer, Blockchain, ChainTip, DigestOracle, Payment,
    ProofGate, ProofOracle, SealedBlock, Transaction, TransactionBuilder, TxOutput, UtxoId,
    VerificationKey,
};
use crate::error::{BlockchainError, Result};
use crate::storage::{ArtifactLoader, Utxo};
use crate::wallet::Signer;
use log::info;
use std::sync::Arc;

/// Origin id of the genesis output
pub const GENESIS_ORIGIN: &str = "genesis";

pub struct Node {
    chain: Arc<Blockchain>,
    builder: TransactionBuilder,
    sealer: BlockSealer,
    recipient: String,
    // None sweeps the first spendable entry
    amount: Option<u64>,
    genesis_amount: u64,
}

impl Node {
    /// A node that mines unproven blocks
    pub fn new(config: &Config, signer: Arc<dyn Signer>) -> Result<Node> {
        let difficulty = config.get_difficulty()?;
        Ok(Node {
            chain: Arc::new(Blockchain::new(difficulty)),
            builder: TransactionBuilder::new(signer),
            sealer: BlockSealer::new(difficulty).with_max_nonce(config.max_nonce),
            recipient: config.recipient.clone(),
            amount: config.amount,
            genesis_amount: config.genesis_amount,
        })
    }

    /// A node whose transactions are proven by `oracle` and whose chain only
    /// admits proofs that verify under `verification_key`
    pub fn with_proof_system(
        config: &Config,
        signer: Arc<dyn Signer>,
        oracle: Arc<dyn ProofOracle>,
        verification_key: VerificationKey,
    ) -> Result<Node> {
        let difficulty = config.get_difficulty()?;
        let gate = ProofGate::new(Arc::clone(&oracle), verification_key).binding_transition();
        Ok(Node {
            chain: Arc::new(Blockchain::new(difficulty).with_proof_gate(gate)),
            builder: TransactionBuilder::new(signer).with_oracle(oracle),
            sealer: BlockSealer::new(difficulty).with_max_nonce(config.max_nonce),
            recipient: config.recipient.clone(),
            amount: config.amount,
            genesis_amount: config.genesis_amount,
        })
    }

    /// Load artifacts and back the node with a [`DigestOracle`].
    /// A load failure is returned, never downgraded to unproven mining.
    pub fn with_artifacts(
        config: &Config,
        signer: Arc<dyn Signer>,
        loader: &dyn ArtifactLoader,
    ) -> Result<Node> {
        let artifacts = loader.load()?;
        let oracle = DigestOracle::from_artifacts(&artifacts)?;
        let verification_key = oracle.verification_key();
        Node::with_proof_system(config, signer, Arc::new(oracle), verification_key)
    }

    pub fn get_chain(&self) -> Arc<Blockchain> {
        Arc::clone(&self.chain)
    }

    pub fn is_proving(&self) -> bool {
        self.builder.has_oracle()
    }

    pub fn init_genesis(&self) -> Result<ChainTip> {
        self.chain.init_genesis(vec![Utxo {
            id: UtxoId::new(GENESIS_ORIGIN, 0),
            output: TxOutput::new(None, self.genesis_amount),
        }])
    }

    /// What the next transaction pays the configured recipient
    pub fn payment(&self) -> Payment {
        let recipient = self.recipient.clone();
        match self.amount {
            Some(amount) => Payment::Amount { recipient, amount },
            None => Payment::Sweep { recipient },
        }
    }

    /// Build and sign the next payment against the current tip. The ledger
    /// is not touched until the block carrying it is accepted.
    pub fn create_transaction(&self) -> Result<Transaction> {
        let tip = self.chain.current_tip()?;
        let entries = self.chain.spendable_entries()?;
        let transaction = self.builder.build_transaction(
            &entries,
            &tip.get_header().merkle_root,
            &self.payment(),
        )?;
        if !transaction.verify_signature(self.builder.signer())? {
            return Err(BlockchainError::Crypto(
                "Built transaction does not verify under its own key".to_string(),
            ));
        }
        Ok(transaction)
    }

    /// Build, seal and submit one block carrying a fresh transaction
    pub fn mine_block(&self) -> Result<BlockHeader> {
        let tip = self.chain.current_tip()?;
        let transaction = self.create_transaction()?;
        let proof = transaction.get_proof().cloned();
        let transactions = vec![transaction];

        let root = merkle_root(&transactions)?;
        info!(
            "Sealing on {} at difficulty {}",
            tip.get_hash(),
            self.chain.get_difficulty().get_nibbles()
        );
        let header = self
            .sealer
            .seal_on_worker(tip.get_hash(), root)
            .join()
            .map_err(|_| BlockchainError::Mining("Sealing worker panicked".to_string()))??;

        let block = SealedBlock::new(header, transactions);
        let block = match proof {
            Some(proof) => Block::Proven { block, proof },
            None => Block::Sealed(block),
        };
        let accepted = self.chain.accept_block(block)?;
        info!("Chain tip is now {}", accepted.get_hash());
        Ok(*accepted.get_header())
    }

    pub fn current_tip(&self) -> Result<ChainTip> {
        self.chain.current_tip()
    }

    pub fn balance(&self) -> Result<u64> {
        self.chain.balance()
    }

    pub fn spendable_entries(&self) -> Result<Vec<Utxo>> {
        self.chain.spendable_entries()
    }
}
