//! Test utilities for chain testing

use crate::core::{
    Blockchain, Difficulty, DigestOracle, ProofOracle, ProofPayload, ProofStatement, Transaction,
    TransactionBody, TxOutput, UtxoId, VerificationKey,
};
use crate::error::{BlockchainError, Result};
use crate::storage::{ProofArtifacts, Utxo};

/// Fixed development proving key so tests are reproducible
pub const TEST_PROVING_KEY: &[u8] = b"zk-minichain test proving key 01";

/// An in-memory artifact set the [`DigestOracle`] accepts
pub fn dev_artifacts() -> ProofArtifacts {
    ProofArtifacts {
        circuit: b"\0asm\x01\0\0\0".to_vec(),
        proving_key: TEST_PROVING_KEY.to_vec(),
        verification_key: DigestOracle::verification_key_for(TEST_PROVING_KEY),
    }
}

/// How a [`ScriptedOracle`] answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
    Fail,
}

/// Oracle with a canned answer, for exercising the proof gate
#[derive(Debug, Clone)]
pub struct ScriptedOracle {
    verdict: Verdict,
}

impl ScriptedOracle {
    pub fn accepting() -> ScriptedOracle {
        ScriptedOracle {
            verdict: Verdict::Accept,
        }
    }

    pub fn rejecting() -> ScriptedOracle {
        ScriptedOracle {
            verdict: Verdict::Reject,
        }
    }

    pub fn failing() -> ScriptedOracle {
        ScriptedOracle {
            verdict: Verdict::Fail,
        }
    }
}

impl ProofOracle for ScriptedOracle {
    fn prove(&self, statement: &ProofStatement) -> Result<ProofPayload> {
        match self.verdict {
            Verdict::Fail => Err(BlockchainError::Crypto("scripted prover failure".to_string())),
            _ => Ok(ProofPayload {
                proof: statement.new_root.as_bytes().to_vec(),
                public_signals: vec![statement.prior_root.to_hex(), statement.new_root.to_hex()],
            }),
        }
    }

    fn verify(&self, _: &VerificationKey, _: &[String], _: &[u8]) -> Result<bool> {
        match self.verdict {
            Verdict::Accept => Ok(true),
            Verdict::Reject => Ok(false),
            Verdict::Fail => Err(BlockchainError::Crypto("scripted verifier failure".to_string())),
        }
    }
}

/// A transaction with no signature, for ledger and Merkle tests
pub fn unsigned_transaction(inputs: Vec<UtxoId>, outputs: Vec<TxOutput>) -> Transaction {
    Transaction::new(TransactionBody { inputs, outputs }, vec![], vec![], None)
}

/// The single ("genesis", 0) output with no owner
pub fn genesis_outputs(amount: u64) -> Vec<Utxo> {
    vec![Utxo {
        id: UtxoId::new("genesis", 0),
        output: TxOutput::new(None, amount),
    }]
}

/// A ready chain at `nibbles` difficulty holding one genesis output
pub fn create_test_blockchain(nibbles: u32, genesis_amount: u64) -> Result<Blockchain> {
    let chain = Blockchain::new(Difficulty::leading_zero_nibbles(nibbles)?);
    chain.init_genesis(genesis_outputs(genesis_amount))?;
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_artifacts_load_into_oracle() {
        assert!(DigestOracle::from_artifacts(&dev_artifacts()).is_ok());
    }

    #[test]
    fn test_create_test_blockchain() {
        let chain = create_test_blockchain(1, 100).unwrap();
        assert_eq!(chain.balance().unwrap(), 100);
        assert_eq!(chain.spendable_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_scripted_verdicts() {
        let key = VerificationKey(serde_json::json!({}));
        assert!(ScriptedOracle::accepting().verify(&key, &[], &[]).unwrap());
        assert!(!ScriptedOracle::rejecting().verify(&key, &[], &[]).unwrap());
        assert!(ScriptedOracle::failing().verify(&key, &[], &[]).is_err());
    }
}
