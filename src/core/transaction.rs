// Transactions move value between unspent outputs. A transaction names the
// outputs it consumes, lists the outputs it creates, carries a signature over
// its body and may carry a succinct proof of the state transition.

use crate::core::hashing::{hash, Digest};
use crate::core::proof::{ProofOracle, ProofPayload, ProofStatement};
use crate::error::{BlockchainError, Result};
use crate::storage::Utxo;
use crate::utils::{deserialize, serialize};
use crate::wallet::Signer;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifies an output: the transaction (or block) that created it and its position
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct UtxoId {
    origin_tx_id: String,
    output_index: u32,
}

impl UtxoId {
    pub fn new(origin_tx_id: impl Into<String>, output_index: u32) -> UtxoId {
        UtxoId {
            origin_tx_id: origin_tx_id.into(),
            output_index,
        }
    }

    pub fn get_origin_tx_id(&self) -> &str {
        &self.origin_tx_id
    }

    pub fn get_output_index(&self) -> u32 {
        self.output_index
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin_tx_id, self.output_index)
    }
}

/// Value paid to an (opaque, possibly absent) owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TxOutput {
    owner: Option<String>,
    amount: u64,
}

impl TxOutput {
    pub fn new(owner: Option<String>, amount: u64) -> TxOutput {
        TxOutput { owner, amount }
    }

    pub fn get_owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }
}

/// The signed part of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TransactionBody {
    pub inputs: Vec<UtxoId>,
    pub outputs: Vec<TxOutput>,
}

impl TransactionBody {
    /// Canonical bytes that the signature covers
    pub fn encode(&self) -> Result<Vec<u8>> {
        serialize(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    body: TransactionBody,
    signature: Vec<u8>,
    public_key: Vec<u8>,
    proof: Option<ProofPayload>,
}

impl Transaction {
    pub fn new(
        body: TransactionBody,
        signature: Vec<u8>,
        public_key: Vec<u8>,
        proof: Option<ProofPayload>,
    ) -> Transaction {
        Transaction {
            body,
            signature,
            public_key,
            proof,
        }
    }

    /// Sign `body` with `signer`; no proof attached
    pub fn signed(body: TransactionBody, signer: &dyn Signer) -> Result<Transaction> {
        let signature = signer.sign(&body.encode()?)?;
        Ok(Transaction::new(
            body,
            signature,
            signer.public_key().to_vec(),
            None,
        ))
    }

    pub fn get_inputs(&self) -> &[UtxoId] {
        &self.body.inputs
    }

    pub fn get_outputs(&self) -> &[TxOutput] {
        &self.body.outputs
    }

    pub fn get_body(&self) -> &TransactionBody {
        &self.body
    }

    pub fn get_signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn get_public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn get_proof(&self) -> Option<&ProofPayload> {
        self.proof.as_ref()
    }

    pub fn total_output(&self) -> Result<u64> {
        self.body.outputs.iter().try_fold(0u64, |acc, out| {
            acc.checked_add(out.amount)
                .ok_or_else(|| BlockchainError::Transaction("Output total overflows".to_string()))
        })
    }

    /// Canonical encoding of the whole transaction, as hashed into Merkle leaves
    pub fn encode(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    /// Inverse of [`Transaction::encode`]
    pub fn decode(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }

    /// Parse a JSON array of transactions, as written by `serde_json`
    pub fn list_from_json(bytes: &[u8]) -> Result<Vec<Transaction>> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn id(&self) -> Result<Digest> {
        Ok(hash(&self.encode()?))
    }

    pub fn verify_signature(&self, signer: &dyn Signer) -> Result<bool> {
        Ok(signer.verify(&self.body.encode()?, &self.signature, &self.public_key))
    }
}

/// What a new transaction should pay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payment {
    /// Spend the first spendable entry in full to `recipient`
    Sweep { recipient: String },
    /// Pay `amount` to `recipient`, returning change to the signer
    Amount { recipient: String, amount: u64 },
}

impl Payment {
    pub fn recipient(&self) -> &str {
        match self {
            Payment::Sweep { recipient } | Payment::Amount { recipient, .. } => recipient,
        }
    }
}

/// Builds signed (and optionally proven) transactions from a ledger snapshot
#[derive(Clone)]
pub struct TransactionBuilder {
    signer: Arc<dyn Signer>,
    oracle: Option<Arc<dyn ProofOracle>>,
}

impl TransactionBuilder {
    pub fn new(signer: Arc<dyn Signer>) -> TransactionBuilder {
        TransactionBuilder {
            signer,
            oracle: None,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn ProofOracle>) -> TransactionBuilder {
        self.oracle = Some(oracle);
        self
    }

    pub fn signer(&self) -> &dyn Signer {
        self.signer.as_ref()
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn build_transaction(
        &self,
        entries: &[Utxo],
        prior_root: &Digest,
        payment: &Payment,
    ) -> Result<Transaction> {
        let first = entries.first().ok_or(BlockchainError::NoSpendableFunds)?;

        let body = match payment {
            Payment::Sweep { recipient } => TransactionBody {
                inputs: vec![first.id.clone()],
                outputs: vec![TxOutput::new(
                    Some(recipient.clone()),
                    first.output.get_amount(),
                )],
            },
            Payment::Amount { recipient, amount } => {
                self.select_and_pay(entries, recipient, *amount)?
            }
        };

        let message = body.encode()?;
        let signature = self.signer.sign(&message)?;
        let amount = body.outputs.first().map(TxOutput::get_amount).unwrap_or(0);

        let proof = match &self.oracle {
            Some(oracle) => {
                let statement = ProofStatement {
                    prior_root: *prior_root,
                    new_root: hash(&message),
                    tx_fields: vec![
                        self.signer.address(),
                        payment.recipient().to_string(),
                        amount.to_string(),
                    ],
                    owner_public_key: self.signer.public_key().to_vec(),
                    signature: signature.clone(),
                    message,
                };
                let payload = oracle.prove(&statement).map_err(|e| match e {
                    BlockchainError::OracleUnavailable(msg) => BlockchainError::OracleUnavailable(msg),
                    other => BlockchainError::OracleUnavailable(other.to_string()),
                })?;
                info!("Attached succinct proof to transaction");
                Some(payload)
            }
            None => None,
        };

        Ok(Transaction::new(
            body,
            signature,
            self.signer.public_key().to_vec(),
            proof,
        ))
    }

    fn select_and_pay(
        &self,
        entries: &[Utxo],
        recipient: &str,
        amount: u64,
    ) -> Result<TransactionBody> {
        if amount == 0 {
            return Err(BlockchainError::Transaction(
                "Amount must be positive".to_string(),
            ));
        }

        let mut accumulated: u64 = 0;
        let mut inputs = vec![];
        for utxo in entries {
            if accumulated >= amount {
                break;
            }
            accumulated = accumulated.saturating_add(utxo.output.get_amount());
            inputs.push(utxo.id.clone());
        }

        if accumulated < amount {
            warn!("Cannot pay {amount}: only {accumulated} spendable");
            return Err(BlockchainError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        let mut outputs = vec![TxOutput::new(Some(recipient.to_string()), amount)];
        let change = accumulated - amount;
        if change > 0 {
            outputs.push(TxOutput::new(Some(self.signer.address()), change));
        }

        Ok(TransactionBody { inputs, outputs })
    }
}
