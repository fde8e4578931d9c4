//! Succinct proof boundary
//!
//! The chain never looks inside a proof. It hands a [`ProofStatement`] to a
//! [`ProofOracle`] when building a transaction and asks the same oracle to
//! verify the resulting [`ProofPayload`] when a proven block arrives.
//!
//! [`DigestOracle`] is a deterministic development backend: it enforces the
//! statement's constraints (authorization witness and new-root binding) but
//! its proofs are plain hash commitments, so anyone holding the verification
//! key can forge one. It exists so the full pipeline can run without a SNARK
//! toolchain.

use crate::core::hashing::{hash, Digest};
use crate::error::{BlockchainError, Result};
use crate::storage::ProofArtifacts;
use crate::utils::{ecdsa_p256_sha256_sign_verify, serialize};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

const DIGEST_ORACLE_PROTOCOL: &str = "digest-v1";
const DIGEST_ORACLE_DOMAIN: &[u8] = b"minichain/digest-oracle/v1";

/// Proof bytes plus the public values they attest to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct ProofPayload {
    pub proof: Vec<u8>,
    pub public_signals: Vec<String>,
}

/// The state transition a prover is asked to attest to
#[derive(Debug, Clone)]
pub struct ProofStatement {
    pub prior_root: Digest,
    pub new_root: Digest,
    /// `[sender, recipient, amount]`
    pub tx_fields: Vec<String>,
    pub owner_public_key: Vec<u8>,
    pub signature: Vec<u8>,
    /// The signed transaction body
    pub message: Vec<u8>,
}

/// Opaque verification key, as shipped in `verification_key.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationKey(pub serde_json::Value);

impl VerificationKey {
    pub fn from_json_bytes(bytes: &[u8]) -> Result<VerificationKey> {
        Ok(VerificationKey(serde_json::from_slice(bytes)?))
    }

    fn field(&self, name: &str) -> Result<&str> {
        self.0
            .get(name)
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                BlockchainError::OracleUnavailable(format!(
                    "Verification key has no string field '{name}'"
                ))
            })
    }
}

/// Prove/verify capability supplied by an external proof system
pub trait ProofOracle: Send + Sync {
    fn prove(&self, statement: &ProofStatement) -> Result<ProofPayload>;

    fn verify(
        &self,
        verification_key: &VerificationKey,
        public_signals: &[String],
        proof: &[u8],
    ) -> Result<bool>;
}

/// The oracle and key a chain uses to admit proven blocks.
///
/// The oracle only sees the payload, so a plain gate accepts any proof that
/// verifies, including one lifted from an earlier block. A gate built with
/// [`ProofGate::binding_transition`] also requires the leading public signals
/// to be `[prior_root, new_root]` for the block being admitted.
#[derive(Clone)]
pub struct ProofGate {
    oracle: Arc<dyn ProofOracle>,
    verification_key: VerificationKey,
    bind_transition: bool,
}

impl fmt::Debug for ProofGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofGate")
            .field("verification_key", &self.verification_key)
            .field("bind_transition", &self.bind_transition)
            .finish_non_exhaustive()
    }
}

impl ProofGate {
    pub fn new(oracle: Arc<dyn ProofOracle>, verification_key: VerificationKey) -> ProofGate {
        ProofGate {
            oracle,
            verification_key,
            bind_transition: false,
        }
    }

    /// Tie every admitted proof to the tip it extends and to a transaction
    /// in its block
    pub fn binding_transition(mut self) -> ProofGate {
        self.bind_transition = true;
        self
    }

    pub fn binds_transition(&self) -> bool {
        self.bind_transition
    }

    /// Signal 0 must name `prior_root`. When `new_roots` is given, signal 1
    /// must name one of them. A no-op on a gate that does not bind.
    pub fn check_binding(
        &self,
        payload: &ProofPayload,
        prior_root: &Digest,
        new_roots: Option<&[Digest]>,
    ) -> Result<()> {
        if !self.bind_transition {
            return Ok(());
        }

        let signals = &payload.public_signals;
        let expected_prior = prior_root.to_hex();
        match signals.first() {
            Some(prior) if *prior == expected_prior => {}
            Some(prior) => {
                return Err(BlockchainError::InvalidProof(format!(
                    "proof attests prior root {prior}, block extends {expected_prior}"
                )))
            }
            None => {
                return Err(BlockchainError::InvalidProof(
                    "proof has no public signals".to_string(),
                ))
            }
        }

        if let Some(new_roots) = new_roots {
            let attested = signals.get(1).ok_or_else(|| {
                BlockchainError::InvalidProof("proof has no new root signal".to_string())
            })?;
            if !new_roots.iter().any(|root| root.to_hex() == *attested) {
                return Err(BlockchainError::InvalidProof(format!(
                    "proof attests new root {attested}, which no transaction in the block has"
                )));
            }
        }
        Ok(())
    }

    /// Fails closed: a `false` verdict and an oracle error both reject
    pub fn check(&self, payload: &ProofPayload) -> Result<()> {
        match self.oracle.verify(
            &self.verification_key,
            &payload.public_signals,
            &payload.proof,
        ) {
            Ok(true) => Ok(()),
            Ok(false) => Err(BlockchainError::InvalidProof(
                "verifier returned false".to_string(),
            )),
            Err(e) => Err(BlockchainError::InvalidProof(format!(
                "verification error: {e}"
            ))),
        }
    }
}

/// Hash-commitment oracle for development and tests
pub struct DigestOracle {
    proving_key: Zeroizing<Vec<u8>>,
    key_id: Digest,
}

impl DigestOracle {
    pub fn from_artifacts(artifacts: &ProofArtifacts) -> Result<DigestOracle> {
        if artifacts.circuit.is_empty() {
            return Err(BlockchainError::OracleUnavailable(
                "Circuit artifact is empty".to_string(),
            ));
        }
        if artifacts.proving_key.is_empty() {
            return Err(BlockchainError::OracleUnavailable(
                "Proving key artifact is empty".to_string(),
            ));
        }

        let oracle = DigestOracle {
            proving_key: Zeroizing::new(artifacts.proving_key.clone()),
            key_id: hash(&artifacts.proving_key),
        };

        let expected = oracle.verification_key();
        if artifacts.verification_key != expected {
            return Err(BlockchainError::OracleUnavailable(
                "Verification key does not match the proving key".to_string(),
            ));
        }

        info!("Digest oracle ready (key id {})", oracle.key_id);
        Ok(oracle)
    }

    /// The verification key paired with this oracle's proving key
    pub fn verification_key(&self) -> VerificationKey {
        Self::verification_key_for(&self.proving_key)
    }

    pub fn verification_key_for(proving_key: &[u8]) -> VerificationKey {
        VerificationKey(serde_json::json!({
            "protocol": DIGEST_ORACLE_PROTOCOL,
            "key_id": hash(proving_key).to_hex(),
        }))
    }

    fn commitment(key_id: &Digest, public_signals: &[String]) -> Result<Digest> {
        let mut data = DIGEST_ORACLE_DOMAIN.to_vec();
        data.extend_from_slice(key_id.as_bytes());
        data.extend(serialize(&public_signals.to_vec())?);
        Ok(hash(&data))
    }
}

impl ProofOracle for DigestOracle {
    fn prove(&self, statement: &ProofStatement) -> Result<ProofPayload> {
        if !ecdsa_p256_sha256_sign_verify(
            &statement.owner_public_key,
            &statement.signature,
            &statement.message,
        ) {
            return Err(BlockchainError::OracleUnavailable(
                "Witness rejected: signature does not authorize the message".to_string(),
            ));
        }
        if hash(&statement.message) != statement.new_root {
            return Err(BlockchainError::OracleUnavailable(
                "Witness rejected: new root is not the hash of the message".to_string(),
            ));
        }

        let mut public_signals = vec![statement.prior_root.to_hex(), statement.new_root.to_hex()];
        public_signals.extend(statement.tx_fields.iter().cloned());

        let proof = Self::commitment(&self.key_id, &public_signals)?;
        debug!("Digest oracle proved transition {}", statement.new_root);

        Ok(ProofPayload {
            proof: proof.as_bytes().to_vec(),
            public_signals,
        })
    }

    fn verify(
        &self,
        verification_key: &VerificationKey,
        public_signals: &[String],
        proof: &[u8],
    ) -> Result<bool> {
        let protocol = verification_key.field("protocol")?;
        if protocol != DIGEST_ORACLE_PROTOCOL {
            return Err(BlockchainError::OracleUnavailable(format!(
                "Unsupported proof protocol '{protocol}'"
            )));
        }
        let key_id = Digest::from_hex(verification_key.field("key_id")?)?;

        let expected = Self::commitment(&key_id, public_signals)?;
        Ok(expected.as_bytes().as_slice() == proof)
    }
}
