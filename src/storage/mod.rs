//! In-memory state and artifact access
//!
//! The UTXO ledger lives here, along with the loader that fetches the proof
//! system's circuit and keys before any prove or verify call.

pub mod artifacts;
pub mod ledger;

pub use artifacts::{
    write_dev_artifacts, ArtifactLoader, ArtifactStatus, FsArtifactLoader, ProofArtifacts,
    CIRCUIT_FILE, PROVING_KEY_FILE, VERIFICATION_KEY_FILE,
};
pub use ledger::{Ledger, Utxo};
