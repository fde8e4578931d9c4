// Proof system artifacts: the compiled circuit, the proving key and the
// verification key. They must all load before the first prove/verify call;
// any failure is an initialization error, never a silent "no proofs" mode.

use crate::core::{DigestOracle, VerificationKey};
use crate::error::{BlockchainError, Result};
use log::info;
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};

pub const CIRCUIT_FILE: &str = "minichain_transfer.wasm";
pub const PROVING_KEY_FILE: &str = "minichain_final.zkey";
pub const VERIFICATION_KEY_FILE: &str = "verification_key.json";

const WASM_MAGIC: &[u8] = b"\0asm\x01\0\0\0";
const DEV_PROVING_KEY_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct ProofArtifacts {
    pub circuit: Vec<u8>,
    pub proving_key: Vec<u8>,
    pub verification_key: VerificationKey,
}

pub trait ArtifactLoader {
    fn load(&self) -> Result<ProofArtifacts>;
}

/// Availability of one artifact file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    pub name: &'static str,
    pub path: PathBuf,
    pub size: Option<u64>,
}

impl ArtifactStatus {
    pub fn is_available(&self) -> bool {
        self.size.is_some()
    }
}

/// Reads the three artifacts from a build directory
#[derive(Debug, Clone)]
pub struct FsArtifactLoader {
    dir: PathBuf,
}

impl FsArtifactLoader {
    pub fn new(dir: impl Into<PathBuf>) -> FsArtifactLoader {
        FsArtifactLoader { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn check_files(&self) -> Vec<ArtifactStatus> {
        [CIRCUIT_FILE, PROVING_KEY_FILE, VERIFICATION_KEY_FILE]
            .into_iter()
            .map(|name| {
                let path = self.dir.join(name);
                let size = fs::metadata(&path)
                    .ok()
                    .filter(|meta| meta.is_file())
                    .map(|meta| meta.len());
                ArtifactStatus { name, path, size }
            })
            .collect()
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.dir.join(name);
        fs::read(&path).map_err(|e| {
            BlockchainError::OracleUnavailable(format!("Failed to load {}: {e}", path.display()))
        })
    }
}

impl ArtifactLoader for FsArtifactLoader {
    fn load(&self) -> Result<ProofArtifacts> {
        let circuit = self.read(CIRCUIT_FILE)?;
        let proving_key = self.read(PROVING_KEY_FILE)?;
        let verification_key = VerificationKey::from_json_bytes(&self.read(VERIFICATION_KEY_FILE)?)
            .map_err(|e| {
                BlockchainError::OracleUnavailable(format!(
                    "Malformed {VERIFICATION_KEY_FILE}: {e}"
                ))
            })?;

        info!(
            "Loaded proof artifacts from {} (circuit {} bytes, proving key {} bytes)",
            self.dir.display(),
            circuit.len(),
            proving_key.len()
        );
        Ok(ProofArtifacts {
            circuit,
            proving_key,
            verification_key,
        })
    }
}

/// Write a fresh artifact set for the development [`DigestOracle`]
pub fn write_dev_artifacts(dir: &Path) -> Result<ProofArtifacts> {
    fs::create_dir_all(dir)?;

    let mut proving_key = vec![0u8; DEV_PROVING_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut proving_key);
    let verification_key = DigestOracle::verification_key_for(&proving_key);
    let circuit = WASM_MAGIC.to_vec();

    fs::write(dir.join(CIRCUIT_FILE), &circuit)?;
    fs::write(dir.join(PROVING_KEY_FILE), &proving_key)?;
    fs::write(
        dir.join(VERIFICATION_KEY_FILE),
        serde_json::to_vec_pretty(&verification_key.0)?,
    )?;

    info!("Wrote development proof artifacts to {}", dir.display());
    Ok(ProofArtifacts {
        circuit,
        proving_key,
        verification_key,
    })
}
