use crate::core::{Difficulty, DEFAULT_MAX_NONCE};
use crate::error::{BlockchainError, Result};
use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Defaults plus whatever the environment overrides, read once per process
pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

const DEFAULT_DIFFICULTY: u32 = 4;
const DEFAULT_GENESIS_AMOUNT: u64 = 100;
const DEFAULT_RECIPIENT: &str = "recipient";

const DIFFICULTY_KEY: &str = "MINICHAIN_DIFFICULTY";
const GENESIS_AMOUNT_KEY: &str = "MINICHAIN_GENESIS_AMOUNT";
const RECIPIENT_KEY: &str = "MINICHAIN_RECIPIENT";
const ARTIFACTS_DIR_KEY: &str = "MINICHAIN_ARTIFACTS_DIR";
const MAX_NONCE_KEY: &str = "MINICHAIN_MAX_NONCE";
const AMOUNT_KEY: &str = "MINICHAIN_AMOUNT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Required leading zero hex digits in a sealed header hash
    pub difficulty: u32,
    /// Value of the single ("genesis", 0) output
    pub genesis_amount: u64,
    /// Who mined transactions pay
    pub recipient: String,
    /// Fixed amount per mined transaction, with change back to the signer.
    /// Unset sweeps the first spendable entry.
    pub amount: Option<u64>,
    /// Proof artifacts; blocks are mined unproven when unset
    pub artifacts_dir: Option<PathBuf>,
    pub max_nonce: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: DEFAULT_DIFFICULTY,
            genesis_amount: DEFAULT_GENESIS_AMOUNT,
            recipient: String::from(DEFAULT_RECIPIENT),
            amount: None,
            artifacts_dir: None,
            max_nonce: DEFAULT_MAX_NONCE,
        }
    }
}

impl Config {
    /// Defaults overridden by `MINICHAIN_*` environment variables.
    /// Unparsable values are logged and ignored.
    pub fn new() -> Config {
        let mut config = Config::default();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Load a TOML file, then let the environment override it
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut config = Config::from_toml_str(&text)?;
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Config> {
        let config: Config = toml::from_str(text)?;
        config.get_difficulty()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = parsed(&lookup, DIFFICULTY_KEY) {
            self.difficulty = value;
        }
        if let Some(value) = parsed(&lookup, GENESIS_AMOUNT_KEY) {
            self.genesis_amount = value;
        }
        if let Some(value) = parsed(&lookup, MAX_NONCE_KEY) {
            self.max_nonce = value;
        }
        if let Some(value) = parsed(&lookup, AMOUNT_KEY) {
            self.amount = Some(value);
        }
        if let Some(recipient) = lookup(RECIPIENT_KEY) {
            self.recipient = recipient;
        }
        if let Some(dir) = lookup(ARTIFACTS_DIR_KEY) {
            self.artifacts_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn get_difficulty(&self) -> Result<Difficulty> {
        Difficulty::leading_zero_nibbles(self.difficulty)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {key}={raw}: not a valid number");
            None
        }
    }
}
