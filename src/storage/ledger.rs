use crate::core::{Digest, Transaction, TxOutput, UtxoId};
use crate::error::{BlockchainError, Result};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A live output together with its identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub id: UtxoId,
    pub output: TxOutput,
}

/// The set of currently unspent outputs
///
/// Entries keep their insertion order so snapshots and coin selection are
/// reproducible. `seq` only ever grows; removed slots are never reused.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: BTreeMap<u64, Utxo>,
    index: HashMap<UtxoId, u64>,
    next_seq: u64,
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger::default()
    }

    /// Seed a ledger, e.g. with genesis outputs. Duplicate ids and a seed
    /// whose total does not fit in a u64 are rejected.
    pub fn with_entries(entries: impl IntoIterator<Item = Utxo>) -> Result<Ledger> {
        let mut ledger = Ledger::new();
        let mut total: u64 = 0;
        for utxo in entries {
            if ledger.index.contains_key(&utxo.id) {
                return Err(BlockchainError::Transaction(format!(
                    "Duplicate output id {}",
                    utxo.id
                )));
            }
            total = total
                .checked_add(utxo.output.get_amount())
                .ok_or_else(|| {
                    BlockchainError::Transaction(format!(
                        "Seed total overflows at output {}",
                        utxo.id
                    ))
                })?;
            ledger.insert(utxo);
        }
        Ok(ledger)
    }

    pub fn spendable_entries(&self) -> Vec<Utxo> {
        self.entries.values().cloned().collect()
    }

    pub fn get(&self, id: &UtxoId) -> Option<&Utxo> {
        self.index.get(id).and_then(|seq| self.entries.get(seq))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Never overflows: the seed total is checked and apply never creates
    // more value than it spends.
    pub fn balance(&self) -> u64 {
        self.entries
            .values()
            .map(|utxo| utxo.output.get_amount())
            .sum()
    }

    /// Spend `tx`'s inputs and add its outputs as `(origin, first_output_index + i)`.
    ///
    /// Everything is checked before anything is touched, so a failed apply
    /// leaves the ledger exactly as it was.
    pub fn apply(&mut self, tx: &Transaction, origin: &Digest, first_output_index: u32) -> Result<()> {
        let required = tx.total_output()?;

        let mut seen = HashSet::new();
        let mut available: u64 = 0;
        let mut missing = false;
        for input in tx.get_inputs() {
            if !seen.insert(input) {
                warn!("Input {input} is spent twice by the same transaction");
                missing = true;
                continue;
            }
            match self.get(input) {
                Some(utxo) => {
                    available = available
                        .checked_add(utxo.output.get_amount())
                        .ok_or_else(|| {
                            BlockchainError::Transaction("Input total overflows".to_string())
                        })?;
                }
                None => {
                    warn!("Input {input} is not unspent");
                    missing = true;
                }
            }
        }

        if missing || available < required {
            return Err(BlockchainError::InsufficientFunds {
                required,
                available: if missing { 0 } else { available },
            });
        }

        let origin_hex = origin.to_hex();
        let mut created = Vec::with_capacity(tx.get_outputs().len());
        for (i, output) in tx.get_outputs().iter().enumerate() {
            let index = u32::try_from(i)
                .ok()
                .and_then(|i| first_output_index.checked_add(i))
                .ok_or_else(|| BlockchainError::Transaction("Output index overflow".to_string()))?;
            let id = UtxoId::new(origin_hex.clone(), index);
            if self.index.contains_key(&id) && !tx.get_inputs().contains(&id) {
                return Err(BlockchainError::Transaction(format!(
                    "Output id {id} is already live"
                )));
            }
            created.push(Utxo {
                id,
                output: output.clone(),
            });
        }

        for input in tx.get_inputs() {
            if let Some(seq) = self.index.remove(input) {
                self.entries.remove(&seq);
            }
        }
        for utxo in created {
            debug!("New output {} worth {}", utxo.id, utxo.output.get_amount());
            self.insert(utxo);
        }
        Ok(())
    }

    fn insert(&mut self, utxo: Utxo) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(utxo.id.clone(), seq);
        self.entries.insert(seq, utxo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash;
    use crate::testnet::unsigned_transaction;

    fn genesis_ledger() -> Ledger {
        Ledger::with_entries(vec![Utxo {
            id: UtxoId::new("genesis", 0),
            output: TxOutput::new(None, 100),
        }])
        .unwrap()
    }

    #[test]
    fn test_apply_moves_value() {
        let mut ledger = genesis_ledger();
        let tx = unsigned_transaction(
            vec![UtxoId::new("genesis", 0)],
            vec![TxOutput::new(Some("recipient".to_string()), 100)],
        );
        let origin = hash(b"block-1");

        ledger.apply(&tx, &origin, 0).unwrap();

        let entries = ledger.spendable_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, UtxoId::new(origin.to_hex(), 0));
        assert_eq!(entries[0].output.get_owner(), Some("recipient"));
        assert_eq!(ledger.balance(), 100);
    }

    #[test]
    fn test_failed_apply_leaves_no_trace() {
        let mut ledger = genesis_ledger();
        let before = ledger.spendable_entries();

        let phantom = unsigned_transaction(
            vec![UtxoId::new("nowhere", 3)],
            vec![TxOutput::new(Some("recipient".to_string()), 1)],
        );
        assert_eq!(
            ledger.apply(&phantom, &hash(b"x"), 0),
            Err(BlockchainError::InsufficientFunds {
                required: 1,
                available: 0
            })
        );
        assert_eq!(ledger.spendable_entries(), before);

        // one good input and one missing input must not half-apply
        let mixed = unsigned_transaction(
            vec![UtxoId::new("genesis", 0), UtxoId::new("nowhere", 3)],
            vec![TxOutput::new(None, 50)],
        );
        assert!(ledger.apply(&mixed, &hash(b"y"), 0).is_err());
        assert_eq!(ledger.spendable_entries(), before);
    }

    #[test]
    fn test_outputs_exceeding_inputs_rejected() {
        let mut ledger = genesis_ledger();
        let greedy = unsigned_transaction(
            vec![UtxoId::new("genesis", 0)],
            vec![TxOutput::new(None, 60), TxOutput::new(None, 41)],
        );
        assert_eq!(
            ledger.apply(&greedy, &hash(b"z"), 0),
            Err(BlockchainError::InsufficientFunds {
                required: 101,
                available: 100
            })
        );
        assert_eq!(ledger.balance(), 100);
    }

    #[test]
    fn test_duplicate_input_rejected() {
        let mut ledger = genesis_ledger();
        let double = unsigned_transaction(
            vec![UtxoId::new("genesis", 0), UtxoId::new("genesis", 0)],
            vec![TxOutput::new(None, 150)],
        );
        assert!(ledger.apply(&double, &hash(b"d"), 0).is_err());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_excess_is_burned() {
        let mut ledger = genesis_ledger();
        let burn = unsigned_transaction(
            vec![UtxoId::new("genesis", 0)],
            vec![TxOutput::new(Some("recipient".to_string()), 90)],
        );
        ledger.apply(&burn, &hash(b"b"), 0).unwrap();
        assert_eq!(ledger.balance(), 90);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut ledger = Ledger::with_entries(vec![
            Utxo {
                id: UtxoId::new("genesis", 0),
                output: TxOutput::new(None, 10),
            },
            Utxo {
                id: UtxoId::new("genesis", 1),
                output: TxOutput::new(None, 20),
            },
        ])
        .unwrap();

        let tx = unsigned_transaction(
            vec![UtxoId::new("genesis", 0)],
            vec![TxOutput::new(None, 10)],
        );
        let origin = hash(b"block");
        ledger.apply(&tx, &origin, 4).unwrap();

        let ids: Vec<UtxoId> = ledger.spendable_entries().into_iter().map(|u| u.id).collect();
        assert_eq!(
            ids,
            vec![UtxoId::new("genesis", 1), UtxoId::new(origin.to_hex(), 4)]
        );
    }

    #[test]
    fn test_with_entries_rejects_duplicates() {
        let utxo = Utxo {
            id: UtxoId::new("genesis", 0),
            output: TxOutput::new(None, 1),
        };
        assert!(Ledger::with_entries(vec![utxo.clone(), utxo]).is_err());
    }

    #[test]
    fn test_with_entries_rejects_overflowing_total() {
        let seed = vec![
            Utxo {
                id: UtxoId::new("genesis", 0),
                output: TxOutput::new(None, u64::MAX),
            },
            Utxo {
                id: UtxoId::new("genesis", 1),
                output: TxOutput::new(None, 1),
            },
        ];
        assert!(matches!(
            Ledger::with_entries(seed),
            Err(BlockchainError::Transaction(_))
        ));

        let full = Ledger::with_entries(vec![Utxo {
            id: UtxoId::new("genesis", 0),
            output: TxOutput::new(None, u64::MAX),
        }])
        .unwrap();
        assert_eq!(full.balance(), u64::MAX);
    }
}
