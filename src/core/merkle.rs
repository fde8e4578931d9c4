use crate::core::hashing::{hash, hash_pair, Digest};
use crate::core::Transaction;
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};

/// Merkle tree over an ordered transaction sequence
///
/// Leaves are `hash(canonical_encoding(tx))` in input order. Each layer pairs
/// adjacent nodes and hashes the raw concatenation of their digests; an odd
/// layer pairs its last node with itself. A single leaf is its own root and
/// the empty sequence commits to `hash(b"")`.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    // levels[0] are the leaves, the last level holds the root
    levels: Vec<Vec<Digest>>,
}

/// Inclusion proof for one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Leaf hash being proven
    pub transaction_hash: Digest,
    pub merkle_root: Digest,
    /// Sibling hashes from the leaf upwards
    pub proof_path: Vec<ProofElement>,
    pub transaction_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofElement {
    pub hash: Digest,
    /// true if the sibling sits to the right of the running hash
    pub is_right: bool,
}

/// Root of the empty transaction set
pub fn empty_root() -> Digest {
    hash(b"")
}

pub fn leaf_hash(transaction: &Transaction) -> Result<Digest> {
    transaction.id()
}

/// Merkle root of `transactions`, order-sensitive
pub fn merkle_root(transactions: &[Transaction]) -> Result<Digest> {
    if transactions.is_empty() {
        return Ok(empty_root());
    }
    let leaves = transactions
        .iter()
        .map(leaf_hash)
        .collect::<Result<Vec<Digest>>>()?;
    Ok(MerkleTree::from_leaves(leaves).root())
}

fn next_level(level: &[Digest]) -> Vec<Digest> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_pair(left, right)
        })
        .collect()
}

impl MerkleTree {
    pub fn new(transactions: &[Transaction]) -> Result<MerkleTree> {
        let leaves = transactions
            .iter()
            .map(leaf_hash)
            .collect::<Result<Vec<Digest>>>()?;
        Ok(MerkleTree::from_leaves(leaves))
    }

    pub fn from_leaves(leaves: Vec<Digest>) -> MerkleTree {
        let mut levels = vec![leaves];
        while levels.last().map_or(0, Vec::len) > 1 {
            let parent = next_level(levels.last().map_or(&[][..], Vec::as_slice));
            levels.push(parent);
        }
        MerkleTree { levels }
    }

    pub fn root(&self) -> Digest {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_else(empty_root)
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }

    pub fn generate_proof(&self, transaction_index: usize) -> Result<MerkleProof> {
        let leaf_count = self.leaf_count();
        if transaction_index >= leaf_count {
            return Err(BlockchainError::StructuralMismatch(format!(
                "Transaction index {transaction_index} out of bounds ({leaf_count} leaves)"
            )));
        }

        let mut proof_path = Vec::new();
        let mut index = transaction_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = index % 2 == 0;
            let sibling = if is_right {
                // duplicate-last: the missing right sibling is the node itself
                level.get(index + 1).unwrap_or(&level[index])
            } else {
                &level[index - 1]
            };
            proof_path.push(ProofElement {
                hash: *sibling,
                is_right,
            });
            index /= 2;
        }

        Ok(MerkleProof {
            transaction_hash: self.levels[0][transaction_index],
            merkle_root: self.root(),
            proof_path,
            transaction_index,
        })
    }

    pub fn verify_proof(proof: &MerkleProof) -> bool {
        let computed = proof
            .proof_path
            .iter()
            .fold(proof.transaction_hash, |current, element| {
                if element.is_right {
                    hash_pair(&current, &element.hash)
                } else {
                    hash_pair(&element.hash, &current)
                }
            });
        computed == proof.merkle_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TxOutput, UtxoId};
    use crate::testnet::unsigned_transaction;

    fn txs(n: usize) -> Vec<Transaction> {
        (0..n)
            .map(|i| {
                unsigned_transaction(
                    vec![UtxoId::new("genesis", i as u32)],
                    vec![TxOutput::new(Some(format!("owner-{i}")), i as u64 + 1)],
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_root_is_hash_of_empty_message() {
        assert_eq!(
            merkle_root(&[]).unwrap().to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_single_leaf_is_root() {
        let set = txs(1);
        assert_eq!(merkle_root(&set).unwrap(), set[0].id().unwrap());
    }

    #[test]
    fn test_odd_layer_duplicates_last() {
        let set = txs(3);
        let leaves: Vec<Digest> = set.iter().map(|tx| tx.id().unwrap()).collect();
        let left = hash_pair(&leaves[0], &leaves[1]);
        let right = hash_pair(&leaves[2], &leaves[2]);
        assert_eq!(merkle_root(&set).unwrap(), hash_pair(&left, &right));
    }

    #[test]
    fn test_root_is_deterministic_and_order_sensitive() {
        let set = txs(5);
        assert_eq!(merkle_root(&set).unwrap(), merkle_root(&set.clone()).unwrap());

        let mut swapped = set.clone();
        swapped.swap(0, 1);
        assert_ne!(merkle_root(&set).unwrap(), merkle_root(&swapped).unwrap());
    }

    #[test]
    fn test_tree_root_matches_merkle_root() {
        for n in 1..=7 {
            let set = txs(n);
            let tree = MerkleTree::new(&set).unwrap();
            assert_eq!(tree.root(), merkle_root(&set).unwrap());
            assert_eq!(tree.leaf_count(), n);
        }
        assert!(MerkleTree::new(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_inclusion_proofs_verify() {
        let set = txs(5);
        let tree = MerkleTree::new(&set).unwrap();
        for i in 0..set.len() {
            let proof = tree.generate_proof(i).unwrap();
            assert_eq!(proof.transaction_hash, set[i].id().unwrap());
            assert!(MerkleTree::verify_proof(&proof));
        }
        assert!(tree.generate_proof(5).is_err());
    }

    #[test]
    fn test_tampered_proof_fails() {
        let set = txs(4);
        let tree = MerkleTree::new(&set).unwrap();
        let mut proof = tree.generate_proof(2).unwrap();
        proof.transaction_hash = set[1].id().unwrap();
        assert!(!MerkleTree::verify_proof(&proof));
    }

    #[test]
    fn test_known_answer_roots() {
        let set = txs(3);
        assert_eq!(
            set[0].encode().unwrap(),
            vec![
                1, 7, b'g', b'e', b'n', b'e', b's', b'i', b's', 0, 1, 1, 7, b'o', b'w', b'n', b'e',
                b'r', b'-', b'0', 1, 0, 0, 0
            ]
        );

        let ids = [
            "eb3cbb7a211522e003a73ef29a7cc01cca188ebcd34340d9842e692f9fe27400",
            "bb388b94675c7d1f5ed4a832b2c97e33a7bd0182b5f4f8872a19fdfb1b350c8b",
            "1c67e2e1505e3cfe218a51e3d1021770cd4f99121a3a53c840c54194a8d940f0",
        ];
        for (tx, id) in set.iter().zip(ids) {
            assert_eq!(tx.id().unwrap().to_hex(), id);
        }

        assert_eq!(merkle_root(&set[..1]).unwrap().to_hex(), ids[0]);
        assert_eq!(
            merkle_root(&set[..2]).unwrap().to_hex(),
            "35802072b246c31e1c10e51c365d2f7ccbfa469f328d3efd7f9157770887dbd5"
        );
        assert_eq!(
            merkle_root(&set).unwrap().to_hex(),
            "1b5413a7c22d48dc1447794131e8b50ce2d2a315800059d9716fbcf20f0897b5"
        );
    }
}
