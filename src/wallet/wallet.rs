use crate::core::hash;
use crate::error::{BlockchainError, Result};
use crate::utils::{
    base58_decode, base58_encode, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify,
    new_key_pair, ripemd160_digest,
};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;

/// Signs transaction bodies and checks signatures; the chain treats both as black boxes
pub trait Signer: Send + Sync {
    fn sign(&self, body: &[u8]) -> Result<Vec<u8>>;

    fn verify(&self, body: &[u8], signature: &[u8], public_key: &[u8]) -> bool;

    fn public_key(&self) -> &[u8];

    /// Address that change outputs are paid back to
    fn address(&self) -> String;
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        Self::from_pkcs8(new_key_pair()?)
    }

    pub fn from_pkcs8(pkcs8: Vec<u8>) -> Result<Wallet> {
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &pkcs8, &rng)
            .map_err(|e| {
                BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
            })?;
        let public_key = key_pair.public_key().as_ref().to_vec();
        Ok(Wallet { pkcs8, public_key })
    }
}

impl Signer for Wallet {
    fn sign(&self, body: &[u8]) -> Result<Vec<u8>> {
        ecdsa_p256_sha256_sign_digest(&self.pkcs8, body)
    }

    fn verify(&self, body: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        ecdsa_p256_sha256_sign_verify(public_key, signature, body)
    }

    fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    fn address(&self) -> String {
        convert_address(&hash_pub_key(&self.public_key))
    }
}

pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    ripemd160_digest(hash(pub_key).as_bytes())
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    let second = hash(hash(payload).as_bytes());
    second.as_bytes()[..ADDRESS_CHECK_SUM_LEN].to_vec()
}

pub fn validate_address(address: &str) -> bool {
    let payload = match base58_decode(address) {
        Ok(payload) => payload,
        Err(_) => return false,
    };

    if payload.len() < ADDRESS_CHECK_SUM_LEN + 1 {
        return false;
    }

    let (body, actual_checksum) = payload.split_at(payload.len() - ADDRESS_CHECK_SUM_LEN);
    checksum(body) == actual_checksum
}

/// version + pub_key_hash + checksum, base58 encoded
pub fn convert_address(pub_key_hash: &[u8]) -> String {
    let mut payload = vec![VERSION];
    payload.extend_from_slice(pub_key_hash);
    let checksum = checksum(&payload);
    payload.extend(checksum);
    base58_encode(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_address_validates() {
        let wallet = Wallet::new().unwrap();
        let address = wallet.address();
        assert!(validate_address(&address));
        assert!(!validate_address("recipient"));
        assert!(!validate_address(""));
    }

    #[test]
    fn test_wallet_signatures_bind_body_and_key() {
        let alice = Wallet::new().unwrap();
        let bob = Wallet::new().unwrap();

        let signature = alice.sign(b"spend genesis:0").unwrap();
        assert!(alice.verify(b"spend genesis:0", &signature, alice.public_key()));
        assert!(!alice.verify(b"spend genesis:1", &signature, alice.public_key()));
        assert!(!bob.verify(b"spend genesis:0", &signature, bob.public_key()));
    }

    #[test]
    fn test_from_pkcs8_rejects_garbage() {
        assert!(matches!(
            Wallet::from_pkcs8(vec![1, 2, 3]),
            Err(BlockchainError::Crypto(_))
        ));
    }
}
