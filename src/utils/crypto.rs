use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING};
use ripemd::{Digest as RipemdDigest, Ripemd160};

use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, as stored in block headers.
pub fn current_timestamp() -> Result<i64> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Mining(format!("System clock before epoch: {e}")))?
        .as_millis();

    i64::try_from(millis).map_err(|_| BlockchainError::Mining("Timestamp overflow".to_string()))
}

pub fn ripemd160_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

pub fn base58_decode(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| BlockchainError::Crypto(format!("Invalid base58 encoding: {e}")))
}

/// Generates a fresh P-256 key pair in PKCS#8 form.
pub fn new_key_pair() -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to generate ECDSA key pair: {e}")))?;
    Ok(pkcs8.as_ref().to_vec())
}

pub fn ecdsa_p256_sha256_sign_digest(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| {
            BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
        })?;
    let signature = key_pair
        .sign(&rng, message)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to sign message: {e}")))?;
    Ok(signature.as_ref().to_vec())
}

pub fn ecdsa_p256_sha256_sign_verify(public_key: &[u8], signature: &[u8], message: &[u8]) -> bool {
    ring::signature::UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, public_key)
        .verify(message, signature)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::signature::KeyPair;

    #[test]
    fn test_sign_then_verify() {
        let pkcs8 = new_key_pair().unwrap();
        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &pkcs8, &rng).unwrap();
        let public_key = key_pair.public_key().as_ref().to_vec();

        let signature = ecdsa_p256_sha256_sign_digest(&pkcs8, b"body").unwrap();
        assert!(ecdsa_p256_sha256_sign_verify(&public_key, &signature, b"body"));
        assert!(!ecdsa_p256_sha256_sign_verify(&public_key, &signature, b"other"));
    }

    #[test]
    fn test_base58_roundtrip_and_rejects_garbage() {
        let encoded = base58_encode(&[0, 1, 2, 3]);
        assert_eq!(base58_decode(&encoded).unwrap(), vec![0, 1, 2, 3]);
        assert!(base58_decode("0OIl").is_err());
    }

    #[test]
    fn test_timestamp_is_positive() {
        assert!(current_timestamp().unwrap() > 0);
    }
}
