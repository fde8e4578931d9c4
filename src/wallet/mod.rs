//! Key management and transaction authorization
//!
//! The core only talks to the [`Signer`] trait; [`Wallet`] is the ECDSA
//! P-256 implementation the node uses by default.

pub mod wallet;

pub use wallet::{convert_address, hash_pub_key, validate_address, Signer, Wallet, ADDRESS_CHECK_SUM_LEN};
