//! Cryptographic utilities for the token factory
//!
//! This module provides:
//! - SHA-256 hashing
//! - ECDSA key management with recoverable signatures (secp256k1)
//! - Account address derivation and parsing

pub mod hash;
pub mod keys;

pub use hash::{sha256, sha256_concat, sha256_hex};
pub use keys::{
    address_to_bytes, is_valid_address, public_key_to_address, recover_signer, sign_recoverable,
    KeyError, KeyPair, SIGNATURE_LENGTH, ZERO_ADDRESS,
};
