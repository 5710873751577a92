//! ECDSA key management for token accounts
//!
//! Provides key pair generation, recoverable signing, and signer recovery
//! using the secp256k1 elliptic curve. Recoverable signatures let a token
//! derive the signer's address from the signature alone, which is what the
//! permit flow relies on.

use rand::rngs::OsRng;
use ripemd::{Digest as RipemdDigest, Ripemd160};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::sha256;

/// Length of a recoverable signature: 64 compact bytes plus recovery id
pub const SIGNATURE_LENGTH: usize = 65;

/// The null account identity
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Get the account address for this key pair
    pub fn address(&self) -> String {
        public_key_to_address(&self.public_key)
    }

    /// Sign a 32-byte digest, producing a 65-byte recoverable signature
    pub fn sign_recoverable(&self, digest: &[u8]) -> Result<Vec<u8>, KeyError> {
        sign_recoverable(&self.secret_key, digest)
    }
}

/// Convert a public key to an account address
///
/// Addresses are `0x` + 40 hex chars: RIPEMD160(SHA256(compressed pubkey)).
pub fn public_key_to_address(public_key: &PublicKey) -> String {
    let sha256_hash = sha256(&public_key.serialize());

    let mut ripemd = Ripemd160::new();
    ripemd.update(&sha256_hash);
    let ripemd_hash = ripemd.finalize();

    format!("0x{}", hex::encode(ripemd_hash))
}

/// Parse an account address into its 20 raw bytes
pub fn address_to_bytes(address: &str) -> Result<[u8; 20], KeyError> {
    let stripped = address
        .strip_prefix("0x")
        .ok_or_else(|| KeyError::InvalidAddress(address.to_string()))?;
    let bytes =
        hex::decode(stripped).map_err(|_| KeyError::InvalidAddress(address.to_string()))?;
    let array: [u8; 20] = bytes
        .try_into()
        .map_err(|_| KeyError::InvalidAddress(address.to_string()))?;
    Ok(array)
}

/// Check whether an address is well-formed (`0x` + 40 hex chars)
pub fn is_valid_address(address: &str) -> bool {
    address_to_bytes(address).is_ok()
}

/// Sign a 32-byte digest with a secret key, producing a recoverable signature
///
/// Output layout: 64 bytes of compact (r, s) followed by one recovery-id byte.
pub fn sign_recoverable(secret_key: &SecretKey, digest: &[u8]) -> Result<Vec<u8>, KeyError> {
    let secp = Secp256k1::new();

    let message = Message::from_digest_slice(digest)?;
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);

    let (recovery_id, compact) = signature.serialize_compact();
    let mut out = compact.to_vec();
    out.push(recovery_id.to_i32() as u8);
    Ok(out)
}

/// Recover the signer's address from a 65-byte recoverable signature
pub fn recover_signer(digest: &[u8], signature: &[u8]) -> Result<String, KeyError> {
    let secp = Secp256k1::new();

    if signature.len() != SIGNATURE_LENGTH {
        return Err(KeyError::InvalidSignature);
    }

    let recovery_id = RecoveryId::from_i32(i32::from(signature[64]))
        .map_err(|_| KeyError::InvalidSignature)?;
    let sig = RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;

    let message = Message::from_digest_slice(digest)?;
    let public_key = secp
        .recover_ecdsa(&message, &sig)
        .map_err(|_| KeyError::InvalidSignature)?;

    Ok(public_key_to_address(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert!(!kp.private_key_hex().is_empty());
        assert!(!kp.public_key_hex().is_empty());
        assert!(is_valid_address(&kp.address()));
    }

    #[test]
    fn test_sign_and_recover() {
        let kp = KeyPair::generate();
        let digest = sha256(b"permit me");

        let signature = kp.sign_recoverable(&digest).unwrap();
        assert_eq!(signature.len(), SIGNATURE_LENGTH);

        let signer = recover_signer(&digest, &signature).unwrap();
        assert_eq!(signer, kp.address());
    }

    #[test]
    fn test_recover_wrong_digest_yields_other_address() {
        let kp = KeyPair::generate();
        let signature = kp.sign_recoverable(&sha256(b"message one")).unwrap();

        // Recovery over a different digest succeeds but yields a different signer
        let signer = recover_signer(&sha256(b"message two"), &signature).unwrap();
        assert_ne!(signer, kp.address());
    }

    #[test]
    fn test_recover_rejects_malformed_signature() {
        let digest = sha256(b"whatever");
        assert!(matches!(
            recover_signer(&digest, &[0u8; 10]),
            Err(KeyError::InvalidSignature)
        ));

        // Recovery id out of range
        let mut sig = vec![1u8; 65];
        sig[64] = 9;
        assert!(matches!(
            recover_signer(&digest, &sig),
            Err(KeyError::InvalidSignature)
        ));
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = kp1.private_key_hex();

        let kp2 = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());
    }

    #[test]
    fn test_address_format() {
        let kp = KeyPair::generate();
        let address = kp.address();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);
        assert_eq!(address_to_bytes(&address).unwrap().len(), 20);
    }

    #[test]
    fn test_address_parsing() {
        assert!(is_valid_address(ZERO_ADDRESS));
        assert!(!is_valid_address("not-an-address"));
        assert!(!is_valid_address("0x1234"));
        assert_eq!(address_to_bytes(ZERO_ADDRESS).unwrap(), [0u8; 20]);
    }
}
