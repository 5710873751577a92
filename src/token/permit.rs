//! Permit message construction and signing
//!
//! Implements the signature-based approval path: a token owner signs a
//! structured message off-line, and anyone can submit that signature to set
//! an allowance on the owner's behalf. Every message is bound to one token
//! instance and network through a domain separator fixed at token creation,
//! and to one use through the owner's nonce.

use crate::crypto::{address_to_bytes, sha256, sha256_concat, KeyError, KeyPair};

/// Version identifier mixed into every domain separator
pub const DOMAIN_VERSION: &str = "1";

/// Type string for the domain separator
pub const DOMAIN_TYPE: &str = "Domain(string name,string version,uint64 chainId,address token)";

/// Type string for the permit message
pub const PERMIT_TYPE: &str =
    "Permit(address owner,address spender,uint128 value,uint64 nonce,uint64 deadline)";

/// Encode a u64 as a 32-byte big-endian word
fn word_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encode a u128 as a 32-byte big-endian word
fn word_u128(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encode a 20-byte address as a left-padded 32-byte word
fn word_address(address: &[u8; 20]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

/// Compute the domain separator for a token instance
///
/// Derived once at creation from the token name, the protocol version, the
/// network's chain id, and the token's own address. Binding all four means a
/// permit signed for one token can never be replayed against another token
/// or on another network.
pub fn domain_separator(name: &str, chain_id: u64, token_address: &[u8; 20]) -> Vec<u8> {
    sha256_concat(&[
        &sha256(DOMAIN_TYPE.as_bytes()),
        &sha256(name.as_bytes()),
        &sha256(DOMAIN_VERSION.as_bytes()),
        &word_u64(chain_id),
        &word_address(token_address),
    ])
}

/// Compute the struct hash for a permit message
///
/// Fails with [`KeyError::InvalidAddress`] if owner or spender is not a
/// well-formed account address.
pub fn permit_struct_hash(
    owner: &str,
    spender: &str,
    value: u128,
    nonce: u64,
    deadline: u64,
) -> Result<Vec<u8>, KeyError> {
    let owner_bytes = address_to_bytes(owner)?;
    let spender_bytes = address_to_bytes(spender)?;

    Ok(sha256_concat(&[
        &sha256(PERMIT_TYPE.as_bytes()),
        &word_address(&owner_bytes),
        &word_address(&spender_bytes),
        &word_u128(value),
        &word_u64(nonce),
        &word_u64(deadline),
    ]))
}

/// Compute the 32-byte digest a token owner must sign for a permit
///
/// Layout: `sha256(0x19 || 0x01 || domain_separator || struct_hash)`, so a
/// signed permit can never collide with a signature over plain data.
pub fn permit_digest(
    domain_separator: &[u8],
    owner: &str,
    spender: &str,
    value: u128,
    nonce: u64,
    deadline: u64,
) -> Result<Vec<u8>, KeyError> {
    let struct_hash = permit_struct_hash(owner, spender, value, nonce, deadline)?;
    Ok(sha256_concat(&[
        &[0x19, 0x01],
        domain_separator,
        &struct_hash,
    ]))
}

/// Sign a permit message with the owner's key pair
///
/// The owner address is derived from the key pair. Returns a 65-byte
/// recoverable signature suitable for [`crate::token::Token::permit`].
pub fn sign_permit(
    key_pair: &KeyPair,
    domain_separator: &[u8],
    spender: &str,
    value: u128,
    nonce: u64,
    deadline: u64,
) -> Result<Vec<u8>, KeyError> {
    let owner = key_pair.address();
    let digest = permit_digest(domain_separator, &owner, spender, value, nonce, deadline)?;
    key_pair.sign_recoverable(&digest)
}
