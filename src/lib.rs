//! Permit-Factory: a permittable ERC-20 style token factory in Rust
//!
//! This crate provides a token factory and the tokens it creates:
//! - Standard fungible-token ledger (balances, allowances, transfers)
//! - Signature-based approvals (permit) with per-owner replay nonces
//! - Domain separators binding every signature to one token and network
//! - Deterministic token addressing, predictable before creation
//! - Recoverable ECDSA signatures (secp256k1)
//! - Wallet management for signing permits
//! - JSON persistence with rotating backups
//!
//! # Example
//!
//! ```rust
//! use permit_factory::token::TokenFactory;
//! use permit_factory::wallet::Wallet;
//!
//! // One factory per network is the intended pattern
//! let mut factory = TokenFactory::new(1);
//!
//! // Create a token; the address is predictable beforehand
//! let predicted = factory.next_token_address();
//! let owner = Wallet::new();
//! let event = factory.create_token(
//!     &owner.address(),
//!     "My Token".to_string(),
//!     "MTK".to_string(),
//!     18,
//!     1_000_000,
//!     &owner.address(),
//! ).unwrap();
//! assert_eq!(event.token, predicted);
//!
//! // Owner signs a permit off-line, a third party submits it
//! let spender = Wallet::new().address();
//! let signature = owner
//!     .sign_permit(factory.get(&event.token).unwrap(), &spender, 500, u64::MAX)
//!     .unwrap();
//! factory
//!     .permit(&event.token, &owner.address(), &spender, 500, u64::MAX, &signature, 0)
//!     .unwrap();
//! ```

pub mod cli;
pub mod crypto;
pub mod storage;
pub mod token;
pub mod wallet;

// Re-export commonly used types
pub use crypto::KeyPair;
pub use storage::{Storage, StorageConfig};
pub use token::{
    compute_token_address, ApprovalEvent, CreationEvent, Token, TokenError, TokenFactory,
    TokenMetadata, TransferEvent, UNLIMITED_ALLOWANCE,
};
pub use wallet::{Wallet, WalletManager};
