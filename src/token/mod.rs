//! Permittable ERC-20 style fungible tokens and their factory
//!
//! Provides a standard fungible-token interface with:
//! - Balances per address
//! - Allowances for delegated transfers
//! - Signature-based approvals (permit) with per-owner replay nonces
//! - A factory that creates tokens at deterministic, predictable addresses
//!
//! # Example
//!
//! ```
//! use permit_factory::crypto::KeyPair;
//! use permit_factory::token::{sign_permit, TokenFactory};
//!
//! let mut factory = TokenFactory::new(1);
//! let owner = KeyPair::generate();
//! let spender = KeyPair::generate().address();
//!
//! // Create a new token, supply credited to the owner
//! let event = factory.create_token(
//!     &owner.address(),
//!     "My Token".to_string(),
//!     "MTK".to_string(),
//!     18,
//!     1_000_000,
//!     &owner.address(),
//! ).unwrap();
//!
//! // Owner signs a permit off-line; anyone can submit it
//! let separator = factory.get(&event.token).unwrap().domain_separator().to_vec();
//! let signature = sign_permit(&owner, &separator, &spender, 500, 0, u64::MAX).unwrap();
//! factory.permit(&event.token, &owner.address(), &spender, 500, u64::MAX, &signature, 0).unwrap();
//!
//! assert_eq!(factory.allowance(&event.token, &owner.address(), &spender).unwrap(), 500);
//! ```

pub mod factory;
pub mod permit;
pub mod token;

pub use factory::{compute_token_address, CreationEvent, TokenFactory};
pub use permit::{domain_separator, permit_digest, sign_permit, DOMAIN_VERSION, PERMIT_TYPE};
pub use token::{
    ApprovalEvent, Token, TokenError, TokenMetadata, TransferEvent, UNLIMITED_ALLOWANCE,
};
