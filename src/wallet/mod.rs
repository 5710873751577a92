//! Wallet management for token accounts

pub mod wallet;

pub use wallet::{Wallet, WalletError, WalletManager};
