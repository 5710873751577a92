//! Wallet implementation for token accounts
//!
//! Provides key management and permit signing.

use crate::crypto::{KeyError, KeyPair};
use crate::token::{permit, Token};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// Serializable wallet data for persistence
#[derive(Debug, Serialize, Deserialize)]
struct WalletData {
    private_key_hex: String,
    address: String,
    label: Option<String>,
}

/// A wallet for managing keys and signing permits
pub struct Wallet {
    /// The key pair for signing
    key_pair: KeyPair,
    /// Optional label for the wallet
    pub label: Option<String>,
}

impl Wallet {
    /// Create a new wallet with a fresh key pair
    pub fn new() -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: None,
        }
    }

    /// Create a wallet with a label
    pub fn with_label(label: &str) -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: Some(label.to_string()),
        }
    }

    /// Import a wallet from a private key
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
        Ok(Self {
            key_pair,
            label: None,
        })
    }

    /// Get the wallet's address
    pub fn address(&self) -> String {
        self.key_pair.address()
    }

    /// Get the wallet's public key (hex)
    pub fn public_key(&self) -> String {
        self.key_pair.public_key_hex()
    }

    /// Get the wallet's private key (hex)
    /// WARNING: Keep this secret!
    pub fn private_key(&self) -> String {
        self.key_pair.private_key_hex()
    }

    /// Sign a permit for a token this wallet owns a balance on
    ///
    /// Reads the wallet's current nonce from the token and binds the
    /// signature to the token's domain separator. Returns the 65-byte
    /// recoverable signature to hand to [`Token::permit`].
    pub fn sign_permit(
        &self,
        token: &Token,
        spender: &str,
        value: u128,
        deadline: u64,
    ) -> Result<Vec<u8>, WalletError> {
        let nonce = token.nonce_of(&self.address());
        let signature = permit::sign_permit(
            &self.key_pair,
            token.domain_separator(),
            spender,
            value,
            nonce,
            deadline,
        )?;
        Ok(signature)
    }

    /// Save wallet to file
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let data = WalletData {
            private_key_hex: self.private_key(),
            address: self.address(),
            label: self.label.clone(),
        };

        let json = serde_json::to_string_pretty(&data)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load wallet from file
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = fs::read_to_string(path)?;
        let data: WalletData = serde_json::from_str(&json)?;

        let mut wallet = Self::from_private_key(&data.private_key_hex)?;
        wallet.label = data.label;
        Ok(wallet)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Wallet manager for handling multiple wallets
pub struct WalletManager {
    wallets_dir: std::path::PathBuf,
}

impl WalletManager {
    /// Create a new wallet manager
    pub fn new(wallets_dir: &Path) -> Result<Self, WalletError> {
        fs::create_dir_all(wallets_dir)?;
        Ok(Self {
            wallets_dir: wallets_dir.to_path_buf(),
        })
    }

    /// Create and save a new wallet
    pub fn create_wallet(&self, label: Option<&str>) -> Result<Wallet, WalletError> {
        let wallet = match label {
            Some(l) => Wallet::with_label(l),
            None => Wallet::new(),
        };

        let filename = format!("{}.json", wallet.address());
        let path = self.wallets_dir.join(filename);
        wallet.save(&path)?;

        Ok(wallet)
    }

    /// List all wallet addresses
    pub fn list_wallets(&self) -> Result<Vec<String>, WalletError> {
        let mut addresses = Vec::new();

        for entry in fs::read_dir(&self.wallets_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Ok(wallet) = Wallet::load(&path) {
                    addresses.push(wallet.address());
                }
            }
        }

        Ok(addresses)
    }

    /// Load a specific wallet by address
    pub fn load_wallet(&self, address: &str) -> Result<Wallet, WalletError> {
        let filename = format!("{}.json", address);
        let path = self.wallets_dir.join(filename);
        Wallet::load(&path)
    }

    /// Delete a wallet
    pub fn delete_wallet(&self, address: &str) -> Result<(), WalletError> {
        let filename = format!("{}.json", address);
        let path = self.wallets_dir.join(filename);
        fs::remove_file(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenFactory;

    #[test]
    fn test_wallet_creation() {
        let wallet = Wallet::new();
        assert!(!wallet.address().is_empty());
        assert!(!wallet.public_key().is_empty());
        assert!(!wallet.private_key().is_empty());
    }

    #[test]
    fn test_wallet_import() {
        let wallet1 = Wallet::new();
        let private_key = wallet1.private_key();

        let wallet2 = Wallet::from_private_key(&private_key).unwrap();
        assert_eq!(wallet1.address(), wallet2.address());
    }

    #[test]
    fn test_wallet_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test_wallet.json");

        let wallet1 = Wallet::with_label("Test Wallet");
        wallet1.save(&path).unwrap();

        let wallet2 = Wallet::load(&path).unwrap();
        assert_eq!(wallet1.address(), wallet2.address());
        assert_eq!(wallet1.label, wallet2.label);
    }

    #[test]
    fn test_wallet_manager_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = WalletManager::new(temp_dir.path()).unwrap();

        let wallet = manager.create_wallet(Some("primary")).unwrap();
        let listed = manager.list_wallets().unwrap();
        assert_eq!(listed, vec![wallet.address()]);

        let loaded = manager.load_wallet(&wallet.address()).unwrap();
        assert_eq!(loaded.address(), wallet.address());

        manager.delete_wallet(&wallet.address()).unwrap();
        assert!(manager.list_wallets().unwrap().is_empty());
    }

    #[test]
    fn test_sign_permit_via_wallet() {
        let mut factory = TokenFactory::new(1);
        let owner = Wallet::new();
        let spender = Wallet::new().address();

        let event = factory
            .create_token(
                &owner.address(),
                "Test".to_string(),
                "TST".to_string(),
                18,
                1000,
                &owner.address(),
            )
            .unwrap();

        let signature = owner
            .sign_permit(factory.get(&event.token).unwrap(), &spender, 250, 100)
            .unwrap();

        factory
            .permit(&event.token, &owner.address(), &spender, 250, 100, &signature, 1)
            .unwrap();
        assert_eq!(
            factory.allowance(&event.token, &owner.address(), &spender).unwrap(),
            250
        );
    }
}
