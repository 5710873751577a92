//! Factory persistence layer
//!
//! Provides save/load functionality for the token factory state.

use crate::token::TokenFactory;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: std::path::PathBuf,
    pub factory_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: std::path::PathBuf::from(".factory_data"),
            factory_file: "factory.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Factory storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self, StorageError> {
        Self::new(StorageConfig::default())
    }

    /// Get the factory file path
    fn factory_path(&self) -> std::path::PathBuf {
        self.config.data_dir.join(&self.config.factory_file)
    }

    /// Get a backup file path
    fn backup_path(&self, index: usize) -> std::path::PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.factory_file, index))
    }

    /// Save the factory to disk
    pub fn save(&self, factory: &TokenFactory) -> Result<(), StorageError> {
        let path = self.factory_path();

        // Create backup if enabled
        if self.config.backup_enabled && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("factory.tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, factory)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Load the factory from disk
    pub fn load(&self) -> Result<TokenFactory, StorageError> {
        let path = self.factory_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Factory file not found".to_string(),
            ));
        }

        let file = fs::File::open(&path)?;
        let reader = BufReader::new(file);

        let factory: TokenFactory = serde_json::from_reader(reader)?;
        Ok(factory)
    }

    /// Check if a saved factory exists
    pub fn exists(&self) -> bool {
        self.factory_path().exists()
    }

    /// Delete the saved factory
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.factory_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                let next = self.backup_path(i + 1);
                fs::rename(&current, &next)?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<TokenFactory, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        let file = fs::File::open(&backup_path)?;
        let reader = BufReader::new(file);

        let factory: TokenFactory = serde_json::from_reader(reader)?;
        Ok(factory)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        let mut backups = Vec::new();

        for i in 0..self.config.max_backups {
            if self.backup_path(i).exists() {
                backups.push(i);
            }
        }

        backups
    }
}

/// Save factory state to a specific file path
pub fn save_to_file(factory: &TokenFactory, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, factory)?;
    Ok(())
}

/// Load factory state from a specific file path
pub fn load_from_file(path: &Path) -> Result<TokenFactory, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let factory: TokenFactory = serde_json::from_reader(reader)?;
    Ok(factory)
}
