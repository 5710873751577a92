//! Token factory: creation entry point and authoritative registry
//!
//! The factory instantiates permittable tokens, records every address it has
//! ever produced (append-only, in creation order), and derives those
//! addresses deterministically from its own identity and a creation counter,
//! so a token's address can be computed off-line before the creation call
//! is ever made.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::crypto::sha256;
use crate::token::permit::domain_separator;
use crate::token::token::{ApprovalEvent, Token, TokenError, TokenMetadata, TransferEvent};

/// Creation event (emitted once per successful `create_token`)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreationEvent {
    pub creator: String,
    pub token: String,
    pub name: String,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
}

/// Derive the raw 20 bytes of the token address for a given creation counter
fn token_address_bytes(factory_address: &str, counter: u64) -> [u8; 20] {
    let input = format!("{}:{}", factory_address, counter);
    let hash = sha256(input.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[..20]);
    bytes
}

/// Compute the address the factory will assign to its `counter`-th token
///
/// Pure function of the factory identity and the creation counter: callers
/// can predict a token's address before submitting the creation call, and
/// verify afterwards that the factory assigned the expected one.
pub fn compute_token_address(factory_address: &str, counter: u64) -> String {
    format!("0x{}", hex::encode(token_address_bytes(factory_address, counter)))
}

/// Creates permittable tokens and manages the registry of all of them
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenFactory {
    /// The factory's own identity, the root of all derived token addresses
    address: String,
    /// Chain id baked into every created token's domain separator
    chain_id: u64,
    /// All tokens by address
    tokens: HashMap<String, Token>,
    /// Token addresses in creation order (append-only)
    created_tokens: Vec<String>,
    /// Token addresses grouped by creator
    tokens_by_creator: HashMap<String, Vec<String>>,
    /// Creation counter for address derivation
    counter: u64,
}

impl TokenFactory {
    /// Create a factory for the given network
    ///
    /// The factory address is derived from the chain id, so every node on a
    /// network converges on the same factory identity (the intended
    /// one-factory-per-network pattern). Use [`TokenFactory::with_address`]
    /// to run several factories side by side.
    pub fn new(chain_id: u64) -> Self {
        let hash = sha256(format!("factory:{}", chain_id).as_bytes());
        let address = format!("0x{}", hex::encode(&hash[..20]));
        Self::with_address(chain_id, address)
    }

    /// Create a factory with an explicit identity
    pub fn with_address(chain_id: u64, address: String) -> Self {
        Self {
            address,
            chain_id,
            tokens: HashMap::new(),
            created_tokens: Vec::new(),
            tokens_by_creator: HashMap::new(),
            counter: 0,
        }
    }

    /// Get the factory's own address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the chain id this factory creates tokens for
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Create a new token
    ///
    /// The full initial supply is credited to `owner`. The new token's
    /// address is `compute_token_address(factory, counter)` for the current
    /// counter; the counter then advances, so every call in the factory's
    /// lifetime yields a distinct address, identical metadata included.
    pub fn create_token(
        &mut self,
        creator: &str,
        name: String,
        symbol: String,
        decimals: u8,
        initial_supply: u128,
        owner: &str,
    ) -> Result<CreationEvent, TokenError> {
        // Validates name/symbol/decimals
        let metadata = TokenMetadata::new(
            name,
            symbol,
            decimals,
            initial_supply,
            creator.to_string(),
            self.chain_id,
        )?;

        let address_bytes = token_address_bytes(&self.address, self.counter);
        let address = format!("0x{}", hex::encode(address_bytes));
        self.counter += 1;

        let separator = domain_separator(&metadata.name, self.chain_id, &address_bytes);
        let token = Token::new(address.clone(), separator, metadata, owner);

        let event = CreationEvent {
            creator: creator.to_string(),
            token: address.clone(),
            name: token.name().to_string(),
            symbol: token.symbol().to_string(),
            timestamp: Utc::now(),
        };

        self.created_tokens.push(address.clone());
        self.tokens_by_creator
            .entry(creator.to_string())
            .or_default()
            .push(address.clone());
        self.tokens.insert(address.clone(), token);

        log::info!(
            "Token created: {} ({}) at {} by {}",
            event.name,
            event.symbol,
            address,
            creator
        );

        Ok(event)
    }

    /// Get a token by address
    pub fn get(&self, address: &str) -> Option<&Token> {
        self.tokens.get(address)
    }

    /// Get mutable reference to a token
    pub fn get_mut(&mut self, address: &str) -> Option<&mut Token> {
        self.tokens.get_mut(address)
    }

    /// All token addresses this factory has created, in creation order
    pub fn created_tokens(&self) -> &[String] {
        &self.created_tokens
    }

    /// Token addresses created by a given account
    pub fn tokens_by_creator(&self, creator: &str) -> &[String] {
        self.tokens_by_creator
            .get(creator)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Get token count
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    /// Check if a token exists
    pub fn exists(&self, address: &str) -> bool {
        self.tokens.contains_key(address)
    }

    /// Address the next `create_token` call will assign
    pub fn next_token_address(&self) -> String {
        compute_token_address(&self.address, self.counter)
    }

    fn token_mut(&mut self, address: &str) -> Result<&mut Token, TokenError> {
        self.tokens
            .get_mut(address)
            .ok_or_else(|| TokenError::TokenNotFound(address.to_string()))
    }

    fn token(&self, address: &str) -> Result<&Token, TokenError> {
        self.tokens
            .get(address)
            .ok_or_else(|| TokenError::TokenNotFound(address.to_string()))
    }

    /// Transfer tokens
    pub fn transfer(
        &mut self,
        token_address: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        self.token_mut(token_address)?.transfer(from, to, amount)
    }

    /// Approve spender
    pub fn approve(
        &mut self,
        token_address: &str,
        owner: &str,
        spender: &str,
        amount: u128,
    ) -> Result<ApprovalEvent, TokenError> {
        self.token_mut(token_address)?.approve(owner, spender, amount)
    }

    /// Transfer from (delegated transfer)
    pub fn transfer_from(
        &mut self,
        token_address: &str,
        spender: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        self.token_mut(token_address)?
            .transfer_from(spender, from, to, amount)
    }

    /// Apply a signed permit to a token
    pub fn permit(
        &mut self,
        token_address: &str,
        owner: &str,
        spender: &str,
        value: u128,
        deadline: u64,
        signature: &[u8],
        now: u64,
    ) -> Result<ApprovalEvent, TokenError> {
        self.token_mut(token_address)?
            .permit(owner, spender, value, deadline, signature, now)
    }

    /// Get balance for an address on a specific token
    pub fn balance_of(&self, token_address: &str, holder: &str) -> Result<u128, TokenError> {
        Ok(self.token(token_address)?.balance_of(holder))
    }

    /// Get allowance
    pub fn allowance(
        &self,
        token_address: &str,
        owner: &str,
        spender: &str,
    ) -> Result<u128, TokenError> {
        Ok(self.token(token_address)?.allowance(owner, spender))
    }

    /// Get the current permit nonce for an owner on a specific token
    pub fn nonce_of(&self, token_address: &str, owner: &str) -> Result<u64, TokenError> {
        Ok(self.token(token_address)?.nonce_of(owner))
    }

    /// Get all tokens held by an address
    pub fn tokens_for_holder(&self, holder: &str) -> Vec<(&Token, u128)> {
        self.created_tokens
            .iter()
            .filter_map(|address| self.tokens.get(address))
            .filter_map(|token| {
                let balance = token.balance_of(holder);
                if balance > 0 {
                    Some((token, balance))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Get transfer history for a token
    pub fn get_history(&self, token_address: &str) -> Result<Vec<TransferEvent>, TokenError> {
        Ok(self.token(token_address)?.transfer_history.clone())
    }
}
