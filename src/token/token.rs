//! Permittable ERC-20 style token implementation
//!
//! Provides a fungible token ledger with the standard operation set plus
//! `permit`: signature-based approvals that never require a transaction
//! from the owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::crypto::{recover_signer, ZERO_ADDRESS};
use crate::token::permit;

/// Allowance sentinel that `transfer_from` never decrements
pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;

/// Number of transfer events retained per token
const HISTORY_LIMIT: usize = 100;

/// Token-related errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: u128, need: u128 },
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Permit expired: deadline {deadline}, now {now}")]
    Expired { deadline: u64, now: u64 },
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Unauthorized: signed by {signer}, expected {owner}")]
    Unauthorized { signer: String, owner: String },
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
    #[error("Arithmetic underflow")]
    ArithmeticUnderflow,
    #[error("Token not found: {0}")]
    TokenNotFound(String),
}

/// Token metadata (immutable after creation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    /// Token name (e.g., "My Token")
    pub name: String,
    /// Token symbol (e.g., "MTK")
    pub symbol: String,
    /// Decimal places (usually 18)
    pub decimals: u8,
    /// Total supply (fixed at creation)
    pub total_supply: u128,
    /// Creator address
    pub creator: String,
    /// Chain id the token was created on
    pub chain_id: u64,
    /// Timestamp when created
    pub created_at: DateTime<Utc>,
}

impl TokenMetadata {
    /// Create new token metadata with validation
    pub fn new(
        name: String,
        symbol: String,
        decimals: u8,
        total_supply: u128,
        creator: String,
        chain_id: u64,
    ) -> Result<Self, TokenError> {
        if name.is_empty() || name.len() > 64 {
            return Err(TokenError::InvalidMetadata(
                "name must be 1-64 characters".to_string(),
            ));
        }

        if symbol.is_empty() || symbol.len() > 10 {
            return Err(TokenError::InvalidMetadata(
                "symbol must be 1-10 characters".to_string(),
            ));
        }

        if decimals > 18 {
            return Err(TokenError::InvalidMetadata(
                "decimals must be 0-18".to_string(),
            ));
        }

        Ok(Self {
            name,
            symbol,
            decimals,
            total_supply,
            creator,
            chain_id,
            created_at: Utc::now(),
        })
    }
}

/// Transfer event (emitted when tokens are transferred)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferEvent {
    pub token: String,
    pub from: String,
    pub to: String,
    pub amount: u128,
    pub timestamp: DateTime<Utc>,
}

/// Approval event (emitted by both `approve` and successful `permit`)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub token: String,
    pub owner: String,
    pub spender: String,
    pub amount: u128,
    pub timestamp: DateTime<Utc>,
}

/// A permittable ERC-20 style fungible token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    /// Unique token address
    pub address: String,
    /// Token metadata
    pub metadata: TokenMetadata,
    /// Domain separator binding permit signatures to this instance
    domain_separator: Vec<u8>,
    /// Balances: address -> amount
    balances: HashMap<String, u128>,
    /// Allowances: owner -> (spender -> amount)
    allowances: HashMap<String, HashMap<String, u128>>,
    /// Permit nonces: owner -> next expected nonce
    nonces: HashMap<String, u64>,
    /// Transfer history (last 100)
    pub transfer_history: Vec<TransferEvent>,
}

impl Token {
    /// Create a new token with all supply allocated to the owner
    pub fn new(
        address: String,
        domain_separator: Vec<u8>,
        metadata: TokenMetadata,
        owner: &str,
    ) -> Self {
        let mut balances = HashMap::new();
        balances.insert(owner.to_string(), metadata.total_supply);

        Self {
            address,
            metadata,
            domain_separator,
            balances,
            allowances: HashMap::new(),
            nonces: HashMap::new(),
            transfer_history: Vec::new(),
        }
    }

    // =========================================================================
    // View Functions
    // =========================================================================

    /// Get token name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Get token symbol
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    /// Get decimal places
    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    /// Get total supply
    pub fn total_supply(&self) -> u128 {
        self.metadata.total_supply
    }

    /// Get the domain separator permit signatures must be bound to
    pub fn domain_separator(&self) -> &[u8] {
        &self.domain_separator
    }

    /// Get balance of an address
    pub fn balance_of(&self, address: &str) -> u128 {
        *self.balances.get(address).unwrap_or(&0)
    }

    /// Get allowance for a spender
    pub fn allowance(&self, owner: &str, spender: &str) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Get the current permit nonce for an owner
    pub fn nonce_of(&self, owner: &str) -> u64 {
        *self.nonces.get(owner).unwrap_or(&0)
    }

    /// Get all holders with balances
    pub fn holders(&self) -> Vec<(&String, &u128)> {
        self.balances.iter().filter(|(_, &b)| b > 0).collect()
    }

    /// Get holder count
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    // =========================================================================
    // Mutating Functions
    // =========================================================================

    /// Transfer tokens from one address to another
    ///
    /// # Arguments
    /// * `from` - Sender address
    /// * `to` - Recipient address
    /// * `amount` - Amount to transfer
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        if to == ZERO_ADDRESS {
            return Err(TokenError::InvalidRecipient(to.to_string()));
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        // Compute both sides before touching state so a failure leaves the
        // ledger untouched. A self-transfer is a net no-op.
        if from != to {
            let new_from = from_balance
                .checked_sub(amount)
                .ok_or(TokenError::ArithmeticUnderflow)?;
            let new_to = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(TokenError::ArithmeticOverflow)?;

            self.balances.insert(from.to_string(), new_from);
            self.balances.insert(to.to_string(), new_to);
        }

        Ok(self.record_transfer(from, to, amount))
    }

    /// Approve a spender to transfer tokens on behalf of owner
    ///
    /// Overwrites any prior allowance (not additive). An allowance of
    /// [`UNLIMITED_ALLOWANCE`] is never decremented by `transfer_from`.
    pub fn approve(
        &mut self,
        owner: &str,
        spender: &str,
        amount: u128,
    ) -> Result<ApprovalEvent, TokenError> {
        Ok(self.set_allowance(owner, spender, amount))
    }

    /// Transfer tokens on behalf of owner (requires prior approval)
    ///
    /// # Arguments
    /// * `spender` - Address performing the transfer (must have allowance)
    /// * `from` - Token owner
    /// * `to` - Recipient
    /// * `amount` - Amount to transfer
    pub fn transfer_from(
        &mut self,
        spender: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        let current_allowance = self.allowance(from, spender);
        if current_allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                have: current_allowance,
                need: amount,
            });
        }

        let event = self.transfer(from, to, amount)?;

        if current_allowance != UNLIMITED_ALLOWANCE {
            let remaining = current_allowance
                .checked_sub(amount)
                .ok_or(TokenError::ArithmeticUnderflow)?;
            self.allowances
                .entry(from.to_string())
                .or_default()
                .insert(spender.to_string(), remaining);
        }

        Ok(event)
    }

    /// Set an allowance from an off-line signature instead of a call by the
    /// owner
    ///
    /// Verifies that `signature` is the owner's signature over this token's
    /// domain separator and the tuple (owner, spender, value, current nonce,
    /// deadline). On success the nonce is consumed and the allowance set
    /// exactly as in [`Token::approve`]. The nonce read, the signature check,
    /// and the nonce increment happen inside this one `&mut self` call, so
    /// no other operation can observe the intermediate state.
    ///
    /// # Arguments
    /// * `owner` - Account that signed the permit
    /// * `spender` - Account being approved
    /// * `value` - Allowance to set
    /// * `deadline` - Unix timestamp the signature is valid until (inclusive)
    /// * `signature` - 65-byte recoverable signature
    /// * `now` - Current unix timestamp, supplied by the environment
    pub fn permit(
        &mut self,
        owner: &str,
        spender: &str,
        value: u128,
        deadline: u64,
        signature: &[u8],
        now: u64,
    ) -> Result<ApprovalEvent, TokenError> {
        if now > deadline {
            return Err(TokenError::Expired { deadline, now });
        }

        if spender == ZERO_ADDRESS {
            return Err(TokenError::InvalidRecipient(spender.to_string()));
        }

        let nonce = self.nonce_of(owner);
        let digest = permit::permit_digest(
            &self.domain_separator,
            owner,
            spender,
            value,
            nonce,
            deadline,
        )
        .map_err(|_| TokenError::InvalidSignature)?;

        let signer = recover_signer(&digest, signature)
            .map_err(|_| TokenError::InvalidSignature)?;
        if signer == ZERO_ADDRESS {
            return Err(TokenError::InvalidSignature);
        }
        if signer != owner {
            return Err(TokenError::Unauthorized {
                signer,
                owner: owner.to_string(),
            });
        }

        // Consume the nonce: the signature above was verified against the
        // pre-increment value, so it can never validate a second time.
        let next = nonce.checked_add(1).ok_or(TokenError::ArithmeticOverflow)?;
        self.nonces.insert(owner.to_string(), next);

        Ok(self.set_allowance(owner, spender, value))
    }

    fn set_allowance(&mut self, owner: &str, spender: &str, amount: u128) -> ApprovalEvent {
        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), amount);

        ApprovalEvent {
            token: self.address.clone(),
            owner: owner.to_string(),
            spender: spender.to_string(),
            amount,
            timestamp: Utc::now(),
        }
    }

    fn record_transfer(&mut self, from: &str, to: &str, amount: u128) -> TransferEvent {
        let event = TransferEvent {
            token: self.address.clone(),
            from: from.to_string(),
            to: to.to_string(),
            amount,
            timestamp: Utc::now(),
        };

        self.transfer_history.push(event.clone());
        if self.transfer_history.len() > HISTORY_LIMIT {
            self.transfer_history.remove(0);
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::token::permit::{domain_separator, sign_permit};

    const TEST_TOKEN_ID: [u8; 20] = [0x11; 20];

    fn create_test_token(owner: &str) -> Token {
        let metadata = TokenMetadata::new(
            "Test Token".to_string(),
            "TST".to_string(),
            18,
            1_000_000,
            owner.to_string(),
            1,
        )
        .unwrap();

        Token::new(
            "0x1111111111111111111111111111111111111111".to_string(),
            domain_separator("Test Token", 1, &TEST_TOKEN_ID),
            metadata,
            owner,
        )
    }

    fn supply_invariant_holds(token: &Token) -> bool {
        let sum: u128 = token.balances.values().sum();
        sum == token.total_supply()
    }

    #[test]
    fn test_token_creation() {
        let token = create_test_token("creator");

        assert_eq!(token.name(), "Test Token");
        assert_eq!(token.symbol(), "TST");
        assert_eq!(token.decimals(), 18);
        assert_eq!(token.total_supply(), 1_000_000);
        assert_eq!(token.balance_of("creator"), 1_000_000);
        assert_eq!(token.nonce_of("creator"), 0);
        assert_eq!(token.holder_count(), 1);
        assert!(supply_invariant_holds(&token));
    }

    #[test]
    fn test_metadata_validation() {
        // Empty name
        assert!(matches!(
            TokenMetadata::new("".to_string(), "TST".to_string(), 18, 1000, "c".to_string(), 1),
            Err(TokenError::InvalidMetadata(_))
        ));

        // Symbol too long
        assert!(matches!(
            TokenMetadata::new(
                "Test".to_string(),
                "TOOLONGSYMBOL".to_string(),
                18,
                1000,
                "c".to_string(),
                1
            ),
            Err(TokenError::InvalidMetadata(_))
        ));

        // Decimals out of range
        assert!(matches!(
            TokenMetadata::new("Test".to_string(), "TST".to_string(), 19, 1000, "c".to_string(), 1),
            Err(TokenError::InvalidMetadata(_))
        ));

        // Zero supply is allowed
        assert!(
            TokenMetadata::new("Test".to_string(), "TST".to_string(), 18, 0, "c".to_string(), 1)
                .is_ok()
        );
    }

    #[test]
    fn test_transfer() {
        let mut token = create_test_token("creator");

        let event = token.transfer("creator", "recipient", 1000).unwrap();

        assert_eq!(event.from, "creator");
        assert_eq!(event.to, "recipient");
        assert_eq!(event.amount, 1000);
        assert_eq!(token.balance_of("creator"), 999_000);
        assert_eq!(token.balance_of("recipient"), 1000);
        assert!(supply_invariant_holds(&token));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut token = create_test_token("creator");

        let result = token.transfer("creator", "recipient", 2_000_000);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientBalance { .. })
        ));

        // State unchanged
        assert_eq!(token.balance_of("creator"), 1_000_000);
        assert_eq!(token.balance_of("recipient"), 0);
        assert!(token.transfer_history.is_empty());
    }

    #[test]
    fn test_transfer_to_zero_address() {
        let mut token = create_test_token("creator");

        let result = token.transfer("creator", ZERO_ADDRESS, 100);
        assert!(matches!(result, Err(TokenError::InvalidRecipient(_))));
        assert_eq!(token.balance_of("creator"), 1_000_000);
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut token = create_test_token("creator");

        token.transfer("creator", "creator", 100).unwrap();
        assert_eq!(token.balance_of("creator"), 1_000_000);
        assert!(supply_invariant_holds(&token));
    }

    #[test]
    fn test_approve_and_allowance() {
        let mut token = create_test_token("creator");

        assert_eq!(token.allowance("creator", "spender"), 0);

        token.approve("creator", "spender", 5000).unwrap();
        assert_eq!(token.allowance("creator", "spender"), 5000);

        // Overwrites, not additive
        token.approve("creator", "spender", 3000).unwrap();
        assert_eq!(token.allowance("creator", "spender"), 3000);

        token.approve("creator", "spender", 0).unwrap();
        assert_eq!(token.allowance("creator", "spender"), 0);
    }

    #[test]
    fn test_transfer_from() {
        let mut token = create_test_token("creator");

        token.approve("creator", "spender", 5000).unwrap();

        let event = token
            .transfer_from("spender", "creator", "recipient", 1000)
            .unwrap();

        assert_eq!(event.amount, 1000);
        assert_eq!(token.balance_of("creator"), 999_000);
        assert_eq!(token.balance_of("recipient"), 1000);
        assert_eq!(token.allowance("creator", "spender"), 4000);
        assert!(supply_invariant_holds(&token));
    }

    #[test]
    fn test_transfer_from_insufficient_allowance() {
        let mut token = create_test_token("creator");

        token.approve("creator", "spender", 500).unwrap();

        let result = token.transfer_from("spender", "creator", "recipient", 1000);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientAllowance { .. })
        ));
        assert_eq!(token.allowance("creator", "spender"), 500);
    }

    #[test]
    fn test_transfer_from_failed_transfer_keeps_allowance() {
        let mut token = create_test_token("creator");

        token.approve("creator", "spender", UNLIMITED_ALLOWANCE).unwrap();

        let result = token.transfer_from("spender", "creator", "recipient", 2_000_000);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientBalance { .. })
        ));
        assert_eq!(token.allowance("creator", "spender"), UNLIMITED_ALLOWANCE);
    }

    #[test]
    fn test_unlimited_allowance_not_decremented() {
        let mut token = create_test_token("creator");

        token.approve("creator", "spender", UNLIMITED_ALLOWANCE).unwrap();
        token
            .transfer_from("spender", "creator", "recipient", 1000)
            .unwrap();

        assert_eq!(token.allowance("creator", "spender"), UNLIMITED_ALLOWANCE);
        assert_eq!(token.balance_of("recipient"), 1000);
    }

    // =========================================================================
    // Permit
    // =========================================================================

    fn permit_fixture() -> (Token, KeyPair, String) {
        let owner = KeyPair::generate();
        let spender = KeyPair::generate().address();
        let token = create_test_token(&owner.address());
        (token, owner, spender)
    }

    #[test]
    fn test_permit_sets_allowance() {
        let (mut token, owner, spender) = permit_fixture();

        let signature =
            sign_permit(&owner, token.domain_separator(), &spender, 500, 0, 100).unwrap();

        let event = token
            .permit(&owner.address(), &spender, 500, 100, &signature, 50)
            .unwrap();

        assert_eq!(event.amount, 500);
        assert_eq!(token.allowance(&owner.address(), &spender), 500);
        assert_eq!(token.nonce_of(&owner.address()), 1);
    }

    #[test]
    fn test_permit_then_transfer_from() {
        let (mut token, owner, spender) = permit_fixture();
        let recipient = KeyPair::generate().address();

        let signature =
            sign_permit(&owner, token.domain_separator(), &spender, 500, 0, 100).unwrap();
        token
            .permit(&owner.address(), &spender, 500, 100, &signature, 50)
            .unwrap();

        token
            .transfer_from(&spender, &owner.address(), &recipient, 500)
            .unwrap();

        assert_eq!(token.balance_of(&recipient), 500);
        assert_eq!(token.allowance(&owner.address(), &spender), 0);
        assert!(supply_invariant_holds(&token));
    }

    #[test]
    fn test_permit_replay_rejected() {
        let (mut token, owner, spender) = permit_fixture();

        let signature =
            sign_permit(&owner, token.domain_separator(), &spender, 500, 0, 100).unwrap();

        token
            .permit(&owner.address(), &spender, 500, 100, &signature, 50)
            .unwrap();

        // Same signature, same parameters: nonce has moved to 1, so the
        // digest no longer matches what was signed.
        let result = token.permit(&owner.address(), &spender, 500, 100, &signature, 50);
        assert!(matches!(result, Err(TokenError::Unauthorized { .. })));
        assert_eq!(token.nonce_of(&owner.address()), 1);
        assert_eq!(token.allowance(&owner.address(), &spender), 500);
    }

    #[test]
    fn test_permit_expired() {
        let (mut token, owner, spender) = permit_fixture();

        let signature =
            sign_permit(&owner, token.domain_separator(), &spender, 500, 0, 100).unwrap();

        let result = token.permit(&owner.address(), &spender, 500, 100, &signature, 101);
        assert!(matches!(result, Err(TokenError::Expired { .. })));
        assert_eq!(token.nonce_of(&owner.address()), 0);

        // Deadline is inclusive
        assert!(token
            .permit(&owner.address(), &spender, 500, 100, &signature, 100)
            .is_ok());
    }

    #[test]
    fn test_permit_wrong_signer() {
        let (mut token, owner, spender) = permit_fixture();
        let mallory = KeyPair::generate();

        let signature =
            sign_permit(&mallory, token.domain_separator(), &spender, 500, 0, 100).unwrap();

        let result = token.permit(&owner.address(), &spender, 500, 100, &signature, 50);
        assert!(matches!(result, Err(TokenError::Unauthorized { .. })));
        assert_eq!(token.allowance(&owner.address(), &spender), 0);
        assert_eq!(token.nonce_of(&owner.address()), 0);
    }

    #[test]
    fn test_permit_tampered_value() {
        let (mut token, owner, spender) = permit_fixture();

        let signature =
            sign_permit(&owner, token.domain_separator(), &spender, 500, 0, 100).unwrap();

        // Submitting a different value than was signed
        let result = token.permit(&owner.address(), &spender, 9999, 100, &signature, 50);
        assert!(matches!(result, Err(TokenError::Unauthorized { .. })));
    }

    #[test]
    fn test_permit_malformed_signature() {
        let (mut token, owner, spender) = permit_fixture();

        let result = token.permit(&owner.address(), &spender, 500, 100, &[0u8; 3], 50);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_permit_zero_spender() {
        let (mut token, owner, _) = permit_fixture();

        let signature =
            sign_permit(&owner, token.domain_separator(), ZERO_ADDRESS, 500, 0, 100).unwrap();

        let result = token.permit(&owner.address(), ZERO_ADDRESS, 500, 100, &signature, 50);
        assert!(matches!(result, Err(TokenError::InvalidRecipient(_))));
    }

    #[test]
    fn test_permit_wrong_token_rejected() {
        let (mut token, owner, spender) = permit_fixture();

        // Signature bound to a different token's domain separator
        let other_separator = domain_separator("Test Token", 1, &[0x22; 20]);
        let signature = sign_permit(&owner, &other_separator, &spender, 500, 0, 100).unwrap();

        let result = token.permit(&owner.address(), &spender, 500, 100, &signature, 50);
        assert!(matches!(result, Err(TokenError::Unauthorized { .. })));
    }

    #[test]
    fn test_permit_nonces_increment_per_use() {
        let (mut token, owner, spender) = permit_fixture();

        for expected_nonce in 0..3 {
            assert_eq!(token.nonce_of(&owner.address()), expected_nonce);
            let signature = sign_permit(
                &owner,
                token.domain_separator(),
                &spender,
                100 + u128::from(expected_nonce),
                expected_nonce,
                1000,
            )
            .unwrap();
            token
                .permit(
                    &owner.address(),
                    &spender,
                    100 + u128::from(expected_nonce),
                    1000,
                    &signature,
                    1,
                )
                .unwrap();
        }

        assert_eq!(token.nonce_of(&owner.address()), 3);
        assert_eq!(token.allowance(&owner.address(), &spender), 102);
    }
}
