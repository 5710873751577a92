//! CLI commands for the token factory
//!
//! Implements all command handlers for the CLI interface.

use crate::storage::{Storage, StorageConfig};
use crate::token::TokenFactory;
use crate::wallet::WalletManager;
use chrono::Utc;
use std::path::PathBuf;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub factory: TokenFactory,
    pub storage: Storage,
    pub wallet_manager: WalletManager,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize application state
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage_config = StorageConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        };

        let storage = Storage::new(storage_config)?;
        let wallet_dir = data_dir.join("wallets");
        let wallet_manager = WalletManager::new(&wallet_dir)?;

        // Load or create factory state
        let factory = if storage.exists() {
            println!("📂 Loading existing factory state...");
            storage.load()?
        } else {
            println!("🆕 Creating new factory (chain id 1)...");
            let factory = TokenFactory::new(1);
            storage.save(&factory)?;
            factory
        };

        Ok(Self {
            factory,
            storage,
            wallet_manager,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.factory)?;
        Ok(())
    }
}

/// Initialize a new factory
pub fn cmd_init(data_dir: &PathBuf, chain_id: Option<u64>) -> CliResult<()> {
    let storage_config = StorageConfig {
        data_dir: data_dir.clone(),
        ..Default::default()
    };

    let storage = Storage::new(storage_config)?;

    if storage.exists() {
        println!("⚠️  Factory state already exists at {:?}", data_dir);
        println!("   Delete the data directory to reinitialize.");
        return Ok(());
    }

    let factory = TokenFactory::new(chain_id.unwrap_or(1));
    storage.save(&factory)?;

    println!("✅ Factory initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   ⛓️  Chain id: {}", factory.chain_id());
    println!("   🏭 Factory address: {}", factory.address());
    println!("   🔮 First token address: {}", factory.next_token_address());

    Ok(())
}

/// Create a new wallet
pub fn cmd_wallet_new(state: &mut AppState, label: Option<&str>) -> CliResult<()> {
    let wallet = state.wallet_manager.create_wallet(label)?;

    println!("🔐 New wallet created!");
    println!("   📍 Address: {}", wallet.address());
    println!("   🔑 Public Key: {}...", &wallet.public_key()[..32]);
    if let Some(l) = &wallet.label {
        println!("   🏷️  Label: {}", l);
    }
    println!("\n   ⚠️  IMPORTANT: Your private key is stored in the wallets directory.");
    println!("   Back up this directory to avoid losing access to your tokens!");

    Ok(())
}

/// List all wallets
pub fn cmd_wallet_list(state: &mut AppState) -> CliResult<()> {
    let addresses = state.wallet_manager.list_wallets()?;

    if addresses.is_empty() {
        println!("📭 No wallets found. Create one with: tokens wallet new");
        return Ok(());
    }

    println!("📋 Wallets:");
    for address in &addresses {
        let wallet = state.wallet_manager.load_wallet(address)?;
        let label = wallet.label.as_deref().unwrap_or("-");
        let holdings = state.factory.tokens_for_holder(address);
        println!("   {} ({}) - {} token(s) held", address, label, holdings.len());
    }

    Ok(())
}

/// Create a new token
pub fn cmd_create_token(
    state: &mut AppState,
    creator: &str,
    name: &str,
    symbol: &str,
    decimals: u8,
    supply: u128,
    owner: Option<&str>,
) -> CliResult<()> {
    // Creator must hold a local wallet; the environment is what authenticates
    // callers, and here the wallet directory is the environment.
    let wallet = state.wallet_manager.load_wallet(creator)?;
    let owner = owner.unwrap_or(creator);

    let predicted = state.factory.next_token_address();
    let event = state.factory.create_token(
        &wallet.address(),
        name.to_string(),
        symbol.to_string(),
        decimals,
        supply,
        owner,
    )?;
    state.save()?;

    println!("🪙 Token created!");
    println!("   ├─ Address: {} (predicted: {})", event.token, predicted);
    println!("   ├─ Name: {}", event.name);
    println!("   ├─ Symbol: {}", event.symbol);
    println!("   ├─ Decimals: {}", decimals);
    println!("   ├─ Supply: {}", supply);
    println!("   └─ Owner: {}", owner);

    Ok(())
}

/// List all created tokens
pub fn cmd_token_list(state: &AppState) -> CliResult<()> {
    let created = state.factory.created_tokens();

    if created.is_empty() {
        println!("📭 No tokens created yet. Create one with: tokens token create");
        return Ok(());
    }

    println!("🪙 Created tokens ({}):", created.len());
    for address in created {
        if let Some(token) = state.factory.get(address) {
            println!(
                "   {} | {} ({}) | supply {} | {} holder(s)",
                address,
                token.name(),
                token.symbol(),
                token.total_supply(),
                token.holder_count()
            );
        }
    }

    Ok(())
}

/// Show token info
pub fn cmd_token_info(state: &AppState, address: &str) -> CliResult<()> {
    match state.factory.get(address) {
        Some(token) => {
            println!("🪙 Token: {}", address);
            println!("   ├─ Name: {}", token.name());
            println!("   ├─ Symbol: {}", token.symbol());
            println!("   ├─ Decimals: {}", token.decimals());
            println!("   ├─ Total supply: {}", token.total_supply());
            println!("   ├─ Creator: {}", token.metadata.creator);
            println!("   ├─ Chain id: {}", token.metadata.chain_id);
            println!("   ├─ Holders: {}", token.holder_count());
            println!(
                "   └─ Domain separator: {}",
                hex::encode(token.domain_separator())
            );
        }
        None => println!("❌ Token not found: {}", address),
    }

    Ok(())
}

/// Predict the next token addresses without creating anything
pub fn cmd_predict(state: &AppState, count: u64) -> CliResult<()> {
    println!("🔮 Next {} token address(es) for factory {}:", count, state.factory.address());
    let start = state.factory.created_tokens().len() as u64;
    for i in 0..count {
        let address =
            crate::token::compute_token_address(state.factory.address(), start + i);
        println!("   #{} → {}", start + i, address);
    }

    Ok(())
}

/// Show a balance on a token
pub fn cmd_balance(state: &AppState, token: &str, address: &str) -> CliResult<()> {
    let balance = state.factory.balance_of(token, address)?;
    let nonce = state.factory.nonce_of(token, address)?;

    println!("💰 Balance for {}", address);
    println!("   Token: {}", token);
    println!("   Balance: {}", balance);
    println!("   Permit nonce: {}", nonce);

    Ok(())
}

/// Transfer tokens
pub fn cmd_transfer(
    state: &mut AppState,
    token: &str,
    from: &str,
    to: &str,
    amount: u128,
) -> CliResult<()> {
    // Sender must hold a local wallet
    let wallet = state.wallet_manager.load_wallet(from)?;

    let event = state.factory.transfer(token, &wallet.address(), to, amount)?;
    state.save()?;

    println!("📤 Transfer complete:");
    println!("   From: {}", event.from);
    println!("   To: {}", event.to);
    println!("   Amount: {}", event.amount);

    Ok(())
}

/// Approve a spender
pub fn cmd_approve(
    state: &mut AppState,
    token: &str,
    owner: &str,
    spender: &str,
    amount: u128,
) -> CliResult<()> {
    let wallet = state.wallet_manager.load_wallet(owner)?;

    let event = state.factory.approve(token, &wallet.address(), spender, amount)?;
    state.save()?;

    println!("✅ Approval set:");
    println!("   Owner: {}", event.owner);
    println!("   Spender: {}", event.spender);
    println!("   Amount: {}", event.amount);

    Ok(())
}

/// Delegated transfer using a prior approval
pub fn cmd_transfer_from(
    state: &mut AppState,
    token: &str,
    spender: &str,
    from: &str,
    to: &str,
    amount: u128,
) -> CliResult<()> {
    let wallet = state.wallet_manager.load_wallet(spender)?;

    let event = state
        .factory
        .transfer_from(token, &wallet.address(), from, to, amount)?;
    state.save()?;

    let remaining = state.factory.allowance(token, from, spender)?;

    println!("📤 Delegated transfer complete:");
    println!("   From: {}", event.from);
    println!("   To: {}", event.to);
    println!("   Amount: {}", event.amount);
    println!("   Remaining allowance: {}", remaining);

    Ok(())
}

/// Sign a permit with a local wallet
pub fn cmd_permit_sign(
    state: &AppState,
    token: &str,
    owner: &str,
    spender: &str,
    value: u128,
    deadline: u64,
) -> CliResult<()> {
    let wallet = state.wallet_manager.load_wallet(owner)?;
    let token_ref = state
        .factory
        .get(token)
        .ok_or_else(|| format!("Token not found: {}", token))?;

    let signature = wallet.sign_permit(token_ref, spender, value, deadline)?;

    println!("✍️  Permit signed (nonce {}):", token_ref.nonce_of(&wallet.address()));
    println!("   Owner: {}", wallet.address());
    println!("   Spender: {}", spender);
    println!("   Value: {}", value);
    println!("   Deadline: {}", deadline);
    println!("   Signature: {}", hex::encode(&signature));
    println!("\n   Anyone can now submit this with: tokens permit submit");

    Ok(())
}

/// Submit a signed permit
pub fn cmd_permit_submit(
    state: &mut AppState,
    token: &str,
    owner: &str,
    spender: &str,
    value: u128,
    deadline: u64,
    signature_hex: &str,
) -> CliResult<()> {
    let signature = hex::decode(signature_hex)?;
    let now = Utc::now().timestamp().max(0) as u64;

    let event = state
        .factory
        .permit(token, owner, spender, value, deadline, &signature, now)?;
    state.save()?;

    println!("✅ Permit applied:");
    println!("   Owner: {}", event.owner);
    println!("   Spender: {}", event.spender);
    println!("   Allowance: {}", event.amount);

    Ok(())
}

/// Show transfer history for a token
pub fn cmd_history(state: &AppState, token: &str) -> CliResult<()> {
    let history = state.factory.get_history(token)?;

    if history.is_empty() {
        println!("📭 No transfers recorded for {}", token);
        return Ok(());
    }

    println!("📜 Transfer history for {} ({} events):", token, history.len());
    for event in history.iter().rev().take(20) {
        println!(
            "   {} | {} → {} | {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.from,
            event.to,
            event.amount
        );
    }

    Ok(())
}

/// Export factory state to file
pub fn cmd_export(state: &AppState, path: &PathBuf) -> CliResult<()> {
    crate::storage::save_to_file(&state.factory, path)?;
    println!("📦 Factory state exported to {:?}", path);
    Ok(())
}

/// Import factory state from file
pub fn cmd_import(state: &mut AppState, path: &PathBuf) -> CliResult<()> {
    let factory = crate::storage::load_from_file(path)?;

    state.factory = factory;
    state.save()?;

    println!("📥 Factory state imported from {:?}", path);
    println!("   Tokens: {}", state.factory.count());

    Ok(())
}
