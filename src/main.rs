//! Token Factory CLI Application
//!
//! A command-line interface for creating and operating permittable tokens.

use clap::{Parser, Subcommand};
use permit_factory::cli::{self, AppState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tokens")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A permittable ERC-20 style token factory", long_about = None)]
struct Cli {
    /// Data directory for factory storage
    #[arg(short, long, default_value = ".factory_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new factory
    Init {
        /// Chain id baked into every token's domain separator
        #[arg(short, long)]
        chain_id: Option<u64>,
    },

    /// Wallet operations
    Wallet {
        #[command(subcommand)]
        action: WalletCommands,
    },

    /// Token operations
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },

    /// Transfer tokens
    Transfer {
        /// Token address
        #[arg(short, long)]
        token: String,

        /// Sender's wallet address
        #[arg(short, long)]
        from: String,

        /// Recipient's address
        #[arg(long)]
        to: String,

        /// Amount to transfer
        #[arg(short, long)]
        amount: u128,
    },

    /// Approve a spender
    Approve {
        /// Token address
        #[arg(short, long)]
        token: String,

        /// Owner's wallet address
        #[arg(short, long)]
        owner: String,

        /// Spender's address
        #[arg(short, long)]
        spender: String,

        /// Allowance to set
        #[arg(short, long)]
        amount: u128,
    },

    /// Delegated transfer using a prior approval or permit
    TransferFrom {
        /// Token address
        #[arg(short, long)]
        token: String,

        /// Spender's wallet address (must have allowance)
        #[arg(short, long)]
        spender: String,

        /// Token owner's address
        #[arg(short, long)]
        from: String,

        /// Recipient's address
        #[arg(long)]
        to: String,

        /// Amount to transfer
        #[arg(short, long)]
        amount: u128,
    },

    /// Signature-based approvals
    Permit {
        #[command(subcommand)]
        action: PermitCommands,
    },

    /// Show a balance on a token
    Balance {
        /// Token address
        #[arg(short, long)]
        token: String,

        /// Account address
        #[arg(short, long)]
        address: String,
    },

    /// Show transfer history for a token
    History {
        /// Token address
        #[arg(short, long)]
        token: String,
    },

    /// Export factory state to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import factory state from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Create a new wallet
    New {
        /// Optional label for the wallet
        #[arg(short, long)]
        label: Option<String>,
    },

    /// List all wallets
    List,
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Create a new token
    Create {
        /// Creator's wallet address
        #[arg(short, long)]
        creator: String,

        /// Token name
        #[arg(short, long)]
        name: String,

        /// Token symbol
        #[arg(short, long)]
        symbol: String,

        /// Decimal places
        #[arg(short, long, default_value = "18")]
        decimals: u8,

        /// Initial supply
        #[arg(long)]
        supply: u128,

        /// Owner receiving the initial supply (defaults to creator)
        #[arg(short, long)]
        owner: Option<String>,
    },

    /// List all created tokens
    List,

    /// Show token info
    Info {
        /// Token address
        #[arg(short, long)]
        address: String,
    },

    /// Predict upcoming token addresses without creating anything
    Predict {
        /// Number of addresses to show
        #[arg(short, long, default_value = "1")]
        count: u64,
    },
}

#[derive(Subcommand)]
enum PermitCommands {
    /// Sign a permit with a local wallet
    Sign {
        /// Token address
        #[arg(short, long)]
        token: String,

        /// Owner's wallet address
        #[arg(short, long)]
        owner: String,

        /// Spender's address
        #[arg(short, long)]
        spender: String,

        /// Allowance to grant
        #[arg(short, long)]
        value: u128,

        /// Unix timestamp the signature is valid until
        #[arg(short, long)]
        deadline: u64,
    },

    /// Submit a signed permit
    Submit {
        /// Token address
        #[arg(short, long)]
        token: String,

        /// Owner who signed the permit
        #[arg(short, long)]
        owner: String,

        /// Spender's address
        #[arg(short, long)]
        spender: String,

        /// Allowance to grant (as signed)
        #[arg(short, long)]
        value: u128,

        /// Deadline (as signed)
        #[arg(short, long)]
        deadline: u64,

        /// Hex-encoded 65-byte signature
        #[arg(long)]
        signature: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Handle init command separately (doesn't need full state)
    if let Commands::Init { chain_id } = &cli.command {
        return cli::cmd_init(&cli.data_dir, *chain_id).map_err(Into::into);
    }

    // Initialize application state
    let mut state = AppState::new(cli.data_dir.clone())?;

    // Process commands
    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Wallet { action } => match action {
            WalletCommands::New { label } => {
                cli::cmd_wallet_new(&mut state, label.as_deref())?;
            }
            WalletCommands::List => {
                cli::cmd_wallet_list(&mut state)?;
            }
        },

        Commands::Token { action } => match action {
            TokenCommands::Create {
                creator,
                name,
                symbol,
                decimals,
                supply,
                owner,
            } => {
                cli::cmd_create_token(
                    &mut state,
                    &creator,
                    &name,
                    &symbol,
                    decimals,
                    supply,
                    owner.as_deref(),
                )?;
            }
            TokenCommands::List => {
                cli::cmd_token_list(&state)?;
            }
            TokenCommands::Info { address } => {
                cli::cmd_token_info(&state, &address)?;
            }
            TokenCommands::Predict { count } => {
                cli::cmd_predict(&state, count)?;
            }
        },

        Commands::Transfer {
            token,
            from,
            to,
            amount,
        } => {
            cli::cmd_transfer(&mut state, &token, &from, &to, amount)?;
        }

        Commands::Approve {
            token,
            owner,
            spender,
            amount,
        } => {
            cli::cmd_approve(&mut state, &token, &owner, &spender, amount)?;
        }

        Commands::TransferFrom {
            token,
            spender,
            from,
            to,
            amount,
        } => {
            cli::cmd_transfer_from(&mut state, &token, &spender, &from, &to, amount)?;
        }

        Commands::Permit { action } => match action {
            PermitCommands::Sign {
                token,
                owner,
                spender,
                value,
                deadline,
            } => {
                cli::cmd_permit_sign(&state, &token, &owner, &spender, value, deadline)?;
            }
            PermitCommands::Submit {
                token,
                owner,
                spender,
                value,
                deadline,
                signature,
            } => {
                cli::cmd_permit_submit(
                    &mut state,
                    &token,
                    &owner,
                    &spender,
                    value,
                    deadline,
                    &signature,
                )?;
            }
        },

        Commands::Balance { token, address } => {
            cli::cmd_balance(&state, &token, &address)?;
        }

        Commands::History { token } => {
            cli::cmd_history(&state, &token)?;
        }

        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }

        Commands::Import { input } => {
            cli::cmd_import(&mut state, &input)?;
        }
    }

    Ok(())
}
