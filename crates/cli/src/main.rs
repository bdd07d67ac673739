//! MLM site CLI - Database migrations and pricing gate tools.
//!
//! # Usage
//!
//! ```bash
//! # Run site database migrations
//! mlm-site migrate
//!
//! # Delete expired one-time passcodes
//! mlm-site otp sweep
//!
//! # Issue a pricing token for support or testing
//! mlm-site token issue -e visitor@example.com
//!
//! # Check a token copied from a browser cookie
//! mlm-site token inspect <TOKEN>
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `otp sweep` - One-off OTP cleanup (the server also sweeps periodically)
//! - `token issue` / `token inspect` - Pricing access tokens

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mlm-site")]
#[command(author, version, about = "MLM marketing site CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage one-time passcodes
    Otp {
        #[command(subcommand)]
        action: OtpAction,
    },
    /// Issue or inspect pricing access tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum OtpAction {
    /// Delete expired passcodes
    Sweep,
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for an email address
    Issue {
        /// Verified email address
        #[arg(short, long)]
        email: String,
    },
    /// Verify a token and print its claims
    Inspect {
        /// Token value from the `pricing_access` cookie
        token: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Otp { action } => match action {
            OtpAction::Sweep => {
                commands::otp::sweep().await?;
            }
        },
        Commands::Token { action } => match action {
            TokenAction::Issue { email } => commands::token::issue(&email)?,
            TokenAction::Inspect { token } => commands::token::inspect(&token)?,
        },
    }
    Ok(())
}
