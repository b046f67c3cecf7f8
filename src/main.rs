//! tabauth - TOTP authenticator CLI
//!
//! Generates time-based one-time codes for stored accounts and imports
//! new accounts from QR code images or screen captures.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tabauth_core::init_logging;
use tabauth_core::qr::{DisplayRect, DisplaySize};

mod cli;

#[derive(Parser)]
#[command(name = "tabauth")]
#[command(about = "TOTP authenticator with QR code import")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configuration interactively
    Setup,
    /// Show current codes
    Codes {
        /// Keep refreshing until interrupted
        #[arg(short, long)]
        watch: bool,
        /// Only show entries whose issuer or account contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Add an account by typing its secret
    Add {
        #[arg(long)]
        issuer: Option<String>,
        #[arg(long)]
        account: Option<String>,
        /// Base32 secret; prompted for when omitted
        #[arg(long)]
        secret: Option<String>,
    },
    /// Add an account from a QR code image
    Scan {
        /// Image file, or a file holding a data: URI with --capture
        image: PathBuf,
        /// Region to scan as X,Y,W,H in display coordinates
        #[arg(long, value_parser = cli::scan::parse_crop)]
        crop: Option<DisplayRect>,
        /// Size the image was displayed at as WxH (defaults to its natural size)
        #[arg(long, value_parser = cli::scan::parse_display, requires = "crop")]
        display: Option<DisplaySize>,
        /// Treat IMAGE as a saved screen capture data: URI
        #[arg(long)]
        capture: bool,
    },
    /// List stored accounts
    List {
        /// Print as JSON (secrets omitted)
        #[arg(long)]
        json: bool,
    },
    /// Remove an account
    Remove { id: String },
    /// Reorder accounts; every id must be listed once
    Reorder {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn main() {
    // Initialize logging
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Setup => cli::setup::run_setup(),
        Commands::Codes { watch, filter } => cli::codes::run_codes(watch, filter.as_deref()),
        Commands::Add {
            issuer,
            account,
            secret,
        } => cli::entries::run_add(
            issuer.as_deref().unwrap_or_default(),
            account.as_deref().unwrap_or_default(),
            secret,
        ),
        Commands::Scan {
            image,
            crop,
            display,
            capture,
        } => cli::scan::run_scan(image, crop, display, capture),
        Commands::List { json } => cli::entries::run_list(json),
        Commands::Remove { id } => cli::entries::run_remove(&id),
        Commands::Reorder { ids } => cli::entries::run_reorder(&ids),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{}", e);
            if let Some(hint) = cli::storage_hint(&e) {
                eprintln!("{}", hint);
            }
            std::process::exit(cli::exit_code(&e));
        }
    }
}
