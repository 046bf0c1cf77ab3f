//! Atelier CLI - database migrations and order management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront and session migrations
//! atelier migrate
//!
//! # Inspect orders
//! atelier orders list --query tanaka --limit 10
//! atelier orders show ART-LX2K9Q1A-7F3Z
//!
//! # Change an order's status
//! atelier orders set-status ART-LX2K9Q1A-7F3Z --status shipped --payment-status paid
//!
//! # Load demo orders
//! atelier seed orders demos/orders.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Atelier gallery CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (orders and sessions)
    Migrate,
    /// Inspect and update orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Seed the database with demo data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Filter by order id, customer name or email (case-insensitive)
        #[arg(short, long)]
        query: Option<String>,

        /// Maximum number of orders to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one order as JSON
    Show {
        /// Order id, e.g. ART-LX2K9Q1A-7F3Z
        order_id: String,
    },
    /// Change status and/or payment status
    SetStatus {
        /// Order id
        order_id: String,

        /// pending, confirmed, processing, shipped, delivered, cancelled
        #[arg(short, long)]
        status: Option<String>,

        /// pending, paid, failed, refunded
        #[arg(short, long)]
        payment_status: Option<String>,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert demo orders from a YAML file
    Orders {
        /// Path to the YAML file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_cli=info,atelier_storefront=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Orders { action } => match action {
            OrdersAction::List { query, limit } => commands::orders::list(query, limit).await?,
            OrdersAction::Show { order_id } => commands::orders::show(&order_id).await?,
            OrdersAction::SetStatus {
                order_id,
                status,
                payment_status,
            } => commands::orders::set_status(&order_id, status, payment_status).await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Orders { file } => commands::seed::orders(&file).await?,
        },
    }
    Ok(())
}
