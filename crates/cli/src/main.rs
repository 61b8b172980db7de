//! Binder TCG CLI - catalog seeding, template previews and order management.
//!
//! # Usage
//!
//! ```bash
//! # Reset the catalog to the built-in seed data
//! binder seed
//!
//! # Replace the catalog with products from a YAML file
//! binder seed --file catalog.yaml
//!
//! # Preview a template with sample values
//! binder render order_shipped --var customerName=Ash --var orderId=ORD-1
//!
//! # List orders, optionally by status
//! binder orders list --status pending
//!
//! # Move an order along (emails the customer if the status notifies)
//! binder orders status ORD-1 shipped --note "Tracking 1Z999"
//! ```
//!
//! Every command works on the same data directory as the storefront
//! (`STOREFRONT_DATA_DIR`, overridable with `--data-dir`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "binder")]
#[command(author, version, about = "Binder TCG CLI tools")]
struct Cli {
    /// Storefront data directory (defaults to `STOREFRONT_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load catalog products
    Seed {
        /// YAML file with a list of products; omit to restore the seed catalog
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Render an email template with sample values
    Render {
        /// Template id (e.g. `order_confirmation`, `order_shipped`)
        template: String,

        /// Variable as `name=value`; repeatable
        #[arg(long = "var", value_parser = commands::render::parse_var)]
        vars: Vec<(String, String)>,
    },
    /// Inspect and update orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Only orders with this status
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Change an order's status
    Status {
        /// Order id
        id: String,

        /// New status (`pending`, `paid`, `processing`, `shipped`, ...)
        status: String,

        /// Note recorded in the history and included in the email
        #[arg(short, long)]
        note: Option<String>,
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
    let data_dir = cli.data_dir;
    match cli.command {
        Commands::Seed { file } => commands::seed::catalog(data_dir, file.as_deref())?,
        Commands::Render { template, vars } => commands::render::template(data_dir, &template, vars)?,
        Commands::Orders { action } => match action {
            OrdersAction::List { status } => commands::orders::list(data_dir, status.as_deref())?,
            OrdersAction::Status { id, status, note } => {
                commands::orders::set_status(data_dir, &id, &status, note).await?;
            }
        },
    }
    Ok(())
}
