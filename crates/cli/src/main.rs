//! Shop Bridge CLI - Operator tools for the OAuth install broker.
//!
//! # Usage
//!
//! ```bash
//! # Fetch an Admin API resource for an installed shop
//! shop-bridge relay --shop my-shop.myshopify.com products.json
//!
//! # Print a signed callback query string
//! shop-bridge sign shop=my-shop.myshopify.com code=abc123
//! ```
//!
//! # Commands
//!
//! - `relay` - GET an Admin API resource with the stored token, print the JSON
//! - `sign` - Sign `key=value` pairs like a Shopify OAuth redirect
//!
//! Logs go to stderr so stdout carries only command output.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shop-bridge")]
#[command(author, version, about = "Shop Bridge CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an Admin API resource for an installed shop
    Relay {
        /// Shop domain (e.g., my-shop.myshopify.com)
        #[arg(short, long)]
        shop: String,

        /// Path under /admin/api/{version}/ (e.g., products.json)
        resource_path: String,
    },
    /// Print a signed OAuth callback query string
    Sign {
        /// Environment variable holding the app client secret
        #[arg(long, default_value = "SHOPIFY_API_SECRET")]
        secret_env: String,

        /// Query parameters as key=value
        #[arg(required = true)]
        params: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shop_bridge=info,shop_bridge_server=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Relay {
            shop,
            resource_path,
        } => {
            let body = commands::relay::fetch(&shop, &resource_path).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::Sign { secret_env, params } => {
            println!("{}", commands::sign::from_env(&params, &secret_env)?);
        }
    }
    Ok(())
}
