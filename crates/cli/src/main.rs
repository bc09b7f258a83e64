//! ShopEase CLI - drive the storefront sync engine from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart of user 42
//! shopease --user 42 cart show
//!
//! # Add two units of product 17, then check out
//! shopease --user 42 cart add 17 --quantity 2
//! shopease --user 42 orders place --address "1 Main St, Springfield"
//!
//! # Save a product for later
//! shopease --user 42 wishlist add 17
//! ```
//!
//! Every invocation signs the user in, waits for the initial load of cart,
//! wishlist and orders, runs one operation and prints the result as JSON.
//! Configuration comes from the environment (see `StorefrontConfig`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use shopease_storefront::{Identity, SessionState, StorefrontConfig, SyncController};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shopease")]
#[command(author, version, about = "ShopEase storefront CLI")]
struct Cli {
    /// ID of the signed-in customer
    #[arg(short, long, env = "SHOPEASE_USER_ID")]
    user: String,

    /// Display name of the signed-in customer
    #[arg(long, default_value = "cli")]
    username: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Inspect or edit the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// List, inspect or place orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        product: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Change the quantity of a cart line (values below 1 become 1)
    Update {
        /// Cart line ID
        item: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        /// Cart line ID
        item: String,
    },
    /// Remove every cart line
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Print the wishlist
    Show,
    /// Save a product
    Add {
        /// Product ID
        product: String,
    },
    /// Unsave a product
    Remove {
        /// Product ID
        product: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Print every order
    List,
    /// Print a single order
    Show {
        /// Order ID
        id: String,
    },
    /// Check out the current cart
    Place {
        /// Shipping address for the order
        #[arg(short, long)]
        address: String,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopease_storefront=info,shopease_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let controller = SyncController::from_config(&config)?;
    controller
        .handle_session(SessionState::authenticated(Identity::new(
            cli.user,
            cli.username,
        )))
        .await;

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&controller)?,
            CartAction::Add { product, quantity } => {
                commands::cart::add(&controller, &product, quantity).await?;
            }
            CartAction::Update { item, quantity } => {
                commands::cart::update(&controller, &item, quantity).await?;
            }
            CartAction::Remove { item } => commands::cart::remove(&controller, &item).await?,
            CartAction::Clear => commands::cart::clear(&controller).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&controller)?,
            WishlistAction::Add { product } => {
                commands::wishlist::add(&controller, &product).await?;
            }
            WishlistAction::Remove { product } => {
                commands::wishlist::remove(&controller, &product).await?;
            }
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&controller).await?,
            OrdersAction::Show { id } => commands::orders::show(&controller, &id).await?,
            OrdersAction::Place { address } => {
                commands::orders::place(&controller, &address).await?;
            }
        },
    }
    Ok(())
}
