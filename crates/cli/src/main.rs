//! EatHub CLI - order from the EatHub menu from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! eathub menu --category pizza
//! eathub item 42
//!
//! # Build a cart and check out
//! eathub cart add 42 --quantity 2
//! eathub cart list
//! eathub checkout --name "Ana" --phone 555-0100
//!
//! # Track an order
//! eathub track EH-1001
//!
//! # Account, rewards and vouchers
//! eathub login -e ana@example.com -p secret
//! eathub rewards status
//! eathub vouchers check WELCOME10 --total 25.00
//! ```
//!
//! # Environment Variables
//!
//! - `EATHUB_API_URL` and the other `EATHUB_*` client settings, see
//!   [`eathub_client::ClientConfig::from_env`]
//! - `EATHUB_STORAGE_PATH` - Cart, session and cache file (default: `./.eathub/storage.json`)
//! - `EATHUB_LOG_FORMAT` - `json` for JSON logs on stderr
//! - `RUST_LOG` - Log filter (default: `eathub_client=info,eathub_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use eathub_client::config::get_env_or_default;
use eathub_client::storage::FileStorage;
use eathub_client::{ClientConfig, EatHub};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use commands::CliError;

const DEFAULT_STORAGE_PATH: &str = "./.eathub/storage.json";

#[derive(Parser)]
#[command(name = "eathub")]
#[command(author, version, about = "EatHub from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the menu
    Menu {
        /// Only featured items
        #[arg(long)]
        featured: bool,

        /// Only items in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Serve from the cache when fresh instead of always refetching
        #[arg(long)]
        cached: bool,
    },
    /// Show one menu item
    Item {
        id: String,
    },
    /// List menu categories
    Categories,
    /// Show the current announcement
    Announcement,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart
    Checkout(commands::cart::CheckoutArgs),
    /// Show an order's status
    Track {
        order_number: String,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Sign in to the admin dashboard instead
        #[arg(long)]
        admin: bool,
    },
    /// Create an account and sign in
    Signup {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        phone: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show who is signed in, checking the session with the server
    Whoami,
    /// Loyalty points
    Rewards {
        #[command(subcommand)]
        action: RewardsAction,
    },
    /// Vouchers
    Vouchers {
        #[command(subcommand)]
        action: VouchersAction,
    },
    /// Send feedback
    Feedback {
        /// 1 to 5
        #[arg(short, long)]
        rating: u8,

        #[arg(short, long)]
        message: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },
    /// Manage the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a menu item
    Add {
        id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        id: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        id: String,
    },
    /// Show the cart
    List,
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum RewardsAction {
    /// Points balance and available rewards
    Status,
    /// Redeem a reward
    Redeem {
        reward_id: String,
    },
}

#[derive(Subcommand)]
enum VouchersAction {
    /// Vouchers available to you
    List,
    /// Check a code against an order total (default: the cart total)
    Check {
        code: String,

        #[arg(short, long)]
        total: Option<String>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Drop every cached response
    Clear,
}

#[tokio::main]
async fn main() {
    // Before tracing, so RUST_LOG can come from .env
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Command failed");
        commands::report(&e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Logs go to stderr; stdout is for command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "eathub_client=info,eathub_cli=info".into());

    let json = get_env_or_default("EATHUB_LOG_FORMAT", "text").eq_ignore_ascii_case("json");
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn connect() -> Result<EatHub, CliError> {
    let config = ClientConfig::from_env().map_err(eathub_client::Error::from)?;
    let path = get_env_or_default("EATHUB_STORAGE_PATH", DEFAULT_STORAGE_PATH);
    let storage = FileStorage::open(&path)?;
    Ok(EatHub::new(config, Arc::new(storage))?)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let hub = connect()?;

    match cli.command {
        Commands::Menu {
            featured,
            category,
            search,
            cached,
        } => commands::menu::list(&hub, featured, category, search, cached).await?,
        Commands::Item { id } => commands::menu::item(&hub, &id).await?,
        Commands::Categories => commands::menu::categories(&hub).await?,
        Commands::Announcement => commands::menu::announcement(&hub).await?,
        Commands::Cart { action } => match action {
            CartAction::Add { id, quantity } => commands::cart::add(&hub, &id, quantity).await?,
            CartAction::Set { id, quantity } => commands::cart::set(&hub, &id, quantity),
            CartAction::Remove { id } => commands::cart::remove(&hub, &id),
            CartAction::List => commands::cart::list(&hub),
            CartAction::Clear => commands::cart::clear(&hub),
        },
        Commands::Checkout(args) => commands::cart::checkout(&hub, args).await?,
        Commands::Track { order_number } => commands::cart::track(&hub, &order_number).await?,
        Commands::Login {
            email,
            password,
            admin,
        } => commands::account::login(&hub, &email, &password, admin).await?,
        Commands::Signup {
            name,
            email,
            password,
            phone,
        } => commands::account::signup(&hub, name, &email, password, phone).await?,
        Commands::Logout => commands::account::logout(&hub),
        Commands::Whoami => commands::account::whoami(&hub).await?,
        Commands::Rewards { action } => match action {
            RewardsAction::Status => commands::rewards::status(&hub).await?,
            RewardsAction::Redeem { reward_id } => {
                commands::rewards::redeem(&hub, &reward_id).await?;
            }
        },
        Commands::Vouchers { action } => match action {
            VouchersAction::List => commands::rewards::vouchers(&hub).await?,
            VouchersAction::Check { code, total } => {
                commands::rewards::check_voucher(&hub, &code, total.as_deref()).await?;
            }
        },
        Commands::Feedback {
            rating,
            message,
            name,
            email,
        } => commands::feedback::submit(&hub, rating, message, name, email.as_deref()).await?,
        Commands::Cache { action } => match action {
            CacheAction::Clear => {
                hub.cache().clear_all();
                tracing::info!("Cache cleared");
            }
        },
    }
    Ok(())
}
