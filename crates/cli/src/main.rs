//! Pantry Palace CLI - browse the catalog, manage the cart, administer
//! products.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! pantry products --category dairy
//! pantry featured
//! pantry product 64f0c1a2b3
//!
//! # Sign in (the session is saved for later commands)
//! pantry login -e asha@example.com
//!
//! # Cart
//! pantry cart add 64f0c1a2b3 --qty 2
//! pantry cart set 1 5
//! pantry cart edit
//!
//! # Admin
//! pantry admin create -n "Greek Yogurt" -c dairy -p 6.49 -d "Creamy" --image yogurt.jpg
//! ```
//!
//! # Environment Variables
//!
//! See `pantry_storefront::config` for the full list. `RUST_LOG` controls
//! log output, which goes to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pantry_storefront::{AppState, PantryConfig};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "pantry")]
#[command(author, version, about = "Pantry Palace grocery storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Only this category (case-insensitive)
        #[arg(short, long)]
        category: Option<String>,

        /// Search name, category and description
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show the featured products
    Featured,
    /// List product categories
    Categories,
    /// Show one product
    Product {
        /// Product ID
        id: String,
    },
    /// Log in and save the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[arg(short, long, env = "PANTRY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Password confirmation (prompted for when omitted)
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the product catalog
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        /// Product ID
        product_id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        qty: i64,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        /// Line number (as shown by `cart show`) or line ID
        line: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        qty: i64,
    },
    /// Remove a line
    Remove {
        /// Line number (as shown by `cart show`) or line ID
        line: String,
    },
    /// Empty the cart
    Clear,
    /// Edit quantities interactively and commit when ready
    Edit,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a product
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        category: String,

        /// Price in rupees, e.g. 6.49
        #[arg(short, long)]
        price: Decimal,

        #[arg(short, long)]
        description: String,

        /// Image file to upload
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// Update a product; omitted fields keep their current values
    Update {
        /// Product ID
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        price: Option<Decimal>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// Delete a product
    Delete {
        /// Product ID
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &PantryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match PantryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pantry_storefront=info,pantry=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: PantryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(config).await?;

    match cli.command {
        Commands::Products { category, search } => {
            commands::catalog::products(&state, category, search).await?;
        }
        Commands::Featured => commands::catalog::featured(&state).await?,
        Commands::Categories => commands::catalog::categories(&state).await?,
        Commands::Product { id } => commands::catalog::product(&state, &id).await?,
        Commands::Login { email, password } => {
            commands::account::login(&state, &email, password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            commands::account::register(&state, &name, &email, password, confirm_password)
                .await?;
        }
        Commands::Logout => commands::account::logout(&state).await?,
        Commands::Whoami => commands::account::whoami(&state).await,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state).await?,
            CartAction::Add { product_id, qty } => {
                commands::cart::add(&state, &product_id, qty).await?;
            }
            CartAction::Set { line, qty } => commands::cart::set(&state, &line, qty).await?,
            CartAction::Remove { line } => commands::cart::remove(&state, &line).await?,
            CartAction::Clear => commands::cart::clear(&state).await?,
            CartAction::Edit => commands::cart::edit(&state).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                name,
                category,
                price,
                description,
                image,
            } => {
                let form = commands::admin::ProductForm {
                    name: Some(name),
                    category: Some(category),
                    price: Some(price),
                    description: Some(description),
                    image,
                };
                commands::admin::create(&state, form).await?;
            }
            AdminAction::Update {
                id,
                name,
                category,
                price,
                description,
                image,
            } => {
                let form = commands::admin::ProductForm {
                    name,
                    category,
                    price,
                    description,
                    image,
                };
                commands::admin::update(&state, &id, form).await?;
            }
            AdminAction::Delete { id } => commands::admin::delete(&state, &id).await?,
        },
    }
    Ok(())
}
