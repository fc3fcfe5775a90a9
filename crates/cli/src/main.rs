//! DummyMart - terminal storefront for the DummyJSON catalog.
//!
//! # Usage
//!
//! ```bash
//! # Interactive shop (default)
//! dummymart
//!
//! # Show one product and related items
//! dummymart product 12
//!
//! # Send a contact message
//! dummymart contact --name "Jane Doe" --email jane@example.com --message "Hello"
//! ```
//!
//! Configuration comes from the environment (see
//! [`dummymart_storefront::config`]); `--storage` and `--api-url` override
//! the corresponding variables.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use dummymart_core::ProductId;
use dummymart_storefront::config::{StorefrontConfig, parse_base_url};
use dummymart_storefront::error::AppError;
use dummymart_storefront::forms::ContactForm;
use dummymart_storefront::state::Storefront;

mod command;
mod render;
mod shell;

#[derive(Parser)]
#[command(name = "dummymart")]
#[command(author, version, about = "DummyMart terminal storefront")]
struct Cli {
    /// Local storage file (overrides `DUMMYMART_STORAGE_PATH`)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// DummyJSON base URL (overrides `DUMMYMART_API_URL`)
    #[arg(long, global = true, value_parser = parse_base_url)]
    api_url: Option<Url>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog interactively
    Shop,
    /// Show a product and related items
    Product {
        /// Product ID
        id: ProductId,
    },
    /// Send a message to the shop
    Contact {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        message: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
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

/// Logs go to stderr so they never interleave with shop output on stdout.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dummymart_storefront=info,dummymart_cli=info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<StorefrontConfig, AppError> {
    let mut config = StorefrontConfig::from_env()?;
    if let Some(path) = &cli.storage {
        config.storage_path.clone_from(path);
    }
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.json_logs);

    match run(cli.command.unwrap_or(Commands::Shop), config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            eprintln!("{}", e.notice());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: StorefrontConfig) -> Result<(), AppError> {
    let store = Storefront::new(config)?;

    match command {
        Commands::Shop => shell::run(store).await,
        Commands::Product { id } => {
            let product = store.product(id).await?;
            let related = store.related(&product).await?;
            println!("{}", render::product_details(&product, &related));
            Ok(())
        }
        Commands::Contact {
            name,
            email,
            message,
        } => {
            store
                .submit_contact(&ContactForm {
                    name,
                    email,
                    message,
                })
                .await?;
            println!("{}", render::CONTACT_SENT);
            Ok(())
        }
    }
}
