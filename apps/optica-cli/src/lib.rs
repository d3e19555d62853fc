//! # Optica CLI Library
//!
//! Command-line front end for the optical shop.
//!
//! ## Module Organization
//! ```text
//! optica_cli/
//! ├── lib.rs          ◄─── You are here (startup, logging, dispatch)
//! ├── cli.rs          ◄─── clap definitions
//! ├── config.rs       ◄─── AppConfig (defaults → TOML → env → --db)
//! ├── error.rs        ◄─── AppError { code, message }
//! ├── output.rs       ◄─── Table / JSON printing
//! └── commands/
//!     ├── mod.rs      ◄─── Dispatch + generic entity helpers
//!     ├── client.rs   ◄─── Clients
//!     ├── product.rs  ◄─── Inventory
//!     ├── supplier.rs ◄─── Suppliers
//!     ├── recipe.rs   ◄─── Prescriptions
//!     ├── ledger.rs   ◄─── sale / purchase / show / void (via Cart)
//!     └── report.rs   ◄─── history / report / sellers
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

use clap::Parser;
use optica_db::Database;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::AppConfig;
use error::AppResult;

/// What every command gets: the open database and how to print.
#[derive(Debug, Clone)]
pub struct Context {
    pub db: Database,
    pub config: AppConfig,
    pub json: bool,
}

/// Runs one command and returns the process exit code.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Command Lifecycle                                 │
/// │                                                                         │
/// │  1. Parse arguments (clap; usage errors exit here)                     │
/// │                                                                         │
/// │  2. Initialize Logging                                                  │
/// │     • tracing-subscriber with env filter, written to stderr            │
/// │     • Default: info,optica=debug,sqlx=warn; override with RUST_LOG    │
/// │                                                                         │
/// │  3. Load Configuration                                                  │
/// │     • defaults → config.toml → OPTICA_* → --db                         │
/// │                                                                         │
/// │  4. Connect to Database                                                 │
/// │     • SQLite with WAL mode, foreign keys on                            │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  5. Dispatch the command                                                │
/// │                                                                         │
/// │  6. Close the pool, map any AppError to an exit status                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    init_tracing();

    let json = cli.json;
    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.code.as_str(), "{}", e.message);
            if json {
                output::print_json_error(&e);
            } else {
                eprintln!("{}", e);
            }
            ExitCode::from(e.code.exit_status())
        }
    }
}

async fn execute(cli: Cli) -> AppResult<()> {
    let config = AppConfig::load(cli.config.as_deref())?.with_database_path(cli.db);
    config.validate()?;

    let db = Database::new(config.db_config()).await?;
    info!(shop = %config.shop.name, "Database ready");

    let ctx = Context {
        db,
        config,
        json: cli.json,
    };

    let result = commands::dispatch(&ctx, cli.command).await;

    ctx.db.close().await;
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=optica_db=trace` - Show trace for the database crate only
/// - Default: `info,optica=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,optica=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
