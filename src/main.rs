//! CLI for popreg
//!
//! Subcommands:
//! - `serve`: run the WebSocket registry server
//! - `token`: print a signed caller token for an identity

use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

use clap::Parser;
use tracing::{error, info};

use popreg::config::{Settings, load_config};
use popreg::persistence::Persistence;
use popreg::registry::Registry;
use popreg::transport::auth::{issue_token, ttl_from_hours};
use popreg::transport::start_websocket_server;
use popreg::utils::error::{Error, Result};
use popreg::utils::logging;

#[derive(Parser)]
#[command(name = "popreg")]
enum Command {
    /// Start the WebSocket registry server
    Serve,
    /// Print a token that authenticates as IDENTITY
    Token {
        #[arg(long)]
        identity: String,
        /// Token lifetime in hours
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cmd = Command::parse();

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.logging.level);

    if let Err(e) = settings.server.validate() {
        error!("Refusing to start: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cmd {
        Command::Serve => run_server(settings).await,
        Command::Token {
            identity,
            ttl_hours,
        } => print_token(&settings, &identity, ttl_hours),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn open_registry(settings: &Settings) -> Result<Registry> {
    let admin = settings.registry.admin.clone();
    match &settings.registry.data_dir {
        Some(dir) => {
            let persistence = Persistence::open(dir)?;
            Ok(Registry::with_persistence(admin, persistence)?)
        }
        None => {
            info!("no registry.data_dir configured, state is kept in memory only");
            Ok(Registry::new(admin))
        }
    }
}

async fn run_server(settings: Settings) -> Result<()> {
    let registry = Arc::new(Mutex::new(open_registry(&settings)?));
    info!(admin = %settings.registry.admin, "registry ready");

    let outcome = tokio::select! {
        res = start_websocket_server(registry.clone(), settings) => {
            error!("WebSocket server exited unexpectedly.");
            res.map_err(Error::from)
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    };

    // Flush even when the server failed, then report the first error.
    let flushed = registry
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .flush();
    outcome?;
    flushed?;
    Ok(())
}

fn print_token(settings: &Settings, identity: &str, ttl_hours: i64) -> Result<()> {
    let ttl = ttl_from_hours(ttl_hours)?;
    let token = issue_token(&settings.server.jwt_secret, identity, ttl)?;
    println!("{token}");
    Ok(())
}
