mod config;
mod logging;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;

use agora_auth::{StaticTokenValidator, TokenValidator, auth_required};
use anyhow::{Context, Result};
use axum::middleware;
use clap::{Parser, Subcommand};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use user_preferences::UserPreferencesModule;
use user_preferences_sdk::NewIdentity;

use crate::config::{AppConfig, SeedIdentity};

/// Agora Server - forum user preferences and capability checks
#[derive(Parser)]
#[command(name = "agora-server")]
#[command(about = "Agora Server - forum user preferences and capability checks")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (AGORA__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose);

    logging::init_logging(&config.logging);
    tracing::info!("Agora Server starting");

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_pretty_json()?);
        return Ok(());
    }

    // Dispatch subcommands (default: run)
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    println!("Configuration is valid");
    println!("{}", config.to_pretty_json()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    let module = UserPreferencesModule::in_memory(&config.user_preferences)?;
    seed_identities(&module, &config.seed).await?;

    let validator: Arc<dyn TokenValidator> =
        Arc::new(StaticTokenValidator::from_config(&config.auth));
    let app = module
        .router()
        .layer(middleware::from_fn_with_state(validator, auth_required))
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        // outermost: every request carries an x-request-id that problem bodies echo
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_shutdown())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Agora Server stopped");
    Ok(())
}

async fn seed_identities(module: &UserPreferencesModule, seeds: &[SeedIdentity]) -> Result<()> {
    for seed in seeds {
        let new = NewIdentity {
            id: seed.id,
            username: seed.username.clone(),
            email: seed.email.clone(),
        };
        let profile = module
            .seed_identity(new, seed.role)
            .await
            .with_context(|| format!("failed to seed identity '{}'", seed.username))?;
        tracing::info!(id = %profile.id, username = %profile.username, role = %seed.role, "identity seeded");
    }
    Ok(())
}
