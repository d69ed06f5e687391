//! Parley server entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads configuration, wires services, and runs the
//! HTTP API until Ctrl+C or SIGTERM.

mod cli;
mod http;
mod state;

use std::path::Path;

use clap::Parser;
use parley_infra::config::{default_config_path, load_app_config, resolve_data_dir};
use parley_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use parley_types::config::AppConfig;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands, ServeArgs, log_filter};
use state::{AppState, Secrets};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(TracingOptions {
        default_filter: log_filter(cli.verbose).to_string(),
        json: cli.json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = load_app_config(&config_path).await;

    let result = match cli.command {
        Commands::Serve(args) => serve(config, args).await,
        Commands::Config => print_config(&config_path, &config, cli.json),
    };

    shutdown_tracing();
    result
}

fn print_config(path: &Path, config: &AppConfig, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("# {}", path.display());
        println!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

/// Apply CLI overrides on top of the file configuration.
fn apply_overrides(config: &mut AppConfig, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = &args.database_url {
        config.database.url = Some(url.clone());
    }
}

async fn serve(mut config: AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);

    let data_dir = resolve_data_dir();
    tokio::fs::create_dir_all(&data_dir).await?;

    let secrets = Secrets {
        gemini_api_key: args.gemini_api_key.map(SecretString::from),
        jwt_secret: args.jwt_secret.map(SecretString::from),
    };

    let shutdown = CancellationToken::new();
    let state = AppState::init(&config, secrets, shutdown.clone()).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Parley listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {} {} (search {})",
        console::style("model").dim(),
        console::style(&config.llm.model).green(),
        if config.search.enabled { "on" } else { "off" }
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let tasks = state.tasks.clone();
    let router = http::router::build_router(state, &config.server.cors_origins);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    // Turns commit their model message after cancellation; wait for them.
    tasks.close();
    tasks.wait().await;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then cancel running turns.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown requested, cancelling running turns");
    shutdown.cancel();
}
