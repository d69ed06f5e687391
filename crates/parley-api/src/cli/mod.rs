//! CLI definitions for the `parley` binary.
//!
//! Uses clap derive macros. Secrets may come from flags or environment
//! variables; they are never read from the config file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Streaming chat backend with optional web-search grounding.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Config file path (default: {data_dir}/parley.toml).
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve(ServeArgs),

    /// Print the effective configuration and exit.
    Config,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Bind address (overrides `server.host`).
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides `server.port`).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// SQLite URL (overrides `database.url`).
    #[arg(long, env = "PARLEY_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Generation backend API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Token signing secret. A random per-process secret is used when unset.
    #[arg(long, env = "PARLEY_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,
}

/// Default log filter for a `-v` count, used when `RUST_LOG` is unset.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "info,parley=debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "parley", "serve", "--host", "0.0.0.0", "--port", "9000", "-v",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(args.port, Some(9000));
            }
            Commands::Config => panic!("expected serve"),
        }
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0), "info");
        assert_eq!(log_filter(1), "info,parley=debug");
        assert_eq!(log_filter(5), "trace");
    }

    #[test]
    fn test_cli_is_well_formed() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }
}
