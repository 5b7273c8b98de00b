//! # EventGate CLI
//!
//! Thin operator CLI for the EventGate service (SPEC_FULL §1.B): boots the
//! HTTP service in the foreground, validates configuration, and talks to a
//! running instance's Subscription API over HTTP. This is ambient tooling
//! around the HTTP API, not a replacement for it — every command here has
//! a direct HTTP equivalent documented in spec §6.

use clap::{Parser, Subcommand};
use eventgate_service::ServiceConfig;
use std::path::PathBuf;
use tracing::{info, Level};

// ============================================================================
// CLI Structure
// ============================================================================

/// EventGate CLI - operator tooling for the event ingestion and fan-out service
#[derive(Parser)]
#[command(name = "eventgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the EventGate event ingestion and fan-out service")]
pub struct Cli {
    /// Logging level
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    /// Enable JSON structured logging
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Boot the HTTP service in the foreground (same entry point as
    /// `eventgate_service::start_server`).
    Serve {
        /// Override `server.port` from the loaded configuration
        #[arg(short, long)]
        port: Option<u16>,

        /// Override `server.host` from the loaded configuration
        #[arg(long)]
        host: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Subscription management against a running instance's Subscription API
    Subscriptions {
        #[command(subcommand)]
        action: SubscriptionCommands,
    },

    /// Read the current metrics snapshot (`GET /metrics`)
    Metrics {
        /// Base URL of the running instance
        #[arg(long, default_value = "http://localhost:8080")]
        server_url: String,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate configuration (defaults → `config.toml` → `EVENTGATE_*` env)
    /// without starting the service.
    Validate {
        /// Configuration file to validate instead of the default layering
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SubscriptionCommands {
    /// Register a webhook subscription (`POST /zapier/hook`)
    Register {
        /// HTTPS URL, allow-listed hostname, `/hooks` path prefix (spec §4.8)
        url: String,

        #[arg(long, default_value = "http://localhost:8080")]
        server_url: String,
    },

    /// Remove a webhook subscription (`DELETE /zapier/hook`)
    Unregister {
        url: String,

        #[arg(long, default_value = "http://localhost:8080")]
        server_url: String,
    },

    /// Fetch a signed, schema-valid sample event (`GET /zapier/hook`) to
    /// exercise a new webhook handler before real traffic arrives.
    Test {
        #[arg(long, default_value = "http://localhost:8080")]
        server_url: String,
    },
}

// ============================================================================
// CLI Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Configuration(#[from] eventgate_service::ConfigError),

    #[error("service error: {0}")]
    Service(#[from] eventgate_service::ServiceError),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server responded with {status}: {body}")]
    ServerError {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Entry point
// ============================================================================

pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    initialize_logging(&cli);

    match cli.command {
        Commands::Serve { port, host } => execute_serve(port, host).await,
        Commands::Config { action } => execute_config(action).await,
        Commands::Subscriptions { action } => execute_subscriptions(action).await,
        Commands::Metrics { server_url } => execute_metrics(&server_url).await,
        Commands::Completions { shell } => execute_completions(shell),
    }
}

/// Initialize the `tracing` subscriber the same way `eventgate-service`
/// does (`EnvFilter` + either text or JSON `fmt` layer).
fn initialize_logging(cli: &Cli) {
    let level: Level = cli.log_level.parse().unwrap_or(Level::INFO);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if cli.json_logs {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

async fn execute_serve(port: Option<u16>, host: Option<String>) -> Result<(), CliError> {
    let mut config = ServiceConfig::load()?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    info!(host = %config.server.host, port = config.server.port, "starting EventGate from CLI");
    eventgate_service::start_server(config).await?;
    Ok(())
}

async fn execute_config(action: ConfigCommands) -> Result<(), CliError> {
    match action {
        ConfigCommands::Validate { file } => {
            let config = match file {
                Some(path) => load_config_file(&path)?,
                None => ServiceConfig::load()?,
            };
            config.validate()?;
            println!("configuration is valid");
            println!(
                "  server: {}:{}",
                config.server.host, config.server.port
            );
            println!("  bearer tokens configured: {}", config.security.bearer_tokens.len());
            println!("  signing secret configured: {}", config.security.signing_secret.is_some());
            println!("  allowed hostnames: {}", config.security.allowed_hostnames.join(", "));
            Ok(())
        }
    }
}

fn load_config_file(path: &PathBuf) -> Result<ServiceConfig, CliError> {
    let built = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .build()
        .map_err(|e| eventgate_service::ConfigError::Invalid { message: e.to_string() })?;
    let parsed: ServiceConfig = built
        .try_deserialize()
        .map_err(|e| eventgate_service::ConfigError::Invalid { message: e.to_string() })?;
    Ok(parsed)
}

async fn execute_subscriptions(action: SubscriptionCommands) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    match action {
        SubscriptionCommands::Register { url, server_url } => {
            let endpoint = format!("{server_url}/zapier/hook");
            let response = client
                .post(&endpoint)
                .json(&serde_json::json!({ "url": url }))
                .send()
                .await
                .map_err(|source| CliError::Request { url: endpoint, source })?;
            print_response("registered subscription", response).await
        }
        SubscriptionCommands::Unregister { url, server_url } => {
            let endpoint = format!("{server_url}/zapier/hook");
            let response = client
                .delete(&endpoint)
                .json(&serde_json::json!({ "url": url }))
                .send()
                .await
                .map_err(|source| CliError::Request { url: endpoint, source })?;
            print_response("removed subscription", response).await
        }
        SubscriptionCommands::Test { server_url } => {
            let endpoint = format!("{server_url}/zapier/hook");
            let response = client
                .get(&endpoint)
                .send()
                .await
                .map_err(|source| CliError::Request { url: endpoint, source })?;
            print_response("sample event", response).await
        }
    }
}

async fn execute_metrics(server_url: &str) -> Result<(), CliError> {
    let endpoint = format!("{server_url}/metrics");
    let response = reqwest::get(&endpoint)
        .await
        .map_err(|source| CliError::Request { url: endpoint, source })?;
    print_response("metrics snapshot", response).await
}

async fn print_response(label: &str, response: reqwest::Response) -> Result<(), CliError> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_success() {
        println!("{label}:");
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value).unwrap_or(body)),
            Err(_) => println!("{body}"),
        }
        Ok(())
    } else {
        Err(CliError::ServerError { status, body })
    }
}

fn execute_completions(shell: clap_complete::Shell) -> Result<(), CliError> {
    let mut cmd = <Cli as clap::CommandFactory>::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
