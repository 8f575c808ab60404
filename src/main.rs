//! sqlany-connstr - resolve a SQL Anywhere connection and print its native
//! connection string.

mod cli;

use anyhow::Context;
use cli::Cli;
use serde::Serialize;
use sqlany_adapter::config::{redact_connection_string, AdapterOptions, Config, ConnectionConfig};
use sqlany_adapter::logging;
use sqlany_adapter::AdapterError;
use tracing::{error, info};

/// JSON shape printed with `--json`.
#[derive(Debug, Serialize)]
struct ResolvedConnection<'a> {
    display: String,
    connection_string: String,
    adapter: &'a AdapterOptions,
}

fn main() {
    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        match e.downcast_ref::<AdapterError>() {
            Some(adapter_error) => error!("{}: {}", adapter_error.category(), adapter_error),
            None => error!("{e:#}"),
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connection = resolve_connection(cli, &config)?;
    let conn_str = connection.to_connection_string()?;
    let printed = if cli.show_password {
        conn_str
    } else {
        redact_connection_string(&conn_str)
    };

    if cli.json {
        let resolved = ResolvedConnection {
            display: connection.display_string(),
            connection_string: printed,
            adapter: &config.adapter,
        };
        let json = serde_json::to_string_pretty(&resolved).context("serializing connection")?;
        println!("{json}");
    } else {
        println!("{printed}");
    }

    Ok(())
}

/// Resolves the final connection configuration with precedence:
/// 1. CLI arguments (highest)
/// 2. Named connection from config
/// 3. Default connection from config
fn resolve_connection(cli: &Cli, config: &Config) -> anyhow::Result<ConnectionConfig> {
    if let Some(connection) = cli.to_connection_config()? {
        return Ok(connection);
    }

    let mut connection = match cli.named_connection() {
        Some(name) => config.get_connection(Some(name)).cloned().ok_or_else(|| {
            AdapterError::config(format!("Connection '{name}' not found in config file"))
        })?,
        None => config.get_connection(None).cloned().ok_or_else(|| {
            AdapterError::config("No connection configured. Use --help for usage information.")
        })?,
    };

    if connection.uri.is_none() {
        connection.merge(&cli.overrides());
    }
    Ok(connection)
}
