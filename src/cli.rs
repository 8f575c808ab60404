//! Command-line argument parsing.

use clap::Parser;
use sqlany_adapter::config::ConnectionConfig;
use sqlany_adapter::Result;
use std::path::PathBuf;

/// Resolve a SQL Anywhere connection and print its native connection string.
#[derive(Parser, Debug)]
#[command(name = "sqlany-connstr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Connection URI (e.g., sqlanywhere://host/data/demo.db?ServerName=demo)
    #[arg(value_name = "URI")]
    pub uri: Option<String>,

    /// Server name (defaults to the database name)
    #[arg(short = 'S', long, value_name = "SERVER")]
    pub server: Option<String>,

    /// Database name
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Database user
    #[arg(short = 'U', long, value_name = "USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(long, env = "SQLANY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Network protocol options, e.g. "tcpip(host=db1)"
    #[arg(long, value_name = "COMMLINKS")]
    pub commlinks: Option<String>,

    /// Name reported by the server for this connection
    #[arg(long, value_name = "NAME")]
    pub connection_name: Option<String>,

    /// Client character set
    #[arg(long, value_name = "CHARSET")]
    pub encoding: Option<String>,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the password instead of masking it
    #[arg(long)]
    pub show_password: bool,

    /// Print the resolved connection as JSON
    #[arg(long)]
    pub json: bool,

    /// Log at debug level
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path (custom or default).
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(sqlany_adapter::config::Config::default_path)
    }

    /// Named connection to look up in the config file.
    pub fn named_connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Converts CLI arguments to a ConnectionConfig.
    ///
    /// A password alone does not make a connection; it is merged into
    /// whatever connection is resolved later.
    pub fn to_connection_config(&self) -> Result<Option<ConnectionConfig>> {
        if let Some(uri) = &self.uri {
            return Ok(Some(ConnectionConfig::from_uri(uri)?));
        }

        if self.server.is_some() || self.database.is_some() || self.user.is_some() {
            return Ok(Some(ConnectionConfig {
                server: self.server.clone(),
                database: self.database.clone(),
                user: self.user.clone(),
                password: self.password.clone(),
                commlinks: self.commlinks.clone(),
                connection_name: self.connection_name.clone(),
                encoding: self.encoding.clone(),
                uri: None,
            }));
        }

        Ok(None)
    }

    /// Fields that override a connection loaded from the config file.
    pub fn overrides(&self) -> ConnectionConfig {
        ConnectionConfig {
            password: self.password.clone(),
            commlinks: self.commlinks.clone(),
            connection_name: self.connection_name.clone(),
            encoding: self.encoding.clone(),
            ..Default::default()
        }
    }
}
