//! Configuration management.
//!
//! Handles loading configuration from TOML files, with support for named
//! connections, and builds the native connection string for a connection.

use crate::db::ApplicationTimezone;
use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use url::Url;

/// User applied when a structured config names none.
pub const DEFAULT_USER: &str = "dba";

/// Password applied when a structured config names none.
pub const DEFAULT_PASSWORD: &str = "sql";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database-scope adapter options.
    #[serde(default)]
    pub adapter: AdapterOptions,

    /// Named database connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

/// Database-scope options shared by every connection of a `Database`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterOptions {
    /// Timezone timestamps are interpreted in. `utc` also disables the
    /// server's time zone adjustment on every new connection.
    #[serde(default)]
    pub application_timezone: ApplicationTimezone,

    /// Database-scope switch for converting small integers to booleans.
    #[serde(default = "default_convert_smallint_to_bool")]
    pub convert_smallint_to_bool: bool,
}

fn default_convert_smallint_to_bool() -> bool {
    true
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            application_timezone: ApplicationTimezone::default(),
            convert_smallint_to_bool: default_convert_smallint_to_bool(),
        }
    }
}

/// Database connection configuration.
///
/// Either `uri` or the structured fields are used, never both.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server name; defaults to the database name.
    pub server: Option<String>,

    pub database: Option<String>,

    pub user: Option<String>,

    /// Password (not recommended to store in config).
    pub password: Option<String>,

    /// Network protocol options, e.g. `tcpip(host=db1)`.
    pub commlinks: Option<String>,

    pub connection_name: Option<String>,

    /// Client character set.
    pub encoding: Option<String>,

    /// Pre-built URI, e.g. `sqlanywhere://host/path/demo.db?ServerName=demo;UID=dba`.
    pub uri: Option<String>,
}

impl ConnectionConfig {
    /// Creates a URI-form connection config.
    pub fn from_uri(uri: &str) -> Result<Self> {
        Url::parse(uri).map_err(|e| AdapterError::config(format!("Invalid uri: {e}")))?;
        Ok(Self {
            uri: Some(uri.to_string()),
            ..Default::default()
        })
    }

    fn has_structured_fields(&self) -> bool {
        self.server.is_some()
            || self.database.is_some()
            || self.user.is_some()
            || self.password.is_some()
            || self.commlinks.is_some()
            || self.connection_name.is_some()
            || self.encoding.is_some()
    }

    /// Checks that the config describes exactly one connection form.
    pub fn validate(&self) -> Result<()> {
        match &self.uri {
            Some(_) if self.has_structured_fields() => Err(AdapterError::config(
                "uri cannot be combined with server, database, user, password, commlinks, connection_name or encoding",
            )),
            Some(_) => Ok(()),
            None if self.database.is_none() => {
                Err(AdapterError::config("Database name or uri is required"))
            }
            None => Ok(()),
        }
    }

    /// Builds the native connection string.
    pub fn to_connection_string(&self) -> Result<String> {
        self.validate()?;
        match &self.uri {
            Some(uri) => uri_connection_string(uri),
            None => Ok(self.structured_connection_string()),
        }
    }

    fn structured_connection_string(&self) -> String {
        let database = self.database.as_deref().unwrap_or_default();
        let server = self.server.as_deref().unwrap_or(database);
        let user = self.user.as_deref().unwrap_or(DEFAULT_USER);
        let password = self.password.as_deref().unwrap_or(DEFAULT_PASSWORD);

        let mut conn_str = format!(
            "ServerName={server};DatabaseName={database};UserID={user};Password={password};"
        );
        if let Some(commlinks) = &self.commlinks {
            conn_str.push_str(&format!("CommLinks={commlinks};"));
        }
        if let Some(name) = &self.connection_name {
            conn_str.push_str(&format!("ConnectionName={name};"));
        }
        if let Some(encoding) = &self.encoding {
            conn_str.push_str(&format!("CharSet={encoding};"));
        }
        // Keep the server from dropping idle sessions.
        conn_str.push_str("Idle=0");
        conn_str
    }

    /// Merges another config into this one, with the other taking precedence.
    pub fn merge(&mut self, other: &ConnectionConfig) {
        let fields = [
            (&mut self.server, &other.server),
            (&mut self.database, &other.database),
            (&mut self.user, &other.user),
            (&mut self.password, &other.password),
            (&mut self.commlinks, &other.commlinks),
            (&mut self.connection_name, &other.connection_name),
            (&mut self.encoding, &other.encoding),
            (&mut self.uri, &other.uri),
        ];
        for (mine, theirs) in fields {
            if theirs.is_some() {
                *mine = theirs.clone();
            }
        }
    }

    /// Returns a display-safe string (no password) for logs and output.
    pub fn display_string(&self) -> String {
        if let Some(uri) = &self.uri {
            return match Url::parse(uri) {
                Ok(url) => format!("{}://{}{}", url.scheme(), url.host_str().unwrap_or(""), url.path()),
                Err(_) => "<invalid uri>".to_string(),
            };
        }
        let database = self.database.as_deref().unwrap_or("unknown");
        let server = self.server.as_deref().unwrap_or(database);
        let user = self.user.as_deref().unwrap_or(DEFAULT_USER);
        format!("{user}@{server}/{database}")
    }
}

/// `DBN=<file name of the uri path>;` followed by the raw query string.
fn uri_connection_string(uri: &str) -> Result<String> {
    let url = Url::parse(uri).map_err(|e| AdapterError::config(format!("Invalid uri: {e}")))?;

    let mut conn_str = String::new();
    if let Some(file) = Path::new(url.path()).file_name() {
        conn_str.push_str("DBN=");
        conn_str.push_str(&file.to_string_lossy());
        conn_str.push(';');
    }
    if let Some(query) = url.query() {
        conn_str.push_str(query);
    }
    Ok(conn_str)
}

/// Replaces the value of every `Password=`/`PWD=` pair with `***`.
pub fn redact_connection_string(conn_str: &str) -> String {
    conn_str
        .split(';')
        .map(|pair| match pair.split_once('=') {
            Some((key, _))
                if key.eq_ignore_ascii_case("password") || key.eq_ignore_ascii_case("pwd") =>
            {
                format!("{key}=***")
            }
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqlany-adapter")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AdapterError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AdapterError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named connection, or the default connection if name is None.
    pub fn get_connection(&self, name: Option<&str>) -> Option<&ConnectionConfig> {
        let key = name.unwrap_or("default");
        self.connections.get(key)
    }
}
