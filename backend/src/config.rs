//! Process configuration, read once at startup from flags and environment.

use std::fmt;
use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

/// Default Redis port.
pub const DEFAULT_DB_PORT: u16 = 6379;

/// Which document store backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Redis,
    /// In-process store; contents are lost on exit.
    Memory,
}

#[derive(Parser, Clone)]
#[command(name = "listy", version, about = "A minimal to-do list web application")]
pub struct Config {
    /// Address to bind to
    #[arg(long, short = 'b', env = "LISTY_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Document store backing the task list
    #[arg(long, env = "LISTY_BACKEND", value_enum, default_value_t = Backend::Redis)]
    pub backend: Backend,

    /// Database host
    #[arg(long, env = "RDB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// Database port
    #[arg(long, env = "RDB_PORT", default_value_t = DEFAULT_DB_PORT)]
    pub db_port: u16,

    /// Database name
    #[arg(long, env = "LISTY_DB", default_value = "listy")]
    pub db_name: String,

    /// Database user
    #[arg(long, env = "RDB_USER")]
    pub db_user: Option<String>,

    /// Database password
    #[arg(long, env = "RDB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Enable debug logging (unless RUST_LOG is set)
    #[arg(long)]
    pub debug: bool,
}

impl Config {
    /// Connection URL for the Redis client. Credentials are percent-encoded.
    pub fn redis_url(&self) -> String {
        let credentials = match (&self.db_user, &self.db_password) {
            (Some(user), Some(password)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(password)
            ),
            (None, Some(password)) => format!(":{}@", urlencoding::encode(password)),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            (None, None) => String::new(),
        };
        format!("redis://{}{}:{}", credentials, self.db_host, self.db_port)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind", &self.bind)
            .field("backend", &self.backend)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &self.db_password.as_ref().map(|_| "<redacted>"))
            .field("debug", &self.debug)
            .finish()
    }
}
