use clap::{Parser, ValueEnum};
use std::net::IpAddr;
use std::time::Duration;

use crate::db::Db;
use crate::error::Result;

const PORT: u16 = 8080;
const POOL_SIZE: usize = 8;
const POOL_TIMEOUT_MS: u64 = 2000;

/// Where pooled connections come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// A Redis server reached at `--redis-url`.
    Redis,
    /// An in-process store, nothing survives a restart.
    Memory,
}

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// The address to listen on
    #[arg(long, env = "KVGATE_BIND", default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// The port to listen on
    #[arg(short, long, env = "KVGATE_PORT", default_value_t = PORT)]
    pub port: u16,

    /// Which store backs the connection pool
    #[arg(long, env = "KVGATE_BACKEND", value_enum, default_value_t = Backend::Redis)]
    pub backend: Backend,

    /// Redis connection URL, used by the redis backend
    #[arg(long, env = "KVGATE_REDIS_URL", default_value = "redis://127.0.0.1:6379/")]
    pub redis_url: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "KVGATE_POOL_SIZE", default_value_t = POOL_SIZE)]
    pub pool_size: usize,

    /// How long a command waits for a free connection, in milliseconds. 0 waits forever
    #[arg(long, env = "KVGATE_POOL_TIMEOUT_MS", default_value_t = POOL_TIMEOUT_MS)]
    pub pool_timeout_ms: u64,

    /// Database used when a request does not name one
    #[arg(
        long,
        env = "KVGATE_DEFAULT_DB",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..16)
    )]
    pub default_db: u8,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "KVGATE_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Configuration for an in-process store, mostly useful in tests.
    pub fn memory(pool_size: usize) -> Config {
        Config {
            bind: IpAddr::from([127, 0, 0, 1]),
            port: PORT,
            backend: Backend::Memory,
            redis_url: String::new(),
            pool_size,
            pool_timeout_ms: POOL_TIMEOUT_MS,
            default_db: 0,
            log_level: "info".to_string(),
        }
    }

    pub fn pool_timeout(&self) -> Option<Duration> {
        match self.pool_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn default_db(&self) -> Result<Db> {
        Db::new(self.default_db)
    }
}
