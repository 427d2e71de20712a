use deadpool::managed::{self, Metrics, PoolError, RecycleError, RecycleResult};
use deadpool::Runtime;
use redis::RedisError;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::connection::{Connection, Connector};
use crate::error::{Error, Result};

pub struct Manager {
    connector: Connector,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager").finish_non_exhaustive()
    }
}

impl managed::Manager for Manager {
    type Type = Connection;
    type Error = RedisError;

    async fn create(&self) -> std::result::Result<Connection, RedisError> {
        debug!("opening a new pooled connection");
        self.connector.connect().await
    }

    async fn recycle(&self, conn: &mut Connection, _: &Metrics) -> RecycleResult<RedisError> {
        conn.ping().await.map_err(RecycleError::Backend)
    }
}

/// A connection leased from the pool. Dropping it hands the connection back.
pub type Lease = managed::Object<Manager>;

/// Bounded set of connections shared by every clone of an executor.
#[derive(Clone)]
pub struct Pool {
    inner: managed::Pool<Manager>,
}

impl Pool {
    /// `wait_timeout` bounds how long [`Pool::lease`] waits for a free connection, `None` waits
    /// forever.
    pub fn new(
        connector: Connector,
        max_size: usize,
        wait_timeout: Option<Duration>,
    ) -> Result<Pool> {
        if max_size == 0 {
            return Err(Error::argument("pool size must be at least 1"));
        }

        let inner = managed::Pool::builder(Manager { connector })
            .max_size(max_size)
            .wait_timeout(wait_timeout)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| Error::Pool(e.to_string()))?;

        Ok(Pool { inner })
    }

    pub fn from_config(config: &Config) -> Result<Pool> {
        let connector = Connector::from_config(config)?;
        Pool::new(connector, config.pool_size, config.pool_timeout())
    }

    pub async fn lease(&self) -> Result<Lease> {
        self.inner.get().await.map_err(|e| match e {
            PoolError::Timeout(_) => Error::PoolExhausted,
            PoolError::Backend(e) => Error::Connection(e),
            e => Error::Pool(e.to_string()),
        })
    }

    /// Drops the connection instead of returning it, for connections left in an unknown state.
    pub fn discard(lease: Lease) {
        drop(Lease::take(lease));
    }

    pub fn status(&self) -> managed::Status {
        self.inner.status()
    }
}
