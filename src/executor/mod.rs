//! The pooled command executor.
//!
//! Every operation leases one connection, runs exactly one command in the executor's database
//! and hands the connection back when the lease drops, whether the command succeeded or not.

mod hashes;
mod keys;
mod lists;
mod sets;
mod sorted_sets;
mod strings;

pub use keys::{KeyType, Ttl};

use bytes::Bytes;
use redis::{FromRedisValue, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{instrument, warn};

use crate::commands::{Command, KeyCommand};
use crate::config::Config;
use crate::db::Db;
use crate::error::{Error, Result};
use crate::pool::Pool;

#[derive(Clone)]
pub struct Executor {
    pool: Pool,
    db: Db,
    // Serializes pops across every clone of this executor.
    pop_guard: Arc<Mutex<()>>,
}

impl Executor {
    /// An executor on database 0.
    pub fn new(pool: Pool) -> Executor {
        Executor {
            pool,
            db: Db::default(),
            pop_guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn connect(config: &Config) -> Result<Executor> {
        let pool = Pool::from_config(config)?;
        Ok(Executor::new(pool).with_db(config.default_db()?))
    }

    /// The same pool and pop guard, scoped to another database.
    pub fn with_db(&self, db: Db) -> Executor {
        Executor {
            db,
            ..self.clone()
        }
    }

    pub fn db(&self) -> Db {
        self.db
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Runs a single command and converts its reply.
    pub async fn execute<T: FromRedisValue>(&self, cmd: impl Into<Command>) -> Result<T> {
        let value = self.run(cmd.into()).await?;
        redis::from_redis_value(&value).map_err(|e| {
            warn!(error = %e, "unexpected reply type");
            Error::Command(e)
        })
    }

    #[instrument(name = "command", skip_all, fields(db = %self.db, command = cmd.name()))]
    async fn run(&self, cmd: Command) -> Result<Value> {
        let mut lease = match self.pool.lease().await {
            Ok(lease) => lease,
            Err(e) => {
                warn!(error = %e, "no connection");
                return Err(e);
            }
        };

        let res = lease.execute(self.db, cmd).await;
        match res {
            Ok(value) => Ok(value),
            Err(e) if e.is_io_error() => {
                warn!(error = %e, "connection failed, discarding it");
                Pool::discard(lease);
                Err(Error::Connection(e))
            }
            Err(e) => {
                warn!(error = %e, "command failed");
                Err(Error::Command(e))
            }
        }
    }

    /// Gives a key that was just written a timeout, unless `seconds` is zero or less.
    ///
    /// This is a second command on its own lease, so the key is briefly without a timeout.
    async fn expire_written(&self, key: Bytes, seconds: i64) -> Result<()> {
        if seconds > 0 {
            self.execute::<bool>(KeyCommand::Expire { key, seconds }).await?;
        }
        Ok(())
    }

    /// Holds the pop guard while `cmd` runs.
    async fn pop<T: FromRedisValue>(&self, cmd: impl Into<Command>) -> Result<T> {
        let _guard = self.pop_guard.lock().await;
        self.execute(cmd).await
    }
}

fn non_empty<T>(items: &[T], what: &str) -> Result<()> {
    if items.is_empty() {
        return Err(Error::argument(format!("at least one {what} is required")));
    }
    Ok(())
}

fn non_negative(delta: i64) -> Result<()> {
    if delta < 0 {
        return Err(Error::argument(format!(
            "delta must not be negative, got {delta}"
        )));
    }
    Ok(())
}
