use redis::aio::MultiplexedConnection;
use redis::{RedisResult, Value};

use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::config::{Backend, Config};
use crate::db::Db;
use crate::error::{Error, Result};
use crate::store::Store;

/// Knows how to open new connections to the store. Cloned into the pool manager.
#[derive(Clone)]
pub enum Connector {
    Redis(redis::Client),
    Memory(Store),
}

impl Connector {
    /// Validates the URL; no connection is opened until the pool asks for one.
    pub fn redis(url: &str) -> Result<Connector> {
        let client = redis::Client::open(url).map_err(Error::Connection)?;
        Ok(Connector::Redis(client))
    }

    /// A fresh in-process store shared by every connection of this connector.
    pub fn memory() -> Connector {
        Connector::Memory(Store::new())
    }

    pub fn from_config(config: &Config) -> Result<Connector> {
        match config.backend {
            Backend::Redis => Connector::redis(&config.redis_url),
            Backend::Memory => Ok(Connector::memory()),
        }
    }

    pub async fn connect(&self) -> RedisResult<Connection> {
        match self {
            Connector::Redis(client) => {
                let conn = client.get_multiplexed_tokio_connection().await?;
                Ok(Connection::Redis {
                    conn,
                    selected: None,
                })
            }
            Connector::Memory(store) => Ok(Connection::Memory(store.clone())),
        }
    }
}

/// A single pooled connection.
pub enum Connection {
    Redis {
        conn: MultiplexedConnection,
        // The database the server side of this connection currently has selected.
        selected: Option<Db>,
    },
    Memory(Store),
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connection::Redis { selected, .. } => f
                .debug_struct("Redis")
                .field("selected", selected)
                .finish_non_exhaustive(),
            Connection::Memory(_) => f.debug_tuple("Memory").finish(),
        }
    }
}

impl Connection {
    /// Runs `cmd` against database `db`.
    ///
    /// A Redis connection only switches databases when the last command ran somewhere else, and
    /// then sends `SELECT` and the command as one pipeline so nothing can run between them.
    pub async fn execute(&mut self, db: Db, cmd: Command) -> RedisResult<Value> {
        match self {
            Connection::Redis { conn, selected } => {
                if *selected == Some(db) {
                    return cmd.to_cmd().query_async(conn).await;
                }

                // Unknown until the pipeline succeeds.
                *selected = None;

                let (value,): (Value,) = redis::pipe()
                    .cmd("SELECT")
                    .arg(db.index())
                    .ignore()
                    .add_command(cmd.to_cmd())
                    .query_async(conn)
                    .await?;

                *selected = Some(db);
                Ok(value)
            }
            Connection::Memory(store) => exec_local(store, db, cmd),
        }
    }

    pub async fn ping(&mut self) -> RedisResult<()> {
        match self {
            Connection::Redis { conn, .. } => {
                let _: String = redis::cmd("PING").query_async(conn).await?;
                Ok(())
            }
            Connection::Memory(_) => Ok(()),
        }
    }
}

// Kept synchronous so the store lock never lives across an await point.
fn exec_local(store: &Store, db: Db, cmd: Command) -> RedisResult<Value> {
    let mut store = store.lock();
    cmd.exec(&mut store, db)
}
