use redis::{ErrorKind, FromRedisValue, RedisError, RedisResult, Value};
use std::time::Duration;
use strum_macros::{Display, EnumString};

use crate::commands::{bytes, KeyCommand, SortOptions};
use crate::error::Result;
use crate::executor::{non_empty, Executor};

/// Time to live of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// There is no such key.
    Missing,
    /// The key never expires.
    Persistent,
    Expires(Duration),
}

impl FromRedisValue for Ttl {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        match i64::from_redis_value(v)? {
            -2 => Ok(Ttl::Missing),
            -1 => Ok(Ttl::Persistent),
            secs if secs >= 0 => Ok(Ttl::Expires(Duration::from_secs(secs as u64))),
            secs => Err(RedisError::from((
                ErrorKind::TypeError,
                "Invalid TTL reply",
                secs.to_string(),
            ))),
        }
    }
}

/// What `TYPE` reports for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum KeyType {
    None,
    String,
    List,
    Set,
    ZSet,
    Hash,
    Stream,
}

impl FromRedisValue for KeyType {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let name = String::from_redis_value(v)?;
        name.parse().map_err(|_| {
            RedisError::from((ErrorKind::TypeError, "Unknown key type", name.clone()))
        })
    }
}

impl Executor {
    pub async fn exists(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        let keys = vec![bytes(key)];
        self.execute(KeyCommand::Exists { keys }).await
    }

    /// Returns how many of `keys` were deleted.
    pub async fn del<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<u64> {
        non_empty(keys, "key")?;
        let keys = keys.iter().map(bytes).collect();
        self.execute(KeyCommand::Del { keys }).await
    }

    /// A timeout of zero or less deletes the key. `false` when there is no such key.
    pub async fn expire(&self, key: impl AsRef<[u8]>, seconds: i64) -> Result<bool> {
        let key = bytes(key);
        self.execute(KeyCommand::Expire { key, seconds }).await
    }

    pub async fn ttl(&self, key: impl AsRef<[u8]>) -> Result<Ttl> {
        self.execute(KeyCommand::Ttl { key: bytes(key) }).await
    }

    pub async fn persist(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(KeyCommand::Persist { key: bytes(key) }).await
    }

    /// Keys matching a glob-style pattern.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = pattern.to_string();
        self.execute(KeyCommand::Keys { pattern }).await
    }

    pub async fn key_type(&self, key: impl AsRef<[u8]>) -> Result<KeyType> {
        self.execute(KeyCommand::Type { key: bytes(key) }).await
    }

    /// The elements of a list, set or sorted set in ascending numeric order.
    pub async fn sort(&self, key: impl AsRef<[u8]>) -> Result<Vec<String>> {
        self.sort_by(key, SortOptions::default()).await
    }

    pub async fn sort_by(
        &self,
        key: impl AsRef<[u8]>,
        options: SortOptions,
    ) -> Result<Vec<String>> {
        let key = bytes(key);
        self.execute(KeyCommand::Sort { key, options }).await
    }

    /// Deletes every key of this executor's database.
    pub async fn flush_db(&self) -> Result<()> {
        self.execute(KeyCommand::FlushDb).await
    }

    /// Deletes every key of every database.
    pub async fn flush_all(&self) -> Result<()> {
        self.execute(KeyCommand::FlushAll).await
    }
}
