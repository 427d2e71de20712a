use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::commands::{bytes, StringCommand};
use crate::error::{Error, Result};
use crate::executor::{non_empty, non_negative, Executor};
use crate::serialize;

fn pairs<K, V>(pairs: &[(K, V)]) -> Vec<(Bytes, Bytes)>
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    pairs
        .iter()
        .map(|(key, value)| (bytes(key), bytes(value)))
        .collect()
}

impl Executor {
    pub async fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<String>> {
        self.execute(StringCommand::Get { key: bytes(key) }).await
    }

    pub async fn get_bytes(&self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        self.execute(StringCommand::Get { key: bytes(key) }).await
    }

    /// Stores `value` and clears any time to live the key had.
    pub async fn set(&self, key: impl AsRef<[u8]>, value: impl AsRef<str>) -> Result<()> {
        self.set_bytes(key, value.as_ref()).await
    }

    pub async fn set_bytes(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let cmd = StringCommand::Set {
            key: bytes(key),
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    /// Stores `value` with a time to live, which must be at least one second.
    pub async fn set_ex(
        &self,
        key: impl AsRef<[u8]>,
        seconds: u64,
        value: impl AsRef<[u8]>,
    ) -> Result<()> {
        if seconds == 0 {
            return Err(Error::argument("expire time must be at least one second"));
        }

        let cmd = StringCommand::SetEx {
            key: bytes(key),
            seconds,
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    /// Stores `value` only if the key does not exist yet.
    pub async fn set_nx(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<bool> {
        let cmd = StringCommand::SetNx {
            key: bytes(key),
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    pub async fn get_set(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<Option<String>> {
        let cmd = StringCommand::GetSet {
            key: bytes(key),
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    /// Returns the length of the string after the append.
    pub async fn append(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<u64> {
        let cmd = StringCommand::Append {
            key: bytes(key),
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    pub async fn incr(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.incr_by(key, 1).await
    }

    /// Rejects a negative `delta`; use [`Executor::decr_by`] to go down.
    pub async fn incr_by(&self, key: impl AsRef<[u8]>, delta: i64) -> Result<i64> {
        non_negative(delta)?;
        let key = bytes(key);
        self.execute(StringCommand::IncrBy { key, delta }).await
    }

    pub async fn decr(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.decr_by(key, 1).await
    }

    /// Rejects a negative `delta`; use [`Executor::incr_by`] to go up.
    pub async fn decr_by(&self, key: impl AsRef<[u8]>, delta: i64) -> Result<i64> {
        non_negative(delta)?;
        let key = bytes(key);
        self.execute(StringCommand::DecrBy { key, delta }).await
    }

    pub async fn strlen(&self, key: impl AsRef<[u8]>) -> Result<u64> {
        self.execute(StringCommand::Strlen { key: bytes(key) }).await
    }

    pub async fn mget<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<Option<String>>> {
        non_empty(keys, "key")?;
        let keys = keys.iter().map(bytes).collect();
        self.execute(StringCommand::MGet { keys }).await
    }

    pub async fn mset<K, V>(&self, pairs: &[(K, V)]) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        non_empty(pairs, "key")?;
        let pairs = self::pairs(pairs);
        self.execute(StringCommand::MSet { pairs }).await
    }

    /// Sets all pairs, or none of them when any key already exists.
    pub async fn mset_nx<K, V>(&self, pairs: &[(K, V)]) -> Result<bool>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        non_empty(pairs, "key")?;
        let pairs = self::pairs(pairs);
        self.execute(StringCommand::MSetNx { pairs }).await
    }

    /// The substring between two inclusive, possibly negative, offsets.
    pub async fn get_range(&self, key: impl AsRef<[u8]>, start: i64, end: i64) -> Result<String> {
        let key = bytes(key);
        self.execute(StringCommand::GetRange { key, start, end }).await
    }

    /// Overwrites part of the string at `offset`, returning its new length.
    pub async fn set_range(
        &self,
        key: impl AsRef<[u8]>,
        offset: u64,
        value: impl AsRef<[u8]>,
    ) -> Result<u64> {
        let cmd = StringCommand::SetRange {
            key: bytes(key),
            offset,
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    /// Stores `value` as an opaque serialized blob.
    pub async fn set_object<T: Serialize + ?Sized>(
        &self,
        key: impl AsRef<[u8]>,
        value: &T,
    ) -> Result<()> {
        let blob = serialize::serialize(value)?;
        self.set_bytes(key, blob).await
    }

    pub async fn get_object<T: DeserializeOwned>(
        &self,
        key: impl AsRef<[u8]>,
    ) -> Result<Option<T>> {
        match self.get_bytes(key).await? {
            Some(blob) => serialize::deserialize(&blob).map(Some),
            None => Ok(None),
        }
    }
}
