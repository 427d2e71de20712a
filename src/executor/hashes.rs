use std::collections::HashMap;

use crate::commands::{bytes, HashCommand};
use crate::error::Result;
use crate::executor::{non_empty, non_negative, Executor};

impl Executor {
    pub async fn hget(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
    ) -> Result<Option<String>> {
        let cmd = HashCommand::HGet {
            key: bytes(key),
            field: bytes(field),
        };
        self.execute(cmd).await
    }

    /// `true` when the field is new, `false` when an existing value was overwritten.
    pub async fn hset(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<bool> {
        let cmd = HashCommand::HSet {
            key: bytes(key),
            field: bytes(field),
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    /// [`Executor::hset`], then a timeout on the whole hash when `seconds` is positive. An
    /// existing timeout is replaced.
    pub async fn hset_ex(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
        seconds: i64,
    ) -> Result<bool> {
        let key = bytes(key);
        let created = self.hset(&key, field, value).await?;
        self.expire_written(key, seconds).await?;
        Ok(created)
    }

    pub async fn hset_nx(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<bool> {
        let cmd = HashCommand::HSetNx {
            key: bytes(key),
            field: bytes(field),
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    pub async fn hmset<F, V>(&self, key: impl AsRef<[u8]>, pairs: &[(F, V)]) -> Result<()>
    where
        F: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        non_empty(pairs, "field")?;
        let cmd = HashCommand::HMSet {
            key: bytes(key),
            pairs: pairs
                .iter()
                .map(|(field, value)| (bytes(field), bytes(value)))
                .collect(),
        };
        self.execute(cmd).await
    }

    /// [`Executor::hmset`], then a timeout on the whole hash when `seconds` is positive.
    pub async fn hmset_ex<F, V>(
        &self,
        key: impl AsRef<[u8]>,
        pairs: &[(F, V)],
        seconds: i64,
    ) -> Result<()>
    where
        F: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let key = bytes(key);
        self.hmset(&key, pairs).await?;
        self.expire_written(key, seconds).await
    }

    pub async fn hmget<F: AsRef<[u8]>>(
        &self,
        key: impl AsRef<[u8]>,
        fields: &[F],
    ) -> Result<Vec<Option<String>>> {
        non_empty(fields, "field")?;
        let cmd = HashCommand::HMGet {
            key: bytes(key),
            fields: fields.iter().map(bytes).collect(),
        };
        self.execute(cmd).await
    }

    /// Rejects a negative `delta`; use [`Executor::hdecr_by`] to go down.
    pub async fn hincr_by(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        delta: i64,
    ) -> Result<i64> {
        non_negative(delta)?;
        let cmd = HashCommand::HIncrBy {
            key: bytes(key),
            field: bytes(field),
            delta,
        };
        self.execute(cmd).await
    }

    /// There is no `HDECRBY`, so this sends `HINCRBY` with the negated delta.
    pub async fn hdecr_by(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        delta: i64,
    ) -> Result<i64> {
        non_negative(delta)?;
        let cmd = HashCommand::HIncrBy {
            key: bytes(key),
            field: bytes(field),
            delta: -delta,
        };
        self.execute(cmd).await
    }

    pub async fn hincr_by_float(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        delta: f64,
    ) -> Result<f64> {
        let cmd = HashCommand::HIncrByFloat {
            key: bytes(key),
            field: bytes(field),
            delta,
        };
        self.execute(cmd).await
    }

    /// Returns how many of `fields` were removed.
    pub async fn hdel<F: AsRef<[u8]>>(&self, key: impl AsRef<[u8]>, fields: &[F]) -> Result<u64> {
        non_empty(fields, "field")?;
        let cmd = HashCommand::HDel {
            key: bytes(key),
            fields: fields.iter().map(bytes).collect(),
        };
        self.execute(cmd).await
    }

    pub async fn hexists(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<bool> {
        let cmd = HashCommand::HExists {
            key: bytes(key),
            field: bytes(field),
        };
        self.execute(cmd).await
    }

    pub async fn hlen(&self, key: impl AsRef<[u8]>) -> Result<u64> {
        self.execute(HashCommand::HLen { key: bytes(key) }).await
    }

    pub async fn hkeys(&self, key: impl AsRef<[u8]>) -> Result<Vec<String>> {
        self.execute(HashCommand::HKeys { key: bytes(key) }).await
    }

    pub async fn hvals(&self, key: impl AsRef<[u8]>) -> Result<Vec<String>> {
        self.execute(HashCommand::HVals { key: bytes(key) }).await
    }

    pub async fn hgetall(&self, key: impl AsRef<[u8]>) -> Result<HashMap<String, String>> {
        self.execute(HashCommand::HGetAll { key: bytes(key) }).await
    }
}
