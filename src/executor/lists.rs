use crate::commands::{bytes, InsertPosition, ListCommand};
use crate::error::Result;
use crate::executor::{non_empty, Executor};

impl Executor {
    /// Pushes `values` to the head one by one, so the last one ends up first.
    pub async fn lpush<V: AsRef<[u8]>>(&self, key: impl AsRef<[u8]>, values: &[V]) -> Result<u64> {
        non_empty(values, "value")?;
        let cmd = ListCommand::LPush {
            key: bytes(key),
            values: values.iter().map(bytes).collect(),
        };
        self.execute(cmd).await
    }

    pub async fn rpush<V: AsRef<[u8]>>(&self, key: impl AsRef<[u8]>, values: &[V]) -> Result<u64> {
        non_empty(values, "value")?;
        let cmd = ListCommand::RPush {
            key: bytes(key),
            values: values.iter().map(bytes).collect(),
        };
        self.execute(cmd).await
    }

    /// [`Executor::rpush`], then a timeout on the list when `seconds` is positive.
    pub async fn rpush_ex<V: AsRef<[u8]>>(
        &self,
        key: impl AsRef<[u8]>,
        values: &[V],
        seconds: i64,
    ) -> Result<u64> {
        let key = bytes(key);
        let len = self.rpush(&key, values).await?;
        self.expire_written(key, seconds).await?;
        Ok(len)
    }

    /// Returns the new length, -1 when `pivot` is not in the list and 0 when the key is missing.
    pub async fn linsert(
        &self,
        key: impl AsRef<[u8]>,
        position: InsertPosition,
        pivot: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<i64> {
        let cmd = ListCommand::LInsert {
            key: bytes(key),
            position,
            pivot: bytes(pivot),
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    pub async fn lset(
        &self,
        key: impl AsRef<[u8]>,
        index: i64,
        value: impl AsRef<[u8]>,
    ) -> Result<()> {
        let cmd = ListCommand::LSet {
            key: bytes(key),
            index,
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    /// Removes up to `count` occurrences of `value`: from the head when positive, from the tail
    /// when negative and all of them when zero.
    pub async fn lrem(
        &self,
        key: impl AsRef<[u8]>,
        count: i64,
        value: impl AsRef<[u8]>,
    ) -> Result<u64> {
        let cmd = ListCommand::LRem {
            key: bytes(key),
            count,
            value: bytes(value),
        };
        self.execute(cmd).await
    }

    pub async fn ltrim(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Result<()> {
        let key = bytes(key);
        self.execute(ListCommand::LTrim { key, start, stop }).await
    }

    /// Pops run one at a time across every clone of this executor.
    pub async fn lpop(&self, key: impl AsRef<[u8]>) -> Result<Option<String>> {
        self.pop(ListCommand::LPop { key: bytes(key) }).await
    }

    /// Pops run one at a time across every clone of this executor.
    pub async fn rpop(&self, key: impl AsRef<[u8]>) -> Result<Option<String>> {
        self.pop(ListCommand::RPop { key: bytes(key) }).await
    }

    /// Moves the tail of `source` to the head of `destination`.
    pub async fn rpoplpush(
        &self,
        source: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
    ) -> Result<Option<String>> {
        let cmd = ListCommand::RPopLPush {
            source: bytes(source),
            destination: bytes(destination),
        };
        self.execute(cmd).await
    }

    pub async fn lindex(&self, key: impl AsRef<[u8]>, index: i64) -> Result<Option<String>> {
        let key = bytes(key);
        self.execute(ListCommand::LIndex { key, index }).await
    }

    pub async fn llen(&self, key: impl AsRef<[u8]>) -> Result<u64> {
        self.execute(ListCommand::LLen { key: bytes(key) }).await
    }

    pub async fn lrange(
        &self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<String>> {
        let key = bytes(key);
        self.execute(ListCommand::LRange { key, start, stop }).await
    }
}
