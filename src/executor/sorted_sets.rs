use crate::commands::{bytes, SortedSetCommand};
use crate::error::{Error, Result};
use crate::executor::{non_empty, Executor};

impl Executor {
    /// `true` when `member` is new, `false` when only its score changed.
    pub async fn zadd(
        &self,
        key: impl AsRef<[u8]>,
        score: f64,
        member: impl AsRef<[u8]>,
    ) -> Result<bool> {
        if score.is_nan() {
            return Err(Error::argument("score must be a number"));
        }

        let cmd = SortedSetCommand::ZAdd {
            key: bytes(key),
            score,
            member: bytes(member),
        };
        self.execute(cmd).await
    }

    /// Members between two ranks, lowest score first.
    pub async fn zrange(
        &self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<String>> {
        let key = bytes(key);
        self.execute(SortedSetCommand::ZRange { key, start, stop }).await
    }

    /// Members between two ranks, highest score first.
    pub async fn zrevrange(
        &self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<String>> {
        let key = bytes(key);
        self.execute(SortedSetCommand::ZRevRange { key, start, stop }).await
    }

    /// Members with `min <= score <= max`, lowest score first.
    pub async fn zrange_by_score(
        &self,
        key: impl AsRef<[u8]>,
        min: f64,
        max: f64,
    ) -> Result<Vec<String>> {
        let key = bytes(key);
        self.execute(SortedSetCommand::ZRangeByScore { key, min, max }).await
    }

    pub async fn zcount(&self, key: impl AsRef<[u8]>, min: f64, max: f64) -> Result<u64> {
        let key = bytes(key);
        self.execute(SortedSetCommand::ZCount { key, min, max }).await
    }

    pub async fn zcard(&self, key: impl AsRef<[u8]>) -> Result<u64> {
        self.execute(SortedSetCommand::ZCard { key: bytes(key) }).await
    }

    pub async fn zrem<M: AsRef<[u8]>>(&self, key: impl AsRef<[u8]>, members: &[M]) -> Result<u64> {
        non_empty(members, "member")?;
        let cmd = SortedSetCommand::ZRem {
            key: bytes(key),
            members: members.iter().map(bytes).collect(),
        };
        self.execute(cmd).await
    }

    /// Returns the new score.
    pub async fn zincr_by(
        &self,
        key: impl AsRef<[u8]>,
        delta: f64,
        member: impl AsRef<[u8]>,
    ) -> Result<f64> {
        let cmd = SortedSetCommand::ZIncrBy {
            key: bytes(key),
            delta,
            member: bytes(member),
        };
        self.execute(cmd).await
    }

    /// Zero-based rank by ascending score, `None` when `member` is not in the set.
    pub async fn zrank(
        &self,
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<Option<u64>> {
        let cmd = SortedSetCommand::ZRank {
            key: bytes(key),
            member: bytes(member),
        };
        self.execute(cmd).await
    }

    pub async fn zrevrank(
        &self,
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<Option<u64>> {
        let cmd = SortedSetCommand::ZRevRank {
            key: bytes(key),
            member: bytes(member),
        };
        self.execute(cmd).await
    }

    pub async fn zscore(
        &self,
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<Option<f64>> {
        let cmd = SortedSetCommand::ZScore {
            key: bytes(key),
            member: bytes(member),
        };
        self.execute(cmd).await
    }

    /// Removes the members between two ranks and returns how many there were.
    pub async fn zrem_range_by_rank(
        &self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<u64> {
        let key = bytes(key);
        self.execute(SortedSetCommand::ZRemRangeByRank { key, start, stop })
            .await
    }

    pub async fn zrem_range_by_score(
        &self,
        key: impl AsRef<[u8]>,
        min: f64,
        max: f64,
    ) -> Result<u64> {
        let key = bytes(key);
        self.execute(SortedSetCommand::ZRemRangeByScore { key, min, max })
            .await
    }
}
