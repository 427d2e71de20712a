use std::collections::HashSet;

use crate::commands::{bytes, SetCommand};
use crate::error::Result;
use crate::executor::{non_empty, Executor};
use crate::store::Key;

fn keys<K: AsRef<[u8]>>(keys: &[K]) -> Result<Vec<Key>> {
    non_empty(keys, "key")?;
    Ok(keys.iter().map(bytes).collect())
}

impl Executor {
    /// Returns how many members were not in the set yet.
    pub async fn sadd<M: AsRef<[u8]>>(&self, key: impl AsRef<[u8]>, members: &[M]) -> Result<u64> {
        non_empty(members, "member")?;
        let cmd = SetCommand::SAdd {
            key: bytes(key),
            members: members.iter().map(bytes).collect(),
        };
        self.execute(cmd).await
    }

    /// [`Executor::sadd`], then a timeout on the set when `seconds` is positive.
    pub async fn sadd_ex<M: AsRef<[u8]>>(
        &self,
        key: impl AsRef<[u8]>,
        members: &[M],
        seconds: i64,
    ) -> Result<u64> {
        let key = bytes(key);
        let added = self.sadd(&key, members).await?;
        self.expire_written(key, seconds).await?;
        Ok(added)
    }

    pub async fn srem<M: AsRef<[u8]>>(&self, key: impl AsRef<[u8]>, members: &[M]) -> Result<u64> {
        non_empty(members, "member")?;
        let cmd = SetCommand::SRem {
            key: bytes(key),
            members: members.iter().map(bytes).collect(),
        };
        self.execute(cmd).await
    }

    pub async fn spop(&self, key: impl AsRef<[u8]>) -> Result<Option<String>> {
        self.execute(SetCommand::SPop { key: bytes(key) }).await
    }

    /// Members of the first set that are in none of the others.
    pub async fn sdiff<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<HashSet<String>> {
        let keys = self::keys(keys)?;
        self.execute(SetCommand::SDiff { keys }).await
    }

    /// Stores the difference under `destination` and returns its size.
    pub async fn sdiff_store<K: AsRef<[u8]>>(
        &self,
        destination: impl AsRef<[u8]>,
        keys: &[K],
    ) -> Result<u64> {
        let keys = self::keys(keys)?;
        let destination = bytes(destination);
        self.execute(SetCommand::SDiffStore { destination, keys }).await
    }

    pub async fn sinter<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<HashSet<String>> {
        let keys = self::keys(keys)?;
        self.execute(SetCommand::SInter { keys }).await
    }

    pub async fn sinter_store<K: AsRef<[u8]>>(
        &self,
        destination: impl AsRef<[u8]>,
        keys: &[K],
    ) -> Result<u64> {
        let keys = self::keys(keys)?;
        let destination = bytes(destination);
        self.execute(SetCommand::SInterStore { destination, keys }).await
    }

    pub async fn sunion<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<HashSet<String>> {
        let keys = self::keys(keys)?;
        self.execute(SetCommand::SUnion { keys }).await
    }

    pub async fn sunion_store<K: AsRef<[u8]>>(
        &self,
        destination: impl AsRef<[u8]>,
        keys: &[K],
    ) -> Result<u64> {
        let keys = self::keys(keys)?;
        let destination = bytes(destination);
        self.execute(SetCommand::SUnionStore { destination, keys }).await
    }

    /// `false` when `member` is not in `source`.
    pub async fn smove(
        &self,
        source: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<bool> {
        let cmd = SetCommand::SMove {
            source: bytes(source),
            destination: bytes(destination),
            member: bytes(member),
        };
        self.execute(cmd).await
    }

    pub async fn scard(&self, key: impl AsRef<[u8]>) -> Result<u64> {
        self.execute(SetCommand::SCard { key: bytes(key) }).await
    }

    pub async fn sismember(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<bool> {
        let cmd = SetCommand::SIsMember {
            key: bytes(key),
            member: bytes(member),
        };
        self.execute(cmd).await
    }

    /// A member of the set, left in place.
    pub async fn srandmember(&self, key: impl AsRef<[u8]>) -> Result<Option<String>> {
        self.execute(SetCommand::SRandMember { key: bytes(key) }).await
    }

    pub async fn smembers(&self, key: impl AsRef<[u8]>) -> Result<HashSet<String>> {
        self.execute(SetCommand::SMembers { key: bytes(key) }).await
    }
}
