use bytes::Bytes;
use redis::{ErrorKind, RedisError};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};

use crate::db::{Db, DATABASES};

/// The Store keeps the keyspaces of the in-process backend, with optional time-to-live settings
/// for each key. Expired keys are hidden as soon as their deadline passes and removed by a
/// background task. The store is thread-safe and cheap to clone.
///
/// Replies and errors mirror what a Redis server would send for the same command.
#[derive(Clone)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    /// Creates an empty store. Must be called from within a tokio runtime.
    pub fn new() -> Store {
        let state = State {
            dbs: (0..DATABASES).map(|_| HashMap::new()).collect(),
            ttls: BTreeSet::new(),
        };

        let waker = Notify::new();
        let inner = Arc::new(InnerStore {
            state: Mutex::new(state),
            waker,
        });

        tokio::spawn({
            let inner = inner.clone();
            async move { remove_expired_keys(inner).await }
        });

        Self { inner }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InnerStore {
    state: Mutex<State>,
    waker: Notify,
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
    waker: &'a Notify,
}

pub type Key = Bytes;

/// A value of one of the five supported types.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    String(Bytes),
    Hash(HashMap<Bytes, Bytes>),
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
    SortedSet(HashMap<Bytes, f64>),
}

impl Data {
    /// The name `TYPE` reports for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Data::String(_) => "string",
            Data::Hash(_) => "hash",
            Data::List(_) => "list",
            Data::Set(_) => "set",
            Data::SortedSet(_) => "zset",
        }
    }

    fn is_empty_collection(&self) -> bool {
        match self {
            Data::String(_) => false,
            Data::Hash(hash) => hash.is_empty(),
            Data::List(list) => list.is_empty(),
            Data::Set(set) => set.is_empty(),
            Data::SortedSet(zset) => zset.is_empty(),
        }
    }
}

pub struct Entry {
    pub data: Data,
    pub expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

pub struct State {
    dbs: Vec<HashMap<Key, Entry>>,
    ttls: BTreeSet<(Instant, Db, Key)>,
}

pub(crate) fn wrong_type() -> RedisError {
    RedisError::from((
        ErrorKind::ResponseError,
        "WRONGTYPE Operation against a key holding the wrong kind of value",
    ))
}

pub(crate) fn not_an_integer() -> RedisError {
    RedisError::from((
        ErrorKind::ResponseError,
        "ERR value is not an integer or out of range",
    ))
}

pub(crate) fn not_a_float() -> RedisError {
    RedisError::from((ErrorKind::ResponseError, "ERR value is not a valid float"))
}

/// A timeout of zero where one is required, or one too far away to be represented.
pub(crate) fn invalid_expire_time(cmd: &str) -> RedisError {
    RedisError::from((
        ErrorKind::ResponseError,
        "ERR invalid expire time",
        format!("in '{cmd}' command"),
    ))
}

// Generates the typed accessors for one variant of `Data`: a read-only lookup, a mutable
// lookup that never creates the key, and an entry that creates an empty value when missing.
macro_rules! typed_access {
    ($variant:ident, $ty:ty, $get:ident, $get_mut:ident, $entry:ident) => {
        pub fn $get(&self, db: Db, key: &[u8]) -> Result<Option<&$ty>, RedisError> {
            match self.get(db, key) {
                None => Ok(None),
                Some(Data::$variant(value)) => Ok(Some(value)),
                Some(_) => Err(wrong_type()),
            }
        }

        pub fn $get_mut(&mut self, db: Db, key: &[u8]) -> Result<Option<&mut $ty>, RedisError> {
            match self.get_mut(db, key) {
                None => Ok(None),
                Some(Data::$variant(value)) => Ok(Some(value)),
                Some(_) => Err(wrong_type()),
            }
        }

        pub fn $entry(&mut self, db: Db, key: &Key) -> Result<&mut $ty, RedisError> {
            self.expire_if_due(db, key);
            let entry = self
                .keyspace_mut(db)
                .entry(key.clone())
                .or_insert_with(|| Entry {
                    data: Data::$variant(Default::default()),
                    expires_at: None,
                });

            match &mut entry.data {
                Data::$variant(value) => Ok(value),
                _ => Err(wrong_type()),
            }
        }
    };
}

impl<'a> InnerStoreLocked<'a> {
    fn keyspace(&self, db: Db) -> &HashMap<Key, Entry> {
        &self.state.dbs[db.index() as usize]
    }

    fn keyspace_mut(&mut self, db: Db) -> &mut HashMap<Key, Entry> {
        &mut self.state.dbs[db.index() as usize]
    }

    fn live_entry(&self, db: Db, key: &[u8]) -> Option<&Entry> {
        let now = Instant::now();
        self.keyspace(db)
            .get(key)
            .filter(|entry| !entry.is_expired(now))
    }

    /// Drops `key` right away if its deadline has passed, instead of waiting for the purge task.
    fn expire_if_due(&mut self, db: Db, key: &[u8]) {
        let now = Instant::now();
        let expired = self
            .keyspace(db)
            .get(key)
            .is_some_and(|entry| entry.is_expired(now));

        if expired {
            self.remove(db, key);
        }
    }

    pub fn get(&self, db: Db, key: &[u8]) -> Option<&Data> {
        self.live_entry(db, key).map(|entry| &entry.data)
    }

    pub fn get_mut(&mut self, db: Db, key: &[u8]) -> Option<&mut Data> {
        self.expire_if_due(db, key);
        self.keyspace_mut(db).get_mut(key).map(|entry| &mut entry.data)
    }

    /// Stores `data` under `key`, replacing any previous value and its time to live.
    pub fn set(&mut self, db: Db, key: Key, data: Data) {
        self.remove(db, &key);
        let value = Entry {
            data,
            expires_at: None,
        };
        self.keyspace_mut(db).insert(key, value);
    }

    /// Replaces the value under `key` but keeps its time to live.
    pub fn replace(&mut self, db: Db, key: Key, data: Data) {
        self.expire_if_due(db, &key);
        match self.keyspace_mut(db).get_mut(&key) {
            Some(entry) => entry.data = data,
            None => self.set(db, key, data),
        }
    }

    pub fn remove(&mut self, db: Db, key: &[u8]) -> Option<Data> {
        let now = Instant::now();
        let state = &mut *self.state;
        let (key, entry) = state.dbs[db.index() as usize].remove_entry(key)?;

        if let Some(when) = entry.expires_at {
            state.ttls.remove(&(when, db, key));
        }

        if entry.is_expired(now) {
            None
        } else {
            Some(entry.data)
        }
    }

    /// Deletes `key` when it holds a collection that no longer has any element.
    pub fn remove_if_empty(&mut self, db: Db, key: &[u8]) {
        let empty = self
            .keyspace(db)
            .get(key)
            .is_some_and(|entry| entry.data.is_empty_collection());

        if empty {
            self.remove(db, key);
        }
    }

    pub fn exists(&self, db: Db, key: &[u8]) -> bool {
        self.live_entry(db, key).is_some()
    }

    /// Sets the deadline of an existing key. Returns `false` if there is no such key.
    pub fn set_expiry(&mut self, db: Db, key: &[u8], when: Instant) -> bool {
        self.expire_if_due(db, key);
        let state = &mut *self.state;
        let Some(entry) = state.dbs[db.index() as usize].get_mut(key) else {
            return false;
        };
        let key = Bytes::copy_from_slice(key);

        if let Some(previous) = entry.expires_at.replace(when) {
            state.ttls.remove(&(previous, db, key.clone()));
        }
        state.ttls.insert((when, db, key));

        let expires_next = state.ttls.iter().next().map(|(at, _, _)| *at) == Some(when);
        if expires_next {
            self.waker.notify_one();
        }

        true
    }

    /// Removes the deadline of `key`. Returns `false` if the key is missing or had none.
    pub fn persist(&mut self, db: Db, key: &[u8]) -> bool {
        self.expire_if_due(db, key);
        let state = &mut *self.state;
        let Some(entry) = state.dbs[db.index() as usize].get_mut(key) else {
            return false;
        };

        match entry.expires_at.take() {
            Some(when) => {
                state.ttls.remove(&(when, db, Bytes::copy_from_slice(key)));
                true
            }
            None => false,
        }
    }

    /// `None` if the key does not exist, `Some(None)` if it never expires.
    pub fn expires_at(&self, db: Db, key: &[u8]) -> Option<Option<Instant>> {
        self.live_entry(db, key).map(|entry| entry.expires_at)
    }

    pub fn keys(&self, db: Db) -> impl Iterator<Item = &Key> {
        let now = Instant::now();
        self.keyspace(db)
            .iter()
            .filter(move |(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key)
    }

    pub fn size(&self, db: Db) -> usize {
        self.keys(db).count()
    }

    pub fn flush(&mut self, db: Db) {
        let state = &mut *self.state;
        state.dbs[db.index() as usize].clear();
        state.ttls.retain(|(_, ttl_db, _)| *ttl_db != db);
    }

    pub fn flush_all(&mut self) {
        let state = &mut *self.state;
        state.dbs.iter_mut().for_each(HashMap::clear);
        state.ttls.clear();
    }

    typed_access!(String, Bytes, string, string_mut, string_entry);
    typed_access!(Hash, HashMap<Bytes, Bytes>, hash, hash_mut, hash_entry);
    typed_access!(List, VecDeque<Bytes>, list, list_mut, list_entry);
    typed_access!(Set, HashSet<Bytes>, members, members_mut, members_entry);
    typed_access!(SortedSet, HashMap<Bytes, f64>, sorted_set, sorted_set_mut, sorted_set_entry);

    pub fn remove_expired_keys(&mut self) -> Option<Instant> {
        let now = Instant::now();

        let expired_keys: Vec<(Instant, Db, Key)> = self
            .state
            .ttls
            .iter()
            .take_while(|(expires_at, _, _)| expires_at <= &now)
            .cloned()
            .collect();

        for (when, db, key) in expired_keys {
            self.keyspace_mut(db).remove(&key);
            self.state.ttls.remove(&(when, db, key));
        }

        self.state
            .ttls
            .iter()
            .next()
            .map(|&(expires_at, _, _)| expires_at)
    }
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl InnerStore {
    pub fn lock(&self) -> InnerStoreLocked<'_> {
        // A panic while holding the lock cannot leave a keyspace half written.
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        InnerStoreLocked {
            state,
            waker: &self.waker,
        }
    }
}

async fn remove_expired_keys(store: Arc<InnerStore>) {
    loop {
        let next_expiration = store.lock().remove_expired_keys();

        if let Some(next_expiration) = next_expiration {
            tokio::select! {
                _ = sleep_until(next_expiration) => {}
                _ = store.waker.notified() => {}
            }
        } else {
            store.waker.notified().await;
        }
    }
}
