use glob_match::glob_match;
use itertools::Itertools;
use bytes::Bytes;
use redis::{Cmd, ErrorKind, RedisError, RedisResult, Value};
use strum_macros::IntoStaticStr;
use tokio::time::{Duration, Instant};

use crate::commands::executable::Executable;
use crate::commands::{args, bulk, flag, len};
use crate::db::Db;
use crate::store::{invalid_expire_time, wrong_type, Data, InnerStoreLocked, Key};

/// Commands that work on keys regardless of the type of their value.
///
/// Ref: <https://redis.io/docs/latest/commands/?group=generic>
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum KeyCommand {
    Exists { keys: Vec<Key> },
    Del { keys: Vec<Key> },
    /// A timeout of zero or less deletes the key.
    Expire { key: Key, seconds: i64 },
    /// Replies -2 when the key does not exist and -1 when it has no timeout.
    Ttl { key: Key },
    Persist { key: Key },
    Keys { pattern: String },
    Type { key: Key },
    /// Sorts the elements of a list, set or sorted set without touching the stored value.
    Sort { key: Key, options: SortOptions },
    FlushDb,
    FlushAll,
}

/// How `SORT` orders and slices its reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortOptions {
    /// `(offset, count)`, a negative count takes everything after `offset`.
    pub limit: Option<(i64, i64)>,
    pub descending: bool,
    /// Compare elements as byte strings instead of numbers.
    pub alpha: bool,
}

impl KeyCommand {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn to_cmd(&self) -> Cmd {
        let mut cmd = redis::cmd(self.name());
        match self {
            KeyCommand::Exists { keys } | KeyCommand::Del { keys } => args(&mut cmd, keys),
            KeyCommand::Expire { key, seconds } => {
                cmd.arg(&key[..]).arg(*seconds);
            }
            KeyCommand::Ttl { key } | KeyCommand::Persist { key } | KeyCommand::Type { key } => {
                cmd.arg(&key[..]);
            }
            KeyCommand::Keys { pattern } => {
                cmd.arg(pattern);
            }
            KeyCommand::Sort { key, options } => {
                cmd.arg(&key[..]);
                if let Some((offset, count)) = options.limit {
                    cmd.arg("LIMIT").arg(offset).arg(count);
                }
                if options.descending {
                    cmd.arg("DESC");
                }
                if options.alpha {
                    cmd.arg("ALPHA");
                }
            }
            KeyCommand::FlushDb | KeyCommand::FlushAll => {}
        }
        cmd
    }
}

impl Executable for KeyCommand {
    fn exec(self, store: &mut InnerStoreLocked<'_>, db: Db) -> RedisResult<Value> {
        match self {
            KeyCommand::Exists { keys } => {
                let count = keys.iter().filter(|key| store.exists(db, key)).count();
                Ok(len(count))
            }
            KeyCommand::Del { keys } => {
                let count = keys
                    .iter()
                    .filter_map(|key| store.remove(db, key))
                    .count();
                Ok(len(count))
            }
            KeyCommand::Expire { key, seconds } => {
                let when = match u64::try_from(seconds) {
                    Ok(seconds) if seconds > 0 => Some(
                        Instant::now()
                            .checked_add(Duration::from_secs(seconds))
                            .ok_or_else(|| invalid_expire_time("expire"))?,
                    ),
                    _ => None,
                };

                if !store.exists(db, &key) {
                    return Ok(flag(false));
                }

                match when {
                    Some(when) => {
                        store.set_expiry(db, &key, when);
                    }
                    None => {
                        store.remove(db, &key);
                    }
                }
                Ok(flag(true))
            }
            KeyCommand::Ttl { key } => {
                let ttl = match store.expires_at(db, &key) {
                    None => -2,
                    Some(None) => -1,
                    Some(Some(when)) => {
                        let remaining = when.saturating_duration_since(Instant::now());
                        // Rounded to the closest second, like the server does.
                        ((remaining.as_millis() + 500) / 1000) as i64
                    }
                };
                Ok(Value::Int(ttl))
            }
            KeyCommand::Persist { key } => Ok(flag(store.persist(db, &key))),
            KeyCommand::Keys { pattern } => {
                let keys = store
                    .keys(db)
                    .filter(|key| glob_match(&pattern, &String::from_utf8_lossy(key)))
                    .sorted()
                    .collect::<Vec<_>>();
                Ok(bulk(keys))
            }
            KeyCommand::Type { key } => {
                let type_ = store.get(db, &key).map_or("none", |data| data.type_name());
                Ok(Value::Status(type_.to_string()))
            }
            KeyCommand::Sort { key, options } => {
                let elements: Vec<Bytes> = match store.get(db, &key) {
                    None => Vec::new(),
                    Some(Data::List(list)) => list.iter().cloned().collect(),
                    Some(Data::Set(set)) => set.iter().cloned().collect(),
                    Some(Data::SortedSet(zset)) => zset.keys().cloned().collect(),
                    Some(_) => return Err(wrong_type()),
                };
                let sorted = sort(elements, &options)?;
                Ok(bulk(&sorted))
            }
            KeyCommand::FlushDb => {
                store.flush(db);
                Ok(Value::Okay)
            }
            KeyCommand::FlushAll => {
                store.flush_all();
                Ok(Value::Okay)
            }
        }
    }
}

fn sort(elements: Vec<Bytes>, options: &SortOptions) -> RedisResult<Vec<Bytes>> {
    let mut sorted = if options.alpha {
        elements.into_iter().sorted().collect::<Vec<_>>()
    } else {
        let mut scored = elements
            .into_iter()
            .map(|element| {
                let score = std::str::from_utf8(&element)
                    .ok()
                    .and_then(|s| s.parse::<f64>().ok())
                    .filter(|score| !score.is_nan())
                    .ok_or_else(|| {
                        RedisError::from((
                            ErrorKind::ResponseError,
                            "ERR One or more scores can't be converted into double",
                        ))
                    })?;
                Ok((score, element))
            })
            .collect::<RedisResult<Vec<_>>>()?;
        // Equal scores fall back to comparing the elements themselves.
        scored.sort_by(|(a, x), (b, y)| a.total_cmp(b).then_with(|| x.cmp(y)));
        scored.into_iter().map(|(_, element)| element).collect()
    };

    if options.descending {
        sorted.reverse();
    }

    let Some((offset, count)) = options.limit else {
        return Ok(sorted);
    };
    let offset = usize::try_from(offset).unwrap_or(0);
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    Ok(sorted.into_iter().skip(offset).take(count).collect())
}
