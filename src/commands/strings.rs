use bytes::Bytes;
use num_traits::{CheckedAdd, Zero};
use redis::{Cmd, ErrorKind, RedisError, RedisResult, Value};
use std::str::FromStr;
use strum_macros::IntoStaticStr;
use tokio::time::{Duration, Instant};

use crate::commands::executable::Executable;
use crate::commands::{args, data, len, optional};
use crate::db::Db;
use crate::store::{invalid_expire_time, not_an_integer, Data, InnerStoreLocked, Key};
use crate::utils::range;

// The largest string the server accepts, 512MB.
const MAX_STRING_LEN: u64 = 512 * 1024 * 1024;

/// Commands on string values.
///
/// Ref: <https://redis.io/docs/latest/commands/?group=string>
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum StringCommand {
    Get {
        key: Key,
    },
    Set {
        key: Key,
        value: Bytes,
    },
    SetEx {
        key: Key,
        seconds: u64,
        value: Bytes,
    },
    SetNx {
        key: Key,
        value: Bytes,
    },
    GetSet {
        key: Key,
        value: Bytes,
    },
    Append {
        key: Key,
        value: Bytes,
    },
    IncrBy {
        key: Key,
        delta: i64,
    },
    DecrBy {
        key: Key,
        delta: i64,
    },
    Strlen {
        key: Key,
    },
    MGet {
        keys: Vec<Key>,
    },
    MSet {
        pairs: Vec<(Key, Bytes)>,
    },
    MSetNx {
        pairs: Vec<(Key, Bytes)>,
    },
    /// Both offsets are inclusive and may be negative.
    GetRange {
        key: Key,
        start: i64,
        end: i64,
    },
    /// Pads the current value with zero bytes when `offset` is past its end.
    SetRange {
        key: Key,
        offset: u64,
        value: Bytes,
    },
}

impl StringCommand {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn to_cmd(&self) -> Cmd {
        let mut cmd = redis::cmd(self.name());
        match self {
            StringCommand::Get { key } | StringCommand::Strlen { key } => {
                cmd.arg(&key[..]);
            }
            StringCommand::Set { key, value }
            | StringCommand::SetNx { key, value }
            | StringCommand::GetSet { key, value }
            | StringCommand::Append { key, value } => {
                cmd.arg(&key[..]).arg(&value[..]);
            }
            StringCommand::SetEx {
                key,
                seconds,
                value,
            } => {
                cmd.arg(&key[..]).arg(*seconds).arg(&value[..]);
            }
            StringCommand::IncrBy { key, delta } | StringCommand::DecrBy { key, delta } => {
                cmd.arg(&key[..]).arg(*delta);
            }
            StringCommand::MGet { keys } => args(&mut cmd, keys),
            StringCommand::MSet { pairs } | StringCommand::MSetNx { pairs } => {
                for (key, value) in pairs {
                    cmd.arg(&key[..]).arg(&value[..]);
                }
            }
            StringCommand::GetRange { key, start, end } => {
                cmd.arg(&key[..]).arg(*start).arg(*end);
            }
            StringCommand::SetRange { key, offset, value } => {
                cmd.arg(&key[..]).arg(*offset).arg(&value[..]);
            }
        }
        cmd
    }
}

impl Executable for StringCommand {
    fn exec(self, store: &mut InnerStoreLocked<'_>, db: Db) -> RedisResult<Value> {
        match self {
            StringCommand::Get { key } => Ok(optional(store.string(db, &key)?)),
            StringCommand::Set { key, value } => {
                store.set(db, key, Data::String(value));
                Ok(Value::Okay)
            }
            StringCommand::SetEx {
                key,
                seconds,
                value,
            } => {
                if seconds == 0 {
                    return Err(invalid_expire_time("setex"));
                }

                let when = Instant::now()
                    .checked_add(Duration::from_secs(seconds))
                    .ok_or_else(|| invalid_expire_time("setex"))?;
                store.set(db, key.clone(), Data::String(value));
                store.set_expiry(db, &key, when);
                Ok(Value::Okay)
            }
            StringCommand::SetNx { key, value } => {
                if store.exists(db, &key) {
                    return Ok(Value::Int(0));
                }

                store.set(db, key, Data::String(value));
                Ok(Value::Int(1))
            }
            StringCommand::GetSet { key, value } => {
                let previous = store.string(db, &key)?.cloned();
                store.set(db, key, Data::String(value));
                Ok(optional(previous.as_ref()))
            }
            StringCommand::Append { key, value } => {
                let current = store.string_entry(db, &key)?;
                let mut appended = current.to_vec();
                appended.extend_from_slice(&value);
                *current = Bytes::from(appended);
                Ok(len(current.len()))
            }
            StringCommand::IncrBy { key, delta } => incr_by(store, db, key, delta),
            StringCommand::DecrBy { key, delta } => {
                let delta = delta.checked_neg().ok_or_else(overflow)?;
                incr_by(store, db, key, delta)
            }
            StringCommand::Strlen { key } => {
                let length = store.string(db, &key)?.map_or(0, Bytes::len);
                Ok(len(length))
            }
            StringCommand::MGet { keys } => {
                let values = keys
                    .iter()
                    .map(|key| match store.get(db, key) {
                        Some(Data::String(value)) => data(value),
                        _ => Value::Nil,
                    })
                    .collect();
                Ok(Value::Bulk(values))
            }
            StringCommand::MSet { pairs } => {
                for (key, value) in pairs {
                    store.set(db, key, Data::String(value));
                }
                Ok(Value::Okay)
            }
            StringCommand::MSetNx { pairs } => {
                if pairs.iter().any(|(key, _)| store.exists(db, key)) {
                    return Ok(Value::Int(0));
                }

                for (key, value) in pairs {
                    store.set(db, key, Data::String(value));
                }
                Ok(Value::Int(1))
            }
            StringCommand::GetRange { key, start, end } => {
                let value = store.string(db, &key)?.cloned().unwrap_or_default();
                let subset = match range::inclusive(start, end, value.len()) {
                    Some((start, end)) => value.slice(start..=end),
                    None => Bytes::new(),
                };
                Ok(data(&subset))
            }
            StringCommand::SetRange { key, offset, value } => {
                if offset > MAX_STRING_LEN {
                    return Err(RedisError::from((
                        ErrorKind::ResponseError,
                        "ERR offset is out of range",
                    )));
                }
                if value.len() as u64 > MAX_STRING_LEN - offset {
                    return Err(RedisError::from((
                        ErrorKind::ResponseError,
                        "ERR string exceeds maximum allowed size (proto-max-bulk-len)",
                    )));
                }

                if value.is_empty() {
                    let length = store.string(db, &key)?.map_or(0, Bytes::len);
                    return Ok(len(length));
                }

                let current = store.string_entry(db, &key)?;
                let offset = offset as usize;
                let mut updated = current.to_vec();
                if updated.len() < offset + value.len() {
                    updated.resize(offset + value.len(), 0);
                }
                updated[offset..offset + value.len()].copy_from_slice(&value);
                *current = Bytes::from(updated);
                Ok(len(current.len()))
            }
        }
    }
}

fn overflow() -> RedisError {
    RedisError::from((
        ErrorKind::ResponseError,
        "ERR increment or decrement would overflow",
    ))
}

/// Parses `current` as a number and adds `delta` to it. A missing value counts as zero.
pub(crate) fn checked_increment<T>(current: Option<&Bytes>, delta: T) -> RedisResult<T>
where
    T: FromStr + CheckedAdd + Zero,
{
    let value = match current {
        Some(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse::<T>().ok())
            .ok_or_else(not_an_integer)?,
        None => T::zero(),
    };

    value.checked_add(&delta).ok_or_else(overflow)
}

fn incr_by(store: &mut InnerStoreLocked<'_>, db: Db, key: Key, delta: i64) -> RedisResult<Value> {
    let value = checked_increment(store.string(db, &key)?, delta)?;
    // INCR keeps the time to live of the key.
    store.replace(db, key, Data::String(Bytes::from(value.to_string())));
    Ok(Value::Int(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::bytes;
    use crate::store::Store;

    fn db() -> Db {
        Db::default()
    }

    fn run(store: &Store, cmd: StringCommand) -> RedisResult<Value> {
        cmd.exec(&mut store.lock(), db())
    }

    fn get(store: &Store, key: &str) -> Value {
        run(store, StringCommand::Get { key: bytes(key) }).unwrap()
    }

    fn set(store: &Store, key: &str, value: &str) {
        let cmd = StringCommand::Set {
            key: bytes(key),
            value: bytes(value),
        };
        assert_eq!(run(store, cmd).unwrap(), Value::Okay);
    }

    #[tokio::test]
    async fn set_and_get() {
        let store = Store::new();

        set(&store, "key", "value");

        assert_eq!(get(&store, "key"), Value::Data(b"value".to_vec()));
        assert_eq!(get(&store, "missing"), Value::Nil);
    }

    #[tokio::test]
    async fn get_wrong_type() {
        let store = Store::new();
        store
            .lock()
            .list_entry(db(), &bytes("list"))
            .unwrap()
            .push_back(bytes("a"));

        let err = run(&store, StringCommand::Get { key: bytes("list") }).unwrap_err();
        assert!(err.to_string().contains("WRONGTYPE"));
    }

    #[tokio::test]
    async fn setex_rejects_zero() {
        let store = Store::new();

        let cmd = StringCommand::SetEx {
            key: bytes("key"),
            seconds: 0,
            value: bytes("value"),
        };
        assert!(run(&store, cmd).is_err());
        assert_eq!(get(&store, "key"), Value::Nil);
    }

    #[tokio::test]
    async fn setex_rejects_unrepresentable_timeout() {
        let store = Store::new();

        let cmd = StringCommand::SetEx {
            key: bytes("key"),
            seconds: u64::MAX,
            value: bytes("value"),
        };
        let err = run(&store, cmd).unwrap_err();
        assert_eq!(err.code(), Some("ERR"));
        assert!(err.to_string().contains("invalid expire time"));
        assert_eq!(get(&store, "key"), Value::Nil);
    }

    #[tokio::test]
    async fn setnx_and_getset() {
        let store = Store::new();

        let setnx = |value: &str| StringCommand::SetNx {
            key: bytes("key"),
            value: bytes(value),
        };
        assert_eq!(run(&store, setnx("a")).unwrap(), Value::Int(1));
        assert_eq!(run(&store, setnx("b")).unwrap(), Value::Int(0));

        let cmd = StringCommand::GetSet {
            key: bytes("key"),
            value: bytes("c"),
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Data(b"a".to_vec()));
        assert_eq!(get(&store, "key"), Value::Data(b"c".to_vec()));
    }

    #[tokio::test]
    async fn append_and_strlen() {
        let store = Store::new();

        let append = |value: &str| StringCommand::Append {
            key: bytes("key"),
            value: bytes(value),
        };
        assert_eq!(run(&store, append("Hello")).unwrap(), Value::Int(5));
        assert_eq!(run(&store, append(" World")).unwrap(), Value::Int(11));

        let cmd = StringCommand::Strlen { key: bytes("key") };
        assert_eq!(run(&store, cmd).unwrap(), Value::Int(11));
    }

    #[tokio::test]
    async fn incr_and_decr() {
        let store = Store::new();

        let cmd = StringCommand::IncrBy {
            key: bytes("counter"),
            delta: 10,
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Int(10));

        let cmd = StringCommand::DecrBy {
            key: bytes("counter"),
            delta: 3,
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Int(7));
        assert_eq!(get(&store, "counter"), Value::Data(b"7".to_vec()));
    }

    #[tokio::test]
    async fn incr_invalid_value() {
        let store = Store::new();
        set(&store, "key", "value");

        let cmd = StringCommand::IncrBy {
            key: bytes("key"),
            delta: 1,
        };
        let err = run(&store, cmd).unwrap_err();

        assert!(err
            .to_string()
            .contains("value is not an integer or out of range"));
        assert_eq!(get(&store, "key"), Value::Data(b"value".to_vec()));
    }

    #[tokio::test]
    async fn incr_overflow() {
        let store = Store::new();
        set(&store, "key", &i64::MAX.to_string());

        let cmd = StringCommand::IncrBy {
            key: bytes("key"),
            delta: 1,
        };
        assert!(run(&store, cmd).is_err());
    }

    #[tokio::test]
    async fn mset_and_mget() {
        let store = Store::new();

        let cmd = StringCommand::MSet {
            pairs: vec![(bytes("a"), bytes("1")), (bytes("b"), bytes("2"))],
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Okay);

        let cmd = StringCommand::MSetNx {
            pairs: vec![(bytes("b"), bytes("3")), (bytes("c"), bytes("4"))],
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Int(0));

        let cmd = StringCommand::MGet {
            keys: vec![bytes("a"), bytes("b"), bytes("c")],
        };
        assert_eq!(
            run(&store, cmd).unwrap(),
            Value::Bulk(vec![
                Value::Data(b"1".to_vec()),
                Value::Data(b"2".to_vec()),
                Value::Nil,
            ])
        );
    }

    #[tokio::test]
    async fn getrange() {
        let store = Store::new();
        set(&store, "key", "This is a string");

        let getrange = |start, end| StringCommand::GetRange {
            key: bytes("key"),
            start,
            end,
        };

        assert_eq!(run(&store, getrange(0, 3)).unwrap(), Value::Data(b"This".to_vec()));
        assert_eq!(run(&store, getrange(-3, -1)).unwrap(), Value::Data(b"ing".to_vec()));
        assert_eq!(
            run(&store, getrange(10, 100)).unwrap(),
            Value::Data(b"string".to_vec())
        );
        assert_eq!(run(&store, getrange(5, 1)).unwrap(), Value::Data(vec![]));
    }

    #[tokio::test]
    async fn setrange() {
        let store = Store::new();
        set(&store, "key", "Hello World");

        let cmd = StringCommand::SetRange {
            key: bytes("key"),
            offset: 6,
            value: bytes("Redis"),
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Int(11));
        assert_eq!(get(&store, "key"), Value::Data(b"Hello Redis".to_vec()));

        let cmd = StringCommand::SetRange {
            key: bytes("padded"),
            offset: 2,
            value: bytes("x"),
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Int(3));
        assert_eq!(get(&store, "padded"), Value::Data(vec![0, 0, b'x']));
    }

    #[tokio::test]
    async fn setrange_offset_out_of_range() {
        let store = Store::new();
        set(&store, "key", "value");

        let cmd = StringCommand::SetRange {
            key: bytes("key"),
            offset: u64::MAX,
            value: bytes("v"),
        };
        let err = run(&store, cmd).unwrap_err();
        assert!(err.to_string().contains("offset is out of range"));

        let cmd = StringCommand::SetRange {
            key: bytes("key"),
            offset: MAX_STRING_LEN,
            value: bytes("v"),
        };
        let err = run(&store, cmd).unwrap_err();
        assert!(err.to_string().contains("maximum allowed size"));

        assert_eq!(get(&store, "key"), Value::Data(b"value".to_vec()));
    }
}
