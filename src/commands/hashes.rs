use bytes::Bytes;
use itertools::Itertools;
use redis::{Cmd, ErrorKind, RedisError, RedisResult, Value};
use strum_macros::IntoStaticStr;

use crate::commands::executable::Executable;
use crate::commands::strings::checked_increment;
use crate::commands::{args, bulk, data, flag, float, len, optional};
use crate::db::Db;
use crate::store::{not_a_float, InnerStoreLocked, Key};

/// Commands on hash values.
///
/// Ref: <https://redis.io/docs/latest/commands/?group=hash>
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HashCommand {
    HGet {
        key: Key,
        field: Bytes,
    },
    HSet {
        key: Key,
        field: Bytes,
        value: Bytes,
    },
    HSetNx {
        key: Key,
        field: Bytes,
        value: Bytes,
    },
    HMSet {
        key: Key,
        pairs: Vec<(Bytes, Bytes)>,
    },
    HMGet {
        key: Key,
        fields: Vec<Bytes>,
    },
    HIncrBy {
        key: Key,
        field: Bytes,
        delta: i64,
    },
    HIncrByFloat {
        key: Key,
        field: Bytes,
        delta: f64,
    },
    HDel {
        key: Key,
        fields: Vec<Bytes>,
    },
    HExists {
        key: Key,
        field: Bytes,
    },
    HLen {
        key: Key,
    },
    HKeys {
        key: Key,
    },
    HVals {
        key: Key,
    },
    HGetAll {
        key: Key,
    },
}

impl HashCommand {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn to_cmd(&self) -> Cmd {
        let mut cmd = redis::cmd(self.name());
        match self {
            HashCommand::HGet { key, field } | HashCommand::HExists { key, field } => {
                cmd.arg(&key[..]).arg(&field[..]);
            }
            HashCommand::HSet { key, field, value } | HashCommand::HSetNx { key, field, value } => {
                cmd.arg(&key[..]).arg(&field[..]).arg(&value[..]);
            }
            HashCommand::HMSet { key, pairs } => {
                cmd.arg(&key[..]);
                for (field, value) in pairs {
                    cmd.arg(&field[..]).arg(&value[..]);
                }
            }
            HashCommand::HMGet { key, fields } | HashCommand::HDel { key, fields } => {
                cmd.arg(&key[..]);
                args(&mut cmd, fields);
            }
            HashCommand::HIncrBy { key, field, delta } => {
                cmd.arg(&key[..]).arg(&field[..]).arg(*delta);
            }
            HashCommand::HIncrByFloat { key, field, delta } => {
                cmd.arg(&key[..]).arg(&field[..]).arg(*delta);
            }
            HashCommand::HLen { key }
            | HashCommand::HKeys { key }
            | HashCommand::HVals { key }
            | HashCommand::HGetAll { key } => {
                cmd.arg(&key[..]);
            }
        }
        cmd
    }
}

impl Executable for HashCommand {
    fn exec(self, store: &mut InnerStoreLocked<'_>, db: Db) -> RedisResult<Value> {
        match self {
            HashCommand::HGet { key, field } => {
                let value = store.hash(db, &key)?.and_then(|hash| hash.get(&field));
                Ok(optional(value))
            }
            HashCommand::HSet { key, field, value } => {
                let previous = store.hash_entry(db, &key)?.insert(field, value);
                Ok(flag(previous.is_none()))
            }
            HashCommand::HSetNx { key, field, value } => {
                let hash = store.hash_entry(db, &key)?;
                if hash.contains_key(&field) {
                    return Ok(flag(false));
                }

                hash.insert(field, value);
                Ok(flag(true))
            }
            HashCommand::HMSet { key, pairs } => {
                store.hash_entry(db, &key)?.extend(pairs);
                Ok(Value::Okay)
            }
            HashCommand::HMGet { key, fields } => {
                let hash = store.hash(db, &key)?;
                let values = fields
                    .iter()
                    .map(|field| optional(hash.and_then(|hash| hash.get(field))))
                    .collect();
                Ok(Value::Bulk(values))
            }
            HashCommand::HIncrBy { key, field, delta } => {
                let current = store.hash(db, &key)?.and_then(|hash| hash.get(&field));
                let value = checked_increment(current, delta)?;

                store
                    .hash_entry(db, &key)?
                    .insert(field, Bytes::from(value.to_string()));
                Ok(Value::Int(value))
            }
            HashCommand::HIncrByFloat { key, field, delta } => {
                let current = match store.hash(db, &key)?.and_then(|hash| hash.get(&field)) {
                    Some(bytes) => std::str::from_utf8(bytes)
                        .ok()
                        .and_then(|s| s.parse::<f64>().ok())
                        .ok_or_else(not_a_float)?,
                    None => 0.0,
                };

                let value = current + delta;
                if !value.is_finite() {
                    return Err(RedisError::from((
                        ErrorKind::ResponseError,
                        "ERR increment would produce NaN or Infinity",
                    )));
                }

                let value = float(value);
                store.hash_entry(db, &key)?.insert(field, value.clone());
                Ok(data(&value))
            }
            HashCommand::HDel { key, fields } => {
                let Some(hash) = store.hash_mut(db, &key)? else {
                    return Ok(Value::Int(0));
                };

                let removed = fields
                    .iter()
                    .filter(|field| hash.remove(*field).is_some())
                    .count();
                store.remove_if_empty(db, &key);
                Ok(len(removed))
            }
            HashCommand::HExists { key, field } => {
                let exists = store
                    .hash(db, &key)?
                    .is_some_and(|hash| hash.contains_key(&field));
                Ok(flag(exists))
            }
            HashCommand::HLen { key } => Ok(len(store.hash(db, &key)?.map_or(0, |h| h.len()))),
            HashCommand::HKeys { key } => {
                let hash = store.hash(db, &key)?;
                Ok(bulk(hash.into_iter().flat_map(|hash| hash.keys()).sorted()))
            }
            HashCommand::HVals { key } => {
                let hash = store.hash(db, &key)?;
                let values = hash
                    .into_iter()
                    .flat_map(|hash| hash.iter())
                    .sorted()
                    .map(|(_, value)| value);
                Ok(bulk(values))
            }
            HashCommand::HGetAll { key } => {
                let hash = store.hash(db, &key)?;
                let pairs = hash
                    .into_iter()
                    .flat_map(|hash| hash.iter())
                    .sorted()
                    .flat_map(|(field, value)| [field, value]);
                Ok(bulk(pairs))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::bytes;
    use crate::store::Store;

    fn db() -> Db {
        Db::default()
    }

    fn run(store: &Store, cmd: HashCommand) -> RedisResult<Value> {
        cmd.exec(&mut store.lock(), db())
    }

    fn hset(store: &Store, field: &str, value: &str) -> Value {
        let cmd = HashCommand::HSet {
            key: bytes("hash"),
            field: bytes(field),
            value: bytes(value),
        };
        run(store, cmd).unwrap()
    }

    #[tokio::test]
    async fn hset_and_hget() {
        let store = Store::new();

        assert_eq!(hset(&store, "name", "redis"), Value::Int(1));
        assert_eq!(hset(&store, "name", "valkey"), Value::Int(0));

        let cmd = HashCommand::HGet {
            key: bytes("hash"),
            field: bytes("name"),
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Data(b"valkey".to_vec()));

        let cmd = HashCommand::HGet {
            key: bytes("hash"),
            field: bytes("missing"),
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Nil);
    }

    #[tokio::test]
    async fn hmset_and_hgetall() {
        let store = Store::new();

        let cmd = HashCommand::HMSet {
            key: bytes("hash"),
            pairs: vec![(bytes("b"), bytes("2")), (bytes("a"), bytes("1"))],
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Okay);

        let cmd = HashCommand::HGetAll { key: bytes("hash") };
        assert_eq!(
            run(&store, cmd).unwrap(),
            Value::Bulk(vec![
                Value::Data(b"a".to_vec()),
                Value::Data(b"1".to_vec()),
                Value::Data(b"b".to_vec()),
                Value::Data(b"2".to_vec()),
            ])
        );

        let cmd = HashCommand::HMGet {
            key: bytes("hash"),
            fields: vec![bytes("a"), bytes("c")],
        };
        assert_eq!(
            run(&store, cmd).unwrap(),
            Value::Bulk(vec![Value::Data(b"1".to_vec()), Value::Nil])
        );
    }

    #[tokio::test]
    async fn hincrby() {
        let store = Store::new();

        let incr = |delta| HashCommand::HIncrBy {
            key: bytes("hash"),
            field: bytes("count"),
            delta,
        };
        assert_eq!(run(&store, incr(5)).unwrap(), Value::Int(5));
        assert_eq!(run(&store, incr(-7)).unwrap(), Value::Int(-2));

        hset(&store, "name", "redis");
        let cmd = HashCommand::HIncrBy {
            key: bytes("hash"),
            field: bytes("name"),
            delta: 1,
        };
        assert!(run(&store, cmd).is_err());
    }

    #[tokio::test]
    async fn hincrbyfloat() {
        let store = Store::new();
        hset(&store, "price", "10.5");

        let cmd = HashCommand::HIncrByFloat {
            key: bytes("hash"),
            field: bytes("price"),
            delta: 0.1,
        };
        let res = run(&store, cmd).unwrap();
        let value: f64 = redis::from_redis_value(&res).unwrap();

        assert!((value - 10.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn hdel_removes_empty_hash() {
        let store = Store::new();
        hset(&store, "a", "1");
        hset(&store, "b", "2");

        let cmd = HashCommand::HDel {
            key: bytes("hash"),
            fields: vec![bytes("a"), bytes("b"), bytes("c")],
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Int(2));
        assert!(!store.lock().exists(db(), b"hash"));

        let cmd = HashCommand::HLen { key: bytes("hash") };
        assert_eq!(run(&store, cmd).unwrap(), Value::Int(0));
    }

    #[tokio::test]
    async fn hkeys_hvals_hexists() {
        let store = Store::new();
        hset(&store, "b", "2");
        hset(&store, "a", "1");

        let cmd = HashCommand::HKeys { key: bytes("hash") };
        assert_eq!(
            run(&store, cmd).unwrap(),
            Value::Bulk(vec![Value::Data(b"a".to_vec()), Value::Data(b"b".to_vec())])
        );

        let cmd = HashCommand::HVals { key: bytes("hash") };
        assert_eq!(
            run(&store, cmd).unwrap(),
            Value::Bulk(vec![Value::Data(b"1".to_vec()), Value::Data(b"2".to_vec())])
        );

        let cmd = HashCommand::HExists {
            key: bytes("hash"),
            field: bytes("a"),
        };
        assert_eq!(run(&store, cmd).unwrap(), Value::Int(1));
    }
}
