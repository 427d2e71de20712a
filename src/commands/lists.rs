use bytes::Bytes;
use redis::{Cmd, ErrorKind, RedisError, RedisResult, Value};
use std::collections::VecDeque;
use strum_macros::IntoStaticStr;

use crate::commands::executable::Executable;
use crate::commands::{args, bulk, data, len, optional};
use crate::db::Db;
use crate::store::{InnerStoreLocked, Key};
use crate::utils::range;

/// Where `LINSERT` puts the new element relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum InsertPosition {
    Before,
    After,
}

/// Commands on list values.
///
/// Ref: <https://redis.io/docs/latest/commands/?group=list>
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ListCommand {
    LPush {
        key: Key,
        values: Vec<Bytes>,
    },
    RPush {
        key: Key,
        values: Vec<Bytes>,
    },
    /// Replies the new length, -1 when the pivot is not found and 0 when the key is missing.
    LInsert {
        key: Key,
        position: InsertPosition,
        pivot: Bytes,
        value: Bytes,
    },
    LSet {
        key: Key,
        index: i64,
        value: Bytes,
    },
    /// Removes up to `count` occurrences from the head, from the tail when negative, or all of
    /// them when zero.
    LRem {
        key: Key,
        count: i64,
        value: Bytes,
    },
    LTrim {
        key: Key,
        start: i64,
        stop: i64,
    },
    LPop {
        key: Key,
    },
    RPop {
        key: Key,
    },
    RPopLPush {
        source: Key,
        destination: Key,
    },
    LIndex {
        key: Key,
        index: i64,
    },
    LLen {
        key: Key,
    },
    LRange {
        key: Key,
        start: i64,
        stop: i64,
    },
}

impl ListCommand {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn to_cmd(&self) -> Cmd {
        let mut cmd = redis::cmd(self.name());
        match self {
            ListCommand::LPush { key, values } | ListCommand::RPush { key, values } => {
                cmd.arg(&key[..]);
                args(&mut cmd, values);
            }
            ListCommand::LInsert {
                key,
                position,
                pivot,
                value,
            } => {
                let position: &'static str = position.into();
                cmd.arg(&key[..])
                    .arg(position)
                    .arg(&pivot[..])
                    .arg(&value[..]);
            }
            ListCommand::LSet { key, index, value } => {
                cmd.arg(&key[..]).arg(*index).arg(&value[..]);
            }
            ListCommand::LRem { key, count, value } => {
                cmd.arg(&key[..]).arg(*count).arg(&value[..]);
            }
            ListCommand::LTrim { key, start, stop } | ListCommand::LRange { key, start, stop } => {
                cmd.arg(&key[..]).arg(*start).arg(*stop);
            }
            ListCommand::LPop { key } | ListCommand::RPop { key } | ListCommand::LLen { key } => {
                cmd.arg(&key[..]);
            }
            ListCommand::RPopLPush {
                source,
                destination,
            } => {
                cmd.arg(&source[..]).arg(&destination[..]);
            }
            ListCommand::LIndex { key, index } => {
                cmd.arg(&key[..]).arg(*index);
            }
        }
        cmd
    }
}

fn no_such_key() -> RedisError {
    RedisError::from((ErrorKind::ResponseError, "ERR no such key"))
}

fn index_out_of_range() -> RedisError {
    RedisError::from((ErrorKind::ResponseError, "ERR index out of range"))
}

impl Executable for ListCommand {
    fn exec(self, store: &mut InnerStoreLocked<'_>, db: Db) -> RedisResult<Value> {
        match self {
            ListCommand::LPush { key, values } => {
                let list = store.list_entry(db, &key)?;
                for value in values {
                    list.push_front(value);
                }
                Ok(len(list.len()))
            }
            ListCommand::RPush { key, values } => {
                let list = store.list_entry(db, &key)?;
                list.extend(values);
                Ok(len(list.len()))
            }
            ListCommand::LInsert {
                key,
                position,
                pivot,
                value,
            } => {
                let Some(list) = store.list_mut(db, &key)? else {
                    return Ok(Value::Int(0));
                };
                let Some(index) = list.iter().position(|item| *item == pivot) else {
                    return Ok(Value::Int(-1));
                };

                let index = match position {
                    InsertPosition::Before => index,
                    InsertPosition::After => index + 1,
                };
                list.insert(index, value);
                Ok(len(list.len()))
            }
            ListCommand::LSet { key, index, value } => {
                let list = store.list_mut(db, &key)?.ok_or_else(no_such_key)?;
                let index = range::index(index, list.len()).ok_or_else(index_out_of_range)?;
                list[index] = value;
                Ok(Value::Okay)
            }
            ListCommand::LRem { key, count, value } => {
                let Some(list) = store.list_mut(db, &key)? else {
                    return Ok(Value::Int(0));
                };

                let limit = match count {
                    0 => usize::MAX,
                    count => count.unsigned_abs() as usize,
                };
                let mut removed = 0;

                if count >= 0 {
                    list.retain(|item| {
                        let remove = removed < limit && *item == value;
                        if remove {
                            removed += 1;
                        }
                        !remove
                    });
                } else {
                    let mut kept = VecDeque::with_capacity(list.len());
                    while let Some(item) = list.pop_back() {
                        if removed < limit && item == value {
                            removed += 1;
                        } else {
                            kept.push_front(item);
                        }
                    }
                    *list = kept;
                }

                store.remove_if_empty(db, &key);
                Ok(len(removed))
            }
            ListCommand::LTrim { key, start, stop } => {
                let Some(list) = store.list_mut(db, &key)? else {
                    return Ok(Value::Okay);
                };

                match range::inclusive(start, stop, list.len()) {
                    Some((start, stop)) => {
                        list.truncate(stop + 1);
                        list.drain(..start);
                    }
                    None => list.clear(),
                }

                store.remove_if_empty(db, &key);
                Ok(Value::Okay)
            }
            ListCommand::LPop { key } => {
                let item = store.list_mut(db, &key)?.and_then(VecDeque::pop_front);
                store.remove_if_empty(db, &key);
                Ok(optional(item.as_ref()))
            }
            ListCommand::RPop { key } => {
                let item = store.list_mut(db, &key)?.and_then(VecDeque::pop_back);
                store.remove_if_empty(db, &key);
                Ok(optional(item.as_ref()))
            }
            ListCommand::RPopLPush {
                source,
                destination,
            } => {
                // The destination is checked first so a type error does not lose the element.
                store.list(db, &destination)?;

                let Some(item) = store.list_mut(db, &source)?.and_then(VecDeque::pop_back) else {
                    return Ok(Value::Nil);
                };
                store.remove_if_empty(db, &source);

                store.list_entry(db, &destination)?.push_front(item.clone());
                Ok(data(&item))
            }
            ListCommand::LIndex { key, index } => {
                let item = store
                    .list(db, &key)?
                    .and_then(|list| range::index(index, list.len()).map(|i| &list[i]));
                Ok(optional(item))
            }
            ListCommand::LLen { key } => Ok(len(store.list(db, &key)?.map_or(0, |l| l.len()))),
            ListCommand::LRange { key, start, stop } => {
                let Some(list) = store.list(db, &key)? else {
                    return Ok(Value::Bulk(vec![]));
                };

                let items = match range::inclusive(start, stop, list.len()) {
                    Some((start, stop)) => list.range(start..=stop).collect(),
                    None => vec![],
                };
                Ok(bulk(items))
            }
        }
    }
}
