use bytes::Bytes;
use itertools::Itertools;
use redis::{Cmd, RedisResult, Value};
use std::collections::HashMap;
use strum_macros::IntoStaticStr;

use crate::commands::executable::Executable;
use crate::commands::{args, bulk, data, double, flag, len};
use crate::db::Db;
use crate::store::{not_a_float, InnerStoreLocked, Key};
use crate::utils::range;

/// Commands on sorted set values. Members are ordered by score, then lexicographically.
///
/// Ref: <https://redis.io/docs/latest/commands/?group=sorted-set>
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SortedSetCommand {
    ZAdd {
        key: Key,
        score: f64,
        member: Bytes,
    },
    ZRange {
        key: Key,
        start: i64,
        stop: i64,
    },
    ZRevRange {
        key: Key,
        start: i64,
        stop: i64,
    },
    /// Both bounds are inclusive; infinite bounds are allowed.
    ZRangeByScore {
        key: Key,
        min: f64,
        max: f64,
    },
    ZCount {
        key: Key,
        min: f64,
        max: f64,
    },
    ZCard {
        key: Key,
    },
    ZRem {
        key: Key,
        members: Vec<Bytes>,
    },
    ZIncrBy {
        key: Key,
        delta: f64,
        member: Bytes,
    },
    ZRank {
        key: Key,
        member: Bytes,
    },
    ZRevRank {
        key: Key,
        member: Bytes,
    },
    ZScore {
        key: Key,
        member: Bytes,
    },
    ZRemRangeByRank {
        key: Key,
        start: i64,
        stop: i64,
    },
    ZRemRangeByScore {
        key: Key,
        min: f64,
        max: f64,
    },
}

impl SortedSetCommand {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn to_cmd(&self) -> Cmd {
        let mut cmd = redis::cmd(self.name());
        match self {
            SortedSetCommand::ZAdd { key, score, member } => {
                cmd.arg(&key[..]).arg(*score).arg(&member[..]);
            }
            SortedSetCommand::ZRange { key, start, stop }
            | SortedSetCommand::ZRevRange { key, start, stop }
            | SortedSetCommand::ZRemRangeByRank { key, start, stop } => {
                cmd.arg(&key[..]).arg(*start).arg(*stop);
            }
            SortedSetCommand::ZRangeByScore { key, min, max }
            | SortedSetCommand::ZCount { key, min, max }
            | SortedSetCommand::ZRemRangeByScore { key, min, max } => {
                cmd.arg(&key[..]).arg(*min).arg(*max);
            }
            SortedSetCommand::ZCard { key } => {
                cmd.arg(&key[..]);
            }
            SortedSetCommand::ZRem { key, members } => {
                cmd.arg(&key[..]);
                args(&mut cmd, members);
            }
            SortedSetCommand::ZIncrBy { key, delta, member } => {
                cmd.arg(&key[..]).arg(*delta).arg(&member[..]);
            }
            SortedSetCommand::ZRank { key, member }
            | SortedSetCommand::ZRevRank { key, member }
            | SortedSetCommand::ZScore { key, member } => {
                cmd.arg(&key[..]).arg(&member[..]);
            }
        }
        cmd
    }
}

/// Members in ascending (score, member) order.
fn ordered(zset: &HashMap<Bytes, f64>) -> Vec<(&Bytes, f64)> {
    zset.iter()
        .map(|(member, score)| (member, *score))
        .sorted_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .collect()
}

fn in_range(score: f64, min: f64, max: f64) -> bool {
    min <= score && score <= max
}

fn rank(zset: &HashMap<Bytes, f64>, member: &Bytes, reverse: bool) -> Value {
    if !zset.contains_key(member) {
        return Value::Nil;
    }

    let ordered = ordered(zset);
    let position = ordered.iter().position(|(m, _)| *m == member);
    match position {
        Some(rank) if reverse => len(ordered.len() - 1 - rank),
        Some(rank) => len(rank),
        None => Value::Nil,
    }
}

fn zrange(
    store: &InnerStoreLocked<'_>,
    db: Db,
    key: &[u8],
    start: i64,
    stop: i64,
    reverse: bool,
) -> RedisResult<Value> {
    let Some(zset) = store.sorted_set(db, key)? else {
        return Ok(Value::Bulk(vec![]));
    };

    let mut ordered = ordered(zset);
    if reverse {
        ordered.reverse();
    }

    let members = match range::inclusive(start, stop, ordered.len()) {
        Some((start, stop)) => ordered[start..=stop].iter().map(|(m, _)| *m).collect(),
        None => vec![],
    };
    Ok(bulk(members))
}

impl Executable for SortedSetCommand {
    fn exec(self, store: &mut InnerStoreLocked<'_>, db: Db) -> RedisResult<Value> {
        match self {
            SortedSetCommand::ZAdd { key, score, member } => {
                if score.is_nan() {
                    return Err(not_a_float());
                }

                let previous = store.sorted_set_entry(db, &key)?.insert(member, score);
                Ok(flag(previous.is_none()))
            }
            SortedSetCommand::ZRange { key, start, stop } => {
                zrange(store, db, &key, start, stop, false)
            }
            SortedSetCommand::ZRevRange { key, start, stop } => {
                zrange(store, db, &key, start, stop, true)
            }
            SortedSetCommand::ZRangeByScore { key, min, max } => {
                let zset = store.sorted_set(db, &key)?;
                let members = zset
                    .map(ordered)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|(_, score)| in_range(*score, min, max))
                    .map(|(member, _)| member);
                Ok(bulk(members))
            }
            SortedSetCommand::ZCount { key, min, max } => {
                let count = store.sorted_set(db, &key)?.map_or(0, |zset| {
                    zset.values()
                        .filter(|score| in_range(**score, min, max))
                        .count()
                });
                Ok(len(count))
            }
            SortedSetCommand::ZCard { key } => {
                Ok(len(store.sorted_set(db, &key)?.map_or(0, |z| z.len())))
            }
            SortedSetCommand::ZRem { key, members } => {
                let Some(zset) = store.sorted_set_mut(db, &key)? else {
                    return Ok(Value::Int(0));
                };

                let removed = members
                    .iter()
                    .filter(|member| zset.remove(*member).is_some())
                    .count();
                store.remove_if_empty(db, &key);
                Ok(len(removed))
            }
            SortedSetCommand::ZIncrBy { key, delta, member } => {
                let zset = store.sorted_set_entry(db, &key)?;
                let score = zset.get(&member).copied().unwrap_or(0.0) + delta;
                if score.is_nan() {
                    store.remove_if_empty(db, &key);
                    return Err(not_a_float());
                }

                zset.insert(member, score);
                Ok(data(&double(score)))
            }
            SortedSetCommand::ZRank { key, member } => {
                let zset = store.sorted_set(db, &key)?;
                Ok(zset.map_or(Value::Nil, |zset| rank(zset, &member, false)))
            }
            SortedSetCommand::ZRevRank { key, member } => {
                let zset = store.sorted_set(db, &key)?;
                Ok(zset.map_or(Value::Nil, |zset| rank(zset, &member, true)))
            }
            SortedSetCommand::ZScore { key, member } => {
                let score = store
                    .sorted_set(db, &key)?
                    .and_then(|zset| zset.get(&member).copied());
                Ok(score.map_or(Value::Nil, |score| data(&double(score))))
            }
            SortedSetCommand::ZRemRangeByRank { key, start, stop } => {
                let Some(zset) = store.sorted_set_mut(db, &key)? else {
                    return Ok(Value::Int(0));
                };

                let doomed: Vec<Bytes> = match range::inclusive(start, stop, zset.len()) {
                    Some((start, stop)) => ordered(zset)[start..=stop]
                        .iter()
                        .map(|(member, _)| (*member).clone())
                        .collect(),
                    None => vec![],
                };
                for member in &doomed {
                    zset.remove(member);
                }

                store.remove_if_empty(db, &key);
                Ok(len(doomed.len()))
            }
            SortedSetCommand::ZRemRangeByScore { key, min, max } => {
                let Some(zset) = store.sorted_set_mut(db, &key)? else {
                    return Ok(Value::Int(0));
                };

                let before = zset.len();
                zset.retain(|_, score| !in_range(*score, min, max));
                let removed = before - zset.len();

                store.remove_if_empty(db, &key);
                Ok(len(removed))
            }
        }
    }
}
