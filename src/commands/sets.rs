use bytes::Bytes;
use itertools::Itertools;
use rand::seq::IteratorRandom;
use redis::{Cmd, RedisResult, Value};
use std::collections::HashSet;
use strum_macros::IntoStaticStr;

use crate::commands::executable::Executable;
use crate::commands::{args, bulk, flag, len, optional};
use crate::db::Db;
use crate::store::{Data, InnerStoreLocked, Key};

/// Commands on set values.
///
/// Ref: <https://redis.io/docs/latest/commands/?group=set>
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SetCommand {
    SAdd {
        key: Key,
        members: Vec<Bytes>,
    },
    SRem {
        key: Key,
        members: Vec<Bytes>,
    },
    SPop {
        key: Key,
    },
    SDiff {
        keys: Vec<Key>,
    },
    SDiffStore {
        destination: Key,
        keys: Vec<Key>,
    },
    SInter {
        keys: Vec<Key>,
    },
    SInterStore {
        destination: Key,
        keys: Vec<Key>,
    },
    SUnion {
        keys: Vec<Key>,
    },
    SUnionStore {
        destination: Key,
        keys: Vec<Key>,
    },
    SMove {
        source: Key,
        destination: Key,
        member: Bytes,
    },
    SCard {
        key: Key,
    },
    SIsMember {
        key: Key,
        member: Bytes,
    },
    SRandMember {
        key: Key,
    },
    SMembers {
        key: Key,
    },
}

impl SetCommand {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn to_cmd(&self) -> Cmd {
        let mut cmd = redis::cmd(self.name());
        match self {
            SetCommand::SAdd { key, members } | SetCommand::SRem { key, members } => {
                cmd.arg(&key[..]);
                args(&mut cmd, members);
            }
            SetCommand::SDiff { keys }
            | SetCommand::SInter { keys }
            | SetCommand::SUnion { keys } => args(&mut cmd, keys),
            SetCommand::SDiffStore { destination, keys }
            | SetCommand::SInterStore { destination, keys }
            | SetCommand::SUnionStore { destination, keys } => {
                cmd.arg(&destination[..]);
                args(&mut cmd, keys);
            }
            SetCommand::SMove {
                source,
                destination,
                member,
            } => {
                cmd.arg(&source[..]).arg(&destination[..]).arg(&member[..]);
            }
            SetCommand::SIsMember { key, member } => {
                cmd.arg(&key[..]).arg(&member[..]);
            }
            SetCommand::SPop { key }
            | SetCommand::SCard { key }
            | SetCommand::SRandMember { key }
            | SetCommand::SMembers { key } => {
                cmd.arg(&key[..]);
            }
        }
        cmd
    }
}

#[derive(Clone, Copy)]
enum Algebra {
    Diff,
    Inter,
    Union,
}

/// Combines the sets under `keys` in order. Missing keys count as empty sets.
fn combine(
    store: &InnerStoreLocked<'_>,
    db: Db,
    keys: &[Key],
    algebra: Algebra,
) -> RedisResult<HashSet<Bytes>> {
    let mut sets = Vec::with_capacity(keys.len());
    for key in keys {
        sets.push(store.members(db, key)?);
    }

    let mut sets = sets.into_iter();
    let Some(first) = sets.next() else {
        return Ok(HashSet::new());
    };
    let mut result = first.cloned().unwrap_or_default();

    for set in sets {
        match (algebra, set) {
            (Algebra::Diff, Some(set)) => result.retain(|member| !set.contains(member)),
            (Algebra::Inter, Some(set)) => result.retain(|member| set.contains(member)),
            (Algebra::Inter, None) => result.clear(),
            (Algebra::Union, Some(set)) => result.extend(set.iter().cloned()),
            (Algebra::Diff | Algebra::Union, None) => {}
        }
    }

    Ok(result)
}

fn reply(members: &HashSet<Bytes>) -> Value {
    bulk(members.iter().sorted())
}

/// Stores `members` under `destination`, deleting it when the result is empty.
fn store_result(
    store: &mut InnerStoreLocked<'_>,
    db: Db,
    destination: Key,
    members: HashSet<Bytes>,
) -> Value {
    let count = members.len();
    if members.is_empty() {
        store.remove(db, &destination);
    } else {
        store.set(db, destination, Data::Set(members));
    }
    len(count)
}

impl Executable for SetCommand {
    fn exec(self, store: &mut InnerStoreLocked<'_>, db: Db) -> RedisResult<Value> {
        match self {
            SetCommand::SAdd { key, members } => {
                let set = store.members_entry(db, &key)?;
                let added = members
                    .into_iter()
                    .filter(|member| set.insert(member.clone()))
                    .count();
                Ok(len(added))
            }
            SetCommand::SRem { key, members } => {
                let Some(set) = store.members_mut(db, &key)? else {
                    return Ok(Value::Int(0));
                };

                let removed = members.iter().filter(|member| set.remove(*member)).count();
                store.remove_if_empty(db, &key);
                Ok(len(removed))
            }
            SetCommand::SPop { key } => {
                let member = store.members_mut(db, &key)?.and_then(|set| {
                    let member = set.iter().choose(&mut rand::thread_rng()).cloned()?;
                    set.remove(&member);
                    Some(member)
                });
                store.remove_if_empty(db, &key);
                Ok(optional(member.as_ref()))
            }
            SetCommand::SDiff { keys } => Ok(reply(&combine(store, db, &keys, Algebra::Diff)?)),
            SetCommand::SInter { keys } => Ok(reply(&combine(store, db, &keys, Algebra::Inter)?)),
            SetCommand::SUnion { keys } => Ok(reply(&combine(store, db, &keys, Algebra::Union)?)),
            SetCommand::SDiffStore { destination, keys } => {
                let members = combine(store, db, &keys, Algebra::Diff)?;
                Ok(store_result(store, db, destination, members))
            }
            SetCommand::SInterStore { destination, keys } => {
                let members = combine(store, db, &keys, Algebra::Inter)?;
                Ok(store_result(store, db, destination, members))
            }
            SetCommand::SUnionStore { destination, keys } => {
                let members = combine(store, db, &keys, Algebra::Union)?;
                Ok(store_result(store, db, destination, members))
            }
            SetCommand::SMove {
                source,
                destination,
                member,
            } => {
                store.members(db, &destination)?;

                let moved = store
                    .members_mut(db, &source)?
                    .is_some_and(|set| set.remove(&member));
                if !moved {
                    return Ok(flag(false));
                }

                store.remove_if_empty(db, &source);
                store.members_entry(db, &destination)?.insert(member);
                Ok(flag(true))
            }
            SetCommand::SCard { key } => Ok(len(store.members(db, &key)?.map_or(0, |s| s.len()))),
            SetCommand::SIsMember { key, member } => {
                let found = store
                    .members(db, &key)?
                    .is_some_and(|set| set.contains(&member));
                Ok(flag(found))
            }
            SetCommand::SRandMember { key } => {
                let member = store
                    .members(db, &key)?
                    .and_then(|set| set.iter().choose(&mut rand::thread_rng()));
                Ok(optional(member))
            }
            SetCommand::SMembers { key } => {
                let set = store.members(db, &key)?;
                Ok(bulk(set.into_iter().flatten().sorted()))
            }
        }
    }
}
