use redis::{RedisResult, Value};

use crate::db::Db;
use crate::store::InnerStoreLocked;

/// Runs a command against the in-process store, producing the reply a Redis server would send.
pub trait Executable {
    fn exec(self, store: &mut InnerStoreLocked<'_>, db: Db) -> RedisResult<Value>;
}
