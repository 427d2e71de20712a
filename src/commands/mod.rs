pub mod executable;
pub mod hashes;
pub mod keys;
pub mod lists;
pub mod sets;
pub mod sorted_sets;
pub mod strings;

use bytes::Bytes;
use redis::{Cmd, RedisResult, Value};

use crate::commands::executable::Executable;
use crate::db::Db;
use crate::store::InnerStoreLocked;

pub use hashes::HashCommand;
pub use keys::{KeyCommand, SortOptions};
pub use lists::{InsertPosition, ListCommand};
pub use sets::SetCommand;
pub use sorted_sets::SortedSetCommand;
pub use strings::StringCommand;

/// A single store command: its name and arguments.
///
/// Variants of the family enums are named after the Redis command they stand for, so
/// `StringCommand::SetEx` is sent as `SETEX`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Key(KeyCommand),
    String(StringCommand),
    Hash(HashCommand),
    List(ListCommand),
    Set(SetCommand),
    SortedSet(SortedSetCommand),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Key(cmd) => cmd.name(),
            Command::String(cmd) => cmd.name(),
            Command::Hash(cmd) => cmd.name(),
            Command::List(cmd) => cmd.name(),
            Command::Set(cmd) => cmd.name(),
            Command::SortedSet(cmd) => cmd.name(),
        }
    }

    /// Packs the command for a Redis connection.
    pub fn to_cmd(&self) -> Cmd {
        match self {
            Command::Key(cmd) => cmd.to_cmd(),
            Command::String(cmd) => cmd.to_cmd(),
            Command::Hash(cmd) => cmd.to_cmd(),
            Command::List(cmd) => cmd.to_cmd(),
            Command::Set(cmd) => cmd.to_cmd(),
            Command::SortedSet(cmd) => cmd.to_cmd(),
        }
    }
}

impl Executable for Command {
    fn exec(self, store: &mut InnerStoreLocked<'_>, db: Db) -> RedisResult<Value> {
        match self {
            Command::Key(cmd) => cmd.exec(store, db),
            Command::String(cmd) => cmd.exec(store, db),
            Command::Hash(cmd) => cmd.exec(store, db),
            Command::List(cmd) => cmd.exec(store, db),
            Command::Set(cmd) => cmd.exec(store, db),
            Command::SortedSet(cmd) => cmd.exec(store, db),
        }
    }
}

impl From<KeyCommand> for Command {
    fn from(cmd: KeyCommand) -> Self {
        Command::Key(cmd)
    }
}

impl From<StringCommand> for Command {
    fn from(cmd: StringCommand) -> Self {
        Command::String(cmd)
    }
}

impl From<HashCommand> for Command {
    fn from(cmd: HashCommand) -> Self {
        Command::Hash(cmd)
    }
}

impl From<ListCommand> for Command {
    fn from(cmd: ListCommand) -> Self {
        Command::List(cmd)
    }
}

impl From<SetCommand> for Command {
    fn from(cmd: SetCommand) -> Self {
        Command::Set(cmd)
    }
}

impl From<SortedSetCommand> for Command {
    fn from(cmd: SortedSetCommand) -> Self {
        Command::SortedSet(cmd)
    }
}

pub(crate) fn bytes(value: impl AsRef<[u8]>) -> Bytes {
    Bytes::copy_from_slice(value.as_ref())
}

pub(crate) fn args<I>(cmd: &mut Cmd, items: I)
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    for item in items {
        cmd.arg(item.as_ref());
    }
}

pub(crate) fn data(value: &Bytes) -> Value {
    Value::Data(value.to_vec())
}

pub(crate) fn optional(value: Option<&Bytes>) -> Value {
    value.map(data).unwrap_or(Value::Nil)
}

pub(crate) fn bulk<'a>(items: impl IntoIterator<Item = &'a Bytes>) -> Value {
    Value::Bulk(items.into_iter().map(data).collect())
}

pub(crate) fn flag(value: bool) -> Value {
    Value::Int(i64::from(value))
}

pub(crate) fn len(len: usize) -> Value {
    Value::Int(len as i64)
}

/// Plain decimal digits, the form `HINCRBYFLOAT` stores.
pub(crate) fn float(value: f64) -> Bytes {
    Bytes::from(value.to_string())
}

/// A score as the server replies with it: the shortest digits that read back as the same
/// number, switching to exponent form outside `1e-4..1e17` like `%.17g` does.
pub(crate) fn double(value: f64) -> Bytes {
    if value.is_infinite() {
        return Bytes::from_static(if value > 0.0 { b"inf" } else { b"-inf" });
    }

    let scientific = format!("{value:e}");
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return float(value);
    };
    match exp.parse::<i32>() {
        Ok(exp) if !(-4..17).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            Bytes::from(format!("{mantissa}e{sign}{:02}", exp.abs()))
        }
        _ => float(value),
    }
}
