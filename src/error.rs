use redis::RedisError;
use thiserror::Error as ThisError;
use tracing::warn;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between a caller and the store.
///
/// Failures are logged where they happen and handed back as one of these variants, so callers
/// can tell "key absent" (an `Ok` carrying `None`, `0`, ...) apart from "store unreachable".
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("no connection available in the pool before the wait timeout")]
    PoolExhausted,
    #[error("could not connect to the store: {0}")]
    Connection(#[source] RedisError),
    #[error("command failed: {0}")]
    Command(#[source] RedisError),
    #[error("serialization failed: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("pool error: {0}")]
    Pool(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Error::Argument(msg.into())
    }
}

/// Collapses a failed command into the "empty" value of its result type.
///
/// For callers that only want a best-effort answer: `None`, `0`, `false` or an empty
/// collection. The error is logged.
pub trait OrSentinel<T> {
    fn or_sentinel(self) -> T;
}

impl<T: Default> OrSentinel<T> for Result<T> {
    fn or_sentinel(self) -> T {
        self.unwrap_or_else(|err| {
            warn!(error = %err, "command failed, falling back to the empty value");
            T::default()
        })
    }
}
