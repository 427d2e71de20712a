pub mod commands;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod executor;
pub mod pool;
pub mod serialize;
pub mod server;
pub mod store;
pub mod utils;

pub use config::Config;
pub use db::Db;
pub use error::{Error, OrSentinel, Result};
pub use executor::Executor;
pub use pool::Pool;
