use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Number of logical databases a store serves.
pub const DATABASES: u8 = 16;

/// Index of one of the isolated keyspaces served by the same store.
///
/// Always in `0..DATABASES`; the only way to get one is through [`Db::new`] (or the default,
/// database 0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Db(u8);

impl Db {
    pub fn new(index: u8) -> Result<Db> {
        if index < DATABASES {
            Ok(Db(index))
        } else {
            Err(Error::argument(format!(
                "database index {index} out of range, expected 0..{DATABASES}"
            )))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Db> {
        (0..DATABASES).map(Db)
    }
}

impl TryFrom<u8> for Db {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self> {
        Db::new(index)
    }
}

impl From<Db> for u8 {
    fn from(db: Db) -> u8 {
        db.0
    }
}

impl fmt::Display for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
