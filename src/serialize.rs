//! Opaque blob encoding for structured values stored under a single key.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

/// Fails with [`crate::Error::Serialization`] on truncated or corrupted input.
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}
