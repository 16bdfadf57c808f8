//! 12-byte, time-ordered object identifiers.
//!
//! Layout: 4-byte big-endian Unix seconds, 5 bytes of per-process randomness, 3-byte counter.
//! Identifiers created later in the same process sort after earlier ones.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ObjectIdError;

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(rand::random);
static COUNTER: LazyLock<AtomicU32> = LazyLock::new(|| AtomicU32::new(rand::random::<u32>()));

const COUNTER_MASK: u32 = 0x00FF_FFFF;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    #[must_use]
    pub fn new() -> Self {
        let secs = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parse the 24-character hexadecimal form.
    ///
    /// # Errors
    /// Returns [`ObjectIdError`] on wrong length or non-hex input.
    pub fn parse_str(s: &str) -> Result<Self, ObjectIdError> {
        if s.len() != 24 {
            return Err(ObjectIdError::InvalidLength(s.len()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ObjectIdError::InvalidHex)?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creation time encoded in the identifier (second precision).
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        DateTime::from_timestamp(i64::from(secs), 0).unwrap_or_default()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let id = ObjectId::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 24);
        assert_eq!(ObjectId::parse_str(&hex).unwrap(), id);
    }

    #[test]
    fn later_ids_sort_after_earlier_ones() {
        let ids: Vec<_> = (0..100).map(|_| ObjectId::new()).collect();
        // The counter starts at a random value and may wrap once within a second.
        let descents = ids.windows(2).filter(|w| w[0] >= w[1]).count();
        assert!(descents <= 1);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(
            ObjectId::parse_str("abc"),
            Err(ObjectIdError::InvalidLength(3))
        );
        assert_eq!(
            ObjectId::parse_str("zzzzzzzzzzzzzzzzzzzzzzzz"),
            Err(ObjectIdError::InvalidHex)
        );
    }

    #[test]
    fn timestamp_is_close_to_now() {
        let id = ObjectId::new();
        let drift = (Utc::now() - id.timestamp()).num_seconds();
        assert!((0..=2).contains(&drift));
    }
}
