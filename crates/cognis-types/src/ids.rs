//! Process-local unique identifiers.
//!
//! The source system this platform is modeled on used a global sequence
//! counter for message/task IDs. That does not translate cleanly: instead
//! every ID combines a coarse wall-clock high bits with a per-process
//! monotonic counter, so IDs are unique within a process lifetime and
//! weakly time-ordered across processes without any shared coordination.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A process-local, weakly time-ordered identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id {
    time_hi: u64,
    seq: u32,
}

impl Id {
    /// Generate a new identifier. Unique within this process's lifetime;
    /// two IDs generated in the same process compare in generation order.
    pub fn new() -> Self {
        let time_hi = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self { time_hi, seq }
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:013x}-{:08x}", self.time_hi, self.seq)
    }
}

impl serde::Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let (hi, seq) = s
            .split_once('-')
            .ok_or_else(|| serde::de::Error::custom("malformed id"))?;
        let time_hi =
            u64::from_str_radix(hi, 16).map_err(|e| serde::de::Error::custom(e.to_string()))?;
        let seq =
            u32::from_str_radix(seq, 16).map_err(|e| serde::de::Error::custom(e.to_string()))?;
        Ok(Self { time_hi, seq })
    }
}

#[derive(Debug)]
pub struct ParseIdError;

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed id")
    }
}

impl std::error::Error for ParseIdError {}

impl std::str::FromStr for Id {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hi, seq) = s.split_once('-').ok_or(ParseIdError)?;
        let time_hi = u64::from_str_radix(hi, 16).map_err(|_| ParseIdError)?;
        let seq = u32::from_str_radix(seq, 16).map_err(|_| ParseIdError)?;
        Ok(Self { time_hi, seq })
    }
}

/// Current epoch-seconds timestamp, used for `created`/`timestamp` fields.
pub fn epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ordered() {
        let a = Id::new();
        let b = Id::new();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn id_roundtrips_through_json() {
        let id = Id::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: Id = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn id_roundtrips_through_its_display_and_fromstr() {
        let id = Id::new();
        let back: Id = id.to_string().parse().unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn parsing_a_malformed_id_fails() {
        assert!("not-an-id".parse::<Id>().is_err());
        assert!("nohyphen".parse::<Id>().is_err());
    }
}
