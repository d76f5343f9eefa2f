//! Exchange identifiers.
//!
//! Every command gets a UUID v7 exchange id. It is embedded in the callback
//! path handed to Bear and attached to every log line of the exchange, so a
//! callback can be tied back to the command that produced it.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one command/callback exchange.
///
/// UUID v7 is time-ordered, which keeps log output for concurrent exchanges
/// sortable by start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(Uuid);

impl ExchangeId {
    /// Generate a new exchange id (UUID v7)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse from the hyphenated string form used in callback paths
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Milliseconds since the Unix epoch encoded in the id, if it is a v7 UUID.
    pub fn timestamp_ms(&self) -> Option<u64> {
        let bytes = self.0.as_bytes();
        if (bytes[6] >> 4) != 7 {
            return None;
        }
        Some(
            bytes[..6]
                .iter()
                .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        )
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ExchangeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ExchangeId::new(), ExchangeId::new());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        let id = ExchangeId::new();
        let s = id.to_string();
        assert_eq!(s.len(), 36);
        assert_eq!(ExchangeId::parse(&s).unwrap(), id);
    }

    #[test]
    fn test_timestamp_is_recent() {
        let ts = ExchangeId::new().timestamp_ms().unwrap();
        let now_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        assert!(now_ms.abs_diff(ts) < 1000);
    }

    #[test]
    fn test_non_v7_has_no_timestamp() {
        let id = ExchangeId::from(Uuid::nil());
        assert!(id.timestamp_ms().is_none());
    }
}
