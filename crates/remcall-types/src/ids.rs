use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Opaque, globally unique identifier used as store key and result name.
///
/// Encodes as 16 raw bytes in CBOR and as a hyphenated string in JSON.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(Uuid);

impl Uid {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Short prefix used in log lines.
    pub fn short(&self) -> String {
        let mut s = self.0.simple().to_string();
        s.truncate(8);
        s
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Uid").field(&self.0.hyphenated().to_string()).finish()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl From<Uuid> for Uid {
    fn from(value: Uuid) -> Self {
        Uid(value)
    }
}

impl From<[u8; 16]> for Uid {
    fn from(value: [u8; 16]) -> Self {
        Uid(Uuid::from_bytes(value))
    }
}

impl FromStr for Uid {
    type Err = UidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Uid)
            .map_err(|source| UidParseError {
                value: s.to_string(),
                source,
            })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid identifier '{value}': {source}")]
pub struct UidParseError {
    value: String,
    #[source]
    source: uuid::Error,
}
