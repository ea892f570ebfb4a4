use serde::{Deserialize, Serialize};

use crate::{Address, Uid};

/// Pointer to a value that should exist in some node's store.
///
/// Never carries the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub id_at_location: Uid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl Reference {
    pub fn new(id_at_location: Uid) -> Self {
        Self {
            id_at_location,
            address: None,
        }
    }

    pub fn at(id_at_location: Uid, address: Address) -> Self {
        Self {
            id_at_location,
            address: Some(address),
        }
    }

    /// Two references name the same value when their identifiers match,
    /// regardless of address.
    pub fn same_target(&self, other: &Reference) -> bool {
        self.id_at_location == other.id_at_location
    }
}

impl From<Uid> for Reference {
    fn from(value: Uid) -> Self {
        Reference::new(value)
    }
}
