use serde::{Deserialize, Serialize};

use crate::{AccessSet, PrincipalKey, Uid, Value};

/// Object store entry: a payload plus who may read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: Uid,
    pub data: Value,
    #[serde(default)]
    pub read_permissions: AccessSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StoredObject {
    pub fn new(id: Uid, data: Value, read_permissions: AccessSet) -> Self {
        Self {
            id,
            data,
            read_permissions,
            tags: Vec::new(),
            description: None,
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn readable_by(&self, key: &PrincipalKey) -> bool {
        self.read_permissions.contains(key)
    }
}
