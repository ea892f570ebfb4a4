use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{PrincipalKey, Uid};

/// Who may read a value, and under which grant (request id).
///
/// Keeps insertion order so intersections and encodings are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessSet(IndexMap<PrincipalKey, Uid>);

impl AccessSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys present on both sides; markers are taken from `self` and the
    /// other side's markers are discarded.
    pub fn intersect(&self, other: &AccessSet) -> AccessSet {
        self.0
            .iter()
            .filter(|(key, _)| other.0.contains_key(*key))
            .map(|(key, marker)| (*key, *marker))
            .collect()
    }

    pub fn grant(&mut self, key: PrincipalKey, marker: Uid) -> Option<Uid> {
        self.0.insert(key, marker)
    }

    pub fn revoke(&mut self, key: &PrincipalKey) -> Option<Uid> {
        self.0.shift_remove(key)
    }

    pub fn contains(&self, key: &PrincipalKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn marker(&self, key: &PrincipalKey) -> Option<&Uid> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PrincipalKey> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PrincipalKey, &Uid)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(PrincipalKey, Uid)> for AccessSet {
    fn from_iter<I: IntoIterator<Item = (PrincipalKey, Uid)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for AccessSet {
    type Item = (PrincipalKey, Uid);
    type IntoIter = indexmap::map::IntoIter<PrincipalKey, Uid>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
