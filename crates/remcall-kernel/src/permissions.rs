//! Read-permission propagation: a computed value is readable only by
//! principals that could read every input.

use remcall_types::AccessSet;

/// Left-to-right intersection over the inputs of one call.
///
/// A fold seeded with a receiver starts from the receiver's set. An
/// unconstrained fold (static calls) adopts the first input's set, so the
/// markers of the leftmost input survive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionFold {
    acc: Option<AccessSet>,
}

impl PermissionFold {
    pub fn unconstrained() -> Self {
        Self { acc: None }
    }

    pub fn seeded(seed: AccessSet) -> Self {
        Self { acc: Some(seed) }
    }

    pub fn absorb(&mut self, input: &AccessSet) {
        let next = match self.acc.take() {
            Some(acc) => acc.intersect(input),
            None => input.clone(),
        };
        self.acc = Some(next);
    }

    /// Sets with no inputs at all resolve to nobody.
    pub fn finish(self) -> AccessSet {
        self.acc.unwrap_or_default()
    }
}
