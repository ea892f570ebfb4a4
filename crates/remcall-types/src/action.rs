//! Action messages: serializable descriptions of work a node performs.
//!
//! Only the data lives here. Execution semantics belong to `remcall-kernel`.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Address, CodecError, Reference, StoredObject, Uid, cbor};

/// Run the method named by `path` on the object `_self` points at, keeping
/// the returned value under `id_at_location`.
///
/// Every reference must point at an object stored on the executing node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunClassMethodAction {
    pub path: String,
    #[serde(rename = "_self", default, skip_serializing_if = "Option::is_none")]
    pub self_ref: Option<Reference>,
    #[serde(default)]
    pub args: Vec<Reference>,
    #[serde(default)]
    pub kwargs: IndexMap<String, Reference>,
    pub id_at_location: Uid,
    pub address: Address,
    pub msg_id: Uid,
    #[serde(default)]
    pub is_static: bool,
}

impl RunClassMethodAction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        path: impl Into<String>,
        self_ref: Option<Reference>,
        args: Vec<Reference>,
        kwargs: IndexMap<String, Reference>,
        id_at_location: Uid,
        address: Address,
        msg_id: Option<Uid>,
        is_static: bool,
    ) -> Self {
        Self {
            path: path.into(),
            self_ref,
            args,
            kwargs,
            id_at_location,
            address,
            msg_id: msg_id.unwrap_or_else(Uid::generate),
            is_static,
        }
    }

    /// Bound method call on `receiver`.
    pub fn method(
        path: impl Into<String>,
        receiver: Reference,
        args: Vec<Reference>,
        id_at_location: Uid,
        address: Address,
    ) -> Self {
        Self::new(
            path,
            Some(receiver),
            args,
            IndexMap::new(),
            id_at_location,
            address,
            None,
            false,
        )
    }

    /// Static call with no receiver.
    pub fn function(
        path: impl Into<String>,
        args: Vec<Reference>,
        id_at_location: Uid,
        address: Address,
    ) -> Self {
        Self::new(
            path,
            None,
            args,
            IndexMap::new(),
            id_at_location,
            address,
            None,
            true,
        )
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, reference: Reference) -> Self {
        self.kwargs.insert(name.into(), reference);
        self
    }

    /// Last dotted segment of the path.
    pub fn method_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn pprint(&self) -> String {
        format!("RunClassMethodAction({})", self.path)
    }

    /// Substitute `new` for `current`: the receiver if it matches, otherwise
    /// the first matching positional argument. Returns whether anything
    /// changed; argument order and count are preserved.
    pub fn remap_input(&mut self, current: &Reference, new: Reference) -> bool {
        if let Some(self_ref) = self.self_ref.as_mut() {
            if self_ref.same_target(current) {
                *self_ref = new;
                return true;
            }
        }
        match self.args.iter_mut().find(|arg| arg.same_target(current)) {
            Some(arg) => {
                *arg = new;
                true
            }
            None => false,
        }
    }

    pub fn to_wire(&self) -> Result<Vec<u8>, CodecError> {
        cbor::to_cbor(self)
    }

    pub fn from_wire(bytes: &[u8]) -> Result<Self, CodecError> {
        cbor::from_cbor(bytes)
    }
}

impl fmt::Display for RunClassMethodAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pprint())
    }
}

/// Fetch a stored object; the reply is sent to `reply_to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetObjectAction {
    pub id_at_location: Uid,
    pub address: Address,
    pub reply_to: Address,
    pub msg_id: Uid,
    /// Delete the object once it has been handed out.
    #[serde(default)]
    pub delete_obj: bool,
}

impl GetObjectAction {
    pub fn new(id_at_location: Uid, address: Address, reply_to: Address) -> Self {
        Self {
            id_at_location,
            address,
            reply_to,
            msg_id: Uid::generate(),
            delete_obj: false,
        }
    }

    pub fn pprint(&self) -> String {
        format!("GetObjectAction({})", self.id_at_location.short())
    }
}

/// Reply to [`GetObjectAction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetObjectResponse {
    pub obj: StoredObject,
    pub address: Address,
    pub msg_id: Uid,
}

/// Insert an object produced upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveObjectAction {
    pub obj: StoredObject,
    pub address: Address,
    pub msg_id: Uid,
}

impl SaveObjectAction {
    pub fn new(obj: StoredObject, address: Address) -> Self {
        Self {
            obj,
            address,
            msg_id: Uid::generate(),
        }
    }

    pub fn pprint(&self) -> String {
        format!("SaveObjectAction({})", self.obj.id.short())
    }
}

/// Deferred computation: a recorded action sequence replayed against the
/// references it is called with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uid>,
    pub inputs: Vec<Reference>,
    pub actions: Vec<RunClassMethodAction>,
    pub outputs: Vec<Reference>,
}

impl Plan {
    pub fn new(
        inputs: Vec<Reference>,
        actions: Vec<RunClassMethodAction>,
        outputs: Vec<Reference>,
    ) -> Self {
        Self {
            id: None,
            inputs,
            actions,
            outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunClassMethodAction {
        RunClassMethodAction::method(
            "torch.Tensor.add",
            Reference::new(Uid::generate()),
            vec![Reference::new(Uid::generate()), Reference::new(Uid::generate())],
            Uid::generate(),
            Address::new().with_vm(Uid::generate()),
        )
        .with_kwarg("alpha", Reference::new(Uid::generate()))
        .with_kwarg("out", Reference::at(Uid::generate(), Address::new().with_domain(Uid::generate())))
    }

    #[test]
    fn wire_round_trip_preserves_every_field() {
        let action = sample();
        let bytes = action.to_wire().expect("encode");
        let decoded = RunClassMethodAction::from_wire(&bytes).expect("decode");
        assert_eq!(decoded, action);
        let names: Vec<_> = decoded.kwargs.keys().cloned().collect();
        assert_eq!(names, vec!["alpha".to_string(), "out".to_string()]);
    }

    #[test]
    fn static_flag_defaults_to_false_on_the_wire() {
        let action = sample();
        let mut value: serde_cbor::Value =
            serde_cbor::from_slice(&action.to_wire().expect("encode")).expect("decode value");
        if let serde_cbor::Value::Map(map) = &mut value {
            map.remove(&serde_cbor::Value::Text("is_static".into()));
        }
        let bytes = serde_cbor::to_vec(&value).expect("re-encode");
        let decoded = RunClassMethodAction::from_wire(&bytes).expect("decode");
        assert!(!decoded.is_static);
        assert_eq!(decoded.path, action.path);
    }

    #[test]
    fn remap_prefers_receiver() {
        let mut action = sample();
        let receiver = action.self_ref.expect("receiver");
        let replacement = Reference::new(Uid::generate());
        let before = action.clone();

        assert!(action.remap_input(&receiver, replacement));
        assert_eq!(action.self_ref, Some(replacement));
        assert_eq!(action.args, before.args);
        assert_eq!(action.kwargs, before.kwargs);
        assert_eq!(action.id_at_location, before.id_at_location);
        assert_eq!(action.msg_id, before.msg_id);
    }

    #[test]
    fn remap_replaces_first_matching_argument_only() {
        let shared = Reference::new(Uid::generate());
        let mut action = RunClassMethodAction::function(
            "torch.tensor",
            vec![Reference::new(Uid::generate()), shared, shared],
            Uid::generate(),
            Address::new(),
        );
        let replacement = Reference::new(Uid::generate());
        assert!(action.remap_input(&shared, replacement));
        assert_eq!(action.args.len(), 3);
        assert_eq!(action.args[1], replacement);
        assert_eq!(action.args[2], shared);
    }

    #[test]
    fn remap_without_match_is_a_no_op() {
        let mut action = sample();
        let before = action.clone();
        assert!(!action.remap_input(&Reference::new(Uid::generate()), Reference::new(Uid::generate())));
        assert_eq!(action, before);
    }

    #[test]
    fn method_name_is_last_segment() {
        let action = sample();
        assert_eq!(action.method_name(), "add");
        assert_eq!(action.to_string(), "RunClassMethodAction(torch.Tensor.add)");
    }
}
