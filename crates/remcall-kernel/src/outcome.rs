use remcall_types::{Uid, Value};

use crate::error::KernelError;

/// Raw call result, classified once before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// Scalar or plain container; stored inside a boxed envelope.
    Primitive(Value),
    /// Exposes an identity slot that must end up equal to the destination.
    Identified(Value),
    /// No identity slot; stored as returned.
    Opaque(Value),
}

impl CallResult {
    pub fn classify(value: Value) -> Self {
        if value.is_primitive() {
            CallResult::Primitive(value)
        } else if value.has_identity_slot() {
            CallResult::Identified(value)
        } else {
            CallResult::Opaque(value)
        }
    }

    /// Payload to store under `destination`.
    pub fn into_payload(self, destination: Uid, path: &str) -> Result<Value, KernelError> {
        match self {
            CallResult::Primitive(value) => Ok(Value::boxed(destination, value)),
            CallResult::Identified(mut value) => {
                let found = value.force_identity(destination);
                if found != Some(destination) {
                    return Err(KernelError::IdentityMismatch {
                        path: path.to_string(),
                        expected: destination,
                        found,
                    });
                }
                Ok(value)
            }
            CallResult::Opaque(value) => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remcall_types::{Identity, Object, Tensor};

    #[test]
    fn primitives_are_boxed_with_destination() {
        let dest = Uid::generate();
        let payload = CallResult::classify(Value::Int(4))
            .into_payload(dest, "builtins.int.__add__")
            .expect("payload");
        assert_eq!(payload, Value::boxed(dest, Value::Int(4)));
    }

    #[test]
    fn identified_results_take_destination_id() {
        let dest = Uid::generate();
        let mut tensor = Tensor::from_vec(vec![1.0, 2.0]);
        tensor.id = Some(Uid::generate());
        let classified = CallResult::classify(tensor.into());
        assert!(matches!(classified, CallResult::Identified(_)));
        let payload = classified.into_payload(dest, "torch.Tensor.add").expect("payload");
        assert_eq!(payload.identity(), Some(dest));
    }

    #[test]
    fn reboxing_keeps_a_single_envelope() {
        let dest = Uid::generate();
        let boxed = Value::boxed(Uid::generate(), Value::Text("x".into()));
        let payload = CallResult::classify(boxed)
            .into_payload(dest, "plan.Plan.__call__")
            .expect("payload");
        assert_eq!(payload, Value::boxed(dest, Value::Text("x".into())));
    }

    #[test]
    fn pinned_identity_is_a_mismatch() {
        let dest = Uid::generate();
        let pinned = Object::new("demo.Handle").with_identity(Identity::Pinned(Uid::generate()));
        let err = CallResult::classify(pinned.into())
            .into_payload(dest, "demo.Handle.clone")
            .unwrap_err();
        assert!(matches!(err, KernelError::IdentityMismatch { expected, .. } if expected == dest));
    }

    #[test]
    fn opaque_values_pass_through() {
        let value: Value = Object::new("demo.Blob").with_field("size", 3i64).into();
        let payload = CallResult::classify(value.clone())
            .into_payload(Uid::generate(), "demo.Blob.copy")
            .expect("payload");
        assert_eq!(payload, value);
    }
}
