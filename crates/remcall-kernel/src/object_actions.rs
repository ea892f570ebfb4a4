use remcall_types::{GetObjectAction, GetObjectResponse, PrincipalKey, SaveObjectAction, Uid};

use crate::error::KernelError;
use crate::executor::Action;
use crate::node::Node;

impl Action for GetObjectAction {
    type Reply = GetObjectResponse;

    /// Hands out the object to the node's root key or to a principal in its
    /// access set.
    fn execute_action(
        &self,
        node: &Node,
        principal: &PrincipalKey,
    ) -> Result<GetObjectResponse, KernelError> {
        let store = node.store();
        let obj = store
            .get(&self.id_at_location)?
            .ok_or(KernelError::ObjectNotFound(self.id_at_location))?;

        if principal != node.root_key() && !obj.readable_by(principal) {
            log::warn!(
                "{} denied: {} is not a reader of {}",
                self.pprint(),
                principal,
                self.id_at_location
            );
            return Err(KernelError::PermissionDenied {
                id: self.id_at_location,
                principal: *principal,
            });
        }

        if self.delete_obj {
            store.remove(&self.id_at_location)?;
        }

        Ok(GetObjectResponse {
            obj,
            address: self.reply_to,
            msg_id: Uid::generate(),
        })
    }
}

impl Action for SaveObjectAction {
    type Reply = ();

    /// Upserts the object; the sender becomes a reader under this message.
    fn execute_action(&self, node: &Node, principal: &PrincipalKey) -> Result<(), KernelError> {
        let mut obj = self.obj.clone();
        if !obj.readable_by(principal) {
            obj.read_permissions.grant(*principal, self.msg_id);
        }
        log::debug!("{} saved for {}", self.pprint(), principal);
        node.store().set(obj)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remcall_types::{AccessSet, Address, StoredObject, Value};

    fn key(byte: u8) -> PrincipalKey {
        PrincipalKey::from_bytes([byte; 32])
    }

    fn node() -> Node {
        Node::builder("alice", key(0)).build()
    }

    #[test]
    fn save_then_get_as_sender() {
        let node = node();
        let obj = StoredObject::new(Uid::generate(), Value::Int(7), AccessSet::new());
        let id = obj.id;
        SaveObjectAction::new(obj, Address::new())
            .execute_action(&node, &key(1))
            .expect("save");

        let reply = GetObjectAction::new(id, Address::new(), Address::new())
            .execute_action(&node, &key(1))
            .expect("get");
        assert_eq!(reply.obj.data, Value::Int(7));
        assert!(reply.obj.readable_by(&key(1)));
    }

    #[test]
    fn strangers_are_denied_but_root_is_not() {
        let node = node();
        let obj = StoredObject::new(Uid::generate(), Value::Int(7), AccessSet::new());
        let id = obj.id;
        node.store().set(obj).expect("seed");

        let get = GetObjectAction::new(id, Address::new(), Address::new());
        let err = get.execute_action(&node, &key(5)).unwrap_err();
        assert!(matches!(err, KernelError::PermissionDenied { .. }));
        assert!(get.execute_action(&node, &key(0)).is_ok());
    }

    #[test]
    fn delete_obj_evicts_after_reply() {
        let node = node();
        let obj = StoredObject::new(Uid::generate(), Value::Null, AccessSet::new());
        let id = obj.id;
        node.store().set(obj).expect("seed");

        let mut get = GetObjectAction::new(id, Address::new(), Address::new());
        get.delete_obj = true;
        get.execute_action(&node, &key(0)).expect("get");
        assert!(node.store().get(&id).expect("lookup").is_none());
        assert!(matches!(
            get.execute_action(&node, &key(0)),
            Err(KernelError::ObjectNotFound(missing)) if missing == id
        ));
    }
}
