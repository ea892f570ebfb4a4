use std::fmt;

use remcall_types::{
    CodecError, GetObjectAction, RunClassMethodAction, SaveObjectAction, Uid, cbor,
};
use serde::{Deserialize, Serialize};

/// Executed on receipt; the sender waits for a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImmediateActionWithReply {
    GetObject(GetObjectAction),
}

/// Executed on receipt; nothing is sent back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImmediateActionWithoutReply {
    RunClassMethod(RunClassMethodAction),
    SaveObject(SaveObjectAction),
}

/// May be deferred and executed later in acceptance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventualActionWithoutReply {
    RunClassMethod(RunClassMethodAction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionMessage {
    ImmediateWithReply(ImmediateActionWithReply),
    ImmediateWithoutReply(ImmediateActionWithoutReply),
    EventualWithoutReply(EventualActionWithoutReply),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    ImmediateWithReply,
    ImmediateWithoutReply,
    EventualWithoutReply,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MessageKind::ImmediateWithReply => "immediate-with-reply",
            MessageKind::ImmediateWithoutReply => "immediate-without-reply",
            MessageKind::EventualWithoutReply => "eventual-without-reply",
        })
    }
}

impl ActionMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ActionMessage::ImmediateWithReply(_) => MessageKind::ImmediateWithReply,
            ActionMessage::ImmediateWithoutReply(_) => MessageKind::ImmediateWithoutReply,
            ActionMessage::EventualWithoutReply(_) => MessageKind::EventualWithoutReply,
        }
    }

    pub fn msg_id(&self) -> Uid {
        match self {
            ActionMessage::ImmediateWithReply(ImmediateActionWithReply::GetObject(a)) => a.msg_id,
            ActionMessage::ImmediateWithoutReply(ImmediateActionWithoutReply::RunClassMethod(a))
            | ActionMessage::EventualWithoutReply(EventualActionWithoutReply::RunClassMethod(a)) => {
                a.msg_id
            }
            ActionMessage::ImmediateWithoutReply(ImmediateActionWithoutReply::SaveObject(a)) => {
                a.msg_id
            }
        }
    }

    pub fn pprint(&self) -> String {
        match self {
            ActionMessage::ImmediateWithReply(ImmediateActionWithReply::GetObject(a)) => a.pprint(),
            ActionMessage::ImmediateWithoutReply(ImmediateActionWithoutReply::RunClassMethod(a))
            | ActionMessage::EventualWithoutReply(EventualActionWithoutReply::RunClassMethod(a)) => {
                a.pprint()
            }
            ActionMessage::ImmediateWithoutReply(ImmediateActionWithoutReply::SaveObject(a)) => {
                a.pprint()
            }
        }
    }

    /// Wrap a method call for the deferred channel.
    pub fn eventual(action: RunClassMethodAction) -> Self {
        ActionMessage::EventualWithoutReply(EventualActionWithoutReply::RunClassMethod(action))
    }

    pub fn to_wire(&self) -> Result<Vec<u8>, CodecError> {
        cbor::to_cbor(self)
    }

    pub fn from_wire(bytes: &[u8]) -> Result<Self, CodecError> {
        cbor::from_cbor(bytes)
    }
}

impl From<GetObjectAction> for ActionMessage {
    fn from(action: GetObjectAction) -> Self {
        ActionMessage::ImmediateWithReply(ImmediateActionWithReply::GetObject(action))
    }
}

impl From<SaveObjectAction> for ActionMessage {
    fn from(action: SaveObjectAction) -> Self {
        ActionMessage::ImmediateWithoutReply(ImmediateActionWithoutReply::SaveObject(action))
    }
}

impl From<RunClassMethodAction> for ActionMessage {
    /// Method calls run on receipt unless sent through [`ActionMessage::eventual`].
    fn from(action: RunClassMethodAction) -> Self {
        ActionMessage::ImmediateWithoutReply(ImmediateActionWithoutReply::RunClassMethod(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remcall_types::{Address, Reference};

    #[test]
    fn kind_and_id_follow_the_wrapped_action() {
        let action = RunClassMethodAction::function(
            "torch.zeros",
            vec![Reference::new(Uid::generate())],
            Uid::generate(),
            Address::new(),
        );
        let msg_id = action.msg_id;
        let message = ActionMessage::from(action.clone());
        assert_eq!(message.kind(), MessageKind::ImmediateWithoutReply);
        assert_eq!(message.msg_id(), msg_id);
        assert_eq!(message.pprint(), "RunClassMethodAction(torch.zeros)");

        let deferred = ActionMessage::eventual(action);
        assert_eq!(deferred.kind(), MessageKind::EventualWithoutReply);
        assert_eq!(deferred.msg_id(), msg_id);
    }

    #[test]
    fn wire_round_trip_keeps_the_envelope() {
        let message = ActionMessage::from(GetObjectAction::new(
            Uid::generate(),
            Address::new(),
            Address::new(),
        ));
        let bytes = message.to_wire().expect("encode");
        assert_eq!(ActionMessage::from_wire(&bytes).expect("decode"), message);
    }

    #[test]
    fn method_call_messages_survive_the_wire() {
        let action = RunClassMethodAction::method(
            "torch.Tensor.add",
            Reference::new(Uid::generate()),
            vec![Reference::new(Uid::generate())],
            Uid::generate(),
            Address::new(),
        );
        for message in [ActionMessage::from(action.clone()), ActionMessage::eventual(action)] {
            let bytes = message.to_wire().expect("encode");
            assert_eq!(ActionMessage::from_wire(&bytes).expect("decode"), message);
        }
    }

    #[test]
    fn json_uses_variant_names() {
        let message = ActionMessage::from(GetObjectAction::new(
            Uid::generate(),
            Address::new(),
            Address::new(),
        ));
        let json = cbor::to_json(&message, false).expect("json");
        assert!(json.starts_with(r#"{"ImmediateWithReply":{"GetObject":"#));
    }
}
