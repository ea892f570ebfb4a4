use remcall_kernel::{Action, Node};
use remcall_types::{GetObjectResponse, PrincipalKey};

use crate::error::HostError;
use crate::messages::{
    ActionMessage, EventualActionWithoutReply, ImmediateActionWithReply,
    ImmediateActionWithoutReply, MessageKind,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceReply {
    Reply(GetObjectResponse),
    Done,
    /// Accepted and queued; runs on the next flush.
    Deferred,
}

/// Executes the messages of the kinds it declares.
pub trait ActionService: Send + Sync {
    fn name(&self) -> &'static str;

    fn message_handler_types(&self) -> &'static [MessageKind];

    fn process(
        &self,
        node: &Node,
        msg: &ActionMessage,
        principal: &PrincipalKey,
    ) -> Result<ServiceReply, HostError>;
}

fn unsupported(service: &dyn ActionService, msg: &ActionMessage) -> HostError {
    HostError::UnsupportedMessage {
        service: service.name(),
        kind: msg.kind(),
    }
}

#[derive(Debug, Default)]
pub struct ImmediateActionServiceWithReply;

impl ActionService for ImmediateActionServiceWithReply {
    fn name(&self) -> &'static str {
        "ImmediateActionServiceWithReply"
    }

    fn message_handler_types(&self) -> &'static [MessageKind] {
        &[MessageKind::ImmediateWithReply]
    }

    fn process(
        &self,
        node: &Node,
        msg: &ActionMessage,
        principal: &PrincipalKey,
    ) -> Result<ServiceReply, HostError> {
        match msg {
            ActionMessage::ImmediateWithReply(ImmediateActionWithReply::GetObject(action)) => {
                Ok(ServiceReply::Reply(action.execute_action(node, principal)?))
            }
            other => Err(unsupported(self, other)),
        }
    }
}

#[derive(Debug, Default)]
pub struct ImmediateActionServiceWithoutReply;

impl ActionService for ImmediateActionServiceWithoutReply {
    fn name(&self) -> &'static str {
        "ImmediateActionServiceWithoutReply"
    }

    fn message_handler_types(&self) -> &'static [MessageKind] {
        &[MessageKind::ImmediateWithoutReply]
    }

    fn process(
        &self,
        node: &Node,
        msg: &ActionMessage,
        principal: &PrincipalKey,
    ) -> Result<ServiceReply, HostError> {
        match msg {
            ActionMessage::ImmediateWithoutReply(ImmediateActionWithoutReply::RunClassMethod(
                action,
            )) => action.execute_action(node, principal)?,
            ActionMessage::ImmediateWithoutReply(ImmediateActionWithoutReply::SaveObject(action)) => {
                action.execute_action(node, principal)?
            }
            other => return Err(unsupported(self, other)),
        }
        Ok(ServiceReply::Done)
    }
}

#[derive(Debug, Default)]
pub struct EventualActionServiceWithoutReply;

impl ActionService for EventualActionServiceWithoutReply {
    fn name(&self) -> &'static str {
        "EventualActionServiceWithoutReply"
    }

    fn message_handler_types(&self) -> &'static [MessageKind] {
        &[MessageKind::EventualWithoutReply]
    }

    fn process(
        &self,
        node: &Node,
        msg: &ActionMessage,
        principal: &PrincipalKey,
    ) -> Result<ServiceReply, HostError> {
        match msg {
            ActionMessage::EventualWithoutReply(EventualActionWithoutReply::RunClassMethod(
                action,
            )) => action.execute_action(node, principal)?,
            other => return Err(unsupported(self, other)),
        }
        Ok(ServiceReply::Done)
    }
}
