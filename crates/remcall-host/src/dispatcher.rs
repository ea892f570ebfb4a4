use std::collections::VecDeque;

use remcall_kernel::Node;
use remcall_types::{PrincipalKey, Uid};

use crate::config::HostConfig;
use crate::error::HostError;
use crate::messages::{ActionMessage, MessageKind};
use crate::services::{
    ActionService, EventualActionServiceWithoutReply, ImmediateActionServiceWithReply,
    ImmediateActionServiceWithoutReply, ServiceReply,
};

/// Result of one deferred message, reported by [`ActionDispatcher::flush`].
#[derive(Debug)]
pub struct EventualOutcome {
    pub msg_id: Uid,
    pub result: Result<(), HostError>,
}

struct Pending {
    service: usize,
    msg: ActionMessage,
    principal: PrincipalKey,
}

/// Routes messages to services by kind. Immediate messages run inline;
/// eventual ones queue until flushed.
pub struct ActionDispatcher {
    node: Node,
    config: HostConfig,
    services: Vec<Box<dyn ActionService>>,
    pending: VecDeque<Pending>,
    completed: Vec<EventualOutcome>,
}

impl ActionDispatcher {
    /// Dispatcher with the three standard services.
    pub fn new(node: Node, config: HostConfig) -> Self {
        let mut dispatcher = Self::without_services(node, config);
        dispatcher.register(Box::new(ImmediateActionServiceWithReply));
        dispatcher.register(Box::new(ImmediateActionServiceWithoutReply));
        dispatcher.register(Box::new(EventualActionServiceWithoutReply));
        dispatcher
    }

    pub fn without_services(node: Node, config: HostConfig) -> Self {
        Self {
            node,
            config,
            services: Vec::new(),
            pending: VecDeque::new(),
            completed: Vec::new(),
        }
    }

    /// Later registrations do not displace earlier ones for a kind.
    pub fn register(&mut self, service: Box<dyn ActionService>) {
        self.services.push(service);
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn route(&self, kind: MessageKind) -> Result<usize, HostError> {
        self.services
            .iter()
            .position(|service| service.message_handler_types().contains(&kind))
            .ok_or(HostError::NoService(kind))
    }

    pub fn dispatch(
        &mut self,
        msg: ActionMessage,
        principal: PrincipalKey,
    ) -> Result<ServiceReply, HostError> {
        let kind = msg.kind();
        let service = self.route(kind)?;
        log::debug!(
            "routing {} ({kind}) to {}",
            msg.pprint(),
            self.services[service].name()
        );

        if kind != MessageKind::EventualWithoutReply {
            return self.services[service].process(&self.node, &msg, &principal);
        }

        self.pending.push_back(Pending {
            service,
            msg,
            principal,
        });
        let limit = self.config.eventual_batch_limit;
        if limit > 0 && self.pending.len() >= limit {
            let outcomes = self.drain();
            self.completed.extend(outcomes);
        }
        Ok(ServiceReply::Deferred)
    }

    /// Run every queued message in acceptance order. Includes outcomes of
    /// batches already flushed automatically since the last call.
    pub fn flush(&mut self) -> Vec<EventualOutcome> {
        let outcomes = self.drain();
        let mut all = std::mem::take(&mut self.completed);
        all.extend(outcomes);
        all
    }

    fn drain(&mut self) -> Vec<EventualOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        while let Some(Pending {
            service,
            msg,
            principal,
        }) = self.pending.pop_front()
        {
            let result = self.services[service]
                .process(&self.node, &msg, &principal)
                .map(|_| ());
            if let Err(err) = &result {
                log::warn!("eventual {} failed: {err}", msg.pprint());
            }
            outcomes.push(EventualOutcome {
                msg_id: msg.msg_id(),
                result,
            });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remcall_types::{Address, GetObjectAction};

    #[test]
    fn messages_without_a_service_are_rejected() {
        let node = Node::builder("alice", PrincipalKey::from_bytes([0; 32])).build();
        let root = *node.root_key();
        let mut dispatcher = ActionDispatcher::without_services(node, HostConfig::default());
        dispatcher.register(Box::new(EventualActionServiceWithoutReply));

        let msg = ActionMessage::from(GetObjectAction::new(
            Uid::generate(),
            Address::new(),
            Address::new(),
        ));
        let err = dispatcher.dispatch(msg, root).unwrap_err();
        assert!(matches!(err, HostError::NoService(MessageKind::ImmediateWithReply)));
        assert_eq!(dispatcher.pending(), 0);
    }
}
