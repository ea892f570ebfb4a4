use remcall_types::{CodecError, GetObjectResponse, PrincipalKey, Uid, cbor};
use serde::{Deserialize, Serialize};

use crate::dispatcher::{ActionDispatcher, EventualOutcome};
use crate::messages::{ActionMessage, MessageKind};
use crate::services::ServiceReply;

/// One message of a batch file, optionally sent as a specific principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<PrincipalKey>,
    pub message: ActionMessage,
}

impl Envelope {
    pub fn new(message: impl Into<ActionMessage>) -> Self {
        Self {
            principal: None,
            message: message.into(),
        }
    }

    pub fn from_principal(mut self, principal: PrincipalKey) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Parse a JSON array of envelopes.
    pub fn load_json(text: &str) -> Result<Vec<Envelope>, CodecError> {
        cbor::from_json(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub msg_id: Uid,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<GetObjectResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-message results: immediate messages in dispatch order, followed by
/// eventual ones in acceptance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|entry| entry.error.is_some()).count()
    }
}

pub struct BatchRunner {
    dispatcher: ActionDispatcher,
    default_principal: PrincipalKey,
}

impl BatchRunner {
    /// Envelopes without a principal are sent as `default_principal`.
    pub fn new(dispatcher: ActionDispatcher, default_principal: PrincipalKey) -> Self {
        Self {
            dispatcher,
            default_principal,
        }
    }

    /// Dispatch every envelope, then flush the eventual queue.
    pub fn run(&mut self, envelopes: Vec<Envelope>) -> BatchReport {
        let mut report = BatchReport::default();
        for envelope in envelopes {
            let principal = envelope.principal.unwrap_or(self.default_principal);
            let msg_id = envelope.message.msg_id();
            let kind = envelope.message.kind();
            match self.dispatcher.dispatch(envelope.message, principal) {
                Ok(ServiceReply::Deferred) => {}
                Ok(reply) => report.entries.push(BatchEntry {
                    msg_id,
                    kind,
                    reply: match reply {
                        ServiceReply::Reply(response) => Some(response),
                        _ => None,
                    },
                    error: None,
                }),
                Err(err) => report.entries.push(BatchEntry {
                    msg_id,
                    kind,
                    reply: None,
                    error: Some(err.to_string()),
                }),
            }
        }
        report
            .entries
            .extend(self.dispatcher.flush().into_iter().map(eventual_entry));
        report
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut ActionDispatcher {
        &mut self.dispatcher
    }
}

fn eventual_entry(outcome: EventualOutcome) -> BatchEntry {
    BatchEntry {
        msg_id: outcome.msg_id,
        kind: MessageKind::EventualWithoutReply,
        reply: None,
        error: outcome.result.err().map(|err| err.to_string()),
    }
}
