//! Message routing around the kernel: typed action envelopes, the services
//! that execute them and a dispatcher that defers eventual work.

pub mod batch;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod services;

pub use batch::{BatchEntry, BatchReport, BatchRunner, Envelope};
pub use config::HostConfig;
pub use dispatcher::{ActionDispatcher, EventualOutcome};
pub use error::HostError;
pub use messages::{
    ActionMessage, EventualActionWithoutReply, ImmediateActionWithReply,
    ImmediateActionWithoutReply, MessageKind,
};
pub use services::{
    ActionService, EventualActionServiceWithoutReply, ImmediateActionServiceWithReply,
    ImmediateActionServiceWithoutReply, ServiceReply,
};
