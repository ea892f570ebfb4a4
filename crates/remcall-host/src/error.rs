use thiserror::Error;

use crate::messages::MessageKind;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("kernel error: {0}")]
    Kernel(#[from] remcall_kernel::KernelError),
    #[error("{service} does not handle {kind} messages")]
    UnsupportedMessage {
        service: &'static str,
        kind: MessageKind,
    },
    #[error("no service registered for {0} messages")]
    NoService(MessageKind),
}
