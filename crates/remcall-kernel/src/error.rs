use remcall_types::{PrincipalKey, Uid};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("store error: {0}")]
    Store(#[from] remcall_store::StoreError),
    /// Soft: logged by the executor and never returned from `execute_action`.
    #[error("receiver {id} for '{path}' not found")]
    ReceiverNotFound { path: String, id: Uid },
    #[error("argument {id} for '{path}' not found")]
    ArgumentNotFound { path: String, id: Uid },
    #[error("no callable registered at '{0}'")]
    CallableNotFound(String),
    #[error("method '{0}' called without a receiver")]
    UnboundMethod(String),
    #[error("unable to set id on result of '{path}': expected {expected}, found {found:?}")]
    IdentityMismatch {
        path: String,
        expected: Uid,
        found: Option<Uid>,
    },
    #[error("'{path}' failed: {source}")]
    Invocation {
        path: String,
        #[source]
        source: InvocationError,
    },
    #[error("object {0} not found")]
    ObjectNotFound(Uid),
    #[error("principal {principal} may not read {id}")]
    PermissionDenied { id: Uid, principal: PrincipalKey },
    #[error("plan nesting exceeded depth limit {0}")]
    PlanDepthExceeded(usize),
    #[error("plan expects {expected} input(s), got {found}")]
    PlanArity { expected: usize, found: usize },
}

impl KernelError {
    /// Soft failures abort the action without surfacing to the caller.
    pub fn is_soft(&self) -> bool {
        matches!(self, KernelError::ReceiverNotFound { .. })
    }
}

/// Raised by a callable itself; wrapped with the path by the executor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvocationError {
    #[error("expected {expected} argument(s), got {found}")]
    Arity { expected: usize, found: usize },
    #[error("argument {index}: expected {expected}, got {found}")]
    Type {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("receiver: expected {expected}, got {found}")]
    Receiver {
        expected: &'static str,
        found: &'static str,
    },
    #[error("shape mismatch: {left:?} vs {right:?}")]
    Shape { left: Vec<usize>, right: Vec<usize> },
    #[error("index {index} out of range for length {len}")]
    Index { index: i64, len: usize },
    #[error("callable does not support this call shape")]
    Unsupported,
    #[error("{0}")]
    Failed(String),
}
