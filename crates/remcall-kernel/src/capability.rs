//! Capability table: dotted paths to invocable handles.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use remcall_types::{Kwargs, Plan, Reference, Value};

use crate::error::{InvocationError, KernelError};
use crate::node::CallContext;

/// Whether a callable takes a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    Static,
    Bound,
}

/// Plain callable: receiver first (when bound), then positional and named
/// arguments.
pub trait Invocable: Send + Sync {
    fn call(
        &self,
        receiver: Option<&mut Value>,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, InvocationError>;
}

/// Callable handed execution context instead of argument values. Used by
/// plan invocation, which re-enters the executor.
pub trait ContextInvocable: Send + Sync {
    fn call_with_context(
        &self,
        plan: &Plan,
        ctx: &CallContext<'_>,
        args: &[Reference],
        kwargs: Kwargs,
    ) -> Result<Value, KernelError>;
}

#[derive(Clone)]
enum Callable {
    Plain(Arc<dyn Invocable>),
    Contextual(Arc<dyn ContextInvocable>),
}

/// Resolved capability: the callable plus the path it was registered under.
#[derive(Clone)]
pub struct Handle {
    path: String,
    shape: CallShape,
    callable: Callable,
}

impl Handle {
    pub fn new(path: impl Into<String>, shape: CallShape, invocable: Arc<dyn Invocable>) -> Self {
        Self {
            path: path.into(),
            shape,
            callable: Callable::Plain(invocable),
        }
    }

    pub fn contextual(path: impl Into<String>, invocable: Arc<dyn ContextInvocable>) -> Self {
        Self {
            path: path.into(),
            shape: CallShape::Bound,
            callable: Callable::Contextual(invocable),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn shape(&self) -> CallShape {
        self.shape
    }

    /// Identity comparison of the underlying callables.
    pub fn same_callable(&self, other: &Handle) -> bool {
        match (&self.callable, &other.callable) {
            (Callable::Plain(a), Callable::Plain(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Callable::Contextual(a), Callable::Contextual(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }

    pub fn invoke(
        &self,
        receiver: Option<&mut Value>,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, KernelError> {
        let outcome = match &self.callable {
            Callable::Plain(invocable) => invocable.call(receiver, args, kwargs),
            Callable::Contextual(_) => Err(InvocationError::Unsupported),
        };
        outcome.map_err(|source| KernelError::Invocation {
            path: self.path.clone(),
            source,
        })
    }

    pub fn invoke_in_context(
        &self,
        plan: &Plan,
        ctx: &CallContext<'_>,
        args: &[Reference],
        kwargs: Kwargs,
    ) -> Result<Value, KernelError> {
        match &self.callable {
            Callable::Contextual(invocable) => invocable.call_with_context(plan, ctx, args, kwargs),
            Callable::Plain(_) => Err(KernelError::Invocation {
                path: self.path.clone(),
                source: InvocationError::Unsupported,
            }),
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.callable {
            Callable::Plain(_) => "plain",
            Callable::Contextual(_) => "contextual",
        };
        f.debug_struct("Handle")
            .field("path", &self.path)
            .field("shape", &self.shape)
            .field("callable", &kind)
            .finish()
    }
}

/// Resolves a dotted path to a callable. Resolution failures are final.
pub trait CapabilityTable: Send + Sync {
    fn resolve(&self, path: &str) -> Result<Handle, KernelError>;
}

struct FnInvocable<F>(F);

impl<F> Invocable for FnInvocable<F>
where
    F: Fn(Option<&mut Value>, Vec<Value>, Kwargs) -> Result<Value, InvocationError> + Send + Sync,
{
    fn call(
        &self,
        receiver: Option<&mut Value>,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, InvocationError> {
        (self.0)(receiver, args, kwargs)
    }
}

/// In-memory capability table.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    handles: HashMap<String, Handle>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        path: impl Into<String>,
        shape: CallShape,
        invocable: Arc<dyn Invocable>,
    ) -> Handle {
        let handle = Handle::new(path, shape, invocable);
        self.handles.insert(handle.path.clone(), handle.clone());
        handle
    }

    pub fn register_fn<F>(&mut self, path: impl Into<String>, shape: CallShape, f: F) -> Handle
    where
        F: Fn(Option<&mut Value>, Vec<Value>, Kwargs) -> Result<Value, InvocationError>
            + Send
            + Sync
            + 'static,
    {
        self.register(path, shape, Arc::new(FnInvocable(f)))
    }

    pub fn register_contextual(
        &mut self,
        path: impl Into<String>,
        invocable: Arc<dyn ContextInvocable>,
    ) -> Handle {
        let handle = Handle::contextual(path, invocable);
        self.handles.insert(handle.path.clone(), handle.clone());
        handle
    }

    /// Expose an existing callable under a second path; both resolve to the
    /// same callable identity.
    pub fn alias(&mut self, path: impl Into<String>, existing: &str) -> Result<Handle, KernelError> {
        let mut handle = self.resolve(existing)?;
        handle.path = path.into();
        self.handles.insert(handle.path.clone(), handle.clone());
        Ok(handle)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.handles.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl CapabilityTable for CapabilityRegistry {
    fn resolve(&self, path: &str) -> Result<Handle, KernelError> {
        self.handles
            .get(path)
            .cloned()
            .ok_or_else(|| KernelError::CallableNotFound(path.to_string()))
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("handles", &self.handles.len())
            .finish()
    }
}
