//! Executes [`RunClassMethodAction`]s against a node.
//!
//! Steps, in order: resolve the path, classify mutation, resolve the
//! receiver and arguments while folding their read permissions, normalize,
//! invoke, classify the result and assign its identity, write back an
//! in-place receiver, inherit tags, commit. Everything before the receiver
//! write-back only reads the store, so abandoning an execution earlier
//! leaves the store untouched.

use indexmap::IndexMap;
use remcall_store::{ObjectStore, Versioned};
use remcall_types::{Kwargs, PrincipalKey, Reference, RunClassMethodAction, StoredObject, Value};

use crate::capability::{CapabilityTable, Handle};
use crate::error::KernelError;
use crate::mutation::{CALL_OPERATOR, MutationPolicy};
use crate::node::{CallContext, Node};
use crate::outcome::CallResult;
use crate::permissions::PermissionFold;

/// Something a node can execute on behalf of a principal.
pub trait Action {
    type Reply;

    fn execute_action(&self, node: &Node, principal: &PrincipalKey)
    -> Result<Self::Reply, KernelError>;
}

impl Action for RunClassMethodAction {
    type Reply = ();

    fn execute_action(&self, node: &Node, principal: &PrincipalKey) -> Result<(), KernelError> {
        run_class_method(self, &CallContext::root(node, principal))
    }
}

/// Callable chosen at call time.
#[derive(Debug, Clone)]
pub enum ResolvedCallable {
    /// No receiver.
    Static(Handle),
    /// Plan receiver with the call operator; gets execution context.
    PlanCall(Handle),
    /// The table's handle bound to the receiver payload.
    Bound(Handle),
    /// The receiver payload swapped the method for a different callable.
    Overridden { handle: Handle, replaced: Handle },
}

impl ResolvedCallable {
    /// Pick the callable for `method_name` given the table's `handle` and
    /// the receiver payload (absent for static calls).
    pub fn select(
        method_name: &str,
        handle: Handle,
        receiver: Option<&Value>,
        table: &dyn CapabilityTable,
    ) -> Result<Self, KernelError> {
        let Some(receiver) = receiver else {
            return Ok(ResolvedCallable::Static(handle));
        };
        if receiver.as_plan().is_some() && method_name == CALL_OPERATOR {
            return Ok(ResolvedCallable::PlanCall(handle));
        }
        match receiver.method_override(method_name) {
            Some(path) => {
                let dynamic = table.resolve(path)?;
                if dynamic.same_callable(&handle) {
                    Ok(ResolvedCallable::Bound(handle))
                } else {
                    Ok(ResolvedCallable::Overridden {
                        handle: dynamic,
                        replaced: handle,
                    })
                }
            }
            None => Ok(ResolvedCallable::Bound(handle)),
        }
    }

    pub fn handle(&self) -> &Handle {
        match self {
            ResolvedCallable::Static(handle)
            | ResolvedCallable::PlanCall(handle)
            | ResolvedCallable::Bound(handle)
            | ResolvedCallable::Overridden { handle, .. } => handle,
        }
    }
}

pub(crate) fn run_class_method(
    action: &RunClassMethodAction,
    ctx: &CallContext<'_>,
) -> Result<(), KernelError> {
    let node = ctx.node();
    let store = node.store();
    let method = node.capabilities().resolve(&action.path)?;
    let policy = MutationPolicy::classify(&action.path, &node.config().tensor_namespace);

    let mut receiver: Option<Versioned> = None;
    let mut permissions = PermissionFold::unconstrained();
    if !action.is_static {
        match resolve_receiver(action, store) {
            Ok(entry) => {
                permissions = PermissionFold::seeded(entry.object.read_permissions.clone());
                receiver = Some(entry);
            }
            Err(err) if err.is_soft() => {
                log::error!(
                    "execute_action on {} failed due to missing object: {err}",
                    action.path
                );
                return Ok(());
            }
            Err(err) => return Err(err),
        }
    }

    let mut args = Vec::with_capacity(action.args.len());
    let mut tag_args = Vec::with_capacity(action.args.len());
    for reference in &action.args {
        let obj = resolve_argument(action, reference, store)?;
        permissions.absorb(&obj.read_permissions);
        args.push(obj.data.clone());
        tag_args.push(obj);
    }

    let mut kwargs = Kwargs::new();
    let mut tag_kwargs = IndexMap::new();
    for (name, reference) in &action.kwargs {
        let obj = resolve_argument(action, reference, store)?;
        permissions.absorb(&obj.read_permissions);
        kwargs.insert(name.clone(), obj.data.clone());
        tag_kwargs.insert(name.clone(), obj);
    }
    let read_permissions = permissions.finish();

    let (args, kwargs) = node.normalizer().normalize(args, kwargs);

    let resolved = ResolvedCallable::select(
        action.method_name(),
        method,
        receiver.as_ref().map(|entry| &entry.object.data),
        node.capabilities(),
    )?;
    if let ResolvedCallable::Overridden { handle, replaced } = &resolved {
        log::warn!(
            "method {} overwritten on object {}: calling {} instead of {}",
            action.method_name(),
            receiver
                .as_ref()
                .map(|entry| entry.object.id.to_string())
                .unwrap_or_default(),
            handle.path(),
            replaced.path()
        );
    }

    let raw = match &resolved {
        ResolvedCallable::Static(handle) => handle.invoke(None, args, kwargs)?,
        ResolvedCallable::PlanCall(handle) => {
            let plan = receiver
                .as_ref()
                .and_then(|entry| entry.object.data.as_plan())
                .ok_or_else(|| KernelError::UnboundMethod(action.path.clone()))?;
            handle.invoke_in_context(plan, ctx, &action.args, kwargs)?
        }
        ResolvedCallable::Bound(handle) | ResolvedCallable::Overridden { handle, .. } => {
            let entry = receiver
                .as_mut()
                .ok_or_else(|| KernelError::UnboundMethod(action.path.clone()))?;
            match policy {
                MutationPolicy::InPlace => {
                    handle.invoke(Some(&mut entry.object.data), args, kwargs)?
                }
                MutationPolicy::CopyOnWrite => {
                    let mut scratch = entry.object.data.clone();
                    handle.invoke(Some(&mut scratch), args, kwargs)?
                }
            }
        }
    };

    let payload = CallResult::classify(raw).into_payload(action.id_at_location, &action.path)?;

    // Point of no return: the receiver is rewritten before the result lands.
    if policy.is_in_place() {
        if let Some(entry) = receiver.as_mut() {
            entry.object.read_permissions = read_permissions.clone();
            entry.version = store.compare_and_set(entry.object.clone(), Some(entry.version))?;
        }
    }

    let mut result = StoredObject::new(action.id_at_location, payload, read_permissions);
    node.tags().inherit(
        &action.path,
        &mut result,
        receiver.as_ref().map(|entry| &entry.object),
        &tag_args,
        &tag_kwargs,
    );

    log::debug!(
        "{} stored {} readable by {} principal(s)",
        action.pprint(),
        result.id,
        result.read_permissions.len()
    );
    store.set(result)?;
    Ok(())
}

fn resolve_receiver(
    action: &RunClassMethodAction,
    store: &dyn ObjectStore,
) -> Result<Versioned, KernelError> {
    let reference = action
        .self_ref
        .as_ref()
        .ok_or_else(|| KernelError::UnboundMethod(action.path.clone()))?;
    store
        .get_versioned(&reference.id_at_location)?
        .ok_or_else(|| KernelError::ReceiverNotFound {
            path: action.path.clone(),
            id: reference.id_at_location,
        })
}

fn resolve_argument(
    action: &RunClassMethodAction,
    reference: &Reference,
    store: &dyn ObjectStore,
) -> Result<StoredObject, KernelError> {
    store
        .get(&reference.id_at_location)?
        .ok_or_else(|| KernelError::ArgumentNotFound {
            path: action.path.clone(),
            id: reference.id_at_location,
        })
}
