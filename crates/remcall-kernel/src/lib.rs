//! Execution kernel: resolve references against the object store, invoke
//! the capability behind an action's path, propagate read permissions and
//! commit the result under the caller-chosen identifier.

pub mod builtins;
pub mod capability;
pub mod error;
pub mod executor;
pub mod mutation;
pub mod node;
pub mod normalize;
pub mod object_actions;
pub mod outcome;
pub mod permissions;
pub mod plan;
pub mod tags;

pub use capability::{
    CallShape, CapabilityRegistry, CapabilityTable, ContextInvocable, Handle, Invocable,
};
pub use error::{InvocationError, KernelError};
pub use executor::{Action, ResolvedCallable};
pub use mutation::MutationPolicy;
pub use node::{CallContext, KernelConfig, Node, NodeBuilder};
pub use normalize::{ArgNormalizer, Upcast};
pub use outcome::CallResult;
pub use permissions::PermissionFold;
pub use tags::{InheritTags, TagPolicy};
