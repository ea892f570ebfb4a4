//! Builtin capability library.

mod scalars;
mod tensor;

use std::sync::Arc;

use remcall_types::Value;

use crate::capability::CapabilityRegistry;
use crate::error::InvocationError;
use crate::plan::{PLAN_CALL_PATH, PlanCall};

/// Registry with the tensor, scalar and plan capabilities.
pub fn standard_library() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    tensor::register(&mut registry);
    scalars::register(&mut registry);
    registry.register_contextual(PLAN_CALL_PATH, Arc::new(PlanCall));
    registry
}

fn expect_arity(args: &[Value], expected: usize) -> Result<(), InvocationError> {
    if args.len() != expected {
        return Err(InvocationError::Arity {
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn receiver_mismatch(expected: &'static str, found: Option<&Value>) -> InvocationError {
    InvocationError::Receiver {
        expected,
        found: found.map(Value::kind).unwrap_or("nothing"),
    }
}
