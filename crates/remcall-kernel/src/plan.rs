//! Plan invocation: replays a recorded action sequence against the caller's
//! references through the same executor.

use std::collections::HashMap;

use remcall_types::{Kwargs, Plan, Reference, RunClassMethodAction, Uid, Value};

use crate::capability::ContextInvocable;
use crate::error::KernelError;
use crate::executor::run_class_method;
use crate::node::CallContext;

pub const PLAN_CALL_PATH: &str = "plan.Plan.__call__";

/// Runs a plan's actions with its inputs bound to the call's positional
/// references. Returns the single output's payload, a tuple for several
/// outputs, or null when the plan declares none.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanCall;

impl ContextInvocable for PlanCall {
    fn call_with_context(
        &self,
        plan: &Plan,
        ctx: &CallContext<'_>,
        args: &[Reference],
        _kwargs: Kwargs,
    ) -> Result<Value, KernelError> {
        if args.len() != plan.inputs.len() {
            return Err(KernelError::PlanArity {
                expected: plan.inputs.len(),
                found: args.len(),
            });
        }
        let nested = ctx.nested()?;
        let bindings = Bindings::new(&plan.inputs, args);

        for template in &plan.actions {
            let action = bindings.apply(template);
            log::debug!("plan step {} at depth {}", action.pprint(), nested.depth());
            run_class_method(&action, &nested)?;
        }

        let store = ctx.node().store();
        let mut outputs = Vec::with_capacity(plan.outputs.len());
        for output in &plan.outputs {
            let target = bindings.resolve(output);
            let obj = store
                .get(&target.id_at_location)?
                .ok_or(KernelError::ObjectNotFound(target.id_at_location))?;
            outputs.push(obj.data);
        }

        Ok(match outputs.len() {
            0 => Value::Null,
            1 => outputs.remove(0),
            _ => Value::Tuple(outputs),
        })
    }
}

/// Plan input id to the call argument bound to it. Each reference is looked
/// up once, so inputs and arguments may overlap or be permuted.
struct Bindings(HashMap<Uid, Reference>);

impl Bindings {
    fn new(inputs: &[Reference], args: &[Reference]) -> Self {
        Self(
            inputs
                .iter()
                .map(|input| input.id_at_location)
                .zip(args.iter().copied())
                .collect(),
        )
    }

    fn resolve(&self, reference: &Reference) -> Reference {
        self.0
            .get(&reference.id_at_location)
            .copied()
            .unwrap_or(*reference)
    }

    /// Copy of `template` with its receiver, positional and named arguments
    /// rewritten to the bound call arguments.
    fn apply(&self, template: &RunClassMethodAction) -> RunClassMethodAction {
        let mut action = template.clone();
        let bind = |reference: &mut Reference| *reference = self.resolve(reference);
        if let Some(receiver) = action.self_ref.as_mut() {
            bind(receiver);
        }
        action.args.iter_mut().for_each(&bind);
        action.kwargs.values_mut().for_each(&bind);
        action
    }
}
