use remcall_types::Value;

use super::{expect_arity, receiver_mismatch};
use crate::capability::{CallShape, CapabilityRegistry};
use crate::error::InvocationError;

pub(super) fn register(registry: &mut CapabilityRegistry) {
    registry.register_fn("builtins.int.__add__", CallShape::Bound, |receiver, args, _| {
        let (lhs, rhs) = int_pair(receiver.as_deref(), &args)?;
        lhs.checked_add(rhs)
            .map(Value::Int)
            .ok_or_else(|| InvocationError::Failed("integer overflow".into()))
    });

    registry.register_fn("builtins.int.__mul__", CallShape::Bound, |receiver, args, _| {
        let (lhs, rhs) = int_pair(receiver.as_deref(), &args)?;
        lhs.checked_mul(rhs)
            .map(Value::Int)
            .ok_or_else(|| InvocationError::Failed("integer overflow".into()))
    });

    registry.register_fn("builtins.list.__len__", CallShape::Bound, |receiver, args, _| {
        expect_arity(&args, 0)?;
        let items = list(receiver.as_deref())?;
        Ok(Value::Int(items.len() as i64))
    });

    registry.register_fn("builtins.list.__getitem__", CallShape::Bound, |receiver, args, _| {
        expect_arity(&args, 1)?;
        let items = list(receiver.as_deref())?;
        let index = unboxed(&args[0]).as_int().ok_or(InvocationError::Type {
            index: 0,
            expected: "int",
            found: args[0].kind(),
        })?;
        let len = items.len();
        let position = if index < 0 { index + len as i64 } else { index };
        usize::try_from(position)
            .ok()
            .and_then(|position| items.get(position))
            .cloned()
            .ok_or(InvocationError::Index { index, len })
    });

    registry.register_fn("builtins.list.__add__", CallShape::Bound, |receiver, args, _| {
        expect_arity(&args, 1)?;
        let mut items = list(receiver.as_deref())?.to_vec();
        match unboxed(&args[0]) {
            Value::List(more) => items.extend(more.iter().cloned()),
            other => {
                return Err(InvocationError::Type {
                    index: 0,
                    expected: "list",
                    found: other.kind(),
                });
            }
        }
        Ok(Value::List(items))
    });

    registry.register_fn("builtins.str.upper", CallShape::Bound, |receiver, args, _| {
        expect_arity(&args, 0)?;
        let text = receiver
            .as_deref()
            .map(unboxed)
            .and_then(Value::as_text)
            .ok_or_else(|| receiver_mismatch("str", receiver.as_deref()))?;
        Ok(Value::Text(text.to_uppercase()))
    });
}

/// Primitive results are stored inside an identity envelope; methods on
/// them look through it.
fn unboxed(value: &Value) -> &Value {
    match value {
        Value::Boxed { value, .. } => unboxed(value),
        other => other,
    }
}

fn int_pair(receiver: Option<&Value>, args: &[Value]) -> Result<(i64, i64), InvocationError> {
    expect_arity(args, 1)?;
    let lhs = receiver
        .map(unboxed)
        .and_then(Value::as_int)
        .ok_or_else(|| receiver_mismatch("int", receiver))?;
    let rhs = unboxed(&args[0]).as_int().ok_or(InvocationError::Type {
        index: 0,
        expected: "int",
        found: args[0].kind(),
    })?;
    Ok((lhs, rhs))
}

fn list(receiver: Option<&Value>) -> Result<&[Value], InvocationError> {
    match receiver.map(unboxed) {
        Some(Value::List(items)) => Ok(items),
        _ => Err(receiver_mismatch("list", receiver)),
    }
}
