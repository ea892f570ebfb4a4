use remcall_types::{Kwargs, Tensor, Value};

use super::{expect_arity, receiver_mismatch};
use crate::capability::{CallShape, CapabilityRegistry};
use crate::error::InvocationError;

/// Largest tensor `torch.zeros` will allocate.
const MAX_ELEMENTS: usize = 1 << 24;

enum Operand<'a> {
    Tensor(&'a Tensor),
    Scalar(f64),
}

pub(super) fn register(registry: &mut CapabilityRegistry) {
    registry.register_fn("torch.tensor", CallShape::Static, |_, args, _| {
        expect_arity(&args, 1)?;
        let data = numbers(&args[0], 0)?;
        Ok(Tensor::from_vec(data).into())
    });

    registry.register_fn("torch.zeros", CallShape::Static, |_, args, _| {
        let shape = args
            .iter()
            .enumerate()
            .map(|(index, arg)| match arg {
                Value::Int(dim) if *dim >= 0 => Ok(*dim as usize),
                other => Err(InvocationError::Type {
                    index,
                    expected: "non-negative int",
                    found: other.kind(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        match Tensor::element_count(&shape) {
            Some(len) if len <= MAX_ELEMENTS => {}
            _ => {
                return Err(InvocationError::Failed(format!(
                    "shape {shape:?} exceeds {MAX_ELEMENTS} elements"
                )));
            }
        }
        Tensor::zeros(shape)
            .map(Value::from)
            .ok_or_else(|| InvocationError::Failed("tensor size overflow".into()))
    });

    registry.register_fn("torch.Tensor.add", CallShape::Bound, |receiver, args, kwargs| {
        let tensor = tensor_mut(receiver)?;
        let alpha = alpha(&kwargs)?;
        let data = zip_with(tensor, &operand(&args)?, |a, b| a + alpha * b)?;
        Ok(derived(tensor, data))
    });

    registry.register_fn("torch.Tensor.add_", CallShape::Bound, |receiver, args, kwargs| {
        let tensor = tensor_mut(receiver)?;
        let alpha = alpha(&kwargs)?;
        tensor.data = zip_with(tensor, &operand(&args)?, |a, b| a + alpha * b)?;
        Ok(Value::Tensor(tensor.clone()))
    });

    registry.register_fn("torch.Tensor.mul", CallShape::Bound, |receiver, args, _| {
        let tensor = tensor_mut(receiver)?;
        let data = zip_with(tensor, &operand(&args)?, |a, b| a * b)?;
        Ok(derived(tensor, data))
    });

    registry.register_fn("torch.Tensor.mul_", CallShape::Bound, |receiver, args, _| {
        let tensor = tensor_mut(receiver)?;
        tensor.data = zip_with(tensor, &operand(&args)?, |a, b| a * b)?;
        Ok(Value::Tensor(tensor.clone()))
    });

    registry.register_fn("torch.Tensor.neg", CallShape::Bound, |receiver, args, _| {
        expect_arity(&args, 0)?;
        let tensor = tensor_mut(receiver)?;
        let data = tensor.data.iter().map(|x| -x).collect();
        Ok(derived(tensor, data))
    });

    registry.register_fn("torch.Tensor.sum", CallShape::Bound, |receiver, args, _| {
        expect_arity(&args, 0)?;
        let tensor = tensor_mut(receiver)?;
        Ok(Value::Float(tensor.data.iter().sum()))
    });
}

fn tensor_mut(receiver: Option<&mut Value>) -> Result<&mut Tensor, InvocationError> {
    match receiver {
        Some(Value::Tensor(tensor)) => {
            well_formed(tensor)?;
            Ok(tensor)
        }
        other => Err(receiver_mismatch("tensor", other.as_deref())),
    }
}

fn well_formed(tensor: &Tensor) -> Result<(), InvocationError> {
    if tensor.is_well_formed() {
        return Ok(());
    }
    Err(InvocationError::Failed(format!(
        "tensor holds {} elements but has shape {:?}",
        tensor.data.len(),
        tensor.shape
    )))
}

fn derived(source: &Tensor, data: Vec<f64>) -> Value {
    Value::Tensor(Tensor {
        id: None,
        shape: source.shape.clone(),
        data,
    })
}

fn numbers(value: &Value, index: usize) -> Result<Vec<f64>, InvocationError> {
    let (Value::List(items) | Value::Tuple(items)) = value else {
        return Err(InvocationError::Type {
            index,
            expected: "list of numbers",
            found: value.kind(),
        });
    };
    items
        .iter()
        .map(|item| {
            item.as_float().ok_or(InvocationError::Type {
                index,
                expected: "number",
                found: item.kind(),
            })
        })
        .collect()
}

fn operand(args: &[Value]) -> Result<Operand<'_>, InvocationError> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::Tensor(tensor) => {
            well_formed(tensor)?;
            Ok(Operand::Tensor(tensor))
        }
        other => other.as_float().map(Operand::Scalar).ok_or(InvocationError::Type {
            index: 0,
            expected: "tensor or number",
            found: other.kind(),
        }),
    }
}

fn alpha(kwargs: &Kwargs) -> Result<f64, InvocationError> {
    match kwargs.get("alpha") {
        None => Ok(1.0),
        Some(value) => value
            .as_float()
            .ok_or_else(|| InvocationError::Failed(format!("alpha must be a number, got {}", value.kind()))),
    }
}

fn zip_with(
    lhs: &Tensor,
    rhs: &Operand<'_>,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Vec<f64>, InvocationError> {
    match rhs {
        Operand::Scalar(scalar) => Ok(lhs.data.iter().map(|x| f(*x, *scalar)).collect()),
        Operand::Tensor(other) => {
            if other.shape != lhs.shape {
                return Err(InvocationError::Shape {
                    left: lhs.shape.clone(),
                    right: other.shape.clone(),
                });
            }
            Ok(lhs.data.iter().zip(&other.data).map(|(a, b)| f(*a, *b)).collect())
        }
    }
}
