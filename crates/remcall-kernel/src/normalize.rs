use remcall_types::{Kwargs, Value};

/// Widens resolved payloads into what callables expect. Output has the same
/// shape as the input: one value per positional slot, same keyword names.
pub trait ArgNormalizer: Send + Sync {
    fn normalize(&self, args: Vec<Value>, kwargs: Kwargs) -> (Vec<Value>, Kwargs);
}

/// Strips boxed envelopes, including those nested in plain containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Upcast;

impl ArgNormalizer for Upcast {
    fn normalize(&self, args: Vec<Value>, kwargs: Kwargs) -> (Vec<Value>, Kwargs) {
        let args = args.into_iter().map(upcast).collect();
        let kwargs = kwargs
            .into_iter()
            .map(|(name, value)| (name, upcast(value)))
            .collect();
        (args, kwargs)
    }
}

pub fn upcast(value: Value) -> Value {
    match value {
        Value::Boxed { value, .. } => upcast(*value),
        Value::List(items) => Value::List(items.into_iter().map(upcast).collect()),
        Value::Tuple(items) => Value::Tuple(items.into_iter().map(upcast).collect()),
        Value::Dict(entries) => Value::Dict(
            entries
                .into_iter()
                .map(|(key, value)| (key, upcast(value)))
                .collect(),
        ),
        other => other,
    }
}
