use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Uid, action::Plan};

/// Named call arguments in insertion order.
pub type Kwargs = IndexMap<String, Value>;

/// Payload carried by a stored object or passed to a callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    #[serde(with = "serde_bytes")]
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(IndexMap<String, Value>),
    /// Primitive-value envelope tagged with the identifier it is stored under.
    Boxed { id: Uid, value: Box<Value> },
    Tensor(Tensor),
    Object(Object),
    Plan(Box<Plan>),
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl Value {
    /// Human-readable kind string used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Boxed { .. } => "boxed",
            Value::Tensor(_) => "tensor",
            Value::Object(_) => "object",
            Value::Plan(_) => "plan",
        }
    }

    /// Scalars and plain containers. Boxed envelopes are not primitive: they
    /// already carry an identity.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::Text(_)
                | Value::Bytes(_)
                | Value::List(_)
                | Value::Tuple(_)
                | Value::Dict(_)
        )
    }

    pub fn has_identity_slot(&self) -> bool {
        match self {
            Value::Boxed { .. } | Value::Tensor(_) | Value::Plan(_) => true,
            Value::Object(obj) => !matches!(obj.identity, Identity::Anonymous),
            _ => false,
        }
    }

    pub fn identity(&self) -> Option<Uid> {
        match self {
            Value::Boxed { id, .. } => Some(*id),
            Value::Tensor(tensor) => tensor.id,
            Value::Plan(plan) => plan.id,
            Value::Object(obj) => obj.identity.current(),
            _ => None,
        }
    }

    /// Force the identity slot to `id` and return what the slot holds
    /// afterwards. Pinned slots keep their value; values without a slot
    /// return `None`.
    pub fn force_identity(&mut self, id: Uid) -> Option<Uid> {
        match self {
            Value::Boxed { id: slot, .. } => {
                *slot = id;
            }
            Value::Tensor(tensor) => tensor.id = Some(id),
            Value::Plan(plan) => plan.id = Some(id),
            Value::Object(obj) => {
                if let Identity::Mutable(slot) = &mut obj.identity {
                    *slot = Some(id);
                }
            }
            _ => {}
        }
        self.identity()
    }

    /// Capability path replacing `method` on this particular value.
    pub fn method_override(&self, method: &str) -> Option<&str> {
        match self {
            Value::Object(obj) => obj.overrides.get(method).map(String::as_str),
            _ => None,
        }
    }

    pub fn as_plan(&self) -> Option<&Plan> {
        match self {
            Value::Plan(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Tensor(tensor) => Some(tensor),
            _ => None,
        }
    }

    pub fn as_tensor_mut(&mut self) -> Option<&mut Tensor> {
        match self {
            Value::Tensor(tensor) => Some(tensor),
            _ => None,
        }
    }

    pub fn boxed(id: Uid, value: Value) -> Self {
        Value::Boxed {
            id,
            value: Box::new(value),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<Tensor> for Value {
    fn from(value: Tensor) -> Self {
        Value::Tensor(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Plan> for Value {
    fn from(value: Plan) -> Self {
        Value::Plan(Box::new(value))
    }
}

/// Dense row-major tensor of `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uid>,
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl Tensor {
    /// One-dimensional tensor over `data`.
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            id: None,
            shape: vec![data.len()],
            data,
        }
    }

    /// `None` when the element count overflows.
    pub fn zeros(shape: Vec<usize>) -> Option<Self> {
        let len = Self::element_count(&shape)?;
        Some(Self {
            id: None,
            shape,
            data: vec![0.0; len],
        })
    }

    /// Product of the dimensions, `None` on overflow.
    pub fn element_count(shape: &[usize]) -> Option<usize> {
        shape.iter().try_fold(1usize, |acc, dim| acc.checked_mul(*dim))
    }

    /// Whether `data` holds exactly one element per position of `shape`.
    pub fn is_well_formed(&self) -> bool {
        Self::element_count(&self.shape) == Some(self.data.len())
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }
}

/// Identity slot of a user object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    /// The class exposes no identity slot.
    #[default]
    Anonymous,
    /// Settable slot, possibly unset.
    Mutable(Option<Uid>),
    /// Read-only slot.
    Pinned(Uid),
}

impl Identity {
    pub fn current(&self) -> Option<Uid> {
        match self {
            Identity::Anonymous => None,
            Identity::Mutable(id) => *id,
            Identity::Pinned(id) => Some(*id),
        }
    }
}

/// Non-primitive user value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub class: String,
    #[serde(default)]
    pub identity: Identity,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, Value>,
    /// Method name to capability path, for methods swapped out on this instance.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub overrides: IndexMap<String, String>,
}

impl Object {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            identity: Identity::Anonymous,
            fields: IndexMap::new(),
            overrides: IndexMap::new(),
        }
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_override(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.overrides.insert(method.into(), path.into());
        self
    }
}
