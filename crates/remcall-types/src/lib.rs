//! Wire vocabulary shared across remcall: identifiers, references, principals,
//! access sets, payload values, stored objects and the action messages that
//! name remote calls.

pub mod action;
pub mod cbor;

mod access;
mod address;
mod ids;
mod object;
mod principal;
mod reference;
mod value;

pub use access::AccessSet;
pub use action::{
    GetObjectAction, GetObjectResponse, Plan, RunClassMethodAction, SaveObjectAction,
};
pub use address::Address;
pub use cbor::CodecError;
pub use ids::{Uid, UidParseError};
pub use object::StoredObject;
pub use principal::{PrincipalKey, PrincipalParseError};
pub use reference::Reference;
pub use value::{Identity, Kwargs, Object, Tensor, Value};
