//! CBOR wire encoding plus JSON helpers for fixtures.
//!
//! Map entries are written in iteration order, so insertion-ordered maps
//! (named arguments, access sets) keep their order across the wire.

use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::ser::Write as CborWrite;

/// Tag 55799 as written by `self_describe`.
const SELF_DESCRIBE_TAG: [u8; 3] = [0xd9, 0xd9, 0xf7];

/// Serialize a value into self-described CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(256);
    write_cbor(value, &mut buf)?;
    Ok(buf)
}

/// Serialize a value directly into an arbitrary CBOR writer.
pub fn write_cbor<T: Serialize, W>(value: &T, writer: W) -> Result<(), CodecError>
where
    W: CborWrite,
{
    let mut serializer = serde_cbor::ser::Serializer::new(writer);
    serializer.self_describe()?;
    value.serialize(&mut serializer)?;
    Ok(())
}

/// Decode bytes with or without the leading self-describe tag. The tag is
/// dropped first since enum decoding cannot step over it.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let body = bytes.strip_prefix(&SELF_DESCRIBE_TAG[..]).unwrap_or(bytes);
    Ok(serde_cbor::from_slice(body)?)
}

pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CodecError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    Ok(serde_json::from_str(text)?)
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("CBOR codec error: {0}")]
    Cbor(#[from] serde_cbor::Error),
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),
}
