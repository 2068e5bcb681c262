//! # Marshalling
//!
//! Host values in, `DIDL` bytes out, and back. The untyped pair infers wire
//! types from the values; the typed pair works against declared signatures.

use didlpack::Limits;
use didlpack::TypeEnv;
use didlpack::WireType;

use crate::convert::from_host;
use crate::convert::to_host;
use crate::error::Result;
use crate::fields::FieldMap;
use crate::host::Host;
use crate::infer::infer_type;

/// Encodes host values with inferred types and the default field mapping.
pub fn marshal(args: &[Host]) -> Result<Vec<u8>> {
    marshal_with(args, &FieldMap::default())
}

pub fn marshal_with(args: &[Host], fields: &FieldMap) -> Result<Vec<u8>> {
    let types = args
        .iter()
        .map(|h| infer_type(h, fields))
        .collect::<Result<Vec<_>>>()?;
    marshal_typed(&types, &TypeEnv::new(), args, fields)
}

/// Encodes host values against declared argument types.
///
/// Extra host values past `types.len()` are ignored; too few is an error.
pub fn marshal_typed(
    types: &[WireType],
    env: &TypeEnv,
    args: &[Host],
    fields: &FieldMap,
) -> Result<Vec<u8>> {
    if args.len() < types.len() {
        return Err(didlpack::Error::TooFewValues { types: types.len(), values: args.len() }.into());
    }
    let values = types
        .iter()
        .zip(args)
        .map(|(ty, h)| from_host(ty, h, env, fields))
        .collect::<Result<Vec<_>>>()?;
    Ok(didlpack::encode_with_env(env, types, &values)?)
}

/// Decodes a message into host values, shaped by the types it carries.
pub fn unmarshal(bytes: &[u8]) -> Result<Vec<Host>> {
    unmarshal_with(bytes, &FieldMap::default(), Limits::default())
}

pub fn unmarshal_with(bytes: &[u8], fields: &FieldMap, limits: Limits) -> Result<Vec<Host>> {
    let msg = didlpack::decode_with_limits(bytes, limits)?;
    msg.types
        .iter()
        .zip(&msg.values)
        .map(|(ty, v)| to_host(ty, v, &msg.env, fields))
        .collect()
}

/// Decodes a message and converts its leading values through the expected
/// types, so record and variant labels take the declared names.
///
/// The message must carry at least `types.len()` values; any extra are dropped.
pub fn unmarshal_typed(
    bytes: &[u8],
    types: &[WireType],
    env: &TypeEnv,
    fields: &FieldMap,
    limits: Limits,
) -> Result<Vec<Host>> {
    let msg = didlpack::decode_with_limits(bytes, limits)?;
    if msg.values.len() < types.len() {
        return Err(didlpack::Error::TooFewValues {
            types: types.len(),
            values: msg.values.len(),
        }
        .into());
    }
    types
        .iter()
        .zip(&msg.values)
        .map(|(ty, v)| to_host(ty, v, env, fields))
        .collect()
}
