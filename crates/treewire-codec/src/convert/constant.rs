use treewire_core::{ConstValue, Expr, NodeKind, PrimitiveType, TypeRef, TypeRegistry};

use super::{decode_type_value, TYPE};
use crate::encoded::EncodedExpression;
use crate::error::CodecError;
use crate::state::{DecodeState, EncodeState};

const VALUE: &str = "Value";

/// Null constants carry no "Value" entry.
pub(super) fn encode(
    state: &mut EncodeState<'_>,
    value: &ConstValue,
    ty: &TypeRef,
) -> Result<EncodedExpression, CodecError> {
    let mut node = EncodedExpression::new(NodeKind::Constant).with_value(TYPE, state.codec().encode_type(ty)?);
    if let Some(text) = value.to_text() {
        node = node.with_value(VALUE, text);
    }
    Ok(node)
}

pub(super) fn decode(state: &mut DecodeState<'_>, node: &EncodedExpression) -> Result<Expr, CodecError> {
    let ty = decode_type_value(state, node, TYPE)?;
    let value = match node.optional_value(VALUE) {
        Some(text) => parse_literal(state.types(), &ty, text)?,
        None => ConstValue::Null,
    };
    Ok(state.graph().constant(state.types(), value, ty)?)
}

fn parse_literal(types: &TypeRegistry, ty: &TypeRef, text: &str) -> Result<ConstValue, CodecError> {
    let Some(p) = types.primitive_of(types.nullable_underlying(ty).unwrap_or(ty)) else {
        return Err(CodecError::UnknownConstantType {
            type_name: types.type_name(ty),
        });
    };
    let invalid = || CodecError::InvalidConstant {
        type_name: p.name().to_string(),
        text: text.to_string(),
    };
    macro_rules! number {
        ($variant:ident) => {
            ConstValue::$variant(text.parse().map_err(|_| invalid())?)
        };
    }

    Ok(match p {
        PrimitiveType::Boolean => {
            if text.eq_ignore_ascii_case("true") {
                ConstValue::Boolean(true)
            } else if text.eq_ignore_ascii_case("false") {
                ConstValue::Boolean(false)
            } else {
                return Err(invalid());
            }
        }
        PrimitiveType::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => ConstValue::Char(c),
                _ => return Err(invalid()),
            }
        }
        PrimitiveType::SByte => number!(SByte),
        PrimitiveType::Byte => number!(Byte),
        PrimitiveType::Int16 => number!(Int16),
        PrimitiveType::UInt16 => number!(UInt16),
        PrimitiveType::Int32 => number!(Int32),
        PrimitiveType::UInt32 => number!(UInt32),
        PrimitiveType::Int64 => number!(Int64),
        PrimitiveType::UInt64 => number!(UInt64),
        PrimitiveType::Single => number!(Single),
        PrimitiveType::Double => number!(Double),
        PrimitiveType::String => ConstValue::String(text.to_string()),
        PrimitiveType::Void | PrimitiveType::Object => {
            return Err(CodecError::UnknownConstantType {
                type_name: p.name().to_string(),
            })
        }
    })
}
