use treewire_core::{Expr, NodeKind, TypeRef};

use super::{decode_child, decode_type_value, encode_node, TYPE};
use crate::encoded::EncodedExpression;
use crate::error::CodecError;
use crate::state::{DecodeState, EncodeState};

const OPERAND: &str = "Operand";

pub(super) fn encode(
    state: &mut EncodeState<'_>,
    kind: NodeKind,
    operand: &Expr,
    ty: &TypeRef,
) -> Result<EncodedExpression, CodecError> {
    if !kind.is_unary() {
        return Err(CodecError::UnsupportedNodeKind { kind });
    }
    let operand = encode_node(state, operand)?;
    Ok(EncodedExpression::new(kind)
        .with_child(OPERAND, operand)
        .with_value(TYPE, state.codec().encode_type(ty)?))
}

/// The stored result type doubles as the conversion target.
pub(super) fn decode(state: &mut DecodeState<'_>, node: &EncodedExpression) -> Result<Expr, CodecError> {
    let ty = decode_type_value(state, node, TYPE)?;
    let operand = decode_child(state, node, OPERAND)?;
    Ok(state
        .graph()
        .make_unary(state.types(), node.node_type, operand, Some(ty))?)
}
