use treewire_core::{Expr, ExprKind, NodeKind};

use super::{decode_child, decode_node, encode_node};
use crate::encoded::EncodedExpression;
use crate::error::CodecError;
use crate::state::{DecodeState, EncodeState};

const LEFT: &str = "Left";
const RIGHT: &str = "Right";
const CONVERSION: &str = "Conversion";

pub(super) fn encode(
    state: &mut EncodeState<'_>,
    kind: NodeKind,
    left: &Expr,
    right: &Expr,
    conversion: Option<&Expr>,
) -> Result<EncodedExpression, CodecError> {
    if !kind.is_binary() {
        return Err(CodecError::UnsupportedNodeKind { kind });
    }
    let mut node = EncodedExpression::new(kind)
        .with_child(LEFT, encode_node(state, left)?)
        .with_child(RIGHT, encode_node(state, right)?);
    if let Some(conversion) = conversion {
        if kind != NodeKind::Coalesce || !matches!(conversion.kind, ExprKind::Lambda { .. }) {
            return Err(CodecError::UnsupportedConversion { kind });
        }
        node = node.with_child(CONVERSION, encode_node(state, conversion)?);
    }
    Ok(node)
}

pub(super) fn decode(state: &mut DecodeState<'_>, node: &EncodedExpression) -> Result<Expr, CodecError> {
    let kind = node.node_type;
    let left = decode_child(state, node, LEFT)?;
    let right = decode_child(state, node, RIGHT)?;
    let conversion = match node.optional_child(CONVERSION) {
        Some(_) if kind != NodeKind::Coalesce => return Err(CodecError::UnsupportedConversion { kind }),
        Some(child) => Some(decode_node(state, child)?),
        None => None,
    };
    Ok(state
        .graph()
        .make_binary(state.types(), kind, left, right, conversion)?)
}
