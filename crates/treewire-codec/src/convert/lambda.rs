//! Lambdas and the parameters they bind.

use treewire_core::{Expr, ExprKind, NodeKind, ParamId};
use uuid::Uuid;

use super::{decode_child, decode_node, decode_type_value, encode_node, NAME, TYPE};
use crate::encoded::EncodedExpression;
use crate::error::CodecError;
use crate::state::{DecodeState, EncodeState};

const ID: &str = "Id";
const BODY: &str = "Body";
const PARAMETER_COUNT: &str = "ParameterCount";

fn parameter_role(index: usize) -> String {
    format!("Parameter{}", index)
}

pub(super) fn encode_parameter(state: &mut EncodeState<'_>, id: ParamId) -> Result<EncodedExpression, CodecError> {
    let payload = state.intern_parameter(id)?;
    Ok(EncodedExpression::new(NodeKind::Parameter)
        .with_value(TYPE, payload.ty)
        .with_value(NAME, payload.name)
        .with_value(ID, payload.id.to_string()))
}

pub(super) fn decode_parameter(state: &mut DecodeState<'_>, node: &EncodedExpression) -> Result<Expr, CodecError> {
    let text = node.value(ID)?;
    let id = Uuid::parse_str(text).map_err(|e| node.malformed(format!("bad parameter id '{}': {}", text, e)))?;
    let ty = decode_type_value(state, node, TYPE)?;
    let name = node.value(NAME)?;
    let param = state.resolve_parameter(id, ty, name);
    Ok(state.graph().param_ref(param)?)
}

pub(super) fn encode(
    state: &mut EncodeState<'_>,
    parameters: &[ParamId],
    body: &Expr,
) -> Result<EncodedExpression, CodecError> {
    let mut node = EncodedExpression::new(NodeKind::Lambda)
        .with_value(PARAMETER_COUNT, parameters.len().to_string());
    for (i, id) in parameters.iter().enumerate() {
        node = node.with_child(&parameter_role(i), encode_parameter(state, *id)?);
    }
    Ok(node.with_child(BODY, encode_node(state, body)?))
}

/// Parameters are decoded before the body so that the body's references
/// resolve to the bound parameters.
pub(super) fn decode(state: &mut DecodeState<'_>, node: &EncodedExpression) -> Result<Expr, CodecError> {
    let count = node.child_count(PARAMETER_COUNT)?;
    let mut parameters = Vec::with_capacity(count);
    for i in 0..count {
        let role = parameter_role(i);
        let child = node.child(&role)?;
        let param = decode_node(state, child)?;
        match param.kind {
            ExprKind::Parameter(id) => parameters.push(id),
            _ => return Err(node.malformed(format!("child '{}' is not a parameter", role))),
        }
    }
    let body = decode_child(state, node, BODY)?;
    Ok(state.graph().lambda(state.types(), parameters, body)?)
}
