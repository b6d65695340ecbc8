use treewire_core::{Expr, MemberRef, NodeKind};

use super::{decode_child, decode_type_value, encode_node, TYPE};
use crate::encoded::EncodedExpression;
use crate::error::CodecError;
use crate::state::{DecodeState, EncodeState};

const MEMBER: &str = "Member";
const IS_PROPERTY: &str = "IsProperty";
const EXPRESSION: &str = "Expression";

pub(super) fn encode(
    state: &mut EncodeState<'_>,
    expression: &Expr,
    member: &MemberRef,
) -> Result<EncodedExpression, CodecError> {
    let types = state.types();
    for ty in [member.declaring(), &expression.ty] {
        if types.is_anonymous(ty) {
            return Err(CodecError::AnonymousMemberAccess {
                type_name: types.type_name(ty),
            });
        }
    }
    let declaring = state.codec().encode_type(member.declaring())?;
    let target = encode_node(state, expression)?;
    Ok(EncodedExpression::new(NodeKind::MemberAccess)
        .with_value(TYPE, declaring)
        .with_value(MEMBER, member.name())
        .with_value(IS_PROPERTY, member.is_property().to_string())
        .with_child(EXPRESSION, target))
}

/// The member is resolved before its target expression is decoded.
pub(super) fn decode(state: &mut DecodeState<'_>, node: &EncodedExpression) -> Result<Expr, CodecError> {
    let declaring = decode_type_value(state, node, TYPE)?;
    let name = node.value(MEMBER)?.to_string();
    let is_property = node.flag(IS_PROPERTY)?;

    let types = state.types();
    let (exists, what) = if is_property {
        (types.property(&declaring, &name).is_some(), "property")
    } else {
        (types.field_type(&declaring, &name).is_some(), "field")
    };
    if !exists {
        return Err(CodecError::MemberNotFound {
            signature: format!("{}.{}", node.value(TYPE)?, name),
            reason: format!("no {} named '{}'", what, name),
        });
    }
    let member = if is_property {
        MemberRef::Property { declaring, name }
    } else {
        MemberRef::Field { declaring, name }
    };

    let expression = decode_child(state, node, EXPRESSION)?;
    Ok(state.graph().member_access(types, expression, member)?)
}
