//! Node-kind dispatch between [`Expr`] and [`EncodedExpression`].
//!
//! Encoding matches on the expression variant, decoding on the encoded
//! node kind. Both matches are exhaustive, so a new kind cannot be added
//! without deciding how it is carried.

mod binary;
mod call;
mod constant;
mod lambda;
mod member;
mod unary;

use tracing::trace;
use treewire_core::{Expr, ExprKind, NodeKind, TypeRef};

use crate::encoded::EncodedExpression;
use crate::error::CodecError;
use crate::state::{DecodeState, EncodeState};

// Roles shared by more than one node family.
const TYPE: &str = "Type";
const NAME: &str = "Name";

pub(crate) fn encode_node(state: &mut EncodeState<'_>, expr: &Expr) -> Result<EncodedExpression, CodecError> {
    state.enter()?;
    trace!(kind = %expr.node_kind(), "encoding node");
    let result = match &expr.kind {
        ExprKind::Binary {
            kind,
            left,
            right,
            conversion,
        } => binary::encode(state, *kind, left, right, conversion.as_deref()),
        ExprKind::Unary { kind, operand } => unary::encode(state, *kind, operand, &expr.ty),
        ExprKind::Constant(value) => constant::encode(state, value, &expr.ty),
        ExprKind::Member { expression, member } => member::encode(state, expression, member),
        ExprKind::Parameter(id) => lambda::encode_parameter(state, *id),
        ExprKind::Lambda { parameters, body } => lambda::encode(state, parameters, body),
        ExprKind::Call {
            object,
            method,
            arguments,
        } => call::encode(state, object.as_deref(), method, arguments),
    };
    state.leave();
    result
}

pub(crate) fn decode_node(state: &mut DecodeState<'_>, node: &EncodedExpression) -> Result<Expr, CodecError> {
    state.enter()?;
    trace!(kind = %node.node_type, "decoding node");
    let result = decode_kind(state, node);
    state.leave();
    result
}

fn decode_kind(state: &mut DecodeState<'_>, node: &EncodedExpression) -> Result<Expr, CodecError> {
    use NodeKind as K;
    match node.node_type {
        K::Add
        | K::AddChecked
        | K::Subtract
        | K::SubtractChecked
        | K::Multiply
        | K::MultiplyChecked
        | K::Divide
        | K::Modulo
        | K::Power
        | K::And
        | K::Or
        | K::ExclusiveOr
        | K::AndAlso
        | K::OrElse
        | K::LeftShift
        | K::RightShift
        | K::Equal
        | K::NotEqual
        | K::LessThan
        | K::LessThanOrEqual
        | K::GreaterThan
        | K::GreaterThanOrEqual
        | K::Coalesce
        | K::Assign
        | K::AddAssign
        | K::AddAssignChecked
        | K::SubtractAssign
        | K::SubtractAssignChecked
        | K::MultiplyAssign
        | K::MultiplyAssignChecked
        | K::DivideAssign
        | K::ModuloAssign
        | K::PowerAssign
        | K::AndAssign
        | K::OrAssign
        | K::ExclusiveOrAssign
        | K::LeftShiftAssign
        | K::RightShiftAssign => binary::decode(state, node),

        K::Convert
        | K::ConvertChecked
        | K::Negate
        | K::NegateChecked
        | K::UnaryPlus
        | K::Not
        | K::OnesComplement
        | K::IsTrue
        | K::IsFalse
        | K::Increment
        | K::Decrement
        | K::PreIncrementAssign
        | K::PreDecrementAssign
        | K::PostIncrementAssign
        | K::PostDecrementAssign => unary::decode(state, node),

        K::Constant => constant::decode(state, node),
        K::Parameter => lambda::decode_parameter(state, node),
        K::MemberAccess => member::decode(state, node),
        K::Lambda => lambda::decode(state, node),
        K::Call => call::decode(state, node),

        K::ArrayLength
        | K::ArrayIndex
        | K::Conditional
        | K::Invoke
        | K::ListInit
        | K::MemberInit
        | K::New
        | K::NewArrayInit
        | K::NewArrayBounds
        | K::Quote
        | K::TypeAs
        | K::TypeIs
        | K::TypeEqual
        | K::Block
        | K::DebugInfo
        | K::Default
        | K::Dynamic
        | K::Extension
        | K::Goto
        | K::Index
        | K::Label
        | K::Loop
        | K::RuntimeVariables
        | K::Switch
        | K::Throw
        | K::Try
        | K::Unbox => Err(CodecError::UnsupportedNodeKind {
            kind: node.node_type,
        }),
    }
}

/// Decodes a required child.
fn decode_child(
    state: &mut DecodeState<'_>,
    node: &EncodedExpression,
    role: &str,
) -> Result<Expr, CodecError> {
    decode_node(state, node.child(role)?)
}

/// Resolves the type descriptor stored under `role`.
fn decode_type_value(
    state: &DecodeState<'_>,
    node: &EncodedExpression,
    role: &str,
) -> Result<TypeRef, CodecError> {
    state.codec().decode_type(node.value(role)?)
}
