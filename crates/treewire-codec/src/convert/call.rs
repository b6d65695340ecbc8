//! Method calls, the only node family gated by the safety policy.

use tracing::warn;
use treewire_core::{Expr, MethodRef, NodeKind};

use super::{decode_node, decode_type_value, encode_node};
use crate::encoded::EncodedExpression;
use crate::error::CodecError;
use crate::state::{DecodeState, EncodeState};

const METHOD: &str = "Method";
const METHOD_TYPE: &str = "MethodType";
const PARAMETER_TYPES: &str = "ParameterTypes";
const GENERIC_ARGUMENTS: &str = "GenericArguments";
const ARGUMENT_COUNT: &str = "ArgumentCount";
const OBJECT: &str = "Object";

fn argument_role(index: usize) -> String {
    format!("Argument{}", index)
}

pub(super) fn encode(
    state: &mut EncodeState<'_>,
    object: Option<&Expr>,
    method: &MethodRef,
    arguments: &[Expr],
) -> Result<EncodedExpression, CodecError> {
    let codec = state.codec();
    let params = state.types().method_parameter_types(method)?;
    let mut node = EncodedExpression::new(NodeKind::Call)
        .with_value(METHOD, codec.encode_member(method)?)
        .with_value(METHOD_TYPE, codec.encode_type(&method.declaring)?)
        .with_value(PARAMETER_TYPES, codec.encode_types(&params)?)
        .with_value(GENERIC_ARGUMENTS, codec.encode_types(&method.type_args)?)
        .with_value(ARGUMENT_COUNT, arguments.len().to_string());

    let object = object.map(|o| encode_node(state, o)).transpose()?;
    node.set_child(OBJECT, object);
    for (i, arg) in arguments.iter().enumerate() {
        node = node.with_child(&argument_role(i), encode_node(state, arg)?);
    }
    Ok(node)
}

pub(super) fn decode(state: &mut DecodeState<'_>, node: &EncodedExpression) -> Result<Expr, CodecError> {
    let method = resolve_method(state, node)?;

    let types = state.types();
    if !state.options().is_call_allowed(types, &method) {
        let description = types.describe_method(&method);
        warn!(method = %description, "rejected call not allowed by decode options");
        return Err(CodecError::UnsafeCall { method, description });
    }

    let object = node
        .optional_child(OBJECT)
        .map(|o| decode_node(state, o))
        .transpose()?;
    let count = node.child_count(ARGUMENT_COUNT)?;
    let mut arguments = Vec::with_capacity(count);
    for i in 0..count {
        arguments.push(decode_node(state, node.child(&argument_role(i))?)?);
    }
    Ok(state.graph().call(types, object, method, arguments)?)
}

/// Resolves and closes the called member, then checks it against the
/// stored declaring and parameter types.
fn resolve_method(state: &DecodeState<'_>, node: &EncodedExpression) -> Result<MethodRef, CodecError> {
    let codec = state.codec();
    let types = state.types();
    let text = node.value(METHOD)?;
    let mismatch = |reason: String| CodecError::MemberNotFound {
        signature: text.to_string(),
        reason,
    };

    let definition = codec.decode_member(text)?;
    let declaring = decode_type_value(state, node, METHOD_TYPE)?;
    if declaring != definition.declaring {
        return Err(mismatch(format!(
            "member is declared on '{}', node names '{}'",
            types.type_name(&definition.declaring),
            types.type_name(&declaring)
        )));
    }

    let generic_args = codec.decode_types(node.optional_value(GENERIC_ARGUMENTS).unwrap_or_default())?;
    let method = if generic_args.is_empty() {
        definition
    } else {
        types
            .make_generic_method(&definition, &generic_args)
            .map_err(|e| mismatch(e.to_string()))?
    };
    if types.is_generic_definition(&method) {
        return Err(mismatch("generic method is missing its type arguments".to_string()));
    }

    let stored = codec.decode_types(node.value(PARAMETER_TYPES)?)?;
    let actual = types.method_parameter_types(&method)?;
    if stored != actual {
        return Err(mismatch(format!(
            "stored parameter types do not match '{}'",
            types.describe_method(&method)
        )));
    }
    Ok(method)
}
