//! Core error types for treewire-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! registry lookups and the validation performed by the expression factories.

use crate::id::{MethodId, ParamId};
use crate::type_id::TypeId;
use thiserror::Error;

/// Core errors produced by the treewire-core crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Attempting to register a qualified name twice in the same module.
    #[error("duplicate type name: '{name}' in module '{module}'")]
    DuplicateTypeName { name: String, module: String },

    /// A TypeId was not found in the type registry.
    #[error("type not found: TypeId({id})", id = id.0)]
    TypeNotFound { id: TypeId },

    /// A MethodId was not found in the type registry.
    #[error("method not found: MethodId({id})", id = id.0)]
    MethodNotFound { id: MethodId },

    /// A parameter id does not belong to the expression graph.
    #[error("parameter not found: ParamId({id})", id = id.0)]
    ParameterNotFound { id: ParamId },

    /// A field or property name does not exist on the type.
    #[error("member '{member}' not found on type '{type_name}'")]
    MemberNotFound { type_name: String, member: String },

    /// A generic type or method was instantiated with the wrong number of arguments.
    #[error("'{name}' expects {expected} generic argument(s), got {got}")]
    GenericArityMismatch {
        name: String,
        expected: u32,
        got: usize,
    },

    /// The left side of an assignment cannot be written to.
    #[error("expression is not writable: {reason}")]
    NotWritable { reason: String },

    /// A factory rejected the operands of a node.
    #[error("invalid expression: {reason}")]
    InvalidExpression { reason: String },
}
