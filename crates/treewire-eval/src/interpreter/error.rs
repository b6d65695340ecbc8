//! Runtime error types with trap semantics.
//!
//! Each variant is a trap that halts evaluation of the whole tree. Operator
//! traps carry the [`NodeKind`] that raised them.

use serde::{Deserialize, Serialize};
use treewire_core::{NodeKind, ParamId};

/// Runtime errors produced by the interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum RuntimeError {
    #[error("integer overflow in {op}")]
    IntegerOverflow { op: NodeKind },

    #[error("divide by zero in {op}")]
    DivideByZero { op: NodeKind },

    #[error("recursion depth limit ({limit}) exceeded")]
    RecursionLimitExceeded { limit: usize },

    #[error("type mismatch at runtime in {op}: expected {expected}, got {got}")]
    TypeMismatchAtRuntime {
        op: NodeKind,
        expected: String,
        got: String,
    },

    #[error("null reference in {op}")]
    NullReference { op: NodeKind },

    #[error("parameter {id} is not bound")]
    UnboundParameter { id: ParamId },

    #[error("expected {expected} argument(s), got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("no native implementation for '{method}'")]
    NoNativeImplementation { method: String },

    #[error("index {index} is out of range for length {size}")]
    OutOfBoundsAccess { index: i64, size: usize },

    /// The operation is not valid for the current state, e.g. `First` of an
    /// empty sequence.
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl RuntimeError {
    /// Re-attributes an operator trap to the node `kind` that evaluated it.
    pub fn at(self, kind: NodeKind) -> Self {
        match self {
            RuntimeError::IntegerOverflow { .. } => RuntimeError::IntegerOverflow { op: kind },
            RuntimeError::DivideByZero { .. } => RuntimeError::DivideByZero { op: kind },
            RuntimeError::TypeMismatchAtRuntime { expected, got, .. } => {
                RuntimeError::TypeMismatchAtRuntime { op: kind, expected, got }
            }
            other => other,
        }
    }
}
