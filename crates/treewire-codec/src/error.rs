//! Error types for encoding and decoding.
//!
//! Every failure aborts the whole encode or decode call. Variants carry the
//! offending signature fragment, node kind, or member so callers can react
//! programmatically (for example, allow-listing the method named by
//! [`CodecError::UnsafeCall`] and decoding again).

use thiserror::Error;
use treewire_core::{CoreError, MethodRef, NodeKind};

/// Errors produced by the signature codec and the node dispatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Signature text violates the grammar.
    #[error("invalid signature '{signature}': {reason}")]
    SignatureInvalid { signature: String, reason: String },

    /// Well-formed type signature naming no known type.
    #[error("type not found: '{name}'")]
    TypeNotFound { name: String },

    /// Well-formed member signature matching zero or several members.
    #[error("member not found for '{signature}': {reason}")]
    MemberNotFound { signature: String, reason: String },

    /// The decode options do not allow calling this method.
    #[error("call to '{description}' is not allowed by the decode options")]
    UnsafeCall {
        method: MethodRef,
        description: String,
    },

    /// No encoder or decoder exists for this node kind.
    #[error("node kind '{kind}' is not supported")]
    UnsupportedNodeKind { kind: NodeKind },

    /// Constant declared with a type that has no literal parser.
    #[error("no constant parser for type '{type_name}'")]
    UnknownConstantType { type_name: String },

    /// Constant text does not parse as its declared type.
    #[error("'{text}' is not a valid {type_name} literal")]
    InvalidConstant { type_name: String, text: String },

    #[error("Encoding member access of anonymous types is not supported. (type '{type_name}')")]
    AnonymousMemberAccess { type_name: String },

    /// Anonymous types have no name a signature could carry.
    #[error("anonymous type '{type_name}' cannot be named in a signature")]
    AnonymousType { type_name: String },

    #[error("'{kind}' node carries an unsupported conversion")]
    UnsupportedConversion { kind: NodeKind },

    /// An encoded node is missing a child or value, or a value is unreadable.
    #[error("malformed '{kind}' node: {reason}")]
    MalformedNode { kind: NodeKind, reason: String },

    #[error("expression nesting exceeds the depth limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    /// The rebuilt node was rejected by the expression factories.
    #[error(transparent)]
    InvalidExpression(#[from] CoreError),
}
