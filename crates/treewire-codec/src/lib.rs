//! Serialization of typed expression trees.
//!
//! [`ExpressionCodec`] converts an [`ExprTree`] into a tree of
//! [`EncodedExpression`] nodes that any serde format can carry, and rebuilds
//! an equivalent, executable tree from one. Types and members travel as
//! textual descriptors (see [`signature`]); parameters travel with per-call
//! ids so shared references stay shared; calls found in untrusted input are
//! rebuilt only when the [`DecodeOptions`] approve them.

pub mod encoded;
pub mod error;
pub mod policy;
pub mod signature;
pub mod state;
mod convert;

pub use encoded::EncodedExpression;
pub use error::CodecError;
pub use policy::{DecodeOptions, EncodeOptions};
pub use signature::{MemberSignature, SignatureCodec, TypeSignature, CORE_MODULES};
pub use state::{DecodeState, EncodeState, ParameterPayload};

use treewire_core::{ExprTree, TypeRegistry};

use crate::convert::{decode_node, encode_node};

/// Encoder and decoder bound to one type registry.
///
/// Every call runs on fresh state, so a codec can be reused freely.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionCodec<'a> {
    signatures: SignatureCodec<'a>,
}

impl<'a> ExpressionCodec<'a> {
    pub fn new(types: &'a TypeRegistry) -> Self {
        ExpressionCodec {
            signatures: SignatureCodec::new(types),
        }
    }

    pub fn signatures(&self) -> &SignatureCodec<'a> {
        &self.signatures
    }

    pub fn encode(&self, tree: &ExprTree) -> Result<EncodedExpression, CodecError> {
        self.encode_with(tree, &EncodeOptions::default())
    }

    pub fn encode_with(&self, tree: &ExprTree, options: &EncodeOptions) -> Result<EncodedExpression, CodecError> {
        let mut state = EncodeState::new(&self.signatures, &tree.graph, options);
        encode_node(&mut state, &tree.root)
    }

    /// Decodes with the default options, which approve no calls.
    pub fn decode(&self, node: &EncodedExpression) -> Result<ExprTree, CodecError> {
        self.decode_with(node, &DecodeOptions::default())
    }

    pub fn decode_with(&self, node: &EncodedExpression, options: &DecodeOptions) -> Result<ExprTree, CodecError> {
        let mut state = DecodeState::new(&self.signatures, options);
        let root = decode_node(&mut state, node)?;
        Ok(state.into_graph().finish(root))
    }
}

pub fn encode(types: &TypeRegistry, tree: &ExprTree) -> Result<EncodedExpression, CodecError> {
    ExpressionCodec::new(types).encode(tree)
}

pub fn decode(types: &TypeRegistry, node: &EncodedExpression) -> Result<ExprTree, CodecError> {
    ExpressionCodec::new(types).decode(node)
}

pub fn decode_with(
    types: &TypeRegistry,
    node: &EncodedExpression,
    options: &DecodeOptions,
) -> Result<ExprTree, CodecError> {
    ExpressionCodec::new(types).decode_with(node, options)
}
