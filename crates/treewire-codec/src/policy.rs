//! Encode and decode options, including the call safety policy.
//!
//! Decoding untrusted input may only rebuild calls the caller has approved.
//! Approval is granted per declaring type (separately for static and
//! instance members), per method, or wholesale through
//! [`DecodeOptions::allow_unsafe_calls`]. Nothing is approved by default.

use std::collections::HashSet;

use treewire_core::{MethodRef, TypeRef, TypeRegistry};

/// Options for a single decode call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeOptions {
    /// Skip the policy entirely.
    pub allow_unsafe_calls: bool,
    /// Types whose static methods may be called.
    pub safe_static_types: HashSet<TypeRef>,
    /// Types whose instance methods may be called.
    pub safe_instance_types: HashSet<TypeRef>,
    /// Individually approved methods.
    pub safe_methods: HashSet<MethodRef>,
    /// Deepest node nesting accepted, `None` for unlimited.
    pub max_depth: Option<usize>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_unsafe(mut self) -> Self {
        self.allow_unsafe_calls = true;
        self
    }

    pub fn allow_static_type(mut self, ty: TypeRef) -> Self {
        self.safe_static_types.insert(ty);
        self
    }

    pub fn allow_instance_type(mut self, ty: TypeRef) -> Self {
        self.safe_instance_types.insert(ty);
        self
    }

    pub fn allow_method(mut self, method: MethodRef) -> Self {
        self.safe_methods.insert(method);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Whether a call to `method` may be rebuilt.
    ///
    /// Allow-list entries also match through generic definitions: an
    /// approved ``List`1`` covers ``List`1[Int32]``, and an approved generic
    /// method definition covers each of its instantiations.
    pub fn is_call_allowed(&self, types: &TypeRegistry, method: &MethodRef) -> bool {
        if self.allow_unsafe_calls {
            return true;
        }
        let is_static = types.get_method(method.method).is_some_and(|m| m.is_static);
        let safe_types = if is_static {
            &self.safe_static_types
        } else {
            &self.safe_instance_types
        };
        if safe_types.contains(&method.declaring) || safe_types.contains(&method.declaring.definition()) {
            return true;
        }
        self.safe_methods.contains(method) || self.safe_methods.contains(&method.generic_definition())
    }
}

/// Options for a single encode call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Deepest node nesting accepted, `None` for unlimited.
    pub max_depth: Option<usize>,
}

impl EncodeOptions {
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}
