//! Stable ID newtypes for host members and expression parameters.
//!
//! All IDs are distinct newtype wrappers over `u32`, providing type safety
//! so that a `MethodId` cannot be accidentally used where a `ParamId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a method definition in the [`TypeRegistry`](crate::TypeRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodId(pub u32);

/// Index of a parameter in an [`ExprGraph`](crate::ExprGraph) arena.
///
/// Two parameter references are the same parameter iff their ids are equal.
/// Display names carry no identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamId(pub u32);

// Display implementations -- just print the inner value.

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_inner_value() {
        assert_eq!(MethodId(7).to_string(), "7");
        assert_eq!(ParamId(0).to_string(), "0");
    }

    #[test]
    fn param_id_serde_roundtrip() {
        let id = ParamId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: ParamId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
