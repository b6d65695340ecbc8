//! The generic encoded node.
//!
//! [`EncodedExpression`] is the only structure a document format needs to
//! understand: a node-kind tag, named children (a `None` entry means "no
//! child"), and named string values. It derives serde, so any serde format
//! can carry it without further adapter code.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use treewire_core::NodeKind;

use crate::error::CodecError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedExpression {
    pub node_type: NodeKind,
    #[serde(default)]
    pub children: IndexMap<String, Option<EncodedExpression>>,
    #[serde(default)]
    pub values: IndexMap<String, String>,
}

impl EncodedExpression {
    pub fn new(node_type: NodeKind) -> Self {
        EncodedExpression {
            node_type,
            children: IndexMap::new(),
            values: IndexMap::new(),
        }
    }

    pub fn with_child(mut self, role: &str, child: EncodedExpression) -> Self {
        self.children.insert(role.to_string(), Some(child));
        self
    }

    pub fn with_value(mut self, role: &str, value: impl Into<String>) -> Self {
        self.values.insert(role.to_string(), value.into());
        self
    }

    /// Records `child` under `role`, keeping an explicit `None` entry.
    pub fn set_child(&mut self, role: &str, child: Option<EncodedExpression>) {
        self.children.insert(role.to_string(), child);
    }

    /// A required child.
    pub fn child(&self, role: &str) -> Result<&EncodedExpression, CodecError> {
        self.optional_child(role).ok_or_else(|| self.malformed(format!("missing child '{}'", role)))
    }

    /// A child that may be absent or explicitly `None`.
    pub fn optional_child(&self, role: &str) -> Option<&EncodedExpression> {
        self.children.get(role).and_then(Option::as_ref)
    }

    /// A required value.
    pub fn value(&self, role: &str) -> Result<&str, CodecError> {
        self.optional_value(role)
            .ok_or_else(|| self.malformed(format!("missing value '{}'", role)))
    }

    pub fn optional_value(&self, role: &str) -> Option<&str> {
        self.values.get(role).map(String::as_str)
    }

    /// A required non-negative count value.
    pub fn count(&self, role: &str) -> Result<usize, CodecError> {
        let text = self.value(role)?;
        text.parse()
            .map_err(|_| self.malformed(format!("value '{}' is not a count: '{}'", role, text)))
    }

    /// A count of children that this node must actually carry.
    pub fn child_count(&self, role: &str) -> Result<usize, CodecError> {
        let count = self.count(role)?;
        if count > self.children.len() {
            return Err(self.malformed(format!(
                "value '{}' claims {} children, node has {}",
                role,
                count,
                self.children.len()
            )));
        }
        Ok(count)
    }

    /// A required `true`/`false` value.
    pub fn flag(&self, role: &str) -> Result<bool, CodecError> {
        let text = self.value(role)?;
        if text.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(self.malformed(format!("value '{}' is not a flag: '{}'", role, text)))
        }
    }

    pub(crate) fn malformed(&self, reason: String) -> CodecError {
        CodecError::MalformedNode {
            kind: self.node_type,
            reason,
        }
    }
}
