//! Typed expression nodes.
//!
//! An [`Expr`] is a tree of typed operation nodes. Children are owned by
//! their parent; the only sharing is through parameters, which are referred
//! to by [`ParamId`] into the owning [`ExprGraph`](crate::ExprGraph) arena.
//!
//! Nodes should be built through the validating factories on `ExprGraph`.
//! The fields are public so that tests and tools can inspect trees directly.

use serde::{Deserialize, Serialize};

use crate::id::ParamId;
use crate::ops::NodeKind;
use crate::types::{ConstValue, MethodRef, TypeRef};

/// A field or property of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberRef {
    Field { declaring: TypeRef, name: String },
    Property { declaring: TypeRef, name: String },
}

impl MemberRef {
    pub fn declaring(&self) -> &TypeRef {
        match self {
            MemberRef::Field { declaring, .. } | MemberRef::Property { declaring, .. } => declaring,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MemberRef::Field { name, .. } | MemberRef::Property { name, .. } => name,
        }
    }

    pub fn is_property(&self) -> bool {
        matches!(self, MemberRef::Property { .. })
    }
}

/// A typed expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Result type of the node.
    pub ty: TypeRef,
    pub kind: ExprKind,
}

/// The node variants, one per supported family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Binary {
        kind: NodeKind,
        left: Box<Expr>,
        right: Box<Expr>,
        /// Conversion lambda applied to a non-null left operand of `Coalesce`.
        conversion: Option<Box<Expr>>,
    },
    Unary {
        kind: NodeKind,
        operand: Box<Expr>,
    },
    Constant(ConstValue),
    Member {
        expression: Box<Expr>,
        member: MemberRef,
    },
    Parameter(ParamId),
    Lambda {
        parameters: Vec<ParamId>,
        body: Box<Expr>,
    },
    Call {
        /// `None` for static calls.
        object: Option<Box<Expr>>,
        method: MethodRef,
        arguments: Vec<Expr>,
    },
}

impl Expr {
    /// The tag this node is encoded under.
    pub fn node_kind(&self) -> NodeKind {
        match &self.kind {
            ExprKind::Binary { kind, .. } | ExprKind::Unary { kind, .. } => *kind,
            ExprKind::Constant(_) => NodeKind::Constant,
            ExprKind::Member { .. } => NodeKind::MemberAccess,
            ExprKind::Parameter(_) => NodeKind::Parameter,
            ExprKind::Lambda { .. } => NodeKind::Lambda,
            ExprKind::Call { .. } => NodeKind::Call,
        }
    }

    /// Calls `f` on every parameter reference in this subtree, in pre-order.
    pub fn visit_parameters(&self, f: &mut impl FnMut(ParamId)) {
        match &self.kind {
            ExprKind::Binary {
                left,
                right,
                conversion,
                ..
            } => {
                left.visit_parameters(f);
                right.visit_parameters(f);
                if let Some(c) = conversion {
                    c.visit_parameters(f);
                }
            }
            ExprKind::Unary { operand, .. } => operand.visit_parameters(f),
            ExprKind::Constant(_) => {}
            ExprKind::Member { expression, .. } => expression.visit_parameters(f),
            ExprKind::Parameter(id) => f(*id),
            ExprKind::Lambda { parameters, body } => {
                for p in parameters {
                    f(*p);
                }
                body.visit_parameters(f);
            }
            ExprKind::Call {
                object, arguments, ..
            } => {
                if let Some(o) = object {
                    o.visit_parameters(f);
                }
                for a in arguments {
                    a.visit_parameters(f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(id: u32) -> Expr {
        Expr {
            ty: TypeRef::INT32,
            kind: ExprKind::Parameter(ParamId(id)),
        }
    }

    #[test]
    fn node_kind_follows_variant() {
        let add = Expr {
            ty: TypeRef::INT32,
            kind: ExprKind::Binary {
                kind: NodeKind::AddChecked,
                left: Box::new(param(0)),
                right: Box::new(param(1)),
                conversion: None,
            },
        };
        assert_eq!(add.node_kind(), NodeKind::AddChecked);
        assert_eq!(param(0).node_kind(), NodeKind::Parameter);
    }

    #[test]
    fn visit_parameters_sees_every_reference() {
        let body = Expr {
            ty: TypeRef::INT32,
            kind: ExprKind::Binary {
                kind: NodeKind::Add,
                left: Box::new(param(0)),
                right: Box::new(param(0)),
                conversion: None,
            },
        };
        let lambda = Expr {
            ty: TypeRef::OBJECT,
            kind: ExprKind::Lambda {
                parameters: vec![ParamId(0)],
                body: Box::new(body),
            },
        };
        let mut seen = Vec::new();
        lambda.visit_parameters(&mut |id| seen.push(id));
        assert_eq!(seen, vec![ParamId(0), ParamId(0), ParamId(0)]);
    }

    #[test]
    fn member_ref_accessors() {
        let m = MemberRef::Property {
            declaring: TypeRef::STRING,
            name: "Length".into(),
        };
        assert!(m.is_property());
        assert_eq!(m.name(), "Length");
        assert_eq!(m.declaring(), &TypeRef::STRING);
    }
}
