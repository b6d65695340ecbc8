//! Node kind vocabulary for expression trees.
//!
//! [`NodeKind`] is the closed tag shared by in-memory expressions and their
//! encoded form. It lists every kind the host platform knows about, not just
//! the ones treewire can build; foreign kinds (`Conditional`, `Block`, ...)
//! exist so that encoded input naming them fails as an unsupported kind
//! rather than as a malformed document.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    // Arithmetic
    Add,
    AddChecked,
    Subtract,
    SubtractChecked,
    Multiply,
    MultiplyChecked,
    Divide,
    Modulo,
    Power,

    // Bitwise and logical
    And,
    Or,
    ExclusiveOr,
    AndAlso,
    OrElse,
    LeftShift,
    RightShift,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    Coalesce,

    // Assignment
    Assign,
    AddAssign,
    AddAssignChecked,
    SubtractAssign,
    SubtractAssignChecked,
    MultiplyAssign,
    MultiplyAssignChecked,
    DivideAssign,
    ModuloAssign,
    PowerAssign,
    AndAssign,
    OrAssign,
    ExclusiveOrAssign,
    LeftShiftAssign,
    RightShiftAssign,

    // Unary
    Convert,
    ConvertChecked,
    Negate,
    NegateChecked,
    UnaryPlus,
    Not,
    OnesComplement,
    IsTrue,
    IsFalse,
    Increment,
    Decrement,
    PreIncrementAssign,
    PreDecrementAssign,
    PostIncrementAssign,
    PostDecrementAssign,

    // Leaves and structure
    Constant,
    Parameter,
    MemberAccess,
    Lambda,
    Call,

    // Host kinds without an encoding
    ArrayLength,
    ArrayIndex,
    Conditional,
    Invoke,
    ListInit,
    MemberInit,
    New,
    NewArrayInit,
    NewArrayBounds,
    Quote,
    TypeAs,
    TypeIs,
    TypeEqual,
    Block,
    DebugInfo,
    Default,
    Dynamic,
    Extension,
    Goto,
    Index,
    Label,
    Loop,
    RuntimeVariables,
    Switch,
    Throw,
    Try,
    Unbox,
}

impl NodeKind {
    /// Kinds built by [`ExprGraph::make_binary`](crate::ExprGraph::make_binary).
    pub fn is_binary(&self) -> bool {
        self.is_arithmetic()
            || self.is_bitwise()
            || self.is_shift()
            || self.is_logical()
            || self.is_comparison()
            || matches!(self, NodeKind::Coalesce | NodeKind::Assign)
            || self.is_compound_assignment()
    }

    /// Kinds built by [`ExprGraph::make_unary`](crate::ExprGraph::make_unary).
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            NodeKind::Convert
                | NodeKind::ConvertChecked
                | NodeKind::Negate
                | NodeKind::NegateChecked
                | NodeKind::UnaryPlus
                | NodeKind::Not
                | NodeKind::OnesComplement
                | NodeKind::IsTrue
                | NodeKind::IsFalse
                | NodeKind::Increment
                | NodeKind::Decrement
                | NodeKind::PreIncrementAssign
                | NodeKind::PreDecrementAssign
                | NodeKind::PostIncrementAssign
                | NodeKind::PostDecrementAssign
        )
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            NodeKind::Add
                | NodeKind::AddChecked
                | NodeKind::Subtract
                | NodeKind::SubtractChecked
                | NodeKind::Multiply
                | NodeKind::MultiplyChecked
                | NodeKind::Divide
                | NodeKind::Modulo
                | NodeKind::Power
        )
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(self, NodeKind::And | NodeKind::Or | NodeKind::ExclusiveOr)
    }

    pub fn is_shift(&self) -> bool {
        matches!(self, NodeKind::LeftShift | NodeKind::RightShift)
    }

    /// Short-circuiting boolean operators.
    pub fn is_logical(&self) -> bool {
        matches!(self, NodeKind::AndAlso | NodeKind::OrElse)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            NodeKind::Equal
                | NodeKind::NotEqual
                | NodeKind::LessThan
                | NodeKind::LessThanOrEqual
                | NodeKind::GreaterThan
                | NodeKind::GreaterThanOrEqual
        )
    }

    /// Overflow-trapping variants.
    pub fn is_checked(&self) -> bool {
        matches!(
            self,
            NodeKind::AddChecked
                | NodeKind::SubtractChecked
                | NodeKind::MultiplyChecked
                | NodeKind::NegateChecked
                | NodeKind::ConvertChecked
                | NodeKind::AddAssignChecked
                | NodeKind::SubtractAssignChecked
                | NodeKind::MultiplyAssignChecked
        )
    }

    /// `x op= y` forms.
    pub fn is_compound_assignment(&self) -> bool {
        self.base_operator().is_some()
    }

    /// Every kind that writes to its left operand or operand.
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            NodeKind::Assign
                | NodeKind::PreIncrementAssign
                | NodeKind::PreDecrementAssign
                | NodeKind::PostIncrementAssign
                | NodeKind::PostDecrementAssign
        ) || self.is_compound_assignment()
    }

    /// The plain operator a compound assignment applies.
    pub fn base_operator(&self) -> Option<NodeKind> {
        Some(match self {
            NodeKind::AddAssign => NodeKind::Add,
            NodeKind::AddAssignChecked => NodeKind::AddChecked,
            NodeKind::SubtractAssign => NodeKind::Subtract,
            NodeKind::SubtractAssignChecked => NodeKind::SubtractChecked,
            NodeKind::MultiplyAssign => NodeKind::Multiply,
            NodeKind::MultiplyAssignChecked => NodeKind::MultiplyChecked,
            NodeKind::DivideAssign => NodeKind::Divide,
            NodeKind::ModuloAssign => NodeKind::Modulo,
            NodeKind::PowerAssign => NodeKind::Power,
            NodeKind::AndAssign => NodeKind::And,
            NodeKind::OrAssign => NodeKind::Or,
            NodeKind::ExclusiveOrAssign => NodeKind::ExclusiveOr,
            NodeKind::LeftShiftAssign => NodeKind::LeftShift,
            NodeKind::RightShiftAssign => NodeKind::RightShift,
            _ => return None,
        })
    }

    /// Infix symbol used when describing binary nodes.
    pub fn symbol(&self) -> Option<&'static str> {
        let kind = self.base_operator().unwrap_or(*self);
        let sym = match kind {
            NodeKind::Add | NodeKind::AddChecked => "+",
            NodeKind::Subtract | NodeKind::SubtractChecked => "-",
            NodeKind::Multiply | NodeKind::MultiplyChecked => "*",
            NodeKind::Divide => "/",
            NodeKind::Modulo => "%",
            NodeKind::Power => "**",
            NodeKind::And => "&",
            NodeKind::Or => "|",
            NodeKind::ExclusiveOr => "^",
            NodeKind::AndAlso => "&&",
            NodeKind::OrElse => "||",
            NodeKind::LeftShift => "<<",
            NodeKind::RightShift => ">>",
            NodeKind::Equal => "==",
            NodeKind::NotEqual => "!=",
            NodeKind::LessThan => "<",
            NodeKind::LessThanOrEqual => "<=",
            NodeKind::GreaterThan => ">",
            NodeKind::GreaterThanOrEqual => ">=",
            NodeKind::Coalesce => "??",
            NodeKind::Assign => "=",
            _ => return None,
        };
        Some(sym)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_assignments_map_to_base_operator() {
        assert_eq!(NodeKind::AddAssignChecked.base_operator(), Some(NodeKind::AddChecked));
        assert_eq!(NodeKind::RightShiftAssign.base_operator(), Some(NodeKind::RightShift));
        assert_eq!(NodeKind::Add.base_operator(), None);
        assert!(NodeKind::ModuloAssign.is_assignment());
        assert!(NodeKind::PostIncrementAssign.is_assignment());
        assert!(!NodeKind::Increment.is_assignment());
    }

    #[test]
    fn families_are_disjoint() {
        for kind in [NodeKind::Add, NodeKind::Equal, NodeKind::Coalesce, NodeKind::AddAssign] {
            assert!(kind.is_binary());
            assert!(!kind.is_unary());
        }
        for kind in [NodeKind::Convert, NodeKind::IsFalse, NodeKind::PreDecrementAssign] {
            assert!(kind.is_unary());
            assert!(!kind.is_binary());
        }
        for kind in [NodeKind::Lambda, NodeKind::Conditional, NodeKind::DebugInfo] {
            assert!(!kind.is_unary());
            assert!(!kind.is_binary());
        }
    }

    #[test]
    fn checked_variants() {
        assert!(NodeKind::AddChecked.is_checked());
        assert!(NodeKind::ConvertChecked.is_checked());
        assert!(!NodeKind::Add.is_checked());
        assert!(!NodeKind::Divide.is_checked());
    }

    #[test]
    fn compound_symbol_uses_base_operator() {
        assert_eq!(NodeKind::AddAssign.symbol(), Some("+"));
        assert_eq!(NodeKind::Coalesce.symbol(), Some("??"));
        assert_eq!(NodeKind::Lambda.symbol(), None);
    }

    #[test]
    fn serializes_as_plain_name() {
        let json = serde_json::to_string(&NodeKind::AddAssignChecked).unwrap();
        assert_eq!(json, "\"AddAssignChecked\"");
        let back: NodeKind = serde_json::from_str("\"DebugInfo\"").unwrap();
        assert_eq!(back, NodeKind::DebugInfo);
    }
}
