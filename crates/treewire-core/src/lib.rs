pub mod types;
pub mod type_id;
pub mod stdlib;
pub mod id;
pub mod ops;
pub mod expr;
pub mod graph;
pub mod describe;
pub mod error;

// Re-export commonly used types
pub use types::{
    ConstValue, FieldDef, MethodDef, MethodRef, PrimitiveType, PropertyDef, TypeDef, TypeKind,
    TypeRef,
};
pub use type_id::{TypeId, TypeRegistry, CORE_MODULE};
pub use id::{MethodId, ParamId};
pub use ops::NodeKind;
pub use expr::{Expr, ExprKind, MemberRef};
pub use graph::{ExprGraph, ExprTree, ParameterDef};
pub use describe::describe;
pub use error::CoreError;
