//! The host type model.
//!
//! Named types ([`TypeDef`]) live in the [`TypeRegistry`](crate::TypeRegistry)
//! and are referred to through [`TypeRef`] handles. A `TypeRef` is either a
//! named type (closed over its generic arguments, or an open definition when
//! it has none) or one of the two generic placeholders: a parameter of the
//! enclosing generic method (`!!N`) or of the declaring generic type (`!N`).
//!
//! Fields and properties use [`IndexMap`] to keep declaration order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::MethodId;
use crate::type_id::TypeId;

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Primitive types pre-registered in every registry.
///
/// The declaration order matches the built-in [`TypeId`] constants, so
/// `PrimitiveType::Int32 as u32 == TypeId::INT32.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Void,
    Object,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    String,
}

impl PrimitiveType {
    /// Every primitive, in [`TypeId`] order.
    pub const ALL: [PrimitiveType; 15] = [
        PrimitiveType::Void,
        PrimitiveType::Object,
        PrimitiveType::Boolean,
        PrimitiveType::Char,
        PrimitiveType::SByte,
        PrimitiveType::Byte,
        PrimitiveType::Int16,
        PrimitiveType::UInt16,
        PrimitiveType::Int32,
        PrimitiveType::UInt32,
        PrimitiveType::Int64,
        PrimitiveType::UInt64,
        PrimitiveType::Single,
        PrimitiveType::Double,
        PrimitiveType::String,
    ];

    /// Host name of the primitive (without namespace).
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Void => "Void",
            PrimitiveType::Object => "Object",
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::Char => "Char",
            PrimitiveType::SByte => "SByte",
            PrimitiveType::Byte => "Byte",
            PrimitiveType::Int16 => "Int16",
            PrimitiveType::UInt16 => "UInt16",
            PrimitiveType::Int32 => "Int32",
            PrimitiveType::UInt32 => "UInt32",
            PrimitiveType::Int64 => "Int64",
            PrimitiveType::UInt64 => "UInt64",
            PrimitiveType::Single => "Single",
            PrimitiveType::Double => "Double",
            PrimitiveType::String => "String",
        }
    }

    /// The registry id this primitive is pre-registered under.
    pub fn type_id(self) -> TypeId {
        TypeId(self as u32)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveType::SByte
                | PrimitiveType::Byte
                | PrimitiveType::Int16
                | PrimitiveType::UInt16
                | PrimitiveType::Int32
                | PrimitiveType::UInt32
                | PrimitiveType::Int64
                | PrimitiveType::UInt64
        )
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            PrimitiveType::SByte | PrimitiveType::Int16 | PrimitiveType::Int32 | PrimitiveType::Int64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveType::Single | PrimitiveType::Double)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Value types are never null; everything else here is a reference type.
    pub fn is_value_type(self) -> bool {
        !matches!(
            self,
            PrimitiveType::Object | PrimitiveType::String | PrimitiveType::Void
        )
    }
}

// ---------------------------------------------------------------------------
// Type definitions
// ---------------------------------------------------------------------------

/// What sort of named type a [`TypeDef`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Primitive(PrimitiveType),
    Class,
    Struct,
    Interface,
    /// The `Nullable`1` wrapper for value types.
    Nullable,
    /// Function-typed values (`Func`N`, `Action`N`).
    Delegate,
}

/// A named type registered in the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDef {
    pub namespace: String,
    /// Simple name. Generic definitions carry the arity suffix, e.g. ``List`1``.
    pub name: String,
    /// Owning module. Used as the disambiguation hint in type descriptors.
    pub module: String,
    pub generic_arity: u32,
    pub kind: TypeKind,
    /// Compiler-synthesized types that cannot be named in a descriptor.
    pub anonymous: bool,
    /// Implemented interfaces, possibly referring to this type's own `!N` parameters.
    pub interfaces: Vec<TypeRef>,
    pub fields: IndexMap<String, FieldDef>,
    pub properties: IndexMap<String, PropertyDef>,
    pub methods: Vec<MethodId>,
}

impl TypeDef {
    pub fn new(namespace: &str, name: &str, module: &str, kind: TypeKind) -> Self {
        TypeDef {
            namespace: namespace.to_string(),
            name: name.to_string(),
            module: module.to_string(),
            generic_arity: 0,
            kind,
            anonymous: false,
            interfaces: Vec::new(),
            fields: IndexMap::new(),
            properties: IndexMap::new(),
            methods: Vec::new(),
        }
    }

    /// Builder-style helper setting the generic arity.
    pub fn with_arity(mut self, arity: u32) -> Self {
        self.generic_arity = arity;
        self
    }

    /// `Namespace.Name`, or just `Name` for the global namespace.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Name with the generic arity suffix stripped.
    pub fn display_name(&self) -> &str {
        match self.name.find('`') {
            Some(pos) => &self.name[..pos],
            None => &self.name,
        }
    }

    pub fn is_value_type(&self) -> bool {
        match self.kind {
            TypeKind::Primitive(p) => p.is_value_type(),
            TypeKind::Struct | TypeKind::Nullable => true,
            TypeKind::Class | TypeKind::Interface | TypeKind::Delegate => false,
        }
    }
}

/// An instance field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
}

/// An instance property backed by a slot of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub ty: TypeRef,
    pub writable: bool,
}

// ---------------------------------------------------------------------------
// Type handles
// ---------------------------------------------------------------------------

/// A handle to a type as used by expressions and member signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// A named type. Non-empty `args` close a generic definition.
    Named { def: TypeId, args: Vec<TypeRef> },
    /// Open parameter `N` of the enclosing generic method (`!!N`).
    MethodParam(u32),
    /// Open parameter `N` of the declaring generic type (`!N`).
    TypeParam(u32),
}

impl TypeRef {
    pub const VOID: TypeRef = TypeRef::simple(TypeId::VOID);
    pub const OBJECT: TypeRef = TypeRef::simple(TypeId::OBJECT);
    pub const BOOLEAN: TypeRef = TypeRef::simple(TypeId::BOOLEAN);
    pub const CHAR: TypeRef = TypeRef::simple(TypeId::CHAR);
    pub const INT16: TypeRef = TypeRef::simple(TypeId::INT16);
    pub const INT32: TypeRef = TypeRef::simple(TypeId::INT32);
    pub const INT64: TypeRef = TypeRef::simple(TypeId::INT64);
    pub const DOUBLE: TypeRef = TypeRef::simple(TypeId::DOUBLE);
    pub const STRING: TypeRef = TypeRef::simple(TypeId::STRING);

    /// A non-generic named type.
    pub const fn simple(def: TypeId) -> Self {
        TypeRef::Named {
            def,
            args: Vec::new(),
        }
    }

    pub fn generic(def: TypeId, args: Vec<TypeRef>) -> Self {
        TypeRef::Named { def, args }
    }

    pub fn primitive(p: PrimitiveType) -> Self {
        TypeRef::simple(p.type_id())
    }

    /// `Nullable<inner>`.
    pub fn nullable(inner: TypeRef) -> Self {
        TypeRef::generic(TypeId::NULLABLE, vec![inner])
    }

    pub fn def(&self) -> Option<TypeId> {
        match self {
            TypeRef::Named { def, .. } => Some(*def),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_generic_param(&self) -> bool {
        matches!(self, TypeRef::MethodParam(_) | TypeRef::TypeParam(_))
    }

    /// True if a placeholder appears anywhere inside this type.
    pub fn contains_generic_params(&self) -> bool {
        match self {
            TypeRef::Named { args, .. } => args.iter().any(TypeRef::contains_generic_params),
            _ => true,
        }
    }

    /// The unparameterized definition of a named type.
    pub fn definition(&self) -> TypeRef {
        match self {
            TypeRef::Named { def, .. } => TypeRef::simple(*def),
            other => other.clone(),
        }
    }

    /// Replaces `!N` from `type_args` and `!!N` from `method_args`.
    ///
    /// Placeholders whose position has no argument are left open.
    pub fn substitute(&self, type_args: &[TypeRef], method_args: &[TypeRef]) -> TypeRef {
        match self {
            TypeRef::Named { def, args } => TypeRef::Named {
                def: *def,
                args: args
                    .iter()
                    .map(|a| a.substitute(type_args, method_args))
                    .collect(),
            },
            TypeRef::TypeParam(n) => type_args
                .get(*n as usize)
                .cloned()
                .unwrap_or(TypeRef::TypeParam(*n)),
            TypeRef::MethodParam(n) => method_args
                .get(*n as usize)
                .cloned()
                .unwrap_or(TypeRef::MethodParam(*n)),
        }
    }
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

/// A callable member definition.
///
/// Parameter and return types may mention `!N` (declaring type parameters)
/// and `!!N` (the method's own generic parameters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub declaring: TypeId,
    /// Names of the method's generic parameters; the arity is their count.
    pub generic_params: Vec<String>,
    pub is_static: bool,
    pub params: SmallVec<[TypeRef; 4]>,
    pub return_type: TypeRef,
}

impl MethodDef {
    pub fn generic_arity(&self) -> u32 {
        self.generic_params.len() as u32
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

/// A method as seen from a (possibly closed generic) declaring type.
///
/// `type_args` is empty for non-generic methods and for generic method
/// definitions; it holds the method's generic arguments once closed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub method: MethodId,
    pub declaring: TypeRef,
    pub type_args: SmallVec<[TypeRef; 2]>,
}

impl MethodRef {
    pub fn new(method: MethodId, declaring: TypeRef) -> Self {
        MethodRef {
            method,
            declaring,
            type_args: SmallVec::new(),
        }
    }

    /// The same method with its generic arguments removed.
    pub fn generic_definition(&self) -> MethodRef {
        MethodRef::new(self.method, self.declaring.clone())
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// A literal value carried by a constant node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Null,
    Boolean(bool),
    Char(char),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    String(String),
}

impl ConstValue {
    /// The primitive type of a non-null literal.
    pub fn primitive(&self) -> Option<PrimitiveType> {
        Some(match self {
            ConstValue::Null => return None,
            ConstValue::Boolean(_) => PrimitiveType::Boolean,
            ConstValue::Char(_) => PrimitiveType::Char,
            ConstValue::SByte(_) => PrimitiveType::SByte,
            ConstValue::Byte(_) => PrimitiveType::Byte,
            ConstValue::Int16(_) => PrimitiveType::Int16,
            ConstValue::UInt16(_) => PrimitiveType::UInt16,
            ConstValue::Int32(_) => PrimitiveType::Int32,
            ConstValue::UInt32(_) => PrimitiveType::UInt32,
            ConstValue::Int64(_) => PrimitiveType::Int64,
            ConstValue::UInt64(_) => PrimitiveType::UInt64,
            ConstValue::Single(_) => PrimitiveType::Single,
            ConstValue::Double(_) => PrimitiveType::Double,
            ConstValue::String(_) => PrimitiveType::String,
        })
    }

    /// Text form of the literal; `None` for null.
    ///
    /// Floats use the shortest representation that parses back to the same bits.
    pub fn to_text(&self) -> Option<String> {
        Some(match self {
            ConstValue::Null => return None,
            ConstValue::Boolean(v) => v.to_string(),
            ConstValue::Char(v) => v.to_string(),
            ConstValue::SByte(v) => v.to_string(),
            ConstValue::Byte(v) => v.to_string(),
            ConstValue::Int16(v) => v.to_string(),
            ConstValue::UInt16(v) => v.to_string(),
            ConstValue::Int32(v) => v.to_string(),
            ConstValue::UInt32(v) => v.to_string(),
            ConstValue::Int64(v) => v.to_string(),
            ConstValue::UInt64(v) => v.to_string(),
            ConstValue::Single(v) => v.to_string(),
            ConstValue::Double(v) => v.to_string(),
            ConstValue::String(v) => v.clone(),
        })
    }
}
