//! TypeId and TypeRegistry: the host type system.
//!
//! Every named type has a unique [`TypeId`] providing O(1) identity
//! comparison. The [`TypeRegistry`] owns all type and method definitions,
//! answers name lookups by `(qualified name, module)` and by qualified name
//! alone, and instantiates member signatures for closed generic types.
//!
//! A fresh registry pre-registers the 15 primitives plus `Nullable`1`, all in
//! [`CORE_MODULE`]. [`TypeRegistry::with_std`](crate::stdlib) adds the
//! collection and delegate types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::MethodId;
use crate::types::{MethodDef, MethodRef, PrimitiveType, PropertyDef, TypeDef, TypeKind, TypeRef};

/// Module that owns the primitives and the rest of the standard library.
pub const CORE_MODULE: &str = "System.Private.CoreLib";

/// Unique identifier for a type in the type registry.
///
/// The inner value is an index into the [`TypeRegistry`]'s type vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Pre-registered TypeId constants for built-in types.
impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const OBJECT: TypeId = TypeId(1);
    pub const BOOLEAN: TypeId = TypeId(2);
    pub const CHAR: TypeId = TypeId(3);
    pub const SBYTE: TypeId = TypeId(4);
    pub const BYTE: TypeId = TypeId(5);
    pub const INT16: TypeId = TypeId(6);
    pub const UINT16: TypeId = TypeId(7);
    pub const INT32: TypeId = TypeId(8);
    pub const UINT32: TypeId = TypeId(9);
    pub const INT64: TypeId = TypeId(10);
    pub const UINT64: TypeId = TypeId(11);
    pub const SINGLE: TypeId = TypeId(12);
    pub const DOUBLE: TypeId = TypeId(13);
    pub const STRING: TypeId = TypeId(14);
    pub const NULLABLE: TypeId = TypeId(15);
}

/// Registry of all named types and methods known to the host.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    /// Types indexed by TypeId.0
    types: Vec<TypeDef>,
    /// Methods indexed by MethodId.0
    methods: Vec<MethodDef>,
    /// Exact lookup by (qualified name, module)
    by_name: HashMap<(String, String), TypeId>,
    /// All types sharing a qualified name, in registration order
    by_qualified: HashMap<String, Vec<TypeId>>,
}

impl TypeRegistry {
    /// Number of built-in types pre-registered on construction.
    const BUILTIN_COUNT: u32 = 16;

    /// Creates a registry with the primitives and `Nullable`1` pre-registered.
    pub fn new() -> Self {
        let mut reg = TypeRegistry {
            types: Vec::new(),
            methods: Vec::new(),
            by_name: HashMap::new(),
            by_qualified: HashMap::new(),
        };
        for p in PrimitiveType::ALL {
            reg.insert(TypeDef::new("System", p.name(), CORE_MODULE, TypeKind::Primitive(p)));
        }
        reg.insert(TypeDef::new("System", "Nullable`1", CORE_MODULE, TypeKind::Nullable).with_arity(1));
        debug_assert_eq!(reg.types.len() as u32, Self::BUILTIN_COUNT);
        reg
    }

    /// Adds a definition without checking for duplicates.
    pub(crate) fn insert(&mut self, def: TypeDef) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        let qualified = def.qualified_name();
        self.by_name.insert((qualified.clone(), def.module.clone()), id);
        self.by_qualified.entry(qualified).or_default().push(id);
        self.types.push(def);
        id
    }

    /// Adds a method whose declaring type is known to exist.
    pub(crate) fn insert_method(&mut self, def: MethodDef) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        let declaring = def.declaring.0 as usize;
        self.methods.push(def);
        if let Some(ty) = self.types.get_mut(declaring) {
            ty.methods.push(id);
        }
        id
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Registers a named type, returning its [`TypeId`].
    ///
    /// Returns [`CoreError::DuplicateTypeName`] if the same qualified name is
    /// already registered in the same module.
    pub fn register(&mut self, def: TypeDef) -> Result<TypeId, CoreError> {
        let key = (def.qualified_name(), def.module.clone());
        if self.by_name.contains_key(&key) {
            return Err(CoreError::DuplicateTypeName {
                name: key.0,
                module: key.1,
            });
        }
        Ok(self.insert(def))
    }

    pub fn define_class(&mut self, namespace: &str, name: &str, module: &str) -> Result<TypeId, CoreError> {
        self.register(TypeDef::new(namespace, name, module, TypeKind::Class))
    }

    pub fn define_struct(&mut self, namespace: &str, name: &str, module: &str) -> Result<TypeId, CoreError> {
        self.register(TypeDef::new(namespace, name, module, TypeKind::Struct))
    }

    /// Registers a compiler-synthesized type with no nameable identity.
    pub fn define_anonymous(&mut self, name: &str, module: &str) -> Result<TypeId, CoreError> {
        let mut def = TypeDef::new("", name, module, TypeKind::Class);
        def.anonymous = true;
        self.register(def)
    }

    pub fn add_field(&mut self, ty: TypeId, name: &str, field_ty: TypeRef) -> Result<(), CoreError> {
        let def = self.def_mut(ty)?;
        def.fields.insert(
            name.to_string(),
            crate::types::FieldDef {
                name: name.to_string(),
                ty: field_ty,
            },
        );
        Ok(())
    }

    pub fn add_property(
        &mut self,
        ty: TypeId,
        name: &str,
        prop_ty: TypeRef,
        writable: bool,
    ) -> Result<(), CoreError> {
        let def = self.def_mut(ty)?;
        def.properties.insert(
            name.to_string(),
            PropertyDef {
                name: name.to_string(),
                ty: prop_ty,
                writable,
            },
        );
        Ok(())
    }

    pub fn add_interface(&mut self, ty: TypeId, iface: TypeRef) -> Result<(), CoreError> {
        self.def_mut(ty)?.interfaces.push(iface);
        Ok(())
    }

    /// Registers a method on its declaring type.
    pub fn add_method(&mut self, def: MethodDef) -> Result<MethodId, CoreError> {
        self.def(def.declaring)?;
        Ok(self.insert_method(def))
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(id.0 as usize)
    }

    /// Like [`get`](Self::get) but returns [`CoreError::TypeNotFound`].
    pub fn def(&self, id: TypeId) -> Result<&TypeDef, CoreError> {
        self.get(id).ok_or(CoreError::TypeNotFound { id })
    }

    fn def_mut(&mut self, id: TypeId) -> Result<&mut TypeDef, CoreError> {
        self.types
            .get_mut(id.0 as usize)
            .ok_or(CoreError::TypeNotFound { id })
    }

    pub fn get_method(&self, id: MethodId) -> Option<&MethodDef> {
        self.methods.get(id.0 as usize)
    }

    pub fn method(&self, id: MethodId) -> Result<&MethodDef, CoreError> {
        self.get_method(id).ok_or(CoreError::MethodNotFound { id })
    }

    /// Exact lookup by qualified name and owning module.
    pub fn lookup(&self, qualified: &str, module: &str) -> Option<TypeId> {
        self.by_name
            .get(&(qualified.to_string(), module.to_string()))
            .copied()
    }

    /// Every type registered under `qualified`, across all modules.
    pub fn find_all(&self, qualified: &str) -> &[TypeId] {
        self.by_qualified
            .get(qualified)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First type named `qualified` whose module satisfies `filter`.
    pub fn lookup_in_modules(&self, qualified: &str, filter: impl Fn(&str) -> bool) -> Option<TypeId> {
        self.find_all(qualified)
            .iter()
            .copied()
            .find(|id| self.get(*id).is_some_and(|def| filter(&def.module)))
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDef)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, def)| (TypeId(i as u32), def))
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// All methods declared on `ty`, seen through its generic arguments.
    pub fn methods_of(&self, ty: &TypeRef) -> Vec<MethodRef> {
        let Some(def) = ty.def().and_then(|id| self.get(id)) else {
            return Vec::new();
        };
        def.methods
            .iter()
            .map(|m| MethodRef::new(*m, ty.clone()))
            .collect()
    }

    /// Parameter types of `m` with the declaring type's and the method's
    /// generic arguments substituted.
    pub fn method_parameter_types(&self, m: &MethodRef) -> Result<Vec<TypeRef>, CoreError> {
        let def = self.method(m.method)?;
        Ok(def
            .params
            .iter()
            .map(|p| p.substitute(m.declaring.args(), &m.type_args))
            .collect())
    }

    pub fn method_return_type(&self, m: &MethodRef) -> Result<TypeRef, CoreError> {
        let def = self.method(m.method)?;
        Ok(def.return_type.substitute(m.declaring.args(), &m.type_args))
    }

    /// True when `m` is generic and has not been closed over arguments.
    pub fn is_generic_definition(&self, m: &MethodRef) -> bool {
        self.get_method(m.method)
            .is_some_and(|def| def.is_generic() && m.type_args.is_empty())
    }

    /// Closes a generic method definition over `args`.
    pub fn make_generic_method(&self, m: &MethodRef, args: &[TypeRef]) -> Result<MethodRef, CoreError> {
        let def = self.method(m.method)?;
        if !def.is_generic() || args.len() != def.generic_params.len() {
            return Err(CoreError::GenericArityMismatch {
                name: def.name.clone(),
                expected: def.generic_arity(),
                got: args.len(),
            });
        }
        let mut closed = m.generic_definition();
        closed.type_args.extend(args.iter().cloned());
        Ok(closed)
    }

    /// Type of field `name` on `ty`, substituted for its generic arguments.
    pub fn field_type(&self, ty: &TypeRef, name: &str) -> Option<TypeRef> {
        let def = self.get(ty.def()?)?;
        let field = def.fields.get(name)?;
        Some(field.ty.substitute(ty.args(), &[]))
    }

    /// Property `name` on `ty`: its substituted type and writability.
    pub fn property(&self, ty: &TypeRef, name: &str) -> Option<(TypeRef, bool)> {
        let def = self.get(ty.def()?)?;
        let prop = def.properties.get(name)?;
        Some((prop.ty.substitute(ty.args(), &[]), prop.writable))
    }

    // -----------------------------------------------------------------------
    // Type relations
    // -----------------------------------------------------------------------

    /// The primitive behind a non-generic named type, if any.
    pub fn primitive_of(&self, ty: &TypeRef) -> Option<PrimitiveType> {
        let def = self.get(ty.def()?)?;
        match def.kind {
            TypeKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// `T` for `Nullable<T>`.
    pub fn nullable_underlying<'a>(&self, ty: &'a TypeRef) -> Option<&'a TypeRef> {
        match ty {
            TypeRef::Named { def, args } if *def == TypeId::NULLABLE && args.len() == 1 => args.first(),
            _ => None,
        }
    }

    /// Reference types admit `null`; nullable wrappers do too.
    pub fn admits_null(&self, ty: &TypeRef) -> bool {
        match ty.def().and_then(|id| self.get(id)) {
            Some(def) => !def.is_value_type() || def.kind == TypeKind::Nullable,
            None => false,
        }
    }

    pub fn is_anonymous(&self, ty: &TypeRef) -> bool {
        ty.def()
            .and_then(|id| self.get(id))
            .is_some_and(|def| def.anonymous)
    }

    /// Whether a value of type `from` can be passed where `to` is expected.
    ///
    /// Covers identity, anything to `Object`, implemented interfaces, and
    /// wrapping a value type into its `Nullable<T>`.
    pub fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        if from == to || *to == TypeRef::OBJECT {
            return true;
        }
        if self.nullable_underlying(to) == Some(from) {
            return true;
        }
        let Some(def) = from.def().and_then(|id| self.get(id)) else {
            return false;
        };
        def.interfaces
            .iter()
            .map(|iface| iface.substitute(from.args(), &[]))
            .any(|iface| iface == *to || self.is_assignable(&iface, to))
    }

    /// Finds `Func`N` (or `Action`N` for a `Void` result) for a lambda.
    pub fn delegate_type(&self, params: &[TypeRef], result: &TypeRef) -> Result<TypeRef, CoreError> {
        let (name, args) = if *result == TypeRef::VOID {
            let name = if params.is_empty() {
                "System.Action".to_string()
            } else {
                format!("System.Action`{}", params.len())
            };
            (name, params.to_vec())
        } else {
            let mut args = params.to_vec();
            args.push(result.clone());
            (format!("System.Func`{}", args.len()), args)
        };
        let def = self
            .lookup(&name, CORE_MODULE)
            .ok_or_else(|| CoreError::InvalidExpression {
                reason: format!("no delegate type '{}' registered", name),
            })?;
        Ok(if args.is_empty() {
            TypeRef::simple(def)
        } else {
            TypeRef::generic(def, args)
        })
    }

    // -----------------------------------------------------------------------
    // Names
    // -----------------------------------------------------------------------

    /// Short display name, e.g. ``List`1[Int32]`` or `!!0`.
    pub fn type_name(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::MethodParam(n) => format!("!!{}", n),
            TypeRef::TypeParam(n) => format!("!{}", n),
            TypeRef::Named { def, args } => {
                let base = self
                    .get(*def)
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| def.to_string());
                if args.is_empty() {
                    base
                } else {
                    let inner: Vec<String> = args.iter().map(|a| self.type_name(a)).collect();
                    format!("{}[{}]", base, inner.join(","))
                }
            }
        }
    }

    /// Textual description of a method, e.g.
    /// ``Int32 Count[TSource](IEnumerable`1[!!0])``.
    ///
    /// Closed generic methods list their arguments in place of the parameter names.
    pub fn describe_method(&self, m: &MethodRef) -> String {
        let Some(def) = self.get_method(m.method) else {
            return format!("<unknown method {}>", m.method);
        };
        let ret = self.method_return_type(m).unwrap_or(TypeRef::VOID);
        let params: Vec<String> = self
            .method_parameter_types(m)
            .unwrap_or_default()
            .iter()
            .map(|p| self.type_name(p))
            .collect();
        let generics = if !def.is_generic() {
            String::new()
        } else if m.type_args.is_empty() {
            format!("[{}]", def.generic_params.join(","))
        } else {
            let args: Vec<String> = m.type_args.iter().map(|a| self.type_name(a)).collect();
            format!("[{}]", args.join(","))
        };
        format!(
            "{} {}{}({})",
            self.type_name(&ret),
            def.name,
            generics,
            params.join(", ")
        )
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
