//! Runtime value representation.
//!
//! [`Value`] is the dynamic counterpart of the host type system. Scalars
//! are stored at their exact width. Objects and lists are shared mutable
//! references, so two expressions reading the same object observe each
//! other's writes. A nullable value is either its underlying value or
//! [`Value::Null`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use treewire_core::{ConstValue, Expr, ParamId, TypeRef};

/// A runtime value.
#[derive(Clone)]
pub enum Value {
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
    Object(Rc<RefCell<ObjectData>>),
    List(Rc<RefCell<Vec<Value>>>),
    Closure(Rc<Closure>),
}

/// Slots of an object instance, keyed by field or property name.
#[derive(Debug, Clone)]
pub struct ObjectData {
    pub ty: TypeRef,
    pub fields: IndexMap<String, Value>,
}

/// A lambda together with the scope it was created in.
pub struct Closure {
    pub parameters: Vec<ParamId>,
    pub body: Expr,
    pub(crate) env: Rc<Env>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A chain of parameter scopes. Lookups and writes walk outwards.
#[derive(Debug, Default)]
pub(crate) struct Env {
    vars: RefCell<HashMap<ParamId, Value>>,
    parent: Option<Rc<Env>>,
}

impl Env {
    pub(crate) fn root() -> Rc<Env> {
        Rc::new(Env::default())
    }

    pub(crate) fn child(parent: &Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    pub(crate) fn bind(&self, id: ParamId, value: Value) {
        self.vars.borrow_mut().insert(id, value);
    }

    pub(crate) fn get(&self, id: ParamId) -> Option<Value> {
        if let Some(v) = self.vars.borrow().get(&id) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(id))
    }

    /// Overwrites the innermost binding of `id`. False if unbound.
    pub(crate) fn set(&self, id: ParamId, value: Value) -> bool {
        if let Some(slot) = self.vars.borrow_mut().get_mut(&id) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(p) => p.set(id, value),
            None => false,
        }
    }
}

impl Value {
    pub fn from_const(cv: &ConstValue) -> Value {
        match cv {
            ConstValue::Null => Value::Null,
            ConstValue::Boolean(v) => Value::Boolean(*v),
            ConstValue::Char(v) => Value::Char(*v),
            ConstValue::SByte(v) => Value::SByte(*v),
            ConstValue::Byte(v) => Value::Byte(*v),
            ConstValue::Int16(v) => Value::Int16(*v),
            ConstValue::UInt16(v) => Value::UInt16(*v),
            ConstValue::Int32(v) => Value::Int32(*v),
            ConstValue::UInt32(v) => Value::UInt32(*v),
            ConstValue::Int64(v) => Value::Int64(*v),
            ConstValue::UInt64(v) => Value::UInt64(*v),
            ConstValue::Single(v) => Value::Single(*v),
            ConstValue::Double(v) => Value::Double(*v),
            ConstValue::String(v) => Value::String(v.clone()),
        }
    }

    /// A new object of type `ty` with the given slots.
    pub fn object(ty: TypeRef, fields: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Object(Rc::new(RefCell::new(ObjectData {
            ty,
            fields: fields.into_iter().collect(),
        })))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Char(_) => "Char",
            Value::SByte(_) => "SByte",
            Value::Byte(_) => "Byte",
            Value::Int16(_) => "Int16",
            Value::UInt16(_) => "UInt16",
            Value::Int32(_) => "Int32",
            Value::UInt32(_) => "UInt32",
            Value::Int64(_) => "Int64",
            Value::UInt64(_) => "UInt64",
            Value::Single(_) => "Single",
            Value::Double(_) => "Double",
            Value::String(_) => "String",
            Value::Object(_) => "Object",
            Value::List(_) => "List",
            Value::Closure(_) => "Closure",
        }
    }

    /// Reads slot `name` of an object value.
    pub fn field(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(obj) => obj.borrow().fields.get(name).cloned(),
            _ => None,
        }
    }

    /// Snapshot of a list's elements.
    pub fn items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.borrow().clone()),
            _ => None,
        }
    }
}

/// Scalars compare by value; objects, lists, and closures by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::SByte(a), Value::SByte(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::UInt16(a), Value::UInt16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::UInt32(a), Value::UInt32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::UInt64(a), Value::UInt64(b)) => a == b,
            (Value::Single(a), Value::Single(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Object(obj) => write!(f, "Object({:?})", obj.borrow().fields),
            Value::List(items) => write!(f, "List({:?})", items.borrow()),
            Value::Closure(c) => write!(f, "{:?}", c),
            other => write!(f, "{}({})", other.type_name(), other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::SByte(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Single(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Object(obj) => {
                f.write_str("{ ")?;
                for (i, (name, value)) in obj.borrow().fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", name, value)?;
                }
                f.write_str(" }")
            }
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Closure(c) => write!(f, "<closure/{}>", c.parameters.len()),
        }
    }
}
