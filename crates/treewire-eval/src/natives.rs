//! Native implementations of registry methods and computed properties.
//!
//! Methods are keyed by declaring type and name, so one native serves every
//! overload of a name and dispatches on the argument count and the runtime
//! values it receives. Sequences are [`Value::List`] values; delegates are
//! closures.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;
use treewire_core::stdlib::LINQ_MODULE;
use treewire_core::{MethodRef, NodeKind, PrimitiveType, TypeId, TypeRegistry, CORE_MODULE};

use crate::interpreter::eval::{convert, eval_binary, mismatch};
use crate::interpreter::{Interpreter, RuntimeError, Value};

/// Arguments of one native method call.
pub struct NativeCall<'c> {
    pub method: &'c MethodRef,
    /// Receiver of an instance call, never null.
    pub this: Option<Value>,
    pub args: Vec<Value>,
}

impl NativeCall<'_> {
    pub fn arg(&self, index: usize) -> Result<&Value, RuntimeError> {
        self.args.get(index).ok_or(RuntimeError::ArityMismatch {
            expected: index + 1,
            got: self.args.len(),
        })
    }

    pub fn this(&self) -> Result<&Value, RuntimeError> {
        self.this
            .as_ref()
            .ok_or(RuntimeError::NullReference { op: NodeKind::Call })
    }
}

pub type NativeFn = Rc<dyn Fn(&mut Interpreter<'_>, NativeCall<'_>) -> Result<Value, RuntimeError>>;
pub type NativeGetter = Rc<dyn Fn(&Value) -> Result<Value, RuntimeError>>;

/// Native method and property table.
#[derive(Default, Clone)]
pub struct Natives {
    methods: HashMap<(TypeId, String), NativeFn>,
    properties: HashMap<(TypeId, String), NativeGetter>,
}

impl Natives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` for every overload of `name` declared on `ty`.
    pub fn register(
        &mut self,
        ty: TypeId,
        name: &str,
        f: impl Fn(&mut Interpreter<'_>, NativeCall<'_>) -> Result<Value, RuntimeError> + 'static,
    ) {
        self.methods.insert((ty, name.to_string()), Rc::new(f));
    }

    pub fn register_property(
        &mut self,
        ty: TypeId,
        name: &str,
        f: impl Fn(&Value) -> Result<Value, RuntimeError> + 'static,
    ) {
        self.properties.insert((ty, name.to_string()), Rc::new(f));
    }

    pub fn method(&self, ty: TypeId, name: &str) -> Option<&NativeFn> {
        self.methods.get(&(ty, name.to_string()))
    }

    pub fn property(&self, ty: TypeId, name: &str) -> Option<&NativeGetter> {
        self.properties.get(&(ty, name.to_string()))
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

type NativeResult = Result<Value, RuntimeError>;

/// Natives for the standard library registered by
/// [`TypeRegistry::with_std`].
///
/// Types missing from `types` are skipped.
pub fn std_natives(types: &TypeRegistry) -> Natives {
    let mut natives = Natives::new();

    natives.register(TypeId::OBJECT, "ToString", |_, call| Ok(Value::String(call.this()?.to_string())));

    let s = TypeId::STRING;
    natives.register_property(s, "Length", |v| Ok(Value::Int32(text(v)?.encode_utf16().count() as i32)));
    natives.register(s, "Contains", |_, call| {
        Ok(Value::Boolean(text(call.this()?)?.contains(text(call.arg(0)?)?)))
    });
    natives.register(s, "ToUpper", |_, call| Ok(Value::String(text(call.this()?)?.to_uppercase())));
    natives.register(s, "ToLower", |_, call| Ok(Value::String(text(call.this()?)?.to_lowercase())));
    natives.register(s, "Substring", substring);
    natives.register(s, "Concat", |_, call| {
        let mut out = String::new();
        for arg in &call.args {
            if !arg.is_null() {
                out.push_str(text(arg)?);
            }
        }
        Ok(Value::String(out))
    });
    natives.register(s, "IsNullOrEmpty", |_, call| {
        let arg = call.arg(0)?;
        Ok(Value::Boolean(arg.is_null() || text(arg)?.is_empty()))
    });

    if let Some(math) = types.lookup("System.Math", CORE_MODULE) {
        natives.register(math, "Abs", |_, call| match call.arg(0)? {
            Value::Int32(v) => v.checked_abs().map(Value::Int32).ok_or(overflow()),
            Value::Int64(v) => v.checked_abs().map(Value::Int64).ok_or(overflow()),
            Value::Double(v) => Ok(Value::Double(v.abs())),
            other => Err(mismatch(NodeKind::Call, "number", other.type_name())),
        });
        natives.register(math, "Max", |_, call| pick(call.arg(0)?, call.arg(1)?, NodeKind::GreaterThan));
        natives.register(math, "Min", |_, call| pick(call.arg(0)?, call.arg(1)?, NodeKind::LessThan));
        natives.register(math, "Pow", |_, call| {
            Ok(Value::Double(double(call.arg(0)?)?.powf(double(call.arg(1)?)?)))
        });
        natives.register(math, "Sqrt", |_, call| Ok(Value::Double(double(call.arg(0)?)?.sqrt())));
    } else {
        debug!("registry has no System.Math; skipping its natives");
    }

    if let Some(list) = types.lookup("System.Collections.Generic.List`1", CORE_MODULE) {
        natives.register_property(list, "Count", |v| Ok(Value::Int32(seq(v)?.len() as i32)));
        natives.register(list, "Add", |_, call| {
            let item = call.arg(0)?.clone();
            with_list(call.this()?, |items| items.push(item))
        });
        natives.register(list, "Clear", |_, call| with_list(call.this()?, Vec::clear));
        natives.register(list, "Contains", |_, call| {
            let needle = call.arg(0)?;
            Ok(Value::Boolean(seq(call.this()?)?.contains(needle)))
        });
        natives.register(list, "IndexOf", |_, call| {
            let needle = call.arg(0)?;
            let index = seq(call.this()?)?.iter().position(|v| v == needle);
            Ok(Value::Int32(index.map_or(-1, |i| i as i32)))
        });
        natives.register(list, "Insert", |_, call| {
            let index = int(call.arg(0)?)?;
            let item = call.arg(1)?.clone();
            let Value::List(items) = call.this()? else {
                return Err(mismatch(NodeKind::Call, "List", call.this()?.type_name()));
            };
            let mut items = items.borrow_mut();
            if index < 0 || index as usize > items.len() {
                return Err(RuntimeError::OutOfBoundsAccess {
                    index: index as i64,
                    size: items.len(),
                });
            }
            items.insert(index as usize, item);
            Ok(Value::Null)
        });
    }

    match types.lookup("System.Linq.Enumerable", LINQ_MODULE) {
        Some(e) => register_enumerable(&mut natives, e),
        None => debug!("registry has no System.Linq.Enumerable; skipping its natives"),
    }

    debug!(methods = natives.method_count(), "standard natives registered");
    natives
}

fn register_enumerable(natives: &mut Natives, e: TypeId) {
    natives.register(e, "Count", |interp, call| {
        let n = filtered(interp, &call)?.len();
        i32::try_from(n).map(Value::Int32).map_err(|_| overflow())
    });
    natives.register(e, "LongCount", |interp, call| Ok(Value::Int64(filtered(interp, &call)?.len() as i64)));
    natives.register(e, "Sum", sum);
    natives.register(e, "Min", |interp, call| extreme(interp, &call, NodeKind::LessThan));
    natives.register(e, "Max", |interp, call| extreme(interp, &call, NodeKind::GreaterThan));
    natives.register(e, "Average", |interp, call| {
        let items = projected(interp, &call)?;
        if items.is_empty() {
            return Err(no_elements());
        }
        let mut total = 0.0;
        for item in &items {
            total += double(&convert(item, PrimitiveType::Double, false)?)?;
        }
        Ok(Value::Double(total / items.len() as f64))
    });

    natives.register(e, "Where", |interp, call| {
        let f = call.arg(1)?;
        let mut out = Vec::new();
        for (i, item) in seq(call.arg(0)?)?.into_iter().enumerate() {
            if boolean(apply(interp, f, item.clone(), i)?)? {
                out.push(item);
            }
        }
        Ok(Value::list(out))
    });
    natives.register(e, "Select", |interp, call| {
        let f = call.arg(1)?;
        let mut out = Vec::new();
        for (i, item) in seq(call.arg(0)?)?.into_iter().enumerate() {
            out.push(apply(interp, f, item, i)?);
        }
        Ok(Value::list(out))
    });
    natives.register(e, "SelectMany", |interp, call| {
        let f = call.arg(1)?;
        let mut out = Vec::new();
        for item in seq(call.arg(0)?)? {
            out.extend(seq(&interp.call_closure(f, vec![item])?)?);
        }
        Ok(Value::list(out))
    });

    natives.register(e, "Any", |interp, call| Ok(Value::Boolean(!filtered(interp, &call)?.is_empty())));
    natives.register(e, "All", |interp, call| {
        let f = call.arg(1)?;
        for item in seq(call.arg(0)?)? {
            if !boolean(interp.call_closure(f, vec![item])?)? {
                return Ok(Value::Boolean(false));
            }
        }
        Ok(Value::Boolean(true))
    });
    natives.register(e, "Contains", |_, call| {
        let needle = call.arg(1)?;
        Ok(Value::Boolean(seq(call.arg(0)?)?.contains(needle)))
    });
    natives.register(e, "First", |interp, call| filtered(interp, &call)?.into_iter().next().ok_or_else(no_elements));
    natives.register(e, "Last", |interp, call| filtered(interp, &call)?.pop().ok_or_else(no_elements));
    natives.register(e, "FirstOrDefault", |interp, call| match filtered(interp, &call)?.into_iter().next() {
        Some(v) => Ok(v),
        None => default_of(interp.types(), call.method),
    });
    natives.register(e, "LastOrDefault", |interp, call| match filtered(interp, &call)?.pop() {
        Some(v) => Ok(v),
        None => default_of(interp.types(), call.method),
    });
    natives.register(e, "Single", |interp, call| {
        let mut items = filtered(interp, &call)?;
        match items.len() {
            0 => Err(no_elements()),
            1 => Ok(items.remove(0)),
            _ => Err(RuntimeError::InvalidOperation {
                message: "Sequence contains more than one element".to_string(),
            }),
        }
    });
    natives.register(e, "ElementAt", |_, call| {
        let items = seq(call.arg(0)?)?;
        let index = int(call.arg(1)?)?;
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i).cloned())
            .ok_or(RuntimeError::OutOfBoundsAccess {
                index: index as i64,
                size: items.len(),
            })
    });

    natives.register(e, "Concat", |_, call| {
        let mut items = seq(call.arg(0)?)?;
        items.extend(seq(call.arg(1)?)?);
        Ok(Value::list(items))
    });
    natives.register(e, "Reverse", |_, call| {
        let mut items = seq(call.arg(0)?)?;
        items.reverse();
        Ok(Value::list(items))
    });
    natives.register(e, "Distinct", |_, call| {
        let mut out: Vec<Value> = Vec::new();
        for item in seq(call.arg(0)?)? {
            if !out.contains(&item) {
                out.push(item);
            }
        }
        Ok(Value::list(out))
    });
    natives.register(e, "Skip", |_, call| {
        let n = int(call.arg(1)?)?.max(0) as usize;
        Ok(Value::list(seq(call.arg(0)?)?.into_iter().skip(n)))
    });
    natives.register(e, "Take", |_, call| {
        let n = int(call.arg(1)?)?.max(0) as usize;
        Ok(Value::list(seq(call.arg(0)?)?.into_iter().take(n)))
    });
    natives.register(e, "ToList", |_, call| Ok(Value::list(seq(call.arg(0)?)?)));

    natives.register(e, "Range", |_, call| {
        let start = int(call.arg(0)?)?;
        let count = int(call.arg(1)?)?;
        if count < 0 || start as i64 + count as i64 - 1 > i32::MAX as i64 {
            return Err(RuntimeError::InvalidOperation {
                message: format!("Range({}, {}) is out of range", start, count),
            });
        }
        Ok(Value::list((0..count).map(|i| Value::Int32(start + i))))
    });
    natives.register(e, "Aggregate", |interp, call| {
        let mut items = seq(call.arg(0)?)?.into_iter();
        let (mut acc, fold) = match call.args.len() {
            2 => (items.next().ok_or_else(no_elements)?, call.arg(1)?),
            _ => (call.arg(1)?.clone(), call.arg(2)?),
        };
        for item in items {
            acc = interp.call_closure(fold, vec![acc, item])?;
        }
        match call.args.get(3) {
            Some(finish) => interp.call_closure(finish, vec![acc]),
            None => Ok(acc),
        }
    });
}

// ---------------------------------------------------------------------------
// Individual natives
// ---------------------------------------------------------------------------

fn substring(_: &mut Interpreter<'_>, call: NativeCall<'_>) -> NativeResult {
    let chars: Vec<char> = text(call.this()?)?.chars().collect();
    let start = int(call.arg(0)?)?;
    let len = match call.args.get(1) {
        Some(v) => int(v)?,
        None => chars.len() as i32 - start,
    };
    if start < 0 || len < 0 || start as usize + len as usize > chars.len() {
        return Err(RuntimeError::OutOfBoundsAccess {
            index: start as i64 + len.max(0) as i64,
            size: chars.len(),
        });
    }
    let start = start as usize;
    Ok(Value::String(chars[start..start + len as usize].iter().collect()))
}

/// Checked sum; the zero comes from the overload's return type.
fn sum(interp: &mut Interpreter<'_>, call: NativeCall<'_>) -> NativeResult {
    let items = projected(interp, &call)?;
    let types = interp.types();
    let ret = types
        .method_return_type(call.method)
        .map_err(|e| RuntimeError::InternalError { message: e.to_string() })?;
    let ret = types.nullable_underlying(&ret).cloned().unwrap_or(ret);
    let mut total = match types.primitive_of(&ret) {
        Some(p) => convert(&Value::Int32(0), p, false)?,
        None => Value::Int32(0),
    };
    for item in items.iter().filter(|v| !v.is_null()) {
        total = eval_binary(NodeKind::AddChecked, &total, item)?;
    }
    Ok(total)
}

fn extreme(interp: &mut Interpreter<'_>, call: &NativeCall<'_>, better: NodeKind) -> NativeResult {
    let mut items = projected(interp, call)?.into_iter();
    let mut best = items.next().ok_or_else(no_elements)?;
    for item in items {
        best = pick(&best, &item, better)?;
    }
    Ok(best)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn overflow() -> RuntimeError {
    RuntimeError::IntegerOverflow { op: NodeKind::Call }
}

fn no_elements() -> RuntimeError {
    RuntimeError::InvalidOperation {
        message: "Sequence contains no elements".to_string(),
    }
}

fn seq(v: &Value) -> Result<Vec<Value>, RuntimeError> {
    match v {
        Value::List(items) => Ok(items.borrow().clone()),
        Value::Null => Err(RuntimeError::NullReference { op: NodeKind::Call }),
        other => Err(mismatch(NodeKind::Call, "sequence", other.type_name())),
    }
}

fn text(v: &Value) -> Result<&str, RuntimeError> {
    match v {
        Value::String(s) => Ok(s),
        Value::Null => Err(RuntimeError::NullReference { op: NodeKind::Call }),
        other => Err(mismatch(NodeKind::Call, "String", other.type_name())),
    }
}

fn int(v: &Value) -> Result<i32, RuntimeError> {
    match v {
        Value::Int32(n) => Ok(*n),
        other => Err(mismatch(NodeKind::Call, "Int32", other.type_name())),
    }
}

fn double(v: &Value) -> Result<f64, RuntimeError> {
    match v {
        Value::Double(n) => Ok(*n),
        other => Err(mismatch(NodeKind::Call, "Double", other.type_name())),
    }
}

fn boolean(v: Value) -> Result<bool, RuntimeError> {
    match v {
        Value::Boolean(b) => Ok(b),
        other => Err(mismatch(NodeKind::Call, "Boolean", other.type_name())),
    }
}

/// `b` when `b op a` holds, else `a`.
fn pick(a: &Value, b: &Value, op: NodeKind) -> NativeResult {
    match eval_binary(op, b, a)? {
        Value::Boolean(true) => Ok(b.clone()),
        _ => Ok(a.clone()),
    }
}

/// Calls a selector or predicate, passing the index when it takes two parameters.
fn apply(interp: &mut Interpreter<'_>, f: &Value, item: Value, index: usize) -> NativeResult {
    let indexed = matches!(f, Value::Closure(c) if c.parameters.len() == 2);
    let args = if indexed {
        vec![item, Value::Int32(index as i32)]
    } else {
        vec![item]
    };
    interp.call_closure(f, args)
}

/// Elements of argument 0, filtered by the optional predicate in argument 1.
fn filtered(interp: &mut Interpreter<'_>, call: &NativeCall<'_>) -> Result<Vec<Value>, RuntimeError> {
    let items = seq(call.arg(0)?)?;
    let Some(pred) = call.args.get(1) else {
        return Ok(items);
    };
    let mut out = Vec::new();
    for item in items {
        if boolean(interp.call_closure(pred, vec![item.clone()])?)? {
            out.push(item);
        }
    }
    Ok(out)
}

/// Elements of argument 0, mapped by the optional selector in argument 1.
fn projected(interp: &mut Interpreter<'_>, call: &NativeCall<'_>) -> Result<Vec<Value>, RuntimeError> {
    let items = seq(call.arg(0)?)?;
    match call.args.get(1) {
        Some(f) => items.into_iter().map(|item| interp.call_closure(f, vec![item])).collect(),
        None => Ok(items),
    }
}

/// Default value of the method's return type.
fn default_of(types: &TypeRegistry, method: &MethodRef) -> NativeResult {
    let ret = types
        .method_return_type(method)
        .map_err(|e| RuntimeError::InternalError { message: e.to_string() })?;
    Ok(match types.primitive_of(&ret) {
        Some(PrimitiveType::Boolean) => Value::Boolean(false),
        Some(PrimitiveType::Char) => Value::Char('\0'),
        Some(p) if p.is_numeric() => convert(&Value::Int32(0), p, false)?,
        _ => Value::Null,
    })
}

fn with_list(target: &Value, f: impl FnOnce(&mut Vec<Value>)) -> NativeResult {
    let Value::List(items) = target else {
        return Err(mismatch(NodeKind::Call, "List", target.type_name()));
    };
    f(&mut items.borrow_mut());
    Ok(Value::Null)
}
