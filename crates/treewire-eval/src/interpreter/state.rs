//! Tree-walking evaluation of expression trees.
//!
//! The [`Interpreter`] evaluates an [`ExprTree`] against a [`TypeRegistry`]
//! and a table of [`Natives`] that implement the registry's methods and
//! computed properties. Lambdas evaluate to closures over the scope they
//! were created in, so a nested lambda sees (and writes) the parameters of
//! the lambdas around it.
//!
//! Evaluation is recursive; nesting depth, including closure calls made by
//! natives, is bounded by [`InterpreterConfig::max_depth`].

use std::rc::Rc;

use tracing::trace;
use treewire_core::{Expr, ExprKind, ExprTree, MemberRef, NodeKind, TypeRegistry};

use super::error::RuntimeError;
use super::eval::{convert, eval_binary, eval_unary, mismatch};
use super::value::{Closure, Env, Value};
use crate::natives::{NativeCall, Natives};

/// Configuration for the interpreter.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Maximum evaluation depth. Default: 256.
    pub max_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig { max_depth: 256 }
    }
}

/// Evaluates expression trees built against one registry.
pub struct Interpreter<'a> {
    types: &'a TypeRegistry,
    natives: &'a Natives,
    config: InterpreterConfig,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(types: &'a TypeRegistry, natives: &'a Natives, config: InterpreterConfig) -> Self {
        Interpreter {
            types,
            natives,
            config,
            depth: 0,
        }
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.types
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Evaluates the root of `tree` in an empty scope.
    ///
    /// A lambda root evaluates to a [`Value::Closure`]; use
    /// [`invoke`](Self::invoke) to call it.
    pub fn evaluate(&mut self, tree: &ExprTree) -> Result<Value, RuntimeError> {
        let env = Env::root();
        self.eval(&env, &tree.root)
    }

    /// Evaluates `tree` and calls the resulting closure with `args`.
    ///
    /// A non-lambda root is accepted only with no arguments.
    pub fn invoke(&mut self, tree: &ExprTree, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let root = self.evaluate(tree)?;
        match root {
            Value::Closure(_) => self.call_closure(&root, args),
            value if args.is_empty() => Ok(value),
            _ => Err(RuntimeError::ArityMismatch {
                expected: 0,
                got: args.len(),
            }),
        }
    }

    /// Calls a closure value with positional arguments.
    pub fn call_closure(&mut self, f: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let Value::Closure(closure) = f else {
            return Err(mismatch(NodeKind::Lambda, "closure", f.type_name()));
        };
        if closure.parameters.len() != args.len() {
            return Err(RuntimeError::ArityMismatch {
                expected: closure.parameters.len(),
                got: args.len(),
            });
        }
        let env = Env::child(&closure.env);
        for (id, value) in closure.parameters.iter().zip(args) {
            env.bind(*id, value);
        }
        self.eval(&env, &closure.body)
    }

    pub(crate) fn eval(&mut self, env: &Rc<Env>, expr: &Expr) -> Result<Value, RuntimeError> {
        if self.depth >= self.config.max_depth {
            return Err(RuntimeError::RecursionLimitExceeded {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        let result = self.eval_node(env, expr);
        self.depth -= 1;
        result
    }

    fn eval_node(&mut self, env: &Rc<Env>, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Parameter(id) => env.get(*id).ok_or(RuntimeError::UnboundParameter { id: *id }),
            ExprKind::Constant(value) => Ok(Value::from_const(value)),
            ExprKind::Lambda { parameters, body } => Ok(Value::Closure(Rc::new(Closure {
                parameters: parameters.clone(),
                body: (**body).clone(),
                env: Rc::clone(env),
            }))),
            ExprKind::Unary { kind, operand } => self.eval_unary_node(env, expr, *kind, operand),
            ExprKind::Binary {
                kind,
                left,
                right,
                conversion,
            } => self.eval_binary_node(env, *kind, left, right, conversion.as_deref()),
            ExprKind::Member { expression, member } => {
                let target = self.eval(env, expression)?;
                self.read_member(&target, member)
            }
            ExprKind::Call {
                object,
                method,
                arguments,
            } => {
                let this = match object {
                    Some(o) => match self.eval(env, o)? {
                        Value::Null => return Err(RuntimeError::NullReference { op: NodeKind::Call }),
                        v => Some(v),
                    },
                    None => None,
                };
                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.eval(env, arg)?);
                }

                let types = self.types;
                let natives = self.natives;
                let def = types.method(method.method).map_err(|e| RuntimeError::InternalError {
                    message: e.to_string(),
                })?;
                let Some(native) = natives.method(def.declaring, &def.name) else {
                    return Err(RuntimeError::NoNativeImplementation {
                        method: types.describe_method(method),
                    });
                };
                trace!(method = %def.name, args = args.len(), "native call");
                native(self, NativeCall { method, this, args })
            }
        }
    }

    fn eval_unary_node(
        &mut self,
        env: &Rc<Env>,
        expr: &Expr,
        kind: NodeKind,
        operand: &Expr,
    ) -> Result<Value, RuntimeError> {
        let value = self.eval(env, operand)?;
        match kind {
            NodeKind::Convert | NodeKind::ConvertChecked => {
                self.convert_to(&value, expr, kind == NodeKind::ConvertChecked)
            }
            NodeKind::PreIncrementAssign
            | NodeKind::PreDecrementAssign
            | NodeKind::PostIncrementAssign
            | NodeKind::PostDecrementAssign => {
                let updated = eval_unary(kind, &value)?;
                self.assign(env, operand, updated.clone())?;
                let pre = matches!(kind, NodeKind::PreIncrementAssign | NodeKind::PreDecrementAssign);
                Ok(if pre { updated } else { value })
            }
            // Lifted operators propagate a missing operand.
            _ if value.is_null() => Ok(Value::Null),
            _ => eval_unary(kind, &value),
        }
    }

    fn convert_to(&self, value: &Value, expr: &Expr, checked: bool) -> Result<Value, RuntimeError> {
        let types = self.types;
        if let Some(inner) = types.nullable_underlying(&expr.ty) {
            return match types.primitive_of(inner) {
                Some(p) if !value.is_null() => convert(value, p, checked),
                _ => Ok(value.clone()),
            };
        }
        match types.primitive_of(&expr.ty) {
            Some(p) if value.is_null() && p.is_value_type() => Err(RuntimeError::InvalidOperation {
                message: "Nullable object must have a value".to_string(),
            }),
            Some(p) => convert(value, p, checked),
            // Boxing and reference conversions keep the value.
            None => Ok(value.clone()),
        }
    }

    fn eval_binary_node(
        &mut self,
        env: &Rc<Env>,
        kind: NodeKind,
        left: &Expr,
        right: &Expr,
        conversion: Option<&Expr>,
    ) -> Result<Value, RuntimeError> {
        match kind {
            NodeKind::AndAlso | NodeKind::OrElse => {
                let lhs = self.eval(env, left)?;
                let Value::Boolean(l) = lhs else {
                    return Err(mismatch(kind, "Boolean", lhs.type_name()));
                };
                if l == (kind == NodeKind::OrElse) {
                    return Ok(Value::Boolean(l));
                }
                match self.eval(env, right)? {
                    Value::Boolean(r) => Ok(Value::Boolean(r)),
                    other => Err(mismatch(kind, "Boolean", other.type_name())),
                }
            }
            NodeKind::Coalesce => {
                let lhs = self.eval(env, left)?;
                if lhs.is_null() {
                    return self.eval(env, right);
                }
                match conversion {
                    Some(c) => {
                        let f = self.eval(env, c)?;
                        self.call_closure(&f, vec![lhs])
                    }
                    None => Ok(lhs),
                }
            }
            NodeKind::Assign => {
                let value = self.eval(env, right)?;
                self.assign(env, left, value.clone())?;
                Ok(value)
            }
            _ => {
                let lhs = self.eval(env, left)?;
                let rhs = self.eval(env, right)?;
                let op = kind.base_operator().unwrap_or(kind);
                let value = if (lhs.is_null() || rhs.is_null()) && !op.is_comparison() {
                    Value::Null
                } else {
                    eval_binary(op, &lhs, &rhs).map_err(|e| e.at(kind))?
                };
                if kind.is_compound_assignment() {
                    self.assign(env, left, value.clone())?;
                }
                Ok(value)
            }
        }
    }

    fn read_member(&self, target: &Value, member: &MemberRef) -> Result<Value, RuntimeError> {
        let name = member.name();
        match target {
            Value::Null => return Err(RuntimeError::NullReference { op: NodeKind::MemberAccess }),
            Value::Object(obj) => {
                if let Some(value) = obj.borrow().fields.get(name) {
                    return Ok(value.clone());
                }
            }
            _ => {}
        }
        let getter = member
            .declaring()
            .def()
            .and_then(|ty| self.natives.property(ty, name));
        match getter {
            Some(get) => get(target),
            None => Err(RuntimeError::NoNativeImplementation {
                method: format!("{}.{}", self.types.type_name(member.declaring()), name),
            }),
        }
    }

    /// Writes `value` through an assignable expression.
    fn assign(&mut self, env: &Rc<Env>, target: &Expr, value: Value) -> Result<(), RuntimeError> {
        match &target.kind {
            ExprKind::Parameter(id) => {
                if env.set(*id, value) {
                    Ok(())
                } else {
                    Err(RuntimeError::UnboundParameter { id: *id })
                }
            }
            ExprKind::Member { expression, member } => match self.eval(env, expression)? {
                Value::Object(obj) => {
                    obj.borrow_mut().fields.insert(member.name().to_string(), value);
                    Ok(())
                }
                Value::Null => Err(RuntimeError::NullReference { op: NodeKind::Assign }),
                other => Err(RuntimeError::InvalidOperation {
                    message: format!("cannot assign '{}' on a {} value", member.name(), other.type_name()),
                }),
            },
            _ => Err(RuntimeError::InternalError {
                message: format!("{} is not assignable", target.node_kind()),
            }),
        }
    }
}
