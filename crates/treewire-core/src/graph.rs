//! ExprGraph: the parameter arena and the validating node factories.
//!
//! An [`ExprGraph`] owns every parameter an expression tree refers to.
//! Parameters are interned once and referenced everywhere by [`ParamId`],
//! so two references share identity iff they carry the same id, even when
//! two distinct parameters share a display name.
//!
//! The factory methods mirror the host's node factories: they check operand
//! types against the [`TypeRegistry`], compute the result type, and refuse
//! to build nodes the host executor could not run. Decoding rebuilds trees
//! through the same factories, so a decoded tree is held to the same rules
//! as a hand-built one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::expr::{Expr, ExprKind, MemberRef};
use crate::id::ParamId;
use crate::ops::NodeKind;
use crate::type_id::TypeRegistry;
use crate::types::{ConstValue, MethodRef, PrimitiveType, TypeRef};

/// A parameter's declared type and display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub ty: TypeRef,
    pub name: String,
}

/// Parameter arena plus the factories that build [`Expr`] nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExprGraph {
    params: Vec<ParameterDef>,
}

/// A finished expression: its root node and the arena it refers into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprTree {
    pub graph: ExprGraph,
    pub root: Expr,
}

fn invalid(reason: impl Into<String>) -> CoreError {
    CoreError::InvalidExpression {
        reason: reason.into(),
    }
}

impl ExprGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Parameters
    // -----------------------------------------------------------------------

    /// Adds a new, distinct parameter to the arena.
    pub fn parameter(&mut self, ty: TypeRef, name: &str) -> ParamId {
        let id = ParamId(self.params.len() as u32);
        self.params.push(ParameterDef {
            ty,
            name: name.to_string(),
        });
        id
    }

    pub fn param(&self, id: ParamId) -> Option<&ParameterDef> {
        self.params.get(id.0 as usize)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> impl Iterator<Item = (ParamId, &ParameterDef)> {
        self.params
            .iter()
            .enumerate()
            .map(|(i, p)| (ParamId(i as u32), p))
    }

    /// A reference node to an existing parameter.
    pub fn param_ref(&self, id: ParamId) -> Result<Expr, CoreError> {
        let def = self.param(id).ok_or(CoreError::ParameterNotFound { id })?;
        Ok(Expr {
            ty: def.ty.clone(),
            kind: ExprKind::Parameter(id),
        })
    }

    /// Wraps `root` together with this arena.
    pub fn finish(self, root: Expr) -> ExprTree {
        ExprTree { graph: self, root }
    }

    // -----------------------------------------------------------------------
    // Constants
    // -----------------------------------------------------------------------

    /// A constant of exactly the literal's primitive type (`Object` for null).
    pub fn literal(&self, value: ConstValue) -> Expr {
        let ty = value
            .primitive()
            .map(TypeRef::primitive)
            .unwrap_or(TypeRef::OBJECT);
        Expr {
            ty,
            kind: ExprKind::Constant(value),
        }
    }

    /// A constant with an explicit type.
    ///
    /// Non-null literals must match `ty` exactly; null needs a type that admits null.
    pub fn constant(&self, types: &TypeRegistry, value: ConstValue, ty: TypeRef) -> Result<Expr, CoreError> {
        match value.primitive() {
            None if !types.admits_null(&ty) => {
                return Err(invalid(format!(
                    "null constant requires a nullable or reference type, got '{}'",
                    types.type_name(&ty)
                )))
            }
            Some(p)
                if TypeRef::primitive(p) != ty
                    && types.nullable_underlying(&ty) != Some(&TypeRef::primitive(p)) =>
            {
                return Err(invalid(format!(
                    "{} literal cannot have type '{}'",
                    p.name(),
                    types.type_name(&ty)
                )))
            }
            _ => {}
        }
        Ok(Expr {
            ty,
            kind: ExprKind::Constant(value),
        })
    }

    // -----------------------------------------------------------------------
    // Binary
    // -----------------------------------------------------------------------

    /// Builds a binary node of `kind`.
    ///
    /// `conversion` is only accepted on `Coalesce`, as a one-parameter lambda
    /// taking the left operand's underlying type and returning the right
    /// operand's type.
    pub fn make_binary(
        &self,
        types: &TypeRegistry,
        kind: NodeKind,
        left: Expr,
        right: Expr,
        conversion: Option<Expr>,
    ) -> Result<Expr, CoreError> {
        if !kind.is_binary() {
            return Err(invalid(format!("'{}' is not a binary node kind", kind)));
        }
        if conversion.is_some() && kind != NodeKind::Coalesce {
            return Err(invalid(format!("'{}' does not take a conversion", kind)));
        }

        let ty = if kind == NodeKind::Coalesce {
            self.coalesce_result(types, &left, &right, conversion.as_ref())?
        } else if kind == NodeKind::Assign {
            check_writable(types, &left)?;
            if !types.is_assignable(&right.ty, &left.ty) {
                return Err(mismatch(types, kind, &left.ty, &right.ty));
            }
            left.ty.clone()
        } else if let Some(op) = kind.base_operator() {
            check_writable(types, &left)?;
            let result = binary_result(types, op, &left.ty, &right.ty)?;
            if result != left.ty {
                return Err(mismatch(types, kind, &left.ty, &right.ty));
            }
            result
        } else {
            binary_result(types, kind, &left.ty, &right.ty)?
        };

        Ok(Expr {
            ty,
            kind: ExprKind::Binary {
                kind,
                left: Box::new(left),
                right: Box::new(right),
                conversion: conversion.map(Box::new),
            },
        })
    }

    fn coalesce_result(
        &self,
        types: &TypeRegistry,
        left: &Expr,
        right: &Expr,
        conversion: Option<&Expr>,
    ) -> Result<TypeRef, CoreError> {
        if !types.admits_null(&left.ty) {
            return Err(invalid(format!(
                "left operand of Coalesce must be nullable or a reference type, got '{}'",
                types.type_name(&left.ty)
            )));
        }
        let underlying = types
            .nullable_underlying(&left.ty)
            .cloned()
            .unwrap_or_else(|| left.ty.clone());

        let Some(conversion) = conversion else {
            if right.ty == underlying {
                return Ok(underlying);
            }
            if types.is_assignable(&right.ty, &left.ty) {
                return Ok(left.ty.clone());
            }
            return Err(mismatch(types, NodeKind::Coalesce, &left.ty, &right.ty));
        };

        let ExprKind::Lambda { parameters, .. } = &conversion.kind else {
            return Err(invalid("Coalesce conversion must be a lambda"));
        };
        let [param] = parameters.as_slice() else {
            return Err(invalid("Coalesce conversion must take exactly one parameter"));
        };
        let param_ty = &self
            .param(*param)
            .ok_or(CoreError::ParameterNotFound { id: *param })?
            .ty;
        if *param_ty != underlying {
            return Err(invalid(format!(
                "Coalesce conversion takes '{}', left operand is '{}'",
                types.type_name(param_ty),
                types.type_name(&left.ty)
            )));
        }
        match conversion.ty.args().last() {
            Some(ret) if *ret == right.ty => Ok(right.ty.clone()),
            _ => Err(invalid(format!(
                "Coalesce conversion must return '{}'",
                types.type_name(&right.ty)
            ))),
        }
    }

    // -----------------------------------------------------------------------
    // Unary
    // -----------------------------------------------------------------------

    /// Builds a unary node of `kind`.
    ///
    /// Conversions require the target `ty`. For other kinds `ty` is optional
    /// and, when given, must equal the computed result type.
    pub fn make_unary(
        &self,
        types: &TypeRegistry,
        kind: NodeKind,
        operand: Expr,
        ty: Option<TypeRef>,
    ) -> Result<Expr, CoreError> {
        let from = &operand.ty;
        let p = types.primitive_of(from);
        let is = |pred: fn(PrimitiveType) -> bool| p.is_some_and(pred);

        let result = match kind {
            NodeKind::Convert | NodeKind::ConvertChecked => {
                let to = ty.clone().ok_or_else(|| invalid(format!("'{}' needs a target type", kind)))?;
                if !is_convertible(types, from, &to) {
                    return Err(invalid(format!(
                        "no conversion from '{}' to '{}'",
                        types.type_name(from),
                        types.type_name(&to)
                    )));
                }
                to
            }
            NodeKind::Negate | NodeKind::NegateChecked
                if is(|p| p.is_signed_integer() || p.is_float()) =>
            {
                from.clone()
            }
            NodeKind::UnaryPlus | NodeKind::Increment | NodeKind::Decrement
                if is(PrimitiveType::is_numeric) =>
            {
                from.clone()
            }
            NodeKind::Not if is(|p| p == PrimitiveType::Boolean || p.is_integer()) => from.clone(),
            NodeKind::OnesComplement if is(PrimitiveType::is_integer) => from.clone(),
            NodeKind::IsTrue | NodeKind::IsFalse if *from == TypeRef::BOOLEAN => TypeRef::BOOLEAN,
            NodeKind::PreIncrementAssign
            | NodeKind::PreDecrementAssign
            | NodeKind::PostIncrementAssign
            | NodeKind::PostDecrementAssign
                if is(PrimitiveType::is_numeric) =>
            {
                check_writable(types, &operand)?;
                from.clone()
            }
            _ if kind.is_unary() => {
                return Err(invalid(format!(
                    "unary operator '{}' is not defined for '{}'",
                    kind,
                    types.type_name(from)
                )))
            }
            _ => return Err(invalid(format!("'{}' is not a unary node kind", kind))),
        };

        if let Some(ty) = ty {
            if ty != result {
                return Err(invalid(format!(
                    "'{}' produces '{}', not '{}'",
                    kind,
                    types.type_name(&result),
                    types.type_name(&ty)
                )));
            }
        }

        Ok(Expr {
            ty: result,
            kind: ExprKind::Unary {
                kind,
                operand: Box::new(operand),
            },
        })
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// Reads `member` from the value of `expression`.
    pub fn member_access(&self, types: &TypeRegistry, expression: Expr, member: MemberRef) -> Result<Expr, CoreError> {
        let declaring = member.declaring();
        if !types.is_assignable(&expression.ty, declaring) {
            return Err(invalid(format!(
                "member '{}' of '{}' accessed on '{}'",
                member.name(),
                types.type_name(declaring),
                types.type_name(&expression.ty)
            )));
        }
        let ty = match &member {
            MemberRef::Field { declaring, name } => types.field_type(declaring, name),
            MemberRef::Property { declaring, name } => types.property(declaring, name).map(|(ty, _)| ty),
        }
        .ok_or_else(|| CoreError::MemberNotFound {
            type_name: types.type_name(declaring),
            member: member.name().to_string(),
        })?;
        Ok(Expr {
            ty,
            kind: ExprKind::Member {
                expression: Box::new(expression),
                member,
            },
        })
    }

    /// Field `name` of the expression's own type.
    pub fn field(&self, types: &TypeRegistry, expression: Expr, name: &str) -> Result<Expr, CoreError> {
        let member = MemberRef::Field {
            declaring: expression.ty.clone(),
            name: name.to_string(),
        };
        self.member_access(types, expression, member)
    }

    /// Property `name` of the expression's own type.
    pub fn property(&self, types: &TypeRegistry, expression: Expr, name: &str) -> Result<Expr, CoreError> {
        let member = MemberRef::Property {
            declaring: expression.ty.clone(),
            name: name.to_string(),
        };
        self.member_access(types, expression, member)
    }

    // -----------------------------------------------------------------------
    // Lambdas and calls
    // -----------------------------------------------------------------------

    /// Binds `parameters` over `body`. The node's type is the matching delegate.
    pub fn lambda(&self, types: &TypeRegistry, parameters: Vec<ParamId>, body: Expr) -> Result<Expr, CoreError> {
        let mut seen = HashSet::new();
        let mut param_types = Vec::with_capacity(parameters.len());
        for id in &parameters {
            let def = self.param(*id).ok_or(CoreError::ParameterNotFound { id: *id })?;
            if !seen.insert(*id) {
                return Err(invalid(format!("parameter '{}' bound twice", def.name)));
            }
            param_types.push(def.ty.clone());
        }
        let ty = types.delegate_type(&param_types, &body.ty)?;
        Ok(Expr {
            ty,
            kind: ExprKind::Lambda {
                parameters,
                body: Box::new(body),
            },
        })
    }

    /// Calls `method`. Static methods take no `object`; instance methods need one.
    pub fn call(
        &self,
        types: &TypeRegistry,
        object: Option<Expr>,
        method: MethodRef,
        arguments: Vec<Expr>,
    ) -> Result<Expr, CoreError> {
        let def = types.method(method.method)?;
        if types.is_generic_definition(&method) {
            return Err(invalid(format!(
                "cannot call open generic method '{}'",
                types.describe_method(&method)
            )));
        }
        match (&object, def.is_static) {
            (Some(_), true) => {
                return Err(invalid(format!(
                    "static method '{}' called with an instance",
                    def.name
                )))
            }
            (None, false) => {
                return Err(invalid(format!(
                    "instance method '{}' called without an instance",
                    def.name
                )))
            }
            (Some(obj), false) if !types.is_assignable(&obj.ty, &method.declaring) => {
                return Err(invalid(format!(
                    "method '{}' of '{}' called on '{}'",
                    def.name,
                    types.type_name(&method.declaring),
                    types.type_name(&obj.ty)
                )))
            }
            _ => {}
        }

        let params = types.method_parameter_types(&method)?;
        if params.len() != arguments.len() {
            return Err(invalid(format!(
                "method '{}' takes {} argument(s), got {}",
                def.name,
                params.len(),
                arguments.len()
            )));
        }
        for (i, (param, arg)) in params.iter().zip(&arguments).enumerate() {
            if !types.is_assignable(&arg.ty, param) {
                return Err(invalid(format!(
                    "argument {} of '{}' expects '{}', got '{}'",
                    i,
                    def.name,
                    types.type_name(param),
                    types.type_name(&arg.ty)
                )));
            }
        }

        let ty = types.method_return_type(&method)?;
        Ok(Expr {
            ty,
            kind: ExprKind::Call {
                object: object.map(Box::new),
                method,
                arguments,
            },
        })
    }
}

impl ExprTree {
    pub fn param(&self, id: ParamId) -> Option<&ParameterDef> {
        self.graph.param(id)
    }
}

// ---------------------------------------------------------------------------
// Typing rules
// ---------------------------------------------------------------------------

fn mismatch(types: &TypeRegistry, kind: NodeKind, left: &TypeRef, right: &TypeRef) -> CoreError {
    invalid(format!(
        "binary operator '{}' is not defined for '{}' and '{}'",
        kind,
        types.type_name(left),
        types.type_name(right)
    ))
}

fn binary_result(types: &TypeRegistry, kind: NodeKind, left: &TypeRef, right: &TypeRef) -> Result<TypeRef, CoreError> {
    let lp = types.primitive_of(left);
    let same = left == right;
    let ok = match kind {
        NodeKind::Power => same && *left == TypeRef::DOUBLE,
        k if k.is_arithmetic() => same && lp.is_some_and(PrimitiveType::is_numeric),
        k if k.is_bitwise() => {
            same && lp.is_some_and(|p| p.is_integer() || p == PrimitiveType::Boolean)
        }
        k if k.is_shift() => lp.is_some_and(PrimitiveType::is_integer) && *right == TypeRef::INT32,
        k if k.is_logical() => same && *left == TypeRef::BOOLEAN,
        NodeKind::Equal | NodeKind::NotEqual => same,
        k if k.is_comparison() => {
            same && lp.is_some_and(|p| p.is_numeric() || p == PrimitiveType::Char)
        }
        _ => false,
    };
    if !ok {
        return Err(mismatch(types, kind, left, right));
    }
    Ok(if kind.is_comparison() || kind.is_logical() {
        TypeRef::BOOLEAN
    } else {
        left.clone()
    })
}

fn check_writable(types: &TypeRegistry, target: &Expr) -> Result<(), CoreError> {
    match &target.kind {
        ExprKind::Parameter(_) => Ok(()),
        ExprKind::Member {
            member: MemberRef::Field { .. },
            ..
        } => Ok(()),
        ExprKind::Member {
            member: MemberRef::Property { declaring, name },
            ..
        } => match types.property(declaring, name) {
            Some((_, true)) => Ok(()),
            _ => Err(CoreError::NotWritable {
                reason: format!("property '{}' is read-only", name),
            }),
        },
        _ => Err(CoreError::NotWritable {
            reason: format!("'{}' node cannot be assigned", target.node_kind()),
        }),
    }
}

fn is_convertible(types: &TypeRegistry, from: &TypeRef, to: &TypeRef) -> bool {
    let numeric_like = |t: &TypeRef| {
        types
            .primitive_of(t)
            .is_some_and(|p| p.is_numeric() || p == PrimitiveType::Char)
    };
    if from == to || *from == TypeRef::OBJECT || *to == TypeRef::OBJECT {
        return true;
    }
    if numeric_like(from) && numeric_like(to) {
        return true;
    }
    match (types.nullable_underlying(from), types.nullable_underlying(to)) {
        (_, Some(inner)) if inner == from => return true,
        (Some(inner), _) if inner == to => return true,
        (Some(a), Some(b)) if numeric_like(a) && numeric_like(b) => return true,
        _ => {}
    }
    types.is_assignable(from, to) || types.is_assignable(to, from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(types: &mut TypeRegistry) -> TypeRef {
        let id = types.define_class("Tests", "Counter", "Tests").unwrap();
        types.add_field(id, "FieldValue", TypeRef::INT32).unwrap();
        types.add_property(id, "PropertyValue", TypeRef::INT32, true).unwrap();
        types.add_property(id, "Name", TypeRef::STRING, false).unwrap();
        TypeRef::simple(id)
    }

    #[test]
    fn same_name_parameters_stay_distinct() {
        let mut g = ExprGraph::new();
        let a = g.parameter(TypeRef::INT32, "x");
        let b = g.parameter(TypeRef::INT32, "x");
        assert_ne!(a, b);
        assert_eq!(g.param_count(), 2);
    }

    #[test]
    fn arithmetic_requires_matching_numeric_types() {
        let types = TypeRegistry::new();
        let g = ExprGraph::new();
        let ok = g
            .make_binary(
                &types,
                NodeKind::AddChecked,
                g.literal(ConstValue::Int16(1)),
                g.literal(ConstValue::Int16(2)),
                None,
            )
            .unwrap();
        assert_eq!(ok.ty, TypeRef::INT16);

        let err = g
            .make_binary(
                &types,
                NodeKind::Add,
                g.literal(ConstValue::Int16(1)),
                g.literal(ConstValue::Int32(2)),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidExpression { .. }));
    }

    #[test]
    fn comparison_yields_boolean() {
        let types = TypeRegistry::new();
        let g = ExprGraph::new();
        let cmp = g
            .make_binary(
                &types,
                NodeKind::LessThan,
                g.literal(ConstValue::Double(1.0)),
                g.literal(ConstValue::Double(2.0)),
                None,
            )
            .unwrap();
        assert_eq!(cmp.ty, TypeRef::BOOLEAN);
    }

    #[test]
    fn shift_takes_int32_count() {
        let types = TypeRegistry::new();
        let g = ExprGraph::new();
        let shl = g
            .make_binary(
                &types,
                NodeKind::LeftShift,
                g.literal(ConstValue::Int64(1)),
                g.literal(ConstValue::Int32(3)),
                None,
            )
            .unwrap();
        assert_eq!(shl.ty, TypeRef::INT64);
        assert!(g
            .make_binary(
                &types,
                NodeKind::LeftShift,
                g.literal(ConstValue::Int64(1)),
                g.literal(ConstValue::Int64(3)),
                None,
            )
            .is_err());
    }

    #[test]
    fn assignment_needs_writable_target() {
        let mut types = TypeRegistry::new();
        let counter = counter(&mut types);
        let mut g = ExprGraph::new();
        let p = g.parameter(counter, "c");

        let prop = g.property(&types, g.param_ref(p).unwrap(), "PropertyValue").unwrap();
        assert!(g
            .make_binary(&types, NodeKind::AddAssign, prop, g.literal(ConstValue::Int32(1)), None)
            .is_ok());

        let name = g.property(&types, g.param_ref(p).unwrap(), "Name").unwrap();
        let err = g
            .make_binary(
                &types,
                NodeKind::Assign,
                name,
                g.literal(ConstValue::String("x".into())),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::NotWritable { .. }));

        let constant = g.literal(ConstValue::Int32(1));
        let err = g
            .make_unary(&types, NodeKind::PostIncrementAssign, constant, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotWritable { .. }));
    }

    #[test]
    fn conversions() {
        let types = TypeRegistry::new();
        let g = ExprGraph::new();
        let to_byte = g
            .make_unary(
                &types,
                NodeKind::ConvertChecked,
                g.literal(ConstValue::Int32(600)),
                Some(TypeRef::primitive(PrimitiveType::Byte)),
            )
            .unwrap();
        assert_eq!(to_byte.ty, TypeRef::primitive(PrimitiveType::Byte));

        let nullable = TypeRef::nullable(TypeRef::INT32);
        assert!(g
            .make_unary(&types, NodeKind::Convert, g.literal(ConstValue::Int32(6)), Some(nullable.clone()))
            .is_ok());
        assert!(g
            .make_unary(&types, NodeKind::Convert, g.literal(ConstValue::Null), Some(nullable))
            .is_ok());
        assert!(g
            .make_unary(
                &types,
                NodeKind::Convert,
                g.literal(ConstValue::Boolean(true)),
                Some(TypeRef::INT32)
            )
            .is_err());
        assert!(g
            .make_unary(&types, NodeKind::Convert, g.literal(ConstValue::Int32(1)), None)
            .is_err());
    }

    #[test]
    fn unary_operand_rules() {
        let types = TypeRegistry::new();
        let g = ExprGraph::new();
        let byte = g.literal(ConstValue::Byte(1));
        assert!(g.make_unary(&types, NodeKind::Negate, byte, None).is_err());
        let not = g
            .make_unary(&types, NodeKind::Not, g.literal(ConstValue::Boolean(true)), None)
            .unwrap();
        assert_eq!(not.ty, TypeRef::BOOLEAN);
        let is_true = g
            .make_unary(&types, NodeKind::IsTrue, g.literal(ConstValue::Boolean(true)), Some(TypeRef::BOOLEAN))
            .unwrap();
        assert_eq!(is_true.ty, TypeRef::BOOLEAN);
        assert!(g
            .make_unary(&types, NodeKind::Negate, g.literal(ConstValue::Int32(1)), Some(TypeRef::INT64))
            .is_err());
        assert!(g
            .make_unary(&types, NodeKind::Lambda, g.literal(ConstValue::Int32(1)), None)
            .is_err());
    }

    #[test]
    fn coalesce_with_conversion_lambda() {
        let types = TypeRegistry::with_std();
        let mut g = ExprGraph::new();
        let a = g.parameter(TypeRef::INT32, "a");
        let body = g
            .make_binary(
                &types,
                NodeKind::Add,
                g.param_ref(a).unwrap(),
                g.literal(ConstValue::Int32(3)),
                None,
            )
            .unwrap();
        let conversion = g.lambda(&types, vec![a], body).unwrap();
        let left = g
            .make_unary(
                &types,
                NodeKind::Convert,
                g.literal(ConstValue::Int32(6)),
                Some(TypeRef::nullable(TypeRef::INT32)),
            )
            .unwrap();
        let coalesce = g
            .make_binary(
                &types,
                NodeKind::Coalesce,
                left,
                g.literal(ConstValue::Int32(10)),
                Some(conversion),
            )
            .unwrap();
        assert_eq!(coalesce.ty, TypeRef::INT32);
    }

    #[test]
    fn conversion_rejected_outside_coalesce() {
        let types = TypeRegistry::with_std();
        let mut g = ExprGraph::new();
        let a = g.parameter(TypeRef::INT32, "a");
        let conversion = g.lambda(&types, vec![a], g.param_ref(a).unwrap()).unwrap();
        let err = g
            .make_binary(
                &types,
                NodeKind::Add,
                g.literal(ConstValue::Int32(1)),
                g.literal(ConstValue::Int32(2)),
                Some(conversion),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidExpression { .. }));
    }

    #[test]
    fn constant_type_must_match_literal() {
        let types = TypeRegistry::new();
        let g = ExprGraph::new();
        assert!(g.constant(&types, ConstValue::Int32(1), TypeRef::INT32).is_ok());
        assert!(g.constant(&types, ConstValue::Int32(1), TypeRef::INT64).is_err());
        assert!(g.constant(&types, ConstValue::Null, TypeRef::STRING).is_ok());
        assert!(g.constant(&types, ConstValue::Null, TypeRef::INT32).is_err());
        let maybe = TypeRef::nullable(TypeRef::INT32);
        assert!(g.constant(&types, ConstValue::Int32(1), maybe.clone()).is_ok());
        assert!(g.constant(&types, ConstValue::Null, maybe).is_ok());
        assert!(g.constant(&types, ConstValue::Int64(1), TypeRef::nullable(TypeRef::INT32)).is_err());
    }

    #[test]
    fn lambda_type_is_delegate() {
        let types = TypeRegistry::with_std();
        let mut g = ExprGraph::new();
        let x = g.parameter(TypeRef::INT32, "x");
        let lambda = g.lambda(&types, vec![x], g.param_ref(x).unwrap()).unwrap();
        assert_eq!(types.type_name(&lambda.ty), "Func`2[Int32,Int32]");
        assert!(g.lambda(&types, vec![x, x], g.param_ref(x).unwrap()).is_err());
        assert!(g.lambda(&types, vec![ParamId(9)], g.literal(ConstValue::Int32(0))).is_err());
    }

    #[test]
    fn call_checks_static_and_arguments() {
        let types = TypeRegistry::with_std();
        let g = ExprGraph::new();
        let math = types.lookup("System.Math", crate::type_id::CORE_MODULE).unwrap();
        let abs = types
            .methods_of(&TypeRef::simple(math))
            .into_iter()
            .find(|m| {
                types.method(m.method).unwrap().name == "Abs"
                    && types.method_parameter_types(m).unwrap() == vec![TypeRef::INT32]
            })
            .unwrap();

        let call = g
            .call(&types, None, abs.clone(), vec![g.literal(ConstValue::Int32(-4))])
            .unwrap();
        assert_eq!(call.ty, TypeRef::INT32);

        assert!(g
            .call(&types, None, abs.clone(), vec![g.literal(ConstValue::Int64(-4))])
            .is_err());
        assert!(g
            .call(
                &types,
                Some(g.literal(ConstValue::Int32(0))),
                abs,
                vec![g.literal(ConstValue::Int32(-4))]
            )
            .is_err());
    }

    #[test]
    fn call_rejects_open_generic_definition() {
        let types = TypeRegistry::with_std();
        let g = ExprGraph::new();
        let e = types.lookup("System.Linq.Enumerable", crate::stdlib::LINQ_MODULE).unwrap();
        let count = types
            .methods_of(&TypeRef::simple(e))
            .into_iter()
            .find(|m| types.method(m.method).unwrap().name == "Count")
            .unwrap();
        let xs = g.literal(ConstValue::Null);
        assert!(g.call(&types, None, count, vec![xs]).is_err());
    }
}
