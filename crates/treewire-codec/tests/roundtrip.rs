//! Encode, ship through JSON, decode, and execute.
//!
//! Every test compares the behavior of the original tree with the behavior
//! of the decoded one, using the interpreter from `treewire-eval`.

use treewire_codec::{DecodeOptions, EncodedExpression, ExpressionCodec};
use treewire_core::stdlib::LINQ_MODULE;
use treewire_core::{
    describe, ConstValue, ExprGraph, ExprTree, MethodRef, NodeKind, PrimitiveType, TypeRef, TypeRegistry,
    CORE_MODULE,
};
use treewire_eval::{std_natives, Interpreter, InterpreterConfig, RuntimeError, Value};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Encodes `tree`, serializes to JSON text, parses it back, and decodes.
fn through_json(types: &TypeRegistry, tree: &ExprTree, options: &DecodeOptions) -> ExprTree {
    let codec = ExpressionCodec::new(types);
    let encoded = codec.encode(tree).expect("encode failed");
    let json = serde_json::to_string_pretty(&encoded).expect("serialize failed");
    let node: EncodedExpression = serde_json::from_str(&json).expect("deserialize failed");
    codec.decode_with(&node, options).expect("decode failed")
}

fn run(types: &TypeRegistry, tree: &ExprTree, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let natives = std_natives(types);
    let mut interp = Interpreter::new(types, &natives, InterpreterConfig::default());
    interp.invoke(tree, args)
}

/// Asserts the original and decoded trees agree on `args`.
fn assert_same_behavior(types: &TypeRegistry, tree: &ExprTree, options: &DecodeOptions, args: Vec<Value>) -> Value {
    let back = through_json(types, tree, options);
    assert_eq!(describe(types, &back), describe(types, tree));
    let before = run(types, tree, args.clone());
    let after = run(types, &back, args);
    assert_eq!(before, after);
    before.unwrap_or(Value::Null)
}

fn method(types: &TypeRegistry, ty: &TypeRef, name: &str, type_args: &[TypeRef], params: &[TypeRef]) -> MethodRef {
    types
        .methods_of(ty)
        .into_iter()
        .filter(|m| types.method(m.method).unwrap().name == name)
        .filter_map(|m| {
            if type_args.is_empty() {
                Some(m)
            } else {
                types.make_generic_method(&m, type_args).ok()
            }
        })
        .find(|m| types.method_parameter_types(m).unwrap() == params)
        .unwrap_or_else(|| panic!("no {} overload", name))
}

fn enumerable(types: &TypeRegistry) -> TypeRef {
    TypeRef::simple(types.lookup("System.Linq.Enumerable", LINQ_MODULE).unwrap())
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

#[test]
fn int16_addition_keeps_width_and_checking() {
    let types = TypeRegistry::with_std();
    let g = ExprGraph::new();
    let add = |kind| {
        let sum = g
            .make_binary(
                &types,
                kind,
                g.literal(ConstValue::Int16(30000)),
                g.literal(ConstValue::Int16(10000)),
                None,
            )
            .unwrap();
        g.clone().finish(sum)
    };

    let unchecked = add(NodeKind::Add);
    let value = assert_same_behavior(&types, &unchecked, &DecodeOptions::default(), vec![]);
    assert_eq!(value, Value::Int16(-25536));

    let checked = add(NodeKind::AddChecked);
    let back = through_json(&types, &checked, &DecodeOptions::default());
    assert_eq!(
        run(&types, &back, vec![]).unwrap_err(),
        RuntimeError::IntegerOverflow { op: NodeKind::AddChecked }
    );
}

#[test]
fn int32_add_assign_wraps() {
    let types = TypeRegistry::with_std();
    let mut g = ExprGraph::new();
    let x = g.parameter(TypeRef::INT32, "x");
    let body = g
        .make_binary(
            &types,
            NodeKind::AddAssign,
            g.param_ref(x).unwrap(),
            g.literal(ConstValue::Int32(1_000_000_000)),
            None,
        )
        .unwrap();
    let lambda = g.lambda(&types, vec![x], body).unwrap();
    let tree = g.finish(lambda);

    let value = assert_same_behavior(&types, &tree, &DecodeOptions::default(), vec![Value::Int32(2_000_000_000)]);
    assert_eq!(value, Value::Int32(-1_294_967_296));
}

#[test]
fn checked_conversion_overflows_after_roundtrip() {
    let types = TypeRegistry::with_std();
    let g = ExprGraph::new();
    let byte = TypeRef::primitive(PrimitiveType::Byte);
    let conv = g
        .make_unary(&types, NodeKind::ConvertChecked, g.literal(ConstValue::Int32(600)), Some(byte))
        .unwrap();
    let tree = g.finish(conv);

    let back = through_json(&types, &tree, &DecodeOptions::default());
    assert_eq!(
        run(&types, &back, vec![]).unwrap_err(),
        RuntimeError::IntegerOverflow { op: NodeKind::ConvertChecked }
    );
}

/// `(a, b) => a <kind> b` over two parameters of type `ty`.
fn binary_lambda(types: &TypeRegistry, kind: NodeKind, ty: TypeRef, right_ty: TypeRef) -> ExprTree {
    let mut g = ExprGraph::new();
    let a = g.parameter(ty, "a");
    let b = g.parameter(right_ty, "b");
    let body = g
        .make_binary(types, kind, g.param_ref(a).unwrap(), g.param_ref(b).unwrap(), None)
        .unwrap_or_else(|e| panic!("{kind}: {e}"));
    let lambda = g.lambda(types, vec![a, b], body).unwrap();
    g.finish(lambda)
}

#[test]
fn every_int32_binary_operator_roundtrips() {
    let types = TypeRegistry::with_std();
    let kinds = [
        NodeKind::Add,
        NodeKind::AddChecked,
        NodeKind::Subtract,
        NodeKind::SubtractChecked,
        NodeKind::Multiply,
        NodeKind::MultiplyChecked,
        NodeKind::Divide,
        NodeKind::Modulo,
        NodeKind::And,
        NodeKind::Or,
        NodeKind::ExclusiveOr,
        NodeKind::LeftShift,
        NodeKind::RightShift,
        NodeKind::Equal,
        NodeKind::NotEqual,
        NodeKind::LessThan,
        NodeKind::LessThanOrEqual,
        NodeKind::GreaterThan,
        NodeKind::GreaterThanOrEqual,
        NodeKind::AddAssign,
        NodeKind::AddAssignChecked,
        NodeKind::SubtractAssign,
        NodeKind::SubtractAssignChecked,
        NodeKind::MultiplyAssign,
        NodeKind::MultiplyAssignChecked,
        NodeKind::DivideAssign,
        NodeKind::ModuloAssign,
        NodeKind::AndAssign,
        NodeKind::OrAssign,
        NodeKind::ExclusiveOrAssign,
        NodeKind::LeftShiftAssign,
        NodeKind::RightShiftAssign,
    ];
    let operands = [(7, 3), (-7, 2), (i32::MAX, 2), (i32::MIN, -1), (5, 0)];
    let options = DecodeOptions::default();

    for kind in kinds {
        let tree = binary_lambda(&types, kind, TypeRef::INT32, TypeRef::INT32);
        for (a, b) in operands {
            assert_same_behavior(&types, &tree, &options, vec![Value::Int32(a), Value::Int32(b)]);
        }
    }

    let run_pair = |kind: NodeKind, a: i32, b: i32| {
        let back = through_json(&types, &binary_lambda(&types, kind, TypeRef::INT32, TypeRef::INT32), &options);
        run(&types, &back, vec![Value::Int32(a), Value::Int32(b)])
    };
    assert_eq!(run_pair(NodeKind::Multiply, i32::MAX, 2).unwrap(), Value::Int32(-2));
    assert_eq!(
        run_pair(NodeKind::MultiplyAssignChecked, i32::MAX, 2).unwrap_err(),
        RuntimeError::IntegerOverflow { op: NodeKind::MultiplyAssignChecked }
    );
    assert_eq!(
        run_pair(NodeKind::SubtractChecked, i32::MIN, 1).unwrap_err(),
        RuntimeError::IntegerOverflow { op: NodeKind::SubtractChecked }
    );
    assert_eq!(
        run_pair(NodeKind::Modulo, 5, 0).unwrap_err(),
        RuntimeError::DivideByZero { op: NodeKind::Modulo }
    );
    assert_eq!(run_pair(NodeKind::RightShift, -8, 1).unwrap(), Value::Int32(-4));
    assert_eq!(run_pair(NodeKind::LessThanOrEqual, 3, 3).unwrap(), Value::Boolean(true));
}

#[test]
fn boolean_and_double_operators_roundtrip() {
    let types = TypeRegistry::with_std();
    let options = DecodeOptions::default();

    for kind in [
        NodeKind::AndAlso,
        NodeKind::OrElse,
        NodeKind::And,
        NodeKind::Or,
        NodeKind::ExclusiveOr,
        NodeKind::Equal,
    ] {
        let tree = binary_lambda(&types, kind, TypeRef::BOOLEAN, TypeRef::BOOLEAN);
        for (a, b) in [(true, true), (true, false), (false, true), (false, false)] {
            assert_same_behavior(&types, &tree, &options, vec![Value::Boolean(a), Value::Boolean(b)]);
        }
    }

    for kind in [NodeKind::Power, NodeKind::PowerAssign, NodeKind::Divide] {
        let tree = binary_lambda(&types, kind, TypeRef::DOUBLE, TypeRef::DOUBLE);
        assert_same_behavior(&types, &tree, &options, vec![Value::Double(2.0), Value::Double(10.0)]);
    }
    let power = binary_lambda(&types, NodeKind::Power, TypeRef::DOUBLE, TypeRef::DOUBLE);
    assert_eq!(
        assert_same_behavior(&types, &power, &options, vec![Value::Double(2.0), Value::Double(10.0)]),
        Value::Double(1024.0)
    );
}

#[test]
fn every_unary_operator_roundtrips() {
    let types = TypeRegistry::with_std();
    let options = DecodeOptions::default();

    let unary_lambda = |kind: NodeKind, ty: TypeRef, observe_write: bool| {
        let mut g = ExprGraph::new();
        let x = g.parameter(ty, "x");
        let op = g
            .make_unary(&types, kind, g.param_ref(x).unwrap(), None)
            .unwrap_or_else(|e| panic!("{kind}: {e}"));
        // Adding the parameter afterwards exposes the written-back value.
        let body = if observe_write {
            g.make_binary(&types, NodeKind::Add, op, g.param_ref(x).unwrap(), None)
                .unwrap()
        } else {
            op
        };
        let lambda = g.lambda(&types, vec![x], body).unwrap();
        g.finish(lambda)
    };

    for kind in [
        NodeKind::Negate,
        NodeKind::NegateChecked,
        NodeKind::UnaryPlus,
        NodeKind::Not,
        NodeKind::OnesComplement,
        NodeKind::Increment,
        NodeKind::Decrement,
    ] {
        let tree = unary_lambda(kind, TypeRef::INT32, false);
        for x in [0, 41, -41, i32::MAX, i32::MIN] {
            assert_same_behavior(&types, &tree, &options, vec![Value::Int32(x)]);
        }
    }
    for kind in [
        NodeKind::PreIncrementAssign,
        NodeKind::PreDecrementAssign,
        NodeKind::PostIncrementAssign,
        NodeKind::PostDecrementAssign,
    ] {
        let tree = unary_lambda(kind, TypeRef::INT32, true);
        for x in [0, 41, i32::MAX] {
            assert_same_behavior(&types, &tree, &options, vec![Value::Int32(x)]);
        }
    }
    for kind in [NodeKind::Not, NodeKind::IsTrue, NodeKind::IsFalse] {
        let tree = unary_lambda(kind, TypeRef::BOOLEAN, false);
        for x in [true, false] {
            assert_same_behavior(&types, &tree, &options, vec![Value::Boolean(x)]);
        }
    }

    let negate = through_json(&types, &unary_lambda(NodeKind::NegateChecked, TypeRef::INT32, false), &options);
    assert_eq!(
        run(&types, &negate, vec![Value::Int32(i32::MIN)]).unwrap_err(),
        RuntimeError::IntegerOverflow { op: NodeKind::NegateChecked }
    );
    let post = through_json(&types, &unary_lambda(NodeKind::PostDecrementAssign, TypeRef::INT32, true), &options);
    // 10 + 9
    assert_eq!(run(&types, &post, vec![Value::Int32(10)]).unwrap(), Value::Int32(19));
}

#[test]
fn floating_point_constants_keep_their_bits() {
    let types = TypeRegistry::with_std();
    let g = ExprGraph::new();
    let third = 1.0_f64 / 3.0;
    let body = g
        .make_binary(
            &types,
            NodeKind::Multiply,
            g.literal(ConstValue::Double(third)),
            g.literal(ConstValue::Double(3.0)),
            None,
        )
        .unwrap();
    let tree = g.finish(body);

    let back = through_json(&types, &tree, &DecodeOptions::default());
    assert_eq!(back.root, tree.root);
    assert_eq!(run(&types, &back, vec![]).unwrap(), Value::Double(third * 3.0));
}

// ---------------------------------------------------------------------------
// Parameters, members, coalesce
// ---------------------------------------------------------------------------

#[test]
fn shared_parameter_stays_shared() {
    let types = TypeRegistry::with_std();
    let mut g = ExprGraph::new();
    let x = g.parameter(TypeRef::INT32, "x");
    let bump = g
        .make_binary(&types, NodeKind::AddAssign, g.param_ref(x).unwrap(), g.literal(ConstValue::Int32(5)), None)
        .unwrap();
    let body = g
        .make_binary(&types, NodeKind::Add, bump, g.param_ref(x).unwrap(), None)
        .unwrap();
    let lambda = g.lambda(&types, vec![x], body).unwrap();
    let tree = g.finish(lambda);

    let back = through_json(&types, &tree, &DecodeOptions::default());
    assert_eq!(back.graph.param_count(), 1);
    assert_eq!(describe(&types, &back), "x => ((x += 5) + x)");
    assert_eq!(run(&types, &back, vec![Value::Int32(1)]).unwrap(), Value::Int32(12));
}

#[test]
fn distinct_parameters_with_the_same_name_stay_distinct() {
    let types = TypeRegistry::with_std();
    let mut g = ExprGraph::new();
    let a = g.parameter(TypeRef::INT32, "x");
    let b = g.parameter(TypeRef::INT32, "x");
    let body = g
        .make_binary(&types, NodeKind::Subtract, g.param_ref(a).unwrap(), g.param_ref(b).unwrap(), None)
        .unwrap();
    let lambda = g.lambda(&types, vec![a, b], body).unwrap();
    let tree = g.finish(lambda);

    let back = through_json(&types, &tree, &DecodeOptions::default());
    assert_eq!(back.graph.param_count(), 2);
    assert_eq!(
        run(&types, &back, vec![Value::Int32(10), Value::Int32(3)]).unwrap(),
        Value::Int32(7)
    );
}

#[test]
fn coalesce_conversion_survives() {
    let types = TypeRegistry::with_std();
    let mut g = ExprGraph::new();
    let n = g.parameter(TypeRef::nullable(TypeRef::INT32), "n");
    let v = g.parameter(TypeRef::INT32, "v");
    let triple = g
        .make_binary(&types, NodeKind::Multiply, g.param_ref(v).unwrap(), g.literal(ConstValue::Int32(3)), None)
        .unwrap();
    let conversion = g.lambda(&types, vec![v], triple).unwrap();
    let body = g
        .make_binary(
            &types,
            NodeKind::Coalesce,
            g.param_ref(n).unwrap(),
            g.literal(ConstValue::Int32(-1)),
            Some(conversion),
        )
        .unwrap();
    let lambda = g.lambda(&types, vec![n], body).unwrap();
    let tree = g.finish(lambda);

    let options = DecodeOptions::default();
    assert_eq!(assert_same_behavior(&types, &tree, &options, vec![Value::Int32(3)]), Value::Int32(9));
    assert_eq!(assert_same_behavior(&types, &tree, &options, vec![Value::Null]), Value::Int32(-1));
}

#[test]
fn nullable_constants_keep_their_type() {
    let types = TypeRegistry::with_std();
    let maybe = TypeRef::nullable(TypeRef::INT32);
    for (value, expected) in [(ConstValue::Int32(5), 5), (ConstValue::Null, -1)] {
        let g = ExprGraph::new();
        let constant = g.constant(&types, value, maybe.clone()).unwrap();
        let body = g
            .make_binary(&types, NodeKind::Coalesce, constant, g.literal(ConstValue::Int32(-1)), None)
            .unwrap();
        let tree = g.finish(body);

        let back = through_json(&types, &tree, &DecodeOptions::default());
        assert_eq!(back, tree);
        assert_eq!(run(&types, &back, vec![]).unwrap(), Value::Int32(expected));
    }
}

#[test]
fn field_access_on_user_type() {
    let mut types = TypeRegistry::with_std();
    let counter = types.define_class("Shop", "Counter", "Shop.Model").unwrap();
    types.add_field(counter, "Hits", TypeRef::INT32).unwrap();
    let counter_ty = TypeRef::simple(counter);

    let mut g = ExprGraph::new();
    let c = g.parameter(counter_ty.clone(), "c");
    let hits = g.field(&types, g.param_ref(c).unwrap(), "Hits").unwrap();
    let body = g
        .make_unary(&types, NodeKind::PreIncrementAssign, hits, None)
        .unwrap();
    let lambda = g.lambda(&types, vec![c], body).unwrap();
    let tree = g.finish(lambda);

    let back = through_json(&types, &tree, &DecodeOptions::default());
    let obj = Value::object(counter_ty, [("Hits".to_string(), Value::Int32(9))]);
    assert_eq!(run(&types, &back, vec![obj.clone()]).unwrap(), Value::Int32(10));
    assert_eq!(obj.field("Hits"), Some(Value::Int32(10)));
}

#[test]
fn compound_assignment_through_writable_property() {
    let mut types = TypeRegistry::with_std();
    let account = types.define_class("Bank", "Account", "Bank.Model").unwrap();
    types.add_property(account, "Balance", TypeRef::INT32, true).unwrap();
    let account_ty = TypeRef::simple(account);
    let options = DecodeOptions::default();

    let build = |kind: NodeKind| {
        let mut g = ExprGraph::new();
        let acct = g.parameter(account_ty.clone(), "acct");
        let amount = g.parameter(TypeRef::INT32, "amount");
        let balance = g.property(&types, g.param_ref(acct).unwrap(), "Balance").unwrap();
        let body = g
            .make_binary(&types, kind, balance, g.param_ref(amount).unwrap(), None)
            .unwrap();
        let lambda = g.lambda(&types, vec![acct, amount], body).unwrap();
        g.finish(lambda)
    };
    let with_balance = |v: i32| Value::object(account_ty.clone(), [("Balance".to_string(), Value::Int32(v))]);

    let tree = build(NodeKind::SubtractAssign);
    let encoded = ExpressionCodec::new(&types).encode(&tree).unwrap();
    let body = encoded.children.get("Body").and_then(Option::as_ref).unwrap();
    let target = body.children.get("Left").and_then(Option::as_ref).unwrap();
    assert_eq!(target.node_type, NodeKind::MemberAccess);
    assert_eq!(target.values.get("IsProperty").map(String::as_str), Some("true"));

    let back = through_json(&types, &tree, &options);
    assert_eq!(back, tree);
    let acct = with_balance(100);
    assert_eq!(run(&types, &back, vec![acct.clone(), Value::Int32(30)]).unwrap(), Value::Int32(70));
    assert_eq!(acct.field("Balance"), Some(Value::Int32(70)));

    let checked = through_json(&types, &build(NodeKind::SubtractAssignChecked), &options);
    let acct = with_balance(i32::MIN);
    assert_eq!(
        run(&types, &checked, vec![acct.clone(), Value::Int32(1)]).unwrap_err(),
        RuntimeError::IntegerOverflow { op: NodeKind::SubtractAssignChecked }
    );
    assert_eq!(acct.field("Balance"), Some(Value::Int32(i32::MIN)));

    let mut g = ExprGraph::new();
    let acct = g.parameter(account_ty.clone(), "acct");
    let balance = g.property(&types, g.param_ref(acct).unwrap(), "Balance").unwrap();
    let body = g
        .make_unary(&types, NodeKind::PostDecrementAssign, balance, None)
        .unwrap();
    let lambda = g.lambda(&types, vec![acct], body).unwrap();
    let back = through_json(&types, &g.finish(lambda), &options);
    let obj = with_balance(5);
    assert_eq!(run(&types, &back, vec![obj.clone()]).unwrap(), Value::Int32(5));
    assert_eq!(obj.field("Balance"), Some(Value::Int32(4)));
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

#[test]
fn generic_enumerable_calls_roundtrip() {
    let types = TypeRegistry::with_std();
    let e = enumerable(&types);
    let list_ty = types.list_of(TypeRef::INT32).unwrap();
    let seq_ty = types.enumerable_of(TypeRef::INT32).unwrap();
    let select_ty = types.func_type(vec![TypeRef::INT32, TypeRef::INT64]).unwrap();
    let select = method(
        &types,
        &e,
        "Select",
        &[TypeRef::INT32, TypeRef::INT64],
        &[seq_ty.clone(), select_ty],
    );
    let seq_i64 = types.enumerable_of(TypeRef::INT64).unwrap();
    let sum = method(&types, &e, "Sum", &[], &[seq_i64]);

    let mut g = ExprGraph::new();
    let xs = g.parameter(list_ty, "xs");
    let x = g.parameter(TypeRef::INT32, "x");
    let widen = g
        .make_unary(&types, NodeKind::Convert, g.param_ref(x).unwrap(), Some(TypeRef::INT64))
        .unwrap();
    let square = g
        .make_binary(&types, NodeKind::Multiply, widen.clone(), widen, None)
        .unwrap();
    let selector = g.lambda(&types, vec![x], square).unwrap();
    let projected = g
        .call(&types, None, select, vec![g.param_ref(xs).unwrap(), selector])
        .unwrap();
    let total = g.call(&types, None, sum, vec![projected]).unwrap();
    let lambda = g.lambda(&types, vec![xs], total).unwrap();
    let tree = g.finish(lambda);

    let options = DecodeOptions::default().allow_static_type(e);
    let input = Value::list([Value::Int32(1), Value::Int32(2), Value::Int32(100_000)]);
    let value = assert_same_behavior(&types, &tree, &options, vec![input]);
    assert_eq!(value, Value::Int64(1 + 4 + 10_000_000_000));
}

#[test]
fn instance_calls_on_strings_roundtrip() {
    let types = TypeRegistry::with_std();
    let string = TypeRef::STRING;
    let to_upper = method(&types, &string, "ToUpper", &[], &[]);
    let substring = method(&types, &string, "Substring", &[], &[TypeRef::INT32, TypeRef::INT32]);

    let mut g = ExprGraph::new();
    let s = g.parameter(string.clone(), "s");
    let upper = g.call(&types, Some(g.param_ref(s).unwrap()), to_upper, vec![]).unwrap();
    let head = g
        .call(
            &types,
            Some(upper),
            substring,
            vec![g.literal(ConstValue::Int32(0)), g.literal(ConstValue::Int32(3))],
        )
        .unwrap();
    let lambda = g.lambda(&types, vec![s], head).unwrap();
    let tree = g.finish(lambda);

    let options = DecodeOptions::default().allow_instance_type(string);
    let value = assert_same_behavior(&types, &tree, &options, vec![Value::String("treewire".into())]);
    assert_eq!(value, Value::String("TRE".into()));
}

#[test]
fn math_call_on_core_type() {
    let types = TypeRegistry::with_std();
    let math = TypeRef::simple(types.lookup("System.Math", CORE_MODULE).unwrap());
    let abs = method(&types, &math, "Abs", &[], &[TypeRef::INT32]);

    let mut g = ExprGraph::new();
    let x = g.parameter(TypeRef::INT32, "x");
    let call = g.call(&types, None, abs.clone(), vec![g.param_ref(x).unwrap()]).unwrap();
    let lambda = g.lambda(&types, vec![x], call).unwrap();
    let tree = g.finish(lambda);

    let options = DecodeOptions::default().allow_method(abs);
    assert_eq!(
        assert_same_behavior(&types, &tree, &options, vec![Value::Int32(-7)]),
        Value::Int32(7)
    );
    let back = through_json(&types, &tree, &options);
    assert!(matches!(
        run(&types, &back, vec![Value::Int32(i32::MIN)]),
        Err(RuntimeError::IntegerOverflow { .. })
    ));
}
