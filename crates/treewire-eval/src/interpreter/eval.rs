//! Per-operator evaluation over runtime values.
//!
//! Integer arithmetic is exact to the operand width. Unchecked operators
//! wrap, checked operators trap with [`RuntimeError::IntegerOverflow`], and
//! integer division traps on a zero divisor. Floats follow IEEE semantics.
//! Shift counts are masked to the operand width.

use treewire_core::{NodeKind, PrimitiveType};

use super::error::RuntimeError;
use super::value::Value;

// ---------------------------------------------------------------------------
// Integer helpers
// ---------------------------------------------------------------------------

/// Integer operations needed by the arithmetic operators.
trait IntArith: Copy + Eq {
    const ZERO: Self;
    const ONE: Self;
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;
    fn wrapping_neg(self) -> Self;
    fn checked_add(self, rhs: Self) -> Option<Self>;
    fn checked_sub(self, rhs: Self) -> Option<Self>;
    fn checked_mul(self, rhs: Self) -> Option<Self>;
    fn checked_div(self, rhs: Self) -> Option<Self>;
    fn checked_rem(self, rhs: Self) -> Option<Self>;
    fn checked_neg(self) -> Option<Self>;
    fn wrapping_shl(self, rhs: u32) -> Self;
    fn wrapping_shr(self, rhs: u32) -> Self;
}

macro_rules! impl_int_arith {
    ($($ty:ty),+) => {
        $(
            impl IntArith for $ty {
                const ZERO: Self = 0;
                const ONE: Self = 1;
                fn wrapping_add(self, rhs: Self) -> Self { self.wrapping_add(rhs) }
                fn wrapping_sub(self, rhs: Self) -> Self { self.wrapping_sub(rhs) }
                fn wrapping_mul(self, rhs: Self) -> Self { self.wrapping_mul(rhs) }
                fn wrapping_neg(self) -> Self { self.wrapping_neg() }
                fn checked_add(self, rhs: Self) -> Option<Self> { self.checked_add(rhs) }
                fn checked_sub(self, rhs: Self) -> Option<Self> { self.checked_sub(rhs) }
                fn checked_mul(self, rhs: Self) -> Option<Self> { self.checked_mul(rhs) }
                fn checked_div(self, rhs: Self) -> Option<Self> { self.checked_div(rhs) }
                fn checked_rem(self, rhs: Self) -> Option<Self> { self.checked_rem(rhs) }
                fn checked_neg(self) -> Option<Self> { self.checked_neg() }
                fn wrapping_shl(self, rhs: u32) -> Self { self.wrapping_shl(rhs) }
                fn wrapping_shr(self, rhs: u32) -> Self { self.wrapping_shr(rhs) }
            }
        )+
    }
}

impl_int_arith!(i8, u8, i16, u16, i32, u32, i64, u64);

fn int_arith<T: IntArith>(op: NodeKind, a: T, b: T) -> Result<T, RuntimeError> {
    let overflow = RuntimeError::IntegerOverflow { op };
    match op {
        NodeKind::Add => Ok(a.wrapping_add(b)),
        NodeKind::Subtract => Ok(a.wrapping_sub(b)),
        NodeKind::Multiply => Ok(a.wrapping_mul(b)),
        NodeKind::AddChecked => a.checked_add(b).ok_or(overflow),
        NodeKind::SubtractChecked => a.checked_sub(b).ok_or(overflow),
        NodeKind::MultiplyChecked => a.checked_mul(b).ok_or(overflow),
        // MIN / -1 has no representable result even when unchecked.
        NodeKind::Divide if b == T::ZERO => Err(RuntimeError::DivideByZero { op }),
        NodeKind::Divide => a.checked_div(b).ok_or(overflow),
        NodeKind::Modulo if b == T::ZERO => Err(RuntimeError::DivideByZero { op }),
        NodeKind::Modulo => a.checked_rem(b).ok_or(overflow),
        _ => Err(mismatch(op, "floating-point operands", "integers")),
    }
}

fn float_arith<T>(op: NodeKind, a: T, b: T, pow: fn(T, T) -> T) -> Result<T, RuntimeError>
where
    T: std::ops::Add<Output = T>
        + std::ops::Sub<Output = T>
        + std::ops::Mul<Output = T>
        + std::ops::Div<Output = T>
        + std::ops::Rem<Output = T>,
{
    Ok(match op {
        NodeKind::Add | NodeKind::AddChecked => a + b,
        NodeKind::Subtract | NodeKind::SubtractChecked => a - b,
        NodeKind::Multiply | NodeKind::MultiplyChecked => a * b,
        NodeKind::Divide => a / b,
        NodeKind::Modulo => a % b,
        NodeKind::Power => pow(a, b),
        _ => return Err(mismatch(op, "arithmetic operator", &format!("{}", op))),
    })
}

pub(crate) fn mismatch(op: NodeKind, expected: &str, got: &str) -> RuntimeError {
    RuntimeError::TypeMismatchAtRuntime {
        op,
        expected: expected.to_string(),
        got: got.to_string(),
    }
}

fn mismatch2(op: NodeKind, expected: &str, lhs: &Value, rhs: &Value) -> RuntimeError {
    mismatch(op, expected, &format!("{} and {}", lhs.type_name(), rhs.type_name()))
}

/// Applies `$body` to a pair of same-width integers, rewrapping the result.
macro_rules! int_pair {
    ($lhs:expr, $rhs:expr, |$a:ident, $b:ident| $body:expr, $fallback:expr) => {
        match ($lhs, $rhs) {
            (Value::SByte($a), Value::SByte($b)) => $body.map(Value::SByte),
            (Value::Byte($a), Value::Byte($b)) => $body.map(Value::Byte),
            (Value::Int16($a), Value::Int16($b)) => $body.map(Value::Int16),
            (Value::UInt16($a), Value::UInt16($b)) => $body.map(Value::UInt16),
            (Value::Int32($a), Value::Int32($b)) => $body.map(Value::Int32),
            (Value::UInt32($a), Value::UInt32($b)) => $body.map(Value::UInt32),
            (Value::Int64($a), Value::Int64($b)) => $body.map(Value::Int64),
            (Value::UInt64($a), Value::UInt64($b)) => $body.map(Value::UInt64),
            _ => $fallback,
        }
    };
}

/// Applies `$body` to one integer, rewrapping the result.
macro_rules! int_one {
    ($val:expr, |$a:ident| $body:expr, $fallback:expr) => {
        match $val {
            Value::SByte($a) => $body.map(Value::SByte),
            Value::Byte($a) => $body.map(Value::Byte),
            Value::Int16($a) => $body.map(Value::Int16),
            Value::UInt16($a) => $body.map(Value::UInt16),
            Value::Int32($a) => $body.map(Value::Int32),
            Value::UInt32($a) => $body.map(Value::UInt32),
            Value::Int64($a) => $body.map(Value::Int64),
            Value::UInt64($a) => $body.map(Value::UInt64),
            _ => $fallback,
        }
    };
}

// ---------------------------------------------------------------------------
// Binary operators
// ---------------------------------------------------------------------------

/// Evaluates a non-short-circuiting binary operator.
pub(crate) fn eval_binary(op: NodeKind, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    if op.is_arithmetic() {
        eval_arith(op, lhs, rhs)
    } else if op.is_bitwise() {
        eval_bitwise(op, lhs, rhs)
    } else if op.is_shift() {
        eval_shift(op, lhs, rhs)
    } else if op.is_comparison() {
        eval_compare(op, lhs, rhs)
    } else {
        Err(RuntimeError::InternalError {
            message: format!("{} is not a value operator", op),
        })
    }
}

fn eval_arith(op: NodeKind, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Single(a), Value::Single(b)) => float_arith(op, *a, *b, f32::powf).map(Value::Single),
        (Value::Double(a), Value::Double(b)) => float_arith(op, *a, *b, f64::powf).map(Value::Double),
        _ => int_pair!(lhs, rhs, |a, b| int_arith(op, *a, *b), {
            Err(mismatch2(op, "matching numeric types", lhs, rhs))
        }),
    }
}

fn eval_bitwise(op: NodeKind, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    if let (Value::Boolean(a), Value::Boolean(b)) = (lhs, rhs) {
        return Ok(Value::Boolean(match op {
            NodeKind::And => a & b,
            NodeKind::Or => a | b,
            _ => a ^ b,
        }));
    }
    macro_rules! bits {
        ($a:ident, $b:ident) => {
            Ok::<_, RuntimeError>(match op {
                NodeKind::And => *$a & *$b,
                NodeKind::Or => *$a | *$b,
                _ => *$a ^ *$b,
            })
        };
    }
    int_pair!(lhs, rhs, |a, b| bits!(a, b), {
        Err(mismatch2(op, "matching integer or boolean types", lhs, rhs))
    })
}

fn eval_shift(op: NodeKind, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    let Value::Int32(count) = rhs else {
        return Err(mismatch(op, "Int32 shift count", rhs.type_name()));
    };
    let count = *count as u32;
    int_one!(lhs, |a| {
        Ok::<_, RuntimeError>(if op == NodeKind::LeftShift {
            IntArith::wrapping_shl(*a, count)
        } else {
            IntArith::wrapping_shr(*a, count)
        })
    }, Err(mismatch(op, "integer", lhs.type_name())))
}

fn eval_compare(op: NodeKind, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    if matches!(op, NodeKind::Equal | NodeKind::NotEqual) {
        let eq = lhs == rhs;
        return Ok(Value::Boolean(if op == NodeKind::Equal { eq } else { !eq }));
    }
    macro_rules! ord {
        ($a:expr, $b:expr) => {
            match op {
                NodeKind::LessThan => $a < $b,
                NodeKind::LessThanOrEqual => $a <= $b,
                NodeKind::GreaterThan => $a > $b,
                _ => $a >= $b,
            }
        };
    }
    let result = match (lhs, rhs) {
        (Value::Char(a), Value::Char(b)) => ord!(a, b),
        (Value::SByte(a), Value::SByte(b)) => ord!(a, b),
        (Value::Byte(a), Value::Byte(b)) => ord!(a, b),
        (Value::Int16(a), Value::Int16(b)) => ord!(a, b),
        (Value::UInt16(a), Value::UInt16(b)) => ord!(a, b),
        (Value::Int32(a), Value::Int32(b)) => ord!(a, b),
        (Value::UInt32(a), Value::UInt32(b)) => ord!(a, b),
        (Value::Int64(a), Value::Int64(b)) => ord!(a, b),
        (Value::UInt64(a), Value::UInt64(b)) => ord!(a, b),
        (Value::Single(a), Value::Single(b)) => ord!(a, b),
        (Value::Double(a), Value::Double(b)) => ord!(a, b),
        // Lifted comparisons with a missing operand are false.
        (Value::Null, _) | (_, Value::Null) => false,
        _ => return Err(mismatch2(op, "matching comparable types", lhs, rhs)),
    };
    Ok(Value::Boolean(result))
}

// ---------------------------------------------------------------------------
// Unary operators
// ---------------------------------------------------------------------------

/// Evaluates a unary operator that does not write back.
pub(crate) fn eval_unary(op: NodeKind, val: &Value) -> Result<Value, RuntimeError> {
    let not_defined = || mismatch(op, "operand supported by the operator", val.type_name());
    match op {
        NodeKind::UnaryPlus => Ok(val.clone()),
        NodeKind::Negate | NodeKind::NegateChecked => match val {
            Value::Single(v) => Ok(Value::Single(-v)),
            Value::Double(v) => Ok(Value::Double(-v)),
            _ if op == NodeKind::Negate => int_one!(val, |a| Ok::<_, RuntimeError>(IntArith::wrapping_neg(*a)), Err(not_defined())),
            _ => int_one!(val, |a| IntArith::checked_neg(*a).ok_or(RuntimeError::IntegerOverflow { op }), Err(not_defined())),
        },
        NodeKind::Not => match val {
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            _ => int_one!(val, |a| Ok::<_, RuntimeError>(!*a), Err(not_defined())),
        },
        NodeKind::OnesComplement => int_one!(val, |a| Ok::<_, RuntimeError>(!*a), Err(not_defined())),
        NodeKind::IsTrue | NodeKind::IsFalse => match val {
            Value::Boolean(b) => Ok(Value::Boolean(*b == (op == NodeKind::IsTrue))),
            _ => Err(not_defined()),
        },
        NodeKind::Increment | NodeKind::PreIncrementAssign | NodeKind::PostIncrementAssign => step(op, val, true),
        NodeKind::Decrement | NodeKind::PreDecrementAssign | NodeKind::PostDecrementAssign => step(op, val, false),
        _ => Err(RuntimeError::InternalError {
            message: format!("{} is not a value operator", op),
        }),
    }
}

/// Adds or subtracts one, wrapping.
fn step(op: NodeKind, val: &Value, up: bool) -> Result<Value, RuntimeError> {
    match val {
        Value::Single(v) => Ok(Value::Single(if up { v + 1.0 } else { v - 1.0 })),
        Value::Double(v) => Ok(Value::Double(if up { v + 1.0 } else { v - 1.0 })),
        _ => int_one!(val, |a| Ok::<_, RuntimeError>(if up {
            IntArith::wrapping_add(*a, IntArith::ONE)
        } else {
            IntArith::wrapping_sub(*a, IntArith::ONE)
        }), Err(mismatch(op, "numeric operand", val.type_name()))),
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn as_i128(val: &Value) -> Option<i128> {
    Some(match val {
        Value::Char(c) => *c as u32 as i128,
        Value::SByte(v) => *v as i128,
        Value::Byte(v) => *v as i128,
        Value::Int16(v) => *v as i128,
        Value::UInt16(v) => *v as i128,
        Value::Int32(v) => *v as i128,
        Value::UInt32(v) => *v as i128,
        Value::Int64(v) => *v as i128,
        Value::UInt64(v) => *v as i128,
        _ => return None,
    })
}

fn as_f64(val: &Value) -> Option<f64> {
    match val {
        Value::Single(v) => Some(*v as f64),
        Value::Double(v) => Some(*v),
        _ => as_i128(val).map(|v| v as f64),
    }
}

/// Converts a scalar to primitive `to`.
///
/// Unchecked integer narrowing truncates; `checked` traps instead when the
/// value does not fit. Non-numeric targets are identity conversions.
pub(crate) fn convert(val: &Value, to: PrimitiveType, checked: bool) -> Result<Value, RuntimeError> {
    let op = if checked { NodeKind::ConvertChecked } else { NodeKind::Convert };
    let overflow = RuntimeError::IntegerOverflow { op };
    if matches!(val, Value::Null) || !(to.is_numeric() || to == PrimitiveType::Char) {
        return Ok(val.clone());
    }

    if to.is_float() {
        let v = as_f64(val).ok_or_else(|| mismatch(op, "numeric operand", val.type_name()))?;
        return Ok(match to {
            PrimitiveType::Single => Value::Single(v as f32),
            _ => Value::Double(v),
        });
    }

    // Integer or char target.
    let wide: i128 = match val {
        Value::Single(_) | Value::Double(_) => {
            let f = as_f64(val).unwrap_or(f64::NAN).trunc();
            if checked && !(f.is_finite() && f >= i128::MIN as f64 && f < i128::MAX as f64) {
                return Err(overflow);
            }
            f as i128
        }
        _ => as_i128(val).ok_or_else(|| mismatch(op, "numeric operand", val.type_name()))?,
    };

    macro_rules! narrow {
        ($ty:ty, $variant:ident) => {{
            if checked {
                <$ty>::try_from(wide).map(Value::$variant).map_err(|_| overflow)
            } else {
                Ok(Value::$variant(wide as $ty))
            }
        }};
    }
    match to {
        PrimitiveType::SByte => narrow!(i8, SByte),
        PrimitiveType::Byte => narrow!(u8, Byte),
        PrimitiveType::Int16 => narrow!(i16, Int16),
        PrimitiveType::UInt16 => narrow!(u16, UInt16),
        PrimitiveType::Int32 => narrow!(i32, Int32),
        PrimitiveType::UInt32 => narrow!(u32, UInt32),
        PrimitiveType::Int64 => narrow!(i64, Int64),
        PrimitiveType::UInt64 => narrow!(u64, UInt64),
        PrimitiveType::Char => {
            let code = if checked {
                u16::try_from(wide).map_err(|_| overflow)?
            } else {
                wide as u16
            };
            char::from_u32(code as u32)
                .map(Value::Char)
                .ok_or_else(|| RuntimeError::InvalidOperation {
                    message: format!("{} is not a valid char", code),
                })
        }
        _ => Ok(val.clone()),
    }
}
