//! Human-readable rendering of expression trees.
//!
//! The output is stable and parameter names are printed as declared, so two
//! structurally equal trees describe identically. Round-trip tests compare
//! trees through this form.

use std::fmt::Write;

use crate::expr::{Expr, ExprKind};
use crate::graph::{ExprGraph, ExprTree};
use crate::ops::NodeKind;
use crate::type_id::TypeRegistry;
use crate::types::ConstValue;

/// Renders `tree` as text, e.g. `p => (p.PropertyValue + 10)`.
pub fn describe(types: &TypeRegistry, tree: &ExprTree) -> String {
    let mut out = String::new();
    write_expr(&mut out, types, &tree.graph, &tree.root);
    out
}

fn write_expr(out: &mut String, types: &TypeRegistry, graph: &ExprGraph, expr: &Expr) {
    match &expr.kind {
        ExprKind::Binary {
            kind, left, right, ..
        } => {
            out.push('(');
            write_expr(out, types, graph, left);
            let sym = kind.symbol().unwrap_or("?");
            if kind.is_compound_assignment() {
                let _ = write!(out, " {}= ", sym);
            } else {
                let _ = write!(out, " {} ", sym);
            }
            write_expr(out, types, graph, right);
            out.push(')');
        }
        ExprKind::Unary { kind, operand } => {
            let (prefix, suffix) = match kind {
                NodeKind::Negate | NodeKind::NegateChecked => ("-", ""),
                NodeKind::UnaryPlus => ("+", ""),
                NodeKind::OnesComplement => ("~", ""),
                NodeKind::PreIncrementAssign => ("++", ""),
                NodeKind::PreDecrementAssign => ("--", ""),
                NodeKind::PostIncrementAssign => ("", "++"),
                NodeKind::PostDecrementAssign => ("", "--"),
                NodeKind::Convert | NodeKind::ConvertChecked => {
                    let _ = write!(out, "{}(", kind);
                    write_expr(out, types, graph, operand);
                    let _ = write!(out, ", {})", types.type_name(&expr.ty));
                    return;
                }
                _ => {
                    let _ = write!(out, "{}(", kind);
                    write_expr(out, types, graph, operand);
                    out.push(')');
                    return;
                }
            };
            out.push_str(prefix);
            write_expr(out, types, graph, operand);
            out.push_str(suffix);
        }
        ExprKind::Constant(value) => match value {
            ConstValue::Null => out.push_str("null"),
            ConstValue::String(s) => {
                let _ = write!(out, "\"{}\"", s);
            }
            ConstValue::Char(c) => {
                let _ = write!(out, "'{}'", c);
            }
            other => out.push_str(&other.to_text().unwrap_or_default()),
        },
        ExprKind::Member { expression, member } => {
            write_expr(out, types, graph, expression);
            let _ = write!(out, ".{}", member.name());
        }
        ExprKind::Parameter(id) => match graph.param(*id) {
            Some(p) => out.push_str(&p.name),
            None => {
                let _ = write!(out, "<param {}>", id);
            }
        },
        ExprKind::Lambda { parameters, body } => {
            let names: Vec<&str> = parameters
                .iter()
                .map(|id| graph.param(*id).map(|p| p.name.as_str()).unwrap_or("?"))
                .collect();
            if names.len() == 1 {
                out.push_str(names[0]);
            } else {
                let _ = write!(out, "({})", names.join(", "));
            }
            out.push_str(" => ");
            write_expr(out, types, graph, body);
        }
        ExprKind::Call {
            object,
            method,
            arguments,
        } => {
            match object {
                Some(obj) => write_expr(out, types, graph, obj),
                None => {
                    let declaring = method
                        .declaring
                        .def()
                        .and_then(|id| types.get(id))
                        .map(|def| def.display_name().to_string())
                        .unwrap_or_default();
                    out.push_str(&declaring);
                }
            }
            let name = types
                .get_method(method.method)
                .map(|m| m.name.as_str())
                .unwrap_or("?");
            let _ = write!(out, ".{}(", name);
            for (i, arg) in arguments.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, types, graph, arg);
            }
            out.push(')');
        }
    }
}
