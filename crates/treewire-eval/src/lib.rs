//! Host executor for treewire expression trees.
//!
//! The [`Interpreter`] walks an [`ExprTree`](treewire_core::ExprTree)
//! directly, with width-exact integer semantics: unchecked operators wrap,
//! checked operators trap on overflow. Method calls dispatch to a
//! [`Natives`] table; [`std_natives`] covers the commonly used standard
//! library members.

pub mod interpreter;
pub mod natives;

pub use interpreter::{Interpreter, InterpreterConfig, ObjectData, RuntimeError, Value};
pub use natives::{std_natives, NativeCall, NativeFn, NativeGetter, Natives};
