//! Expression-tree interpreter.
//!
//! # Architecture
//!
//! - [`Interpreter`] walks an [`ExprTree`](treewire_core::ExprTree) and
//!   dispatches calls and computed properties to a [`Natives`](crate::Natives)
//!   table.
//! - [`Value`] is the runtime representation of all values.
//! - [`RuntimeError`] captures trap conditions (overflow, divide by zero,
//!   null dereference, ...) with the operator that raised them.
//!
//! # Usage
//!
//! ```ignore
//! let natives = std_natives(&types);
//! let mut interp = Interpreter::new(&types, &natives, InterpreterConfig::default());
//! let result = interp.invoke(&tree, vec![Value::Int32(3)])?;
//! ```

pub mod error;
pub(crate) mod eval;
pub mod state;
pub mod value;

pub use error::RuntimeError;
pub use state::{Interpreter, InterpreterConfig};
pub use value::{Closure, ObjectData, Value};
