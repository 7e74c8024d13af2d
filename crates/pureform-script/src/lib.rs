//! Embedded script host for `pureform`.
//!
//! `pureform-script` runs a small JavaScript subset: enough for callables to
//! be real, invokable values whose source text can be recovered, inspected and
//! rebuilt.
//!
//! # Architecture
//!
//! ```text
//! source ──> input::javascript ──> ir::Program ──> interp ──> Value
//!            (tree-sitter)                         (Realm, Scope)
//! ```
//!
//! # Example
//!
//! ```
//! use pureform_script::{Realm, Value};
//!
//! let realm = Realm::default();
//! let add = realm.function("function add(a, b) { return a + b; }").unwrap();
//! assert_eq!(add.invoke(&[Value::from(1), Value::from(2)]).unwrap(), Value::from(3));
//! assert_eq!(add.source(), "function add(a, b) { return a + b; }");
//! ```
//!
//! Values are `Rc`-based: a realm and everything created in it stay on one
//! thread.

pub mod builtins;
pub mod callable;
pub mod error;
pub mod input;
pub mod interp;
pub mod ir;
pub mod promise;
pub mod realm;
pub mod registry;
pub mod scope;
pub mod traits;
pub mod value;

// Re-exports: IR types
pub use ir::{BinaryOp, Expr, Function, Literal, Program, Stmt, UnaryOp};

// Re-exports: Errors
pub use error::{ReadError, RuntimeError, ScriptError};

// Re-exports: Runtime
pub use callable::{Callable, NativeFn};
pub use promise::Promise;
pub use realm::{DEFAULT_MAX_CALL_DEPTH, Realm, RealmOptions};
pub use value::Value;

// Re-exports: Readers
pub use input::{FunctionShape, JavascriptReader, function_shape, read_function, read_javascript};
pub use registry::{reader_for_extension, reader_for_language, readers, register_reader};
pub use traits::Reader;
