//! Errors raised while reading or running scripts.

use crate::value::Value;

/// Error that can occur when reading source code into IR.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported syntax: {0}")]
    Unsupported(String),

    #[error("expected {expected}, got {got}")]
    UnexpectedNode { expected: String, got: String },
}

/// Error raised while evaluating a script.
///
/// `Thrown` carries a value raised by a `throw` statement; the other variants
/// correspond to the engine's own error classes and become error objects when
/// caught by a `catch` clause.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("uncaught exception: {0}")]
    Thrown(Value),

    #[error("ReferenceError: {0}")]
    Reference(String),

    #[error("TypeError: {0}")]
    Type(String),

    #[error("RangeError: {0}")]
    Range(String),

    #[error("unsupported at runtime: {0}")]
    Unsupported(String),
}

/// Either stage of evaluating source text.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScriptError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl RuntimeError {
    /// The value a `catch` clause binds for this error.
    pub fn into_value(self) -> Value {
        let (name, message) = match self {
            RuntimeError::Thrown(value) => return value,
            RuntimeError::Reference(message) => ("ReferenceError", message),
            RuntimeError::Type(message) => ("TypeError", message),
            RuntimeError::Range(message) => ("RangeError", message),
            RuntimeError::Unsupported(message) => ("Error", message),
        };
        Value::object_from([
            ("name".to_string(), Value::from(name)),
            ("message".to_string(), Value::from(message)),
        ])
    }
}
