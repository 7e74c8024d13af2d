//! Runtime values.

use crate::callable::Callable;
use crate::error::RuntimeError;
use crate::promise::Promise;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
pub type ObjectRef = Rc<RefCell<BTreeMap<String, Value>>>;

/// A script value.
///
/// Arrays, objects, functions and promises are reference types: cloning a
/// `Value` clones the handle, not the contents.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(ArrayRef),
    Object(ObjectRef),
    Function(Callable),
    Promise(Promise),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object_from(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Object(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    /// Result of the `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Promise(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Promise(_) => true,
        }
    }

    /// Numeric conversion (`Number(v)`).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(items) => {
                let items = items.borrow();
                match items.as_slice() {
                    [] => 0.0,
                    [single] => single.to_number(),
                    _ => f64::NAN,
                }
            }
            Value::Object(_) | Value::Function(_) | Value::Promise(_) => f64::NAN,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The `===` operator.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Promise(a), Value::Promise(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// The `==` operator, restricted to primitive coercions.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_) | Value::Bool(_))
            | (Value::String(_) | Value::Bool(_), Value::Number(_))
            | (Value::String(_), Value::Bool(_))
            | (Value::Bool(_), Value::String(_)) => self.to_number() == other.to_number(),
            _ => self.strict_equals(other),
        }
    }

    /// Convert to JSON. Values with no JSON form become `null`; an array or
    /// object that contains itself is a `TypeError`.
    pub fn to_json(&self) -> Result<serde_json::Value, RuntimeError> {
        self.to_json_in(&mut Vec::new())
    }

    /// `open` holds the containers currently being converted.
    fn to_json_in(&self, open: &mut Vec<*const ()>) -> Result<serde_json::Value, RuntimeError> {
        let json = match self {
            Value::Undefined | Value::Null | Value::Function(_) | Value::Promise(_) => {
                serde_json::Value::Null
            }
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(items) => {
                enter(open, Rc::as_ptr(items).cast())?;
                let converted = items
                    .borrow()
                    .iter()
                    .map(|item| item.to_json_in(open))
                    .collect::<Result<Vec<_>, RuntimeError>>()?;
                open.pop();
                serde_json::Value::Array(converted)
            }
            Value::Object(entries) => {
                enter(open, Rc::as_ptr(entries).cast())?;
                let converted = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| v.to_json_in(open).map(|json| (k.clone(), json)))
                    .collect::<Result<serde_json::Map<_, _>, RuntimeError>>()?;
                open.pop();
                serde_json::Value::Object(converted)
            }
        };
        Ok(json)
    }

    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(items) => {
                Value::array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::object_from(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v))),
            ),
        }
    }
}

/// Strict equality, so `NaN != NaN` and reference types compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_in(f, &mut Vec::new())
    }
}

impl Value {
    /// An array nested inside itself prints as empty, as `join` does.
    fn display_in(&self, f: &mut fmt::Formatter<'_>, open: &mut Vec<*const ()>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                let ptr: *const () = Rc::as_ptr(items).cast();
                if open.contains(&ptr) {
                    return Ok(());
                }
                open.push(ptr);
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        item.display_in(f, open)?;
                    }
                }
                open.pop();
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Function(callable) => f.write_str(callable.source()),
            Value::Promise(_) => f.write_str("[object Promise]"),
        }
    }
}

fn enter(open: &mut Vec<*const ()>, ptr: *const ()) -> Result<(), RuntimeError> {
    if open.contains(&ptr) {
        return Err(RuntimeError::Type(
            "Converting circular structure to JSON".into(),
        ));
    }
    open.push(ptr);
    Ok(())
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Callable> for Value {
    fn from(callable: Callable) -> Self {
        Value::Function(callable)
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::Promise(promise)
    }
}

pub(crate) fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf" and "nan"; the language does not.
        t if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        t => t.parse().unwrap_or(f64::NAN),
    }
}

/// Format a number the way the language prints it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        // Covers -0.
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn test_number_conversion() {
        assert_eq!(Value::from(" 42 ").to_number(), 42.0);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert!(Value::from("inf").to_number().is_nan());
        assert_eq!(Value::from("-Infinity").to_number(), f64::NEG_INFINITY);
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert!(Value::Undefined.to_number().is_nan());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_equality() {
        assert!(Value::from(1).strict_equals(&Value::from(1.0)));
        assert!(!Value::from(1).strict_equals(&Value::from("1")));
        assert!(Value::from(1).loose_equals(&Value::from("1")));
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.loose_equals(&Value::from(0)));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));

        let a = Value::array(vec![]);
        assert_eq!(a, a.clone());
        assert_ne!(a, Value::array(vec![]));
    }

    #[test]
    fn test_display_array() {
        let v = Value::array(vec![Value::from(1), Value::Null, Value::from("x")]);
        assert_eq!(v.to_string(), "1,,x");
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"a": [1, 2.5, "x", null, true]});
        let value = Value::from_json(&json);
        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn test_self_referential_array_display() {
        let a = Value::array(vec![Value::from(1)]);
        let Value::Array(items) = &a else { unreachable!() };
        items.borrow_mut().push(a.clone());
        assert_eq!(a.to_string(), "1,");

        // Shared but acyclic references print in full.
        let inner = Value::array(vec![Value::from(2)]);
        let outer = Value::array(vec![inner.clone(), inner]);
        assert_eq!(outer.to_string(), "2,2");
    }

    #[test]
    fn test_circular_json_is_a_type_error() {
        let o = Value::object_from([("n".to_string(), Value::from(1))]);
        let Value::Object(entries) = &o else { unreachable!() };
        entries
            .borrow_mut()
            .insert("me".into(), Value::array(vec![o.clone()]));
        assert!(matches!(o.to_json(), Err(RuntimeError::Type(msg)) if msg.contains("circular")));

        let shared = Value::array(vec![Value::from(1)]);
        let twice = Value::array(vec![shared.clone(), shared]);
        assert_eq!(twice.to_json().unwrap(), serde_json::json!([[1], [1]]));
    }
}
