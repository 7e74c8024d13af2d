//! Global bindings and the properties of primitive values.

use crate::callable::{Callable, NativeFn};
use crate::error::RuntimeError;
use crate::promise::Promise;
use crate::value::{Value, format_number};
use std::collections::BTreeMap;

/// Largest length an array may grow to. Well under the language maximum of
/// 2^32 - 1, so a single assignment cannot exhaust memory.
pub const MAX_ARRAY_LENGTH: usize = 1 << 22;

/// Reject a length above the language maximum or [`MAX_ARRAY_LENGTH`].
fn check_array_length(len: f64) -> Result<usize, RuntimeError> {
    if len < 0.0 || len.fract() != 0.0 || len.is_nan() || len > u32::MAX as f64 {
        return Err(RuntimeError::Range("Invalid array length".into()));
    }
    let len = len as usize;
    if len > MAX_ARRAY_LENGTH {
        return Err(RuntimeError::Range(format!(
            "Array length {} exceeds the limit of {}",
            len, MAX_ARRAY_LENGTH
        )));
    }
    Ok(len)
}

/// Populate a fresh global object.
pub(crate) fn install(global: &mut BTreeMap<String, Value>) {
    global.insert("undefined".into(), Value::Undefined);
    global.insert("NaN".into(), Value::Number(f64::NAN));
    global.insert("Infinity".into(), Value::Number(f64::INFINITY));

    global.insert("parseInt".into(), native("parseInt", 2, parse_int));
    global.insert("parseFloat".into(), native("parseFloat", 1, parse_float));
    global.insert("isNaN".into(), native("isNaN", 1, is_nan));

    global.insert(
        "Math".into(),
        namespace([
            ("PI", Value::Number(std::f64::consts::PI)),
            ("E", Value::Number(std::f64::consts::E)),
            ("abs", native("abs", 1, |_, a| unary_math(a, f64::abs))),
            ("floor", native("floor", 1, |_, a| unary_math(a, f64::floor))),
            ("ceil", native("ceil", 1, |_, a| unary_math(a, f64::ceil))),
            ("round", native("round", 1, |_, a| unary_math(a, js_round))),
            ("sqrt", native("sqrt", 1, |_, a| unary_math(a, f64::sqrt))),
            ("trunc", native("trunc", 1, |_, a| unary_math(a, f64::trunc))),
            ("sign", native("sign", 1, |_, a| unary_math(a, js_sign))),
            ("pow", native("pow", 2, math_pow)),
            ("max", native("max", 2, math_max)),
            ("min", native("min", 2, math_min)),
        ]),
    );

    global.insert(
        "Promise".into(),
        namespace([
            ("resolve", native("resolve", 1, promise_resolve)),
            ("reject", native("reject", 1, promise_reject)),
        ]),
    );

    global.insert(
        "Array".into(),
        namespace([("isArray", native("isArray", 1, |_, a| {
            Ok(Value::Bool(matches!(arg(a, 0), Value::Array(_))))
        }))]),
    );

    global.insert(
        "console".into(),
        namespace([("log", native("log", 0, console_log))]),
    );
}

fn native(name: &'static str, arity: usize, func: NativeFn) -> Value {
    Value::Function(Callable::native(name, arity, func))
}

fn namespace<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::object_from(entries.into_iter().map(|(k, v)| (k.to_string(), v)))
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

/// Read `key` from `target` (`target.key` / `target[key]`).
pub(crate) fn get_property(target: &Value, key: &str) -> Result<Value, RuntimeError> {
    match target {
        Value::Undefined | Value::Null => Err(RuntimeError::Type(format!(
            "Cannot read properties of {} (reading '{}')",
            target, key
        ))),
        Value::Object(entries) => Ok(entries.borrow().get(key).cloned().unwrap_or_default()),
        Value::Array(items) => {
            if key == "length" {
                return Ok(Value::from(items.borrow().len() as f64));
            }
            if let Some(index) = array_index(key) {
                return Ok(items.borrow().get(index).cloned().unwrap_or_default());
            }
            Ok(array_method(key).unwrap_or_default())
        }
        Value::String(s) => {
            if key == "length" {
                return Ok(Value::from(s.encode_utf16().count() as f64));
            }
            if let Some(index) = array_index(key) {
                return Ok(s
                    .chars()
                    .nth(index)
                    .map(|c| Value::from(c.to_string()))
                    .unwrap_or_default());
            }
            Ok(string_method(key).unwrap_or_default())
        }
        Value::Function(f) => Ok(match key {
            "name" => Value::from(f.name()),
            "length" => Value::from(f.arity() as f64),
            _ => Value::Undefined,
        }),
        Value::Bool(_) | Value::Number(_) | Value::Promise(_) => Ok(Value::Undefined),
    }
}

/// Write `key` on `target` (`target.key = value`).
pub(crate) fn set_property(target: &Value, key: &str, value: Value) -> Result<(), RuntimeError> {
    match target {
        Value::Object(entries) => {
            entries.borrow_mut().insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            if key == "length" {
                let len = check_array_length(value.to_number())?;
                items.resize(len, Value::Undefined);
                return Ok(());
            }
            let Some(index) = array_index(key) else {
                return Err(RuntimeError::Unsupported(format!(
                    "non-index array property '{}'",
                    key
                )));
            };
            if index >= items.len() {
                let len = check_array_length(index as f64 + 1.0)?;
                items.resize(len, Value::Undefined);
            }
            items[index] = value;
            Ok(())
        }
        other => Err(RuntimeError::Type(format!(
            "Cannot set properties of {} (setting '{}')",
            describe(other),
            key
        ))),
    }
}

/// Elements visited by `for…of`.
pub(crate) fn iterate(value: &Value) -> Result<Vec<Value>, RuntimeError> {
    match value {
        Value::Array(items) => Ok(items.borrow().clone()),
        Value::String(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
        other => Err(RuntimeError::Type(format!(
            "{} is not iterable",
            describe(other)
        ))),
    }
}

/// Short description for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
        Value::Function(f) if f.name().is_empty() => "anonymous function".to_string(),
        Value::Function(f) => format!("function {}", f.name()),
        other => other.to_string(),
    }
}

fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok()
}

// ----- globals -----

fn parse_int(_: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let text = arg(args, 0).to_string();
    let text = text.trim_start();
    // 0 means "detect": hex with a 0x prefix, decimal otherwise.
    let radix = match arg(args, 1) {
        Value::Undefined => 0,
        r => r.to_number() as u32,
    };
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) if radix == 0 || radix == 16 => (16, hex),
        _ if radix == 0 => (10, digits),
        _ => (radix, digits),
    };
    if !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    let digits: String = digits.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return Ok(Value::Number(f64::NAN));
    }
    let magnitude = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    Ok(Value::Number(if negative { -magnitude } else { magnitude }))
}

fn parse_float(_: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let text = arg(args, 0).to_string();
    let text = text.trim_start();
    if text.starts_with("Infinity") || text.starts_with("+Infinity") {
        return Ok(Value::Number(f64::INFINITY));
    }
    if text.starts_with("-Infinity") {
        return Ok(Value::Number(f64::NEG_INFINITY));
    }
    // Longest prefix that parses as a decimal literal.
    let end = text
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    let parsed = (1..=end)
        .rev()
        .filter(|&i| text.is_char_boundary(i))
        .find_map(|i| text[..i].parse::<f64>().ok());
    Ok(Value::Number(parsed.unwrap_or(f64::NAN)))
}

fn is_nan(_: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(arg(args, 0).to_number().is_nan()))
}

fn console_log(_: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let line = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(target: "pureform_script::console", "{}", line);
    Ok(Value::Undefined)
}

fn promise_resolve(_: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(match arg(args, 0) {
        Value::Promise(p) => Value::Promise(p),
        value => Value::Promise(Promise::resolved(value)),
    })
}

fn promise_reject(_: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Promise(Promise::rejected(RuntimeError::Thrown(arg(
        args, 0,
    )))))
}

// ----- Math -----

fn unary_math(args: &[Value], op: fn(f64) -> f64) -> Result<Value, RuntimeError> {
    Ok(Value::Number(op(arg(args, 0).to_number())))
}

/// Rounds half up, unlike `f64::round`.
fn js_round(n: f64) -> f64 {
    (n + 0.5).floor()
}

fn js_sign(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 { n } else { n.signum() }
}

fn math_pow(_: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(
        arg(args, 0).to_number().powf(arg(args, 1).to_number()),
    ))
}

fn math_max(_: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut best = f64::NEG_INFINITY;
    for n in args.iter().map(Value::to_number) {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        best = best.max(n);
    }
    Ok(Value::Number(best))
}

fn math_min(_: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut best = f64::INFINITY;
    for n in args.iter().map(Value::to_number) {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        best = best.min(n);
    }
    Ok(Value::Number(best))
}

// ----- Array.prototype -----

fn array_method(name: &str) -> Option<Value> {
    let (name, arity, func): (&'static str, usize, NativeFn) = match name {
        "push" => ("push", 1, array_push),
        "map" => ("map", 1, array_map),
        "filter" => ("filter", 1, array_filter),
        "forEach" => ("forEach", 1, array_for_each),
        "reduce" => ("reduce", 1, array_reduce),
        "join" => ("join", 1, array_join),
        "includes" => ("includes", 1, array_includes),
        "indexOf" => ("indexOf", 1, array_index_of),
        "slice" => ("slice", 2, array_slice),
        "concat" => ("concat", 1, array_concat),
        _ => return None,
    };
    Some(native(name, arity, func))
}

fn this_array(this: &Value, method: &str) -> Result<Vec<Value>, RuntimeError> {
    match this {
        Value::Array(items) => Ok(items.borrow().clone()),
        _ => Err(RuntimeError::Type(format!(
            "Array.prototype.{} called on {}",
            method,
            describe(this)
        ))),
    }
}

fn callback(args: &[Value], method: &str) -> Result<Callable, RuntimeError> {
    match args.first() {
        Some(Value::Function(f)) => Ok(f.clone()),
        other => Err(RuntimeError::Type(format!(
            "{} is not a function (in {})",
            describe(other.unwrap_or(&Value::Undefined)),
            method
        ))),
    }
}

fn array_push(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let Value::Array(items) = this else {
        return Err(RuntimeError::Type(format!(
            "Array.prototype.push called on {}",
            describe(this)
        )));
    };
    let mut items = items.borrow_mut();
    check_array_length((items.len() + args.len()) as f64)?;
    items.extend(args.iter().cloned());
    Ok(Value::from(items.len() as f64))
}

fn array_map(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let f = callback(args, "map")?;
    let items = this_array(this, "map")?;
    let mapped = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| f.invoke(&[item, Value::from(i as f64), this.clone()]))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::array(mapped))
}

fn array_filter(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let f = callback(args, "filter")?;
    let mut kept = Vec::new();
    for (i, item) in this_array(this, "filter")?.into_iter().enumerate() {
        if f.invoke(&[item.clone(), Value::from(i as f64), this.clone()])?
            .is_truthy()
        {
            kept.push(item);
        }
    }
    Ok(Value::array(kept))
}

fn array_for_each(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let f = callback(args, "forEach")?;
    for (i, item) in this_array(this, "forEach")?.into_iter().enumerate() {
        f.invoke(&[item, Value::from(i as f64), this.clone()])?;
    }
    Ok(Value::Undefined)
}

fn array_reduce(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let f = callback(args, "reduce")?;
    let items = this_array(this, "reduce")?;
    let mut iter = items.into_iter().enumerate();
    let mut acc = match args.get(1) {
        Some(init) => init.clone(),
        None => match iter.next() {
            Some((_, first)) => first,
            None => {
                return Err(RuntimeError::Type(
                    "Reduce of empty array with no initial value".into(),
                ));
            }
        },
    };
    for (i, item) in iter {
        acc = f.invoke(&[acc, item, Value::from(i as f64), this.clone()])?;
    }
    Ok(acc)
}

fn array_join(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let separator = match arg(args, 0) {
        Value::Undefined => ",".to_string(),
        sep => sep.to_string(),
    };
    let joined = this_array(this, "join")?
        .iter()
        .map(|item| {
            if item.is_nullish() {
                String::new()
            } else {
                item.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(&separator);
    Ok(Value::from(joined))
}

/// SameValueZero: like `===` but NaN matches NaN.
fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a.strict_equals(b),
    }
}

fn array_includes(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let needle = arg(args, 0);
    Ok(Value::Bool(
        this_array(this, "includes")?
            .iter()
            .any(|item| same_value_zero(item, &needle)),
    ))
}

fn array_index_of(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let needle = arg(args, 0);
    let position = this_array(this, "indexOf")?
        .iter()
        .position(|item| item.strict_equals(&needle));
    Ok(Value::from(position.map_or(-1.0, |i| i as f64)))
}

/// Resolve `slice(start, end)` arguments against a length.
fn slice_bounds(args: &[Value], len: usize) -> (usize, usize) {
    let resolve = |value: Value, default: usize| -> usize {
        if value == Value::Undefined {
            return default;
        }
        let n = value.to_number();
        let n = if n.is_nan() { 0.0 } else { n.trunc() };
        if n < 0.0 {
            (len as f64 + n).max(0.0) as usize
        } else {
            (n as usize).min(len)
        }
    };
    let start = resolve(arg(args, 0), 0);
    let end = resolve(arg(args, 1), len);
    (start, end.max(start))
}

fn array_slice(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = this_array(this, "slice")?;
    let (start, end) = slice_bounds(args, items.len());
    Ok(Value::array(items[start..end].to_vec()))
}

fn array_concat(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut items = this_array(this, "concat")?;
    let added: usize = args
        .iter()
        .map(|extra| match extra {
            Value::Array(more) => more.borrow().len(),
            _ => 1,
        })
        .sum();
    check_array_length((items.len() + added) as f64)?;
    for extra in args {
        match extra {
            Value::Array(more) => items.extend(more.borrow().iter().cloned()),
            other => items.push(other.clone()),
        }
    }
    Ok(Value::array(items))
}

// ----- String.prototype -----

fn string_method(name: &str) -> Option<Value> {
    let (name, arity, func): (&'static str, usize, NativeFn) = match name {
        "toUpperCase" => ("toUpperCase", 0, string_to_upper_case),
        "toLowerCase" => ("toLowerCase", 0, string_to_lower_case),
        "trim" => ("trim", 0, string_trim),
        "includes" => ("includes", 1, string_includes),
        "slice" => ("slice", 2, string_slice),
        "split" => ("split", 2, string_split),
        _ => return None,
    };
    Some(native(name, arity, func))
}

fn this_string(this: &Value, method: &str) -> Result<String, RuntimeError> {
    match this {
        Value::String(s) => Ok(s.to_string()),
        _ => Err(RuntimeError::Type(format!(
            "String.prototype.{} called on {}",
            method,
            describe(this)
        ))),
    }
}

fn string_to_upper_case(this: &Value, _: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from(this_string(this, "toUpperCase")?.to_uppercase()))
}

fn string_to_lower_case(this: &Value, _: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from(this_string(this, "toLowerCase")?.to_lowercase()))
}

fn string_trim(this: &Value, _: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from(this_string(this, "trim")?.trim()))
}

fn string_includes(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let needle = arg(args, 0).to_string();
    Ok(Value::Bool(this_string(this, "includes")?.contains(&needle)))
}

fn string_slice(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let chars: Vec<char> = this_string(this, "slice")?.chars().collect();
    let (start, end) = slice_bounds(args, chars.len());
    Ok(Value::from(chars[start..end].iter().collect::<String>()))
}

fn string_split(this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let s = this_string(this, "split")?;
    let parts: Vec<Value> = match arg(args, 0) {
        Value::Undefined => vec![Value::from(s)],
        sep => {
            let sep = sep.to_string();
            if sep.is_empty() {
                s.chars().map(|c| Value::from(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(Value::from).collect()
            }
        }
    };
    let parts = match arg(args, 1) {
        Value::Undefined => parts,
        limit => parts.into_iter().take(limit.to_number() as usize).collect(),
    };
    Ok(Value::array(parts))
}

/// Property key for a computed access (`obj[key]`).
pub(crate) fn property_key(key: &Value) -> String {
    match key {
        Value::Number(n) => format_number(*n),
        other => other.to_string(),
    }
}
