//! Invokable values.
//!
//! A [`Callable`] is a script function, a native function, or a function
//! whose `this` has been fixed with [`Callable::bind`]. Every callable can
//! report its source text: script functions return the text they were read
//! from, natives return a `[native code]` stub, and bound functions report
//! their target's text.

use crate::error::{ReadError, RuntimeError};
use crate::input::read_function;
use crate::interp::Interpreter;
use crate::ir::Function;
use crate::promise::Promise;
use crate::realm::Realm;
use crate::scope::Scope;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// Signature of a native function: receiver and arguments.
pub type NativeFn = fn(&Value, &[Value]) -> Result<Value, RuntimeError>;

#[derive(Clone)]
pub struct Callable(Rc<Repr>);

enum Repr {
    Script(ScriptFunction),
    Native(NativeFunction),
    Bound { target: Callable, this: Value },
}

struct ScriptFunction {
    realm: Realm,
    function: Rc<Function>,
    closure: Scope,
    /// Arrows capture `this` where they are created.
    lexical_this: Option<Value>,
}

struct NativeFunction {
    name: &'static str,
    arity: usize,
    func: NativeFn,
    source: String,
}

impl Callable {
    /// Evaluate a single-function source in the realm's top-level scope.
    pub fn from_source(realm: &Realm, source: &str) -> Result<Callable, ReadError> {
        let function = read_function(source)?;
        let lexical_this = function.is_arrow.then(|| realm.global_object());
        Ok(Callable::script(
            realm.clone(),
            Rc::new(function),
            realm.global_scope(),
            lexical_this,
        ))
    }

    pub(crate) fn script(
        realm: Realm,
        function: Rc<Function>,
        closure: Scope,
        lexical_this: Option<Value>,
    ) -> Callable {
        Callable(Rc::new(Repr::Script(ScriptFunction {
            realm,
            function,
            closure,
            lexical_this,
        })))
    }

    pub fn native(name: &'static str, arity: usize, func: NativeFn) -> Callable {
        Callable(Rc::new(Repr::Native(NativeFunction {
            name,
            arity,
            func,
            source: format!("function {}() {{ [native code] }}", name),
        })))
    }

    /// A new callable whose `this` is always `this`, whatever the call site
    /// passes.
    pub fn bind(&self, this: Value) -> Callable {
        Callable(Rc::new(Repr::Bound {
            target: self.clone(),
            this,
        }))
    }

    pub fn source(&self) -> &str {
        match &*self.0 {
            Repr::Script(f) => &f.function.text,
            Repr::Native(f) => &f.source,
            Repr::Bound { target, .. } => target.source(),
        }
    }

    pub fn name(&self) -> &str {
        match &*self.0 {
            Repr::Script(f) => &f.function.name,
            Repr::Native(f) => f.name,
            Repr::Bound { target, .. } => target.name(),
        }
    }

    /// Declared parameter count.
    pub fn arity(&self) -> usize {
        match &*self.0 {
            Repr::Script(f) => f.function.params.len(),
            Repr::Native(f) => f.arity,
            Repr::Bound { target, .. } => target.arity(),
        }
    }

    pub fn is_async(&self) -> bool {
        match &*self.0 {
            Repr::Script(f) => f.function.is_async,
            Repr::Native(_) => false,
            Repr::Bound { target, .. } => target.is_async(),
        }
    }

    pub fn is_generator(&self) -> bool {
        match &*self.0 {
            Repr::Script(f) => f.function.is_generator,
            Repr::Native(_) => false,
            Repr::Bound { target, .. } => target.is_generator(),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(&*self.0, Repr::Bound { .. })
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Call with an explicit receiver.
    pub fn call(&self, this: Value, args: &[Value]) -> Result<Value, RuntimeError> {
        match &*self.0 {
            Repr::Native(f) => (f.func)(&this, args),
            Repr::Bound { target, this } => target.call(this.clone(), args),
            Repr::Script(f) => self.call_script(f, this, args),
        }
    }

    /// Call as a plain function (`f(...)`), with an undefined receiver.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        self.call(Value::Undefined, args)
    }

    fn call_script(
        &self,
        f: &ScriptFunction,
        this: Value,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        if f.function.is_generator {
            return Err(RuntimeError::Unsupported(format!(
                "generator function '{}' cannot be invoked",
                f.function.name
            )));
        }

        let this = f.lexical_this.clone().unwrap_or(this);
        if f.function.is_async {
            let callee = self.clone();
            let args = args.to_vec();
            let promise = Promise::deferred(move || callee.run_body(this, &args));
            return Ok(Value::Promise(promise));
        }
        self.run_body(this, args)
    }

    fn run_body(&self, this: Value, args: &[Value]) -> Result<Value, RuntimeError> {
        let Repr::Script(f) = &*self.0 else {
            return self.call(this, args);
        };

        let _depth = f.realm.enter()?;
        let scope = f.closure.child();
        let function = &f.function;

        // Named function expressions can refer to themselves.
        if !function.name.is_empty() && !function.is_arrow {
            scope.declare(function.name.clone(), Value::Function(self.clone()), true);
        }
        for (i, param) in function.params.iter().enumerate() {
            scope.declare(param.clone(), args.get(i).cloned().unwrap_or_default(), true);
        }

        Interpreter::new(&f.realm, this, function.is_async).run_function(&function.body, &scope)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.0 {
            Repr::Script(_) => "script",
            Repr::Native(_) => "native",
            Repr::Bound { .. } => "bound",
        };
        write!(f, "Callable({} {:?})", kind, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_source_keeps_text() {
        let realm = Realm::default();
        let source = "function add(a, b) {\n  return a + b;\n}";
        let add = Callable::from_source(&realm, source).unwrap();
        assert_eq!(add.source(), source);
        assert_eq!(add.name(), "add");
        assert_eq!(add.arity(), 2);
        assert_eq!(
            add.invoke(&[Value::from(2), Value::from(3)]).unwrap(),
            Value::from(5)
        );
    }

    #[test]
    fn test_missing_arguments_are_undefined() {
        let realm = Realm::default();
        let f = Callable::from_source(&realm, "function f(a, b) { return typeof b; }").unwrap();
        assert_eq!(f.invoke(&[Value::from(1)]).unwrap(), Value::from("undefined"));
    }

    #[test]
    fn test_plain_call_has_undefined_this() {
        let realm = Realm::default();
        let f = Callable::from_source(&realm, "function f() { return this; }").unwrap();
        assert_eq!(f.invoke(&[]).unwrap(), Value::Undefined);

        let receiver = Value::object_from([("k".to_string(), Value::from(1))]);
        assert_eq!(f.call(receiver.clone(), &[]).unwrap(), receiver);
    }

    #[test]
    fn test_bind_overrides_receiver() {
        let realm = Realm::default();
        let f = Callable::from_source(&realm, "function f() { return this; }").unwrap();
        let bound = f.bind(realm.global_object());
        assert!(bound.is_bound());
        assert_eq!(bound.source(), f.source());
        assert_eq!(
            bound.call(Value::from(1), &[]).unwrap(),
            realm.global_object()
        );
    }

    #[test]
    fn test_top_level_arrow_captures_global_this() {
        let realm = Realm::default();
        let f = Callable::from_source(&realm, "() => this").unwrap();
        assert_eq!(f.invoke(&[]).unwrap(), realm.global_object());
    }

    #[test]
    fn test_recursion_by_name() {
        let realm = Realm::default();
        let fact = Callable::from_source(
            &realm,
            "function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); }",
        )
        .unwrap();
        assert_eq!(fact.invoke(&[Value::from(5)]).unwrap(), Value::from(120));
    }

    #[test]
    fn test_generator_cannot_be_invoked() {
        let realm = Realm::default();
        let g = Callable::from_source(&realm, "function* g() { yield 1; }").unwrap();
        assert!(g.is_generator());
        assert!(matches!(g.invoke(&[]), Err(RuntimeError::Unsupported(_))));
    }

    #[test]
    fn test_async_call_returns_pending_promise() {
        let realm = Realm::default();
        let f = Callable::from_source(&realm, "async function f(x) { return x * 2; }").unwrap();
        let Value::Promise(promise) = f.invoke(&[Value::from(21)]).unwrap() else {
            panic!("expected a promise");
        };
        assert!(!promise.is_settled());
        assert_eq!(promise.settle().unwrap(), Value::from(42));
    }

    #[test]
    fn test_native_source_stub() {
        let f = Callable::native("max", 2, |_, _| Ok(Value::Undefined));
        assert_eq!(f.source(), "function max() { [native code] }");
    }
}
