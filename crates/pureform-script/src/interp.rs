//! Tree-walking evaluator over the IR.

use crate::builtins::{describe, get_property, iterate, property_key, set_property};
use crate::callable::Callable;
use crate::error::RuntimeError;
use crate::ir::{BinaryOp, Expr, Function, Literal, Stmt, UnaryOp};
use crate::realm::Realm;
use crate::scope::Scope;
use crate::value::Value;
use std::rc::Rc;

/// How a statement completed.
enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Evaluation state for one activation: the receiver and whether `await`
/// is allowed.
pub(crate) struct Interpreter<'r> {
    realm: &'r Realm,
    this: Value,
    is_async: bool,
}

impl<'r> Interpreter<'r> {
    pub(crate) fn new(realm: &'r Realm, this: Value, is_async: bool) -> Self {
        Self {
            realm,
            this,
            is_async,
        }
    }

    /// Run a function body and return its result.
    pub(crate) fn run_function(&self, body: &[Stmt], scope: &Scope) -> Result<Value, RuntimeError> {
        match self.exec_stmts(body, scope)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::Undefined),
        }
    }

    /// Run top-level statements directly in `scope`; the result is the
    /// value of the last expression statement.
    pub(crate) fn run_program(&self, body: &[Stmt], scope: &Scope) -> Result<Value, RuntimeError> {
        self.hoist(body, scope);
        let mut completion = Value::Undefined;
        for stmt in body {
            if let Stmt::Expr(expr) = stmt {
                completion = self.eval(expr, scope)?;
                continue;
            }
            match self.exec_stmt(stmt, scope)? {
                Flow::Normal => {}
                Flow::Return(value) => return Ok(value),
                Flow::Break | Flow::Continue => break,
            }
        }
        Ok(completion)
    }

    fn hoist(&self, stmts: &[Stmt], scope: &Scope) {
        for stmt in stmts {
            if let Stmt::Function(f) = stmt {
                scope.declare(f.name.clone(), self.closure(f, scope), true);
            }
        }
    }

    fn closure(&self, f: &Function, scope: &Scope) -> Value {
        let lexical_this = f.is_arrow.then(|| self.this.clone());
        Value::Function(Callable::script(
            self.realm.clone(),
            Rc::new(f.clone()),
            scope.clone(),
            lexical_this,
        ))
    }

    fn exec_stmts(&self, stmts: &[Stmt], scope: &Scope) -> Result<Flow, RuntimeError> {
        self.hoist(stmts, scope);
        for stmt in stmts {
            match self.exec_stmt(stmt, scope)? {
                Flow::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&self, stmt: &Stmt, scope: &Scope) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr, scope)?;
                Ok(Flow::Normal)
            }

            Stmt::Let {
                name,
                init,
                mutable,
            } => {
                let value = match init {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Undefined,
                };
                scope.declare(name.clone(), value, *mutable);
                Ok(Flow::Normal)
            }

            Stmt::Block(stmts) => self.exec_stmts(stmts, &scope.child()),

            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, scope)?.is_truthy() {
                    self.exec_stmt(consequent, scope)
                } else if let Some(alternate) = alternate {
                    self.exec_stmt(alternate, scope)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { test, body } => {
                while self.eval(test, scope)?.is_truthy() {
                    match self.exec_stmt(body, scope)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                let scope = scope.child();
                if let Some(init) = init {
                    self.exec_stmt(init, &scope)?;
                }
                loop {
                    if let Some(test) = test {
                        if !self.eval(test, &scope)?.is_truthy() {
                            break;
                        }
                    }
                    match self.exec_stmt(body, &scope)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                    if let Some(update) = update {
                        self.eval(update, &scope)?;
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::ForOf {
                variable,
                iterable,
                body,
            } => {
                let items = iterate(&self.eval(iterable, scope)?)?;
                for item in items {
                    let iteration = scope.child();
                    iteration.declare(variable.clone(), item, true);
                    match self.exec_stmt(body, &iteration)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),

            Stmt::Throw(expr) => Err(RuntimeError::Thrown(self.eval(expr, scope)?)),

            Stmt::TryCatch {
                body,
                catch_param,
                catch_body,
                finally_body,
            } => {
                let outcome = match (self.exec_stmt(body, scope), catch_body) {
                    (Err(err), Some(catch_body)) => {
                        let catch_scope = scope.child();
                        if let Some(param) = catch_param {
                            catch_scope.declare(param.clone(), err.into_value(), true);
                        }
                        self.exec_stmt(catch_body, &catch_scope)
                    }
                    (outcome, _) => outcome,
                };
                if let Some(finally_body) = finally_body {
                    // An abrupt finally overrides the try/catch outcome.
                    match self.exec_stmt(finally_body, scope)? {
                        Flow::Normal => {}
                        abrupt => return Ok(abrupt),
                    }
                }
                outcome
            }

            // Hoisted when the enclosing block was entered.
            Stmt::Function(_) => Ok(Flow::Normal),
        }
    }

    fn eval(&self, expr: &Expr, scope: &Scope) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::from(s.as_str()),
            }),

            Expr::Ident(name) => self.lookup(name, scope),

            Expr::This => Ok(self.this.clone()),

            Expr::Binary { left, op, right } => match op {
                BinaryOp::And => {
                    let left = self.eval(left, scope)?;
                    if left.is_truthy() {
                        self.eval(right, scope)
                    } else {
                        Ok(left)
                    }
                }
                BinaryOp::Or => {
                    let left = self.eval(left, scope)?;
                    if left.is_truthy() {
                        Ok(left)
                    } else {
                        self.eval(right, scope)
                    }
                }
                BinaryOp::Nullish => {
                    let left = self.eval(left, scope)?;
                    if left.is_nullish() {
                        self.eval(right, scope)
                    } else {
                        Ok(left)
                    }
                }
                op => {
                    let left = self.eval(left, scope)?;
                    let right = self.eval(right, scope)?;
                    Ok(binary(*op, &left, &right))
                }
            },

            Expr::Unary { op, expr } => {
                if let (UnaryOp::TypeOf, Expr::Ident(name)) = (op, expr.as_ref()) {
                    // `typeof` tolerates undeclared names.
                    return match self.lookup(name, scope) {
                        Ok(value) => Ok(Value::from(value.type_of())),
                        Err(RuntimeError::Reference(_)) => Ok(Value::from("undefined")),
                        Err(err) => Err(err),
                    };
                }
                let value = self.eval(expr, scope)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::TypeOf => Value::from(value.type_of()),
                })
            }

            Expr::Update { target, op, prefix } => {
                let old = self.eval(target, scope)?.to_number();
                let new = match op {
                    BinaryOp::Sub => old - 1.0,
                    _ => old + 1.0,
                };
                self.assign(target, Value::Number(new), scope)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }

            Expr::Call { callee, args } => {
                let (func, this) = match callee.as_ref() {
                    Expr::Member {
                        object,
                        property,
                        computed,
                    } => {
                        let object = self.eval(object, scope)?;
                        let key = self.key(property, *computed, scope)?;
                        (get_property(&object, &key)?, object)
                    }
                    other => (self.eval(other, scope)?, Value::Undefined),
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                match func {
                    Value::Function(f) => f.call(this, &args),
                    other => Err(RuntimeError::Type(format!(
                        "{} is not a function",
                        describe(&other)
                    ))),
                }
            }

            Expr::Member {
                object,
                property,
                computed,
            } => {
                let object = self.eval(object, scope)?;
                let key = self.key(property, *computed, scope)?;
                get_property(&object, &key)
            }

            Expr::Array(items) => Ok(Value::array(
                items
                    .iter()
                    .map(|item| self.eval(item, scope))
                    .collect::<Result<Vec<_>, _>>()?,
            )),

            Expr::Object(pairs) => {
                let mut entries = Vec::with_capacity(pairs.len());
                for (key, value) in pairs {
                    entries.push((key.clone(), self.eval(value, scope)?));
                }
                Ok(Value::object_from(entries))
            }

            Expr::Function(f) => Ok(self.closure(f, scope)),

            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, scope)?.is_truthy() {
                    self.eval(consequent, scope)
                } else {
                    self.eval(alternate, scope)
                }
            }

            Expr::Assign { target, value } => {
                let value = self.eval(value, scope)?;
                self.assign(target, value.clone(), scope)?;
                Ok(value)
            }

            Expr::Await(expr) => {
                if !self.is_async {
                    return Err(RuntimeError::Unsupported(
                        "await is only valid in async functions".into(),
                    ));
                }
                match self.eval(expr, scope)? {
                    Value::Promise(promise) => promise.settle(),
                    value => Ok(value),
                }
            }

            Expr::Yield(_) => Err(RuntimeError::Unsupported(
                "yield requires generator execution".into(),
            )),
        }
    }

    fn lookup(&self, name: &str, scope: &Scope) -> Result<Value, RuntimeError> {
        match scope.lookup(name) {
            Err(RuntimeError::Reference(_)) if name == "globalThis" => {
                Ok(self.realm.global_object())
            }
            result => result,
        }
    }

    fn key(&self, property: &Expr, computed: bool, scope: &Scope) -> Result<String, RuntimeError> {
        match (computed, property) {
            (false, Expr::Literal(Literal::String(name))) => Ok(name.clone()),
            _ => Ok(property_key(&self.eval(property, scope)?)),
        }
    }

    fn assign(&self, target: &Expr, value: Value, scope: &Scope) -> Result<(), RuntimeError> {
        match target {
            Expr::Ident(name) => scope.assign(name, value),
            Expr::Member {
                object,
                property,
                computed,
            } => {
                let object = self.eval(object, scope)?;
                let key = self.key(property, *computed, scope)?;
                set_property(&object, &key, value)
            }
            _ => Err(RuntimeError::Unsupported(
                "invalid assignment target".into(),
            )),
        }
    }
}

/// Non-short-circuit binary operators.
fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let num = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
    match op {
        BinaryOp::Add => {
            if is_stringish(left) || is_stringish(right) {
                Value::from(format!("{}{}", left, right))
            } else {
                num(|a, b| a + b)
            }
        }
        BinaryOp::Sub => num(|a, b| a - b),
        BinaryOp::Mul => num(|a, b| a * b),
        BinaryOp::Div => num(|a, b| a / b),
        BinaryOp::Mod => num(|a, b| a % b),
        BinaryOp::Pow => num(f64::powf),
        BinaryOp::Eq => Value::Bool(left.strict_equals(right)),
        BinaryOp::Ne => Value::Bool(!left.strict_equals(right)),
        BinaryOp::LooseEq => Value::Bool(left.loose_equals(right)),
        BinaryOp::LooseNe => Value::Bool(!left.loose_equals(right)),
        BinaryOp::Lt => compare(left, right, |o| o.is_lt()),
        BinaryOp::Le => compare(left, right, |o| o.is_le()),
        BinaryOp::Gt => compare(left, right, |o| o.is_gt()),
        BinaryOp::Ge => compare(left, right, |o| o.is_ge()),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => {
            unreachable!("short-circuit operators are evaluated lazily")
        }
    }
}

/// Operands that make `+` concatenate.
fn is_stringish(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Promise(_)
    )
}

fn compare(left: &Value, right: &Value, test: fn(std::cmp::Ordering) -> bool) -> Value {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    Value::Bool(ordering.is_some_and(test))
}

#[cfg(test)]
mod tests {
    use crate::error::ScriptError;
    use crate::realm::Realm;
    use crate::value::Value;

    fn eval(source: &str) -> Value {
        Realm::default().eval(source).unwrap()
    }

    #[test]
    fn test_arithmetic_and_concat() {
        assert_eq!(eval("1 + 2 * 3"), Value::from(7));
        assert_eq!(eval("'a' + 1 + 2"), Value::from("a12"));
        assert_eq!(eval("1 + 2 + 'a'"), Value::from("3a"));
        assert_eq!(eval("-7 % 3"), Value::from(-1));
        assert_eq!(eval("2 ** 10"), Value::from(1024));
        assert_eq!(eval("[1, 2] + ''"), Value::from("1,2"));
    }

    #[test]
    fn test_comparison_and_equality() {
        assert_eq!(eval("'b' > 'a'"), Value::Bool(true));
        assert_eq!(eval("NaN < 1 || NaN >= 1"), Value::Bool(false));
        assert_eq!(eval("1 == '1'"), Value::Bool(true));
        assert_eq!(eval("1 === '1'"), Value::Bool(false));
        assert_eq!(eval("null ?? 'fallback'"), Value::from("fallback"));
        assert_eq!(eval("0 || 'x'"), Value::from("x"));
        assert_eq!(eval("0 && missing()"), Value::from(0));
    }

    #[test]
    fn test_loops() {
        let source = "
            let total = 0;
            for (let i = 0; i < 10; i++) {
                if (i % 2 === 0) continue;
                if (i > 7) break;
                total += i;
            }
            total";
        assert_eq!(eval(source), Value::from(16));

        let source = "
            let out = [];
            for (const x of [3, 1, 2]) out.push(x * 10);
            out.join(' ')";
        assert_eq!(eval(source), Value::from("30 10 20"));

        let source = "let n = 0; while (n < 5) { n = n + 1; } n";
        assert_eq!(eval(source), Value::from(5));
    }

    #[test]
    fn test_closures_share_state() {
        let source = "
            function counter() {
                let n = 0;
                return () => { n++; return n; };
            }
            const next = counter();
            next(); next();
            next()";
        assert_eq!(eval(source), Value::from(3));
    }

    #[test]
    fn test_hoisting() {
        assert_eq!(
            eval("const r = later(); function later() { return 'ok'; } r"),
            Value::from("ok")
        );
    }

    #[test]
    fn test_method_call_receiver() {
        let source = "
            const obj = { base: 10, add: function (x) { return this.base + x; } };
            obj.add(5)";
        assert_eq!(eval(source), Value::from(15));

        // Detached calls lose the receiver.
        let source = "
            const obj = { who: function () { return typeof this; } };
            const who = obj.who;
            who()";
        assert_eq!(eval(source), Value::from("undefined"));
    }

    #[test]
    fn test_try_catch_finally() {
        let source = "
            let log = [];
            try {
                log.push('try');
                throw 'boom';
            } catch (e) {
                log.push('caught ' + e);
            } finally {
                log.push('finally');
            }
            log.join(', ')";
        assert_eq!(eval(source), Value::from("try, caught boom, finally"));

        let source = "
            let name;
            try { undefinedThing(); } catch (e) { name = e.name; }
            name";
        assert_eq!(eval(source), Value::from("ReferenceError"));
    }

    #[test]
    fn test_uncaught_throw() {
        let err = Realm::default().eval("throw 42").unwrap_err();
        match err {
            ScriptError::Runtime(crate::error::RuntimeError::Thrown(v)) => {
                assert_eq!(v, Value::from(42))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_const_reassignment() {
        assert!(Realm::default().eval("const c = 1; c = 2;").is_err());
    }

    #[test]
    fn test_typeof_undeclared() {
        assert_eq!(eval("typeof nothingHere"), Value::from("undefined"));
        assert_eq!(eval("typeof Math.max"), Value::from("function"));
    }

    #[test]
    fn test_array_callbacks() {
        assert_eq!(
            eval("[1, 2, 3, 4].filter(x => x % 2 === 0).map(x => x * x).reduce((a, b) => a + b, 0)"),
            Value::from(20)
        );
    }

    #[test]
    fn test_member_assignment() {
        assert_eq!(
            eval("const o = {}; o.a = 1; o['b'] = 2; o.a + o.b"),
            Value::from(3)
        );
        assert_eq!(eval("const xs = [1]; xs[2] = 3; xs.length"), Value::from(3));
    }

    #[test]
    fn test_await_settles_promise() {
        let realm = Realm::default();
        realm
            .eval("async function inner() { return 20; } async function outer() { return (await inner()) + 1; }")
            .unwrap();
        let Value::Promise(p) = realm.eval("outer()").unwrap() else {
            panic!("expected promise");
        };
        assert_eq!(p.settle().unwrap(), Value::from(21));
    }

    #[test]
    fn test_await_outside_async_fails() {
        assert!(Realm::default().eval("function f() { return await 1; } f()").is_err());
    }

    #[test]
    fn test_calling_non_function() {
        let err = Realm::default().eval("const x = 1; x()").unwrap_err();
        assert!(err.to_string().contains("is not a function"));
    }
}
