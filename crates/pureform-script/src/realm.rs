//! Execution realms.
//!
//! A realm owns the global object, the top-level scope every evaluated
//! function closes over, and the call-depth budget.

use crate::builtins;
use crate::callable::Callable;
use crate::error::{RuntimeError, ScriptError};
use crate::input::read_javascript;
use crate::interp::Interpreter;
use crate::scope::Scope;
use crate::value::{ObjectRef, Value};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Tunables for a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmOptions {
    /// Nested script calls allowed before a `RangeError`.
    ///
    /// Each script call costs several interpreter frames on the native
    /// stack. The default stays inside a 2 MiB thread stack (the size of a
    /// spawned or test thread); raise it only on threads with more.
    pub max_call_depth: usize,
}

/// Default for [`RealmOptions::max_call_depth`].
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

impl Default for RealmOptions {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

struct RealmInner {
    global: ObjectRef,
    scope: Scope,
    options: RealmOptions,
    depth: Cell<usize>,
}

/// A global environment. Cloning shares it.
///
/// Script functions hold their realm and the scope they close over, both
/// reference counted. A script function stored in the realm's own globals
/// (a top-level declaration passed to [`eval`](Realm::eval), or a value
/// given to [`set_global`](Realm::set_global)) therefore forms a cycle, and
/// that realm is never freed. Functions built with
/// [`function`](Realm::function) and kept outside the realm do not leak.
/// Long-lived processes should create a realm per unit of work rather than
/// `eval` into one realm indefinitely.
#[derive(Clone)]
pub struct Realm(Rc<RealmInner>);

impl Realm {
    pub fn new(options: RealmOptions) -> Self {
        let global: ObjectRef = Rc::new(RefCell::new(BTreeMap::new()));
        builtins::install(&mut global.borrow_mut());
        let scope = Scope::global(global.clone());
        Realm(Rc::new(RealmInner {
            global,
            scope,
            options,
            depth: Cell::new(0),
        }))
    }

    pub fn options(&self) -> RealmOptions {
        self.0.options
    }

    /// The global object, as seen by `globalThis` and bound lambdas.
    pub fn global_object(&self) -> Value {
        Value::Object(self.0.global.clone())
    }

    pub fn global_scope(&self) -> Scope {
        self.0.scope.clone()
    }

    /// Add or replace a global property.
    pub fn set_global(&self, name: impl Into<String>, value: Value) {
        self.0.global.borrow_mut().insert(name.into(), value);
    }

    /// Evaluate a single-function source in this realm.
    pub fn function(&self, source: &str) -> Result<Callable, ScriptError> {
        Ok(Callable::from_source(self, source)?)
    }

    /// Run a script and return the value of its last expression statement.
    ///
    /// Top-level `let`, `const` and function declarations stay visible to
    /// later calls of `eval` on the same realm.
    pub fn eval(&self, source: &str) -> Result<Value, ScriptError> {
        let program = read_javascript(source)?;
        let interp = Interpreter::new(self, self.global_object(), false);
        Ok(interp.run_program(&program.body, &self.0.scope)?)
    }

    pub(crate) fn enter(&self) -> Result<DepthGuard, RuntimeError> {
        let depth = self.0.depth.get();
        if depth >= self.0.options.max_call_depth {
            return Err(RuntimeError::Range(
                "Maximum call stack size exceeded".into(),
            ));
        }
        self.0.depth.set(depth + 1);
        Ok(DepthGuard(self.clone()))
    }
}

impl Default for Realm {
    fn default() -> Self {
        Realm::new(RealmOptions::default())
    }
}

impl std::fmt::Debug for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realm")
            .field("options", &self.0.options)
            .field("depth", &self.0.depth.get())
            .finish_non_exhaustive()
    }
}

/// Releases one level of call depth on drop.
pub(crate) struct DepthGuard(Realm);

impl Drop for DepthGuard {
    fn drop(&mut self) {
        let depth = &(self.0).0.depth;
        depth.set(depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_completion_value() {
        let realm = Realm::default();
        assert_eq!(realm.eval("1 + 2; 'x' + 1").unwrap(), Value::from("x1"));
        assert_eq!(realm.eval("let y = 3;").unwrap(), Value::Undefined);
    }

    #[test]
    fn test_declarations_persist_across_eval() {
        let realm = Realm::default();
        realm.eval("function double(n) { return n * 2; }").unwrap();
        assert_eq!(realm.eval("double(21)").unwrap(), Value::from(42));
    }

    #[test]
    fn test_call_depth_limit() {
        let realm = Realm::new(RealmOptions { max_call_depth: 16 });
        let err = realm
            .eval("function down(n) { return down(n + 1); } down(0)")
            .unwrap_err();
        assert!(matches!(
            err,
            ScriptError::Runtime(RuntimeError::Range(_))
        ));
        // The guard unwound fully.
        assert_eq!(realm.0.depth.get(), 0);
    }

    #[test]
    fn test_default_depth_limit_fits_thread_stack() {
        // Runs on an ordinary test thread; the limit must trip before the
        // native stack does.
        let realm = Realm::default();
        for source in [
            "function down(n) { return down(n + 1); } down(0)",
            "function nest(n) { if (n >= 0) { let r = 1 + (n > -1 ? [nest(n + 1)][0] : 0); return r; } return 0; } nest(0)",
        ] {
            assert!(
                matches!(
                    realm.eval(source),
                    Err(ScriptError::Runtime(RuntimeError::Range(_)))
                ),
                "{}",
                source
            );
            assert_eq!(realm.0.depth.get(), 0);
        }

        // `count(n)` nests n + 1 calls; the deepest run the limit allows.
        let n = DEFAULT_MAX_CALL_DEPTH - 1;
        let source = format!(
            "function count(n) {{ return n == 0 ? 0 : 1 + count(n - 1); }} count({})",
            n
        );
        assert_eq!(realm.eval(&source).unwrap(), Value::from(n as f64));
    }

    #[test]
    fn test_realm_freed_when_functions_live_outside_it() {
        let realm = Realm::default();
        let weak = Rc::downgrade(&realm.0);
        let f = realm.function("function id(x) { return x; }").unwrap();
        assert_eq!(f.invoke(&[Value::from(1)]).unwrap(), Value::from(1));
        drop(realm);
        // The callable keeps its realm alive...
        assert!(weak.upgrade().is_some());
        drop(f);
        // ...and nothing else does.
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_set_global() {
        let realm = Realm::default();
        realm.set_global("limit", Value::from(10));
        assert_eq!(realm.eval("limit * 2").unwrap(), Value::from(20));
    }

    #[test]
    fn test_global_this() {
        let realm = Realm::default();
        assert_eq!(realm.eval("globalThis").unwrap(), realm.global_object());
        assert_eq!(realm.eval("this").unwrap(), realm.global_object());
    }
}
