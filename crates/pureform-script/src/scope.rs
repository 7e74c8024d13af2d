//! Lexical scopes.

use crate::error::RuntimeError;
use crate::value::{ObjectRef, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Debug)]
struct ScopeInner {
    bindings: RefCell<HashMap<String, Binding>>,
    parent: Option<Scope>,
    /// Only set on the root scope: unresolved names fall through to the
    /// realm's global object.
    global: Option<ObjectRef>,
}

/// A chain of variable bindings. Cloning shares the scope.
#[derive(Debug, Clone)]
pub struct Scope(Rc<ScopeInner>);

impl Scope {
    /// Root scope backed by a global object.
    pub fn global(global: ObjectRef) -> Self {
        Scope(Rc::new(ScopeInner {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
            global: Some(global),
        }))
    }

    pub fn child(&self) -> Self {
        Scope(Rc::new(ScopeInner {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
            global: None,
        }))
    }

    /// Declare a binding in this scope, shadowing outer ones. Redeclaring in
    /// the same scope replaces the binding.
    pub fn declare(&self, name: impl Into<String>, value: Value, mutable: bool) {
        self.0
            .bindings
            .borrow_mut()
            .insert(name.into(), Binding { value, mutable });
    }

    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(binding) = current.0.bindings.borrow().get(name) {
                return Ok(binding.value.clone());
            }
            if let Some(global) = &current.0.global {
                if let Some(value) = global.borrow().get(name) {
                    return Ok(value.clone());
                }
            }
            scope = current.0.parent.as_ref();
        }
        Err(RuntimeError::Reference(format!("{} is not defined", name)))
    }

    /// Assign to the nearest binding named `name`. Assigning to an undeclared
    /// name is an error (strict mode).
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(binding) = current.0.bindings.borrow_mut().get_mut(name) {
                if !binding.mutable {
                    return Err(RuntimeError::Type(
                        "Assignment to constant variable.".into(),
                    ));
                }
                binding.value = value;
                return Ok(());
            }
            if let Some(global) = &current.0.global {
                if let Some(slot) = global.borrow_mut().get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
            }
            scope = current.0.parent.as_ref();
        }
        Err(RuntimeError::Reference(format!("{} is not defined", name)))
    }
}
