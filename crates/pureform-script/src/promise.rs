//! Promises returned by async functions.
//!
//! A promise created by [`Promise::deferred`] holds the function body as a
//! thunk and stays pending until it is driven. Driving happens either from
//! Rust through the [`Future`] implementation or from script code through
//! `await`, which settles the operand in place.

use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

type Thunk = Box<dyn FnOnce() -> Result<Value, RuntimeError>>;

enum State {
    /// Not yet polled.
    Pending(Thunk),
    /// Polled once; the body runs on the next poll.
    Scheduled(Thunk),
    Running,
    Fulfilled(Value),
    Rejected(RuntimeError),
}

#[derive(Clone)]
pub struct Promise(Rc<RefCell<State>>);

impl Promise {
    /// A pending promise that settles by running `body`.
    pub fn deferred(body: impl FnOnce() -> Result<Value, RuntimeError> + 'static) -> Self {
        Promise(Rc::new(RefCell::new(State::Pending(Box::new(body)))))
    }

    pub fn resolved(value: Value) -> Self {
        Promise(Rc::new(RefCell::new(State::Fulfilled(value))))
    }

    pub fn rejected(reason: RuntimeError) -> Self {
        Promise(Rc::new(RefCell::new(State::Rejected(reason))))
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            *self.0.borrow(),
            State::Fulfilled(_) | State::Rejected(_)
        )
    }

    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Run the body if needed and return the outcome.
    pub fn settle(&self) -> Result<Value, RuntimeError> {
        let thunk = {
            let mut state = self.0.borrow_mut();
            match &*state {
                State::Fulfilled(value) => return Ok(value.clone()),
                State::Rejected(reason) => return Err(reason.clone()),
                State::Running => {
                    return Err(RuntimeError::Type(
                        "promise awaited while its own body is running".into(),
                    ));
                }
                State::Pending(_) | State::Scheduled(_) => {}
            }
            match std::mem::replace(&mut *state, State::Running) {
                State::Pending(thunk) | State::Scheduled(thunk) => thunk,
                _ => unreachable!("checked above"),
            }
        };

        let outcome = thunk();
        *self.0.borrow_mut() = match &outcome {
            Ok(value) => State::Fulfilled(value.clone()),
            Err(reason) => State::Rejected(reason.clone()),
        };
        outcome
    }
}

impl Future for Promise {
    type Output = Result<Value, RuntimeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.0.borrow_mut();
        if let State::Pending(_) = &*state {
            // Yield once so the caller observes the pending state.
            if let State::Pending(thunk) = std::mem::replace(&mut *state, State::Running) {
                *state = State::Scheduled(thunk);
            }
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        drop(state);
        Poll::Ready(self.settle())
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.0.borrow() {
            State::Pending(_) | State::Scheduled(_) => "pending",
            State::Running => "running",
            State::Fulfilled(_) => "fulfilled",
            State::Rejected(_) => "rejected",
        };
        write!(f, "Promise({})", state)
    }
}
