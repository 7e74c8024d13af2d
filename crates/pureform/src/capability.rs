//! Capability tags.
//!
//! A tag records a caller's assertion about a callable: that it is pure,
//! commutative or associative. Nothing here checks the assertion. Tags only
//! accumulate; applying a tag that is already present is a no-op, and the
//! commutative and associative tags imply the pure tag.
//!
//! ```
//! use pureform::capability::{Capabilities, Tagged, aliases::fp};
//!
//! let mut sum = Tagged::new("(a, b) => a + b");
//! fp(&mut sum);
//! assert_eq!(sum.capabilities(), Capabilities::all());
//! ```

use crate::classify::SourceText;
use bitflags::bitflags;
use pureform_script::Callable;
use std::ops::Deref;

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// No side effects; the result depends only on the arguments.
        const PURE = 0b001;
        /// `f(a, b) == f(b, a)`.
        const COMMUTATIVE = 0b010;
        /// `f(f(a, b), c) == f(a, f(b, c))`.
        const ASSOCIATIVE = 0b100;
    }
}

/// A single capability, for APIs that take one tag at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Pure,
    Commutative,
    Associative,
}

impl Capability {
    pub fn flag(self) -> Capabilities {
        match self {
            Capability::Pure => Capabilities::PURE,
            Capability::Commutative => Capabilities::COMMUTATIVE,
            Capability::Associative => Capabilities::ASSOCIATIVE,
        }
    }
}

/// A callable paired with its capability tags.
///
/// The wrapped value is never modified; tags live beside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<C = Callable> {
    inner: C,
    capabilities: Capabilities,
}

impl<C> Tagged<C> {
    /// Wrap with no tags.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            capabilities: Capabilities::empty(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability.flag())
    }

    pub fn get(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C> Deref for Tagged<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}

impl<C> From<C> for Tagged<C> {
    fn from(inner: C) -> Self {
        Self::new(inner)
    }
}

impl<C: SourceText> SourceText for Tagged<C> {
    fn source_text(&self) -> &str {
        self.inner.source_text()
    }
}

/// Add `capability` (and `pure`, which every other tag implies). Returns
/// the same wrapper.
pub fn tag<C>(tagged: &mut Tagged<C>, capability: Capability) -> &mut Tagged<C> {
    let flag = capability.flag();
    if tagged.capabilities.contains(flag) {
        return tagged;
    }
    if capability != Capability::Pure {
        tag(tagged, Capability::Pure);
    }
    tagged.capabilities.insert(flag);
    tracing::debug!(?capability, "tagged callable");
    tagged
}

pub fn pure<C>(tagged: &mut Tagged<C>) -> &mut Tagged<C> {
    tag(tagged, Capability::Pure)
}

pub fn commutative<C>(tagged: &mut Tagged<C>) -> &mut Tagged<C> {
    tag(tagged, Capability::Commutative)
}

pub fn associative<C>(tagged: &mut Tagged<C>) -> &mut Tagged<C> {
    tag(tagged, Capability::Associative)
}

/// Commutative, then associative: all three tags.
pub fn commutative_associative<C>(tagged: &mut Tagged<C>) -> &mut Tagged<C> {
    associative(commutative(tagged))
}

/// Short names.
pub mod aliases {
    pub use super::associative as a;
    pub use super::commutative as c;
    pub use super::commutative_associative as ca;
    pub use super::commutative_associative as f;
    pub use super::commutative_associative as fp;
    pub use super::commutative_associative as fully_parallel;
    pub use super::commutative_associative as tag_all;
    pub use super::pure as p;
}
