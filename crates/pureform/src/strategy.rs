//! Construction strategies, one per [`SyntaxKind`].
//!
//! A [`StrategyTable`] is built once and handed to the
//! [`Reconstructor`](crate::Reconstructor); there is no global table.

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::kind::SyntaxKind;
use pureform_script::{Callable, Realm};

/// Builds a new callable from a descriptor.
pub trait Builder: Sync {
    /// The kind this builder is registered under.
    fn kind(&self) -> SyntaxKind;

    fn build(&self, realm: &Realm, descriptor: &Descriptor) -> Result<Callable>;
}

/// Static instance of the ordinary-function builder for registration.
pub static ORDINARY_BUILDER: OrdinaryBuilder = OrdinaryBuilder;
pub static ASYNC_BUILDER: AsyncBuilder = AsyncBuilder;
pub static GENERATOR_BUILDER: GeneratorBuilder = GeneratorBuilder;
pub static CONTEXT_BOUND_LAMBDA_BUILDER: ContextBoundLambdaBuilder = ContextBoundLambdaBuilder;

/// Evaluates `function anonymous(<params>) { <body> }` in the realm.
pub struct OrdinaryBuilder;

impl Builder for OrdinaryBuilder {
    fn kind(&self) -> SyntaxKind {
        SyntaxKind::OrdinaryFunction
    }

    fn build(&self, realm: &Realm, descriptor: &Descriptor) -> Result<Callable> {
        Ok(Callable::from_source(realm, &descriptor.function_source())?)
    }
}

/// Like [`OrdinaryBuilder`] with an `async` prefix: calls return a pending
/// promise.
pub struct AsyncBuilder;

impl Builder for AsyncBuilder {
    fn kind(&self) -> SyntaxKind {
        SyntaxKind::AsyncFunction
    }

    fn build(&self, realm: &Realm, descriptor: &Descriptor) -> Result<Callable> {
        let source = format!("async {}", descriptor.function_source());
        Ok(Callable::from_source(realm, &source)?)
    }
}

/// Registered but disabled: generators are inherently sequential.
pub struct GeneratorBuilder;

impl Builder for GeneratorBuilder {
    fn kind(&self) -> SyntaxKind {
        SyntaxKind::GeneratorFunction
    }

    fn build(&self, _realm: &Realm, _descriptor: &Descriptor) -> Result<Callable> {
        tracing::warn!("refusing to build a generator function: generators cannot be parallelized");
        Err(Error::Unsupported(SyntaxKind::GeneratorFunction))
    }
}

/// Builds an ordinary function and binds its `this` to the realm's global
/// object.
///
/// An arrow's real lexical scope is not recoverable from its text, so the
/// top-level context stands in for it.
pub struct ContextBoundLambdaBuilder;

impl Builder for ContextBoundLambdaBuilder {
    fn kind(&self) -> SyntaxKind {
        SyntaxKind::ContextBoundLambda
    }

    fn build(&self, realm: &Realm, descriptor: &Descriptor) -> Result<Callable> {
        let function = ORDINARY_BUILDER.build(realm, descriptor)?;
        Ok(function.bind(realm.global_object()))
    }
}

/// Fixed mapping from kind to builder.
#[derive(Clone)]
pub struct StrategyTable {
    builders: Vec<&'static dyn Builder>,
}

impl StrategyTable {
    /// A builder for every kind.
    pub fn standard() -> Self {
        Self::empty()
            .with(&ASYNC_BUILDER)
            .with(&GENERATOR_BUILDER)
            .with(&ORDINARY_BUILDER)
            .with(&CONTEXT_BOUND_LAMBDA_BUILDER)
    }

    pub fn empty() -> Self {
        Self {
            builders: Vec::new(),
        }
    }

    /// Register `builder`, replacing any builder for the same kind.
    pub fn with(mut self, builder: &'static dyn Builder) -> Self {
        self.builders.retain(|b| b.kind() != builder.kind());
        self.builders.push(builder);
        self
    }

    pub fn builder_for(&self, kind: SyntaxKind) -> Option<&'static dyn Builder> {
        self.builders.iter().find(|b| b.kind() == kind).copied()
    }

    /// Registered kinds, in priority order.
    pub fn kinds(&self) -> Vec<SyntaxKind> {
        SyntaxKind::ALL
            .into_iter()
            .filter(|kind| self.builder_for(*kind).is_some())
            .collect()
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for StrategyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyTable")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_covers_every_kind() {
        let table = StrategyTable::standard();
        assert_eq!(table.kinds(), SyntaxKind::ALL.to_vec());
        for kind in SyntaxKind::ALL {
            assert_eq!(table.builder_for(kind).map(|b| b.kind()), Some(kind));
        }
    }

    #[test]
    fn test_with_replaces_same_kind() {
        let table = StrategyTable::empty()
            .with(&ORDINARY_BUILDER)
            .with(&ORDINARY_BUILDER);
        assert_eq!(table.kinds(), vec![SyntaxKind::OrdinaryFunction]);
        assert!(table.builder_for(SyntaxKind::AsyncFunction).is_none());
    }

    #[test]
    fn test_generator_builder_is_disabled() {
        let realm = Realm::default();
        let d = Descriptor::new(SyntaxKind::GeneratorFunction, ["x"], "yield x;");
        assert!(matches!(
            GENERATOR_BUILDER.build(&realm, &d),
            Err(Error::Unsupported(SyntaxKind::GeneratorFunction))
        ));
    }

    #[test]
    fn test_ordinary_builder_reports_unreadable_body() {
        let realm = Realm::default();
        let d = Descriptor::ordinary(["a"], "return a +;");
        assert!(matches!(ORDINARY_BUILDER.build(&realm, &d), Err(Error::Read(_))));
    }
}
