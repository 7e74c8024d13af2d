//! Rebuilding callables from descriptors.

use crate::classify::{Classifier, SourceText};
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::strategy::StrategyTable;
use pureform_script::{Callable, Realm};

/// Dispatches descriptors to the builder registered for their kind.
///
/// Every reconstructed callable is a fresh value living in this
/// reconstructor's realm.
#[derive(Debug, Clone)]
pub struct Reconstructor {
    realm: Realm,
    table: StrategyTable,
}

impl Reconstructor {
    pub fn new(realm: Realm, table: StrategyTable) -> Self {
        Self { realm, table }
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    pub fn table(&self) -> &StrategyTable {
        &self.table
    }

    pub fn reconstruct(&self, descriptor: &Descriptor) -> Result<Callable> {
        let builder = self
            .table
            .builder_for(descriptor.kind)
            .ok_or(Error::MissingStrategy(descriptor.kind))?;
        tracing::debug!(kind = %descriptor.kind, "reconstructing callable");
        builder.build(&self.realm, descriptor)
    }

    /// Classify `callable` and rebuild it in one step.
    pub fn rebuild<S: SourceText + ?Sized>(
        &self,
        classifier: &Classifier,
        callable: &S,
    ) -> Result<Callable> {
        let descriptor = classifier.classify(callable)?;
        self.reconstruct(&descriptor)
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new(Realm::default(), StrategyTable::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::SyntaxKind;
    use crate::strategy::ORDINARY_BUILDER;
    use pureform_script::Value;

    #[test]
    fn test_reconstruct_ordinary() {
        let reconstructor = Reconstructor::default();
        let f = reconstructor
            .reconstruct(&Descriptor::ordinary(["a", "b"], " return a * b; "))
            .unwrap();
        assert_eq!(f.source(), "function anonymous(a,b\n) {\n return a * b; \n}");
        assert_eq!(
            f.invoke(&[Value::from(6), Value::from(7)]).unwrap(),
            Value::from(42)
        );
    }

    #[test]
    fn test_missing_strategy() {
        let reconstructor =
            Reconstructor::new(Realm::default(), StrategyTable::empty().with(&ORDINARY_BUILDER));
        let d = Descriptor::ordinary(["x"], "return x;").with_kind(SyntaxKind::AsyncFunction);
        assert!(matches!(
            reconstructor.reconstruct(&d),
            Err(Error::MissingStrategy(SyntaxKind::AsyncFunction))
        ));
    }

    #[test]
    fn test_reconstruction_is_a_new_value() {
        let reconstructor = Reconstructor::default();
        let original = reconstructor
            .realm()
            .function("function id(x) { return x; }")
            .unwrap();
        let rebuilt = reconstructor
            .rebuild(&Classifier::default(), &original)
            .unwrap();
        assert!(!rebuilt.ptr_eq(&original));
        assert_eq!(
            rebuilt.invoke(&[Value::from("same")]).unwrap(),
            Value::from("same")
        );
    }

    #[test]
    fn test_rebuild_propagates_classification_errors() {
        let reconstructor = Reconstructor::default();
        assert_eq!(
            reconstructor
                .rebuild(&Classifier::default(), "x => x")
                .unwrap_err(),
            Error::Unsupported(SyntaxKind::ContextBoundLambda)
        );
    }
}
