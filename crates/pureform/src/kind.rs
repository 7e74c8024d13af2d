//! Syntactic forms a callable's source can take.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The syntactic kind of a callable.
///
/// Variants are declared in detection priority order: a source that
/// satisfies several detection rules gets the earliest kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxKind {
    AsyncFunction,
    GeneratorFunction,
    OrdinaryFunction,
    ContextBoundLambda,
}

impl SyntaxKind {
    /// Every kind, in detection priority order.
    pub const ALL: [SyntaxKind; 4] = [
        SyntaxKind::AsyncFunction,
        SyntaxKind::GeneratorFunction,
        SyntaxKind::OrdinaryFunction,
        SyntaxKind::ContextBoundLambda,
    ];

    /// Stable identifier, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            SyntaxKind::AsyncFunction => "async_function",
            SyntaxKind::GeneratorFunction => "generator_function",
            SyntaxKind::OrdinaryFunction => "ordinary_function",
            SyntaxKind::ContextBoundLambda => "context_bound_lambda",
        }
    }

    /// Whether the classifier decomposes this kind into a descriptor.
    pub fn is_extractable(self) -> bool {
        self == SyntaxKind::OrdinaryFunction
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyntaxKind::AsyncFunction => "async function",
            SyntaxKind::GeneratorFunction => "generator function",
            SyntaxKind::OrdinaryFunction => "function",
            SyntaxKind::ContextBoundLambda => "context-bound lambda",
        })
    }
}
