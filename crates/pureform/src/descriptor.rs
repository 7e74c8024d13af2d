//! Normalized decomposition of a callable.

use crate::kind::SyntaxKind;
use serde::{Deserialize, Serialize};

/// A callable reduced to its kind, parameter names and body text.
///
/// The classifier only produces ordinary-function descriptors; other kinds
/// are built by hand to drive their construction strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub kind: SyntaxKind,
    pub parameters: Vec<String>,
    pub body: String,
}

impl Descriptor {
    pub fn new(
        kind: SyntaxKind,
        parameters: impl IntoIterator<Item = impl Into<String>>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            parameters: parameters.into_iter().map(Into::into).collect(),
            body: body.into(),
        }
    }

    pub fn ordinary(
        parameters: impl IntoIterator<Item = impl Into<String>>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(SyntaxKind::OrdinaryFunction, parameters, body)
    }

    /// Same parameters and body, different kind.
    pub fn with_kind(mut self, kind: SyntaxKind) -> Self {
        self.kind = kind;
        self
    }

    /// Source text of an anonymous ordinary function with this descriptor's
    /// parameters and body.
    ///
    /// The parameter list ends with a newline so a trailing line comment in
    /// the last parameter cannot swallow the closing parenthesis.
    pub fn function_source(&self) -> String {
        format!(
            "function anonymous({}\n) {{\n{}\n}}",
            self.parameters.join(","),
            self.body
        )
    }
}
