//! Classification and reconstruction errors.

use crate::kind::SyntaxKind;
use pureform_script::ReadError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The source was recognized but its kind cannot be decomposed or built.
    #[error("{0} is not supported")]
    Unsupported(SyntaxKind),

    /// No detection rule matched the source.
    #[error("source does not match any known callable form")]
    Unrecognized,

    /// Syntax-mode extraction could not parse the source as one function.
    #[error("malformed function source: {0}")]
    Malformed(String),

    #[error("no construction strategy registered for {0}")]
    MissingStrategy(SyntaxKind),

    /// The synthesized source could not be read by the script host.
    #[error("reconstructed source could not be read: {0}")]
    Read(#[from] ReadError),
}

impl Error {
    /// Errors that describe the input rather than a failure: callers may fall
    /// back to using the original callable unchanged.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Unsupported(_) | Error::Unrecognized)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(Error::Unsupported(SyntaxKind::AsyncFunction).is_recoverable());
        assert!(Error::Unrecognized.is_recoverable());
        assert!(!Error::Malformed("x".into()).is_recoverable());
        assert!(!Error::MissingStrategy(SyntaxKind::OrdinaryFunction).is_recoverable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::Unsupported(SyntaxKind::GeneratorFunction).to_string(),
            "generator function is not supported"
        );
    }
}
