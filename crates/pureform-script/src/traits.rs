//! Traits for language readers.

use crate::error::ReadError;
use crate::ir::Program;

/// A reader parses source code into the script IR.
pub trait Reader: Send + Sync {
    /// Language identifier (e.g., "javascript").
    fn language(&self) -> &'static str;

    /// File extensions this reader handles (e.g., &["js", "mjs"]).
    fn extensions(&self) -> &'static [&'static str];

    /// Parse source code into the IR.
    fn read(&self, source: &str) -> Result<Program, ReadError>;
}
