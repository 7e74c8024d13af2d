//! Registry for readers.

use crate::traits::Reader;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Global reader registry.
static READERS: RwLock<Vec<&'static dyn Reader>> = RwLock::new(Vec::new());
static READERS_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Register a custom reader. Later registrations do not shadow earlier ones.
pub fn register_reader(reader: &'static dyn Reader) {
    READERS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(reader);
}

fn init_readers() {
    READERS_INITIALIZED.get_or_init(|| {
        register_reader(&crate::input::javascript::JAVASCRIPT_READER);
    });
}

fn find(pred: impl Fn(&dyn Reader) -> bool) -> Option<&'static dyn Reader> {
    init_readers();
    READERS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .find(|r| pred(**r))
        .copied()
}

/// Get a reader by language name.
pub fn reader_for_language(lang: &str) -> Option<&'static dyn Reader> {
    find(|r| r.language() == lang)
}

/// Get a reader by file extension (without the dot).
pub fn reader_for_extension(ext: &str) -> Option<&'static dyn Reader> {
    find(|r| r.extensions().contains(&ext))
}

/// Get all registered readers.
pub fn readers() -> Vec<&'static dyn Reader> {
    init_readers();
    READERS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_lookup() {
        let reader = reader_for_language("javascript").expect("javascript reader");
        assert_eq!(reader.language(), "javascript");
        assert!(reader.extensions().contains(&"js"));

        let reader = reader_for_extension("mjs").expect("mjs extension");
        assert_eq!(reader.language(), "javascript");

        assert!(reader_for_extension("lua").is_none());
    }

    #[test]
    fn test_read_via_registry() {
        let reader = reader_for_extension("js").unwrap();
        let program = reader.read("const x = 1 + 2;").unwrap();
        assert_eq!(program.body.len(), 1);
        assert!(readers().iter().any(|r| r.language() == "javascript"));
    }
}
