use std::collections::HashMap;

/// Unique identifier for an interned string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringId(u32);

/// Deduplicating storage for identifiers, qualified names and literal text.
///
/// The lexer fills it while scanning; the parser hands it over to the `Ast`
/// so node payloads stay valid after the token list is dropped.
#[derive(Debug, Clone, Default)]
pub struct StringStorage {
    strings: Vec<Box<str>>,
    index: HashMap<Box<str>, StringId>,
}

impl StringStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the existing id when it was seen before
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(id) = self.index.get(s) {
            return *id;
        }

        let id = StringId(self.strings.len() as u32);
        self.strings.push(s.into());
        self.index.insert(s.into(), id);
        id
    }

    pub fn resolve(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_interning() {
        let mut storage = StringStorage::new();

        let id1 = storage.intern("println");
        let id2 = storage.intern("args");
        let id3 = storage.intern("println");

        assert_eq!(id1, id3);
        assert_ne!(id1, id2);
        assert_eq!(storage.resolve(id1), "println");
        assert_eq!(storage.resolve(id2), "args");
    }

    #[test]
    fn test_deduplication() {
        let mut storage = StringStorage::new();

        for name in ["foo", "bar", "foo", "java.util.List", "bar", "foo"] {
            storage.intern(name);
        }

        assert_eq!(storage.len(), 3);
        let list = storage.intern("java.util.List");
        assert_eq!(storage.resolve(list), "java.util.List");
        assert_eq!(storage.len(), 3);
    }

    #[test]
    fn test_empty_strings() {
        let mut storage = StringStorage::new();
        assert!(storage.is_empty());

        let id1 = storage.intern("");
        let id2 = storage.intern("");

        assert_eq!(id1, id2);
        assert_eq!(storage.resolve(id1), "");
        assert_eq!(storage.len(), 1);
    }
}
