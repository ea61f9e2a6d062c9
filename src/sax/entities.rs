use std::collections::HashMap;

use super::error::{Error, SaxResult};

/// The five entities every XML processor knows.
pub const BUILTIN_ENTITIES: [(&str, &str); 5] = [
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("apos", "'"),
    ("quot", "\""),
];

/// Entity name to replacement text mapping, owned by a single reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityTable {
    entries: HashMap<String, String>,
}

impl EntityTable {
    pub fn new() -> EntityTable {
        EntityTable {
            entries: BUILTIN_ENTITIES
                .iter()
                .map(|(name, text)| (name.to_string(), text.to_string()))
                .collect(),
        }
    }

    pub fn is_builtin(name: &str) -> bool {
        BUILTIN_ENTITIES.iter().any(|(builtin, _)| *builtin == name)
    }

    /// Registers `name`, replacing an earlier non-built-in definition.
    pub fn insert(&mut self, name: &str, replacement_text: &str) -> SaxResult<()> {
        if EntityTable::is_builtin(name) {
            return Err(Error::BuiltinEntity(name.to_owned()));
        }
        self.entries
            .insert(name.to_owned(), replacement_text.to_owned());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EntityTable {
    fn default() -> Self {
        EntityTable::new()
    }
}
