//! # Table Store
//!
//! Ordered container of named tables. Table content is opaque text: the
//! store never looks inside it, it only concatenates or overwrites.
//!
//! Tables keep their first-touch order. A table parsed from a file keeps its
//! original position; a table created later is placed after every existing
//! table.
//!
//! ## Example
//!
//! ```rust
//! use f2k_core::tables::TableStore;
//!
//! let mut store = TableStore::new();
//! store.append("SLAB PROPERTIES", "   Slab=SLAB1   Type=Slab\n");
//! store.append("SLAB PROPERTIES", "   Slab=SLAB2   Type=Drop\n");
//!
//! assert_eq!(store.get("SLAB PROPERTIES").lines().count(), 2);
//! assert_eq!(store.get("MISSING"), "");
//! ```

use std::collections::HashMap;

/// A named block of opaque text lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub content: String,
}

impl Table {
    /// Number of lines held by the table
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Ordered name -> content mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStore {
    tables: Vec<Table>,
    index: HashMap<String, usize>,
}

impl TableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of the named table, or `""` if it does not exist
    pub fn get(&self, name: &str) -> &str {
        self.index
            .get(name)
            .map(|&i| self.tables[i].content.as_str())
            .unwrap_or("")
    }

    /// Write `content` into the named table.
    ///
    /// With `append` set and an existing table, `content` is concatenated
    /// after the current content. Otherwise the table's content is replaced
    /// (a missing table is created at the end of the store).
    pub fn set(&mut self, name: &str, content: &str, append: bool) {
        match self.index.get(name) {
            Some(&i) => {
                let table = &mut self.tables[i];
                if append {
                    table.content.push_str(content);
                } else {
                    table.content = content.to_string();
                }
            }
            None => {
                self.index.insert(name.to_string(), self.tables.len());
                self.tables.push(Table {
                    name: name.to_string(),
                    content: content.to_string(),
                });
            }
        }
    }

    /// Shorthand for `set(name, content, true)`
    pub fn append(&mut self, name: &str, content: &str) {
        self.set(name, content, true);
    }

    /// Shorthand for `set(name, content, false)`
    pub fn replace(&mut self, name: &str, content: &str) {
        self.set(name, content, false);
    }

    /// Table names in first-touch order
    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate over tables in store order
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
