//! Embedded static resources.

use std::collections::HashMap;

/// Static files bundled with the application, keyed by relative path.
///
/// Consulted before the `public` directory when rendering files.
#[derive(Debug, Clone, Default)]
pub struct ResourceSet {
    files: HashMap<String, Vec<u8>>,
}

impl ResourceSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource.
    #[must_use]
    pub fn with(mut self, path: impl AsRef<str>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    /// Adds or replaces a resource.
    pub fn insert(&mut self, path: impl AsRef<str>, data: impl Into<Vec<u8>>) {
        self.files.insert(key(path.as_ref()), data.into());
    }

    /// Returns the resource stored at `path`.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(&key(path)).map(Vec::as_slice)
    }

    /// Returns the number of resources.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn key(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}
