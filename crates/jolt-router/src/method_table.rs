//! Per-path method dispatch.
//!
//! A [`MethodTable`] maps HTTP methods to routed values for a single path.
//! It backs both dispatch and 405 handling (the `Allow` header is built
//! from the registered methods).

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to routed values for one path.
///
/// # Example
///
/// ```rust
/// use jolt_router::MethodTable;
/// use http::Method;
///
/// let table = MethodTable::new()
///     .with(Method::GET, "listUsers")
///     .with(Method::POST, "createUser");
///
/// assert_eq!(table.get(&Method::GET), Some(&"listUsers"));
/// assert_eq!(table.get(&Method::DELETE), None);
/// assert_eq!(table.allow_header(), "GET, POST");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodTable<T> {
    entries: SmallVec<[(Method, T); 2]>,
}

impl<T> MethodTable<T> {
    /// Creates an empty method table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }

    /// Registers a value for a method, replacing any existing entry.
    #[must_use]
    pub fn with(mut self, method: Method, value: T) -> Self {
        self.insert(method, value);
        self
    }

    /// Registers a value for a method in place.
    pub fn insert(&mut self, method: Method, value: T) {
        if let Some(entry) = self.entries.iter_mut().find(|(m, _)| *m == method) {
            entry.1 = value;
        } else {
            self.entries.push((method, value));
        }
    }

    /// Returns the value registered for a method.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&T> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v)
    }

    /// Merges another table into this one without overwriting existing methods.
    pub fn merge(&mut self, other: MethodTable<T>) {
        for (method, value) in other.entries {
            if self.get(&method).is_none() {
                self.entries.push((method, value));
            }
        }
    }

    /// Returns true if any method is registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Returns the registered methods in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns the comma-joined method list for an `Allow` header.
    #[must_use]
    pub fn allow_header(&self) -> String {
        self.entries
            .iter()
            .map(|(m, _)| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let table = MethodTable::new()
            .with(Method::GET, "get")
            .with(Method::POST, "post");
        assert_eq!(table.get(&Method::GET), Some(&"get"));
        assert_eq!(table.get(&Method::POST), Some(&"post"));
        assert_eq!(table.get(&Method::PUT), None);
    }

    #[test]
    fn test_insert_replaces() {
        let table = MethodTable::new()
            .with(Method::GET, "old")
            .with(Method::GET, "new");
        assert_eq!(table.get(&Method::GET), Some(&"new"));
    }

    #[test]
    fn test_merge_does_not_overwrite() {
        let mut table = MethodTable::new().with(Method::GET, "original");
        table.merge(
            MethodTable::new()
                .with(Method::GET, "replacement")
                .with(Method::POST, "added"),
        );
        assert_eq!(table.get(&Method::GET), Some(&"original"));
        assert_eq!(table.get(&Method::POST), Some(&"added"));
    }

    #[test]
    fn test_allow_header() {
        let table = MethodTable::new()
            .with(Method::GET, 1)
            .with(Method::DELETE, 2);
        assert_eq!(table.allow_header(), "GET, DELETE");
    }

    #[test]
    fn test_empty_table() {
        let table: MethodTable<&str> = MethodTable::new();
        assert!(!table.has_any_method());
        assert_eq!(table.allow_header(), "");
    }
}
