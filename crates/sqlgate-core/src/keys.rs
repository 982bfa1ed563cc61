//! Generated key collection

/// Accumulates the keys a database generated for one insert-style statement
///
/// Keys are kept in the order the database reported them. A collector is
/// meant for a single execution; an empty collector is a valid outcome and
/// absence handling is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCollector<T> {
    column_name: String,
    keys: Vec<T>,
}

impl<T> KeyCollector<T> {
    /// Create a collector for the auto-generated `column_name`
    pub fn new(column_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            keys: Vec::new(),
        }
    }

    /// Name of the designated key column
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Append a generated key
    pub fn add_key(&mut self, key: T) {
        self.keys.push(key);
    }

    /// Collected keys in database-reported order
    pub fn keys(&self) -> &[T] {
        &self.keys
    }

    pub fn into_keys(self) -> Vec<T> {
        self.keys
    }
}
