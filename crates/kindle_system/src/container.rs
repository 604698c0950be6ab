//! Storage for values produced by resource initializers.

use crate::options::normalize_key;
use crate::resource::ResourceValue;
use core::any::Any;
use indexmap::IndexMap;
use std::sync::Arc;

/// Container of produced values, addressable by resource name.
///
/// Names are case-insensitive. Entries live as long as the container; there
/// is no removal.
///
/// # Example
///
/// ```
/// use kindle_system::container::Container;
///
/// let mut container = Container::new();
/// container.set("FrontController", String::from("front"));
///
/// assert!(container.has("frontcontroller"));
/// let front = container.get_as::<String>("FRONTCONTROLLER").unwrap();
/// assert_eq!(front.as_str(), "front");
/// ```
#[derive(Debug, Default, Clone)]
pub struct Container {
    values: IndexMap<String, ResourceValue>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }

    /// Returns true if a value is stored under `name`.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(&normalize_key(name))
    }

    /// Returns the value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ResourceValue> {
        self.values.get(&normalize_key(name)).cloned()
    }

    /// Returns the value stored under `name` if it is a `T`.
    #[must_use]
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.values
            .get(&normalize_key(name))
            .and_then(ResourceValue::downcast::<T>)
    }

    /// Stores `value` under `name`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, name: &str, value: T) {
        self.set_value(name, ResourceValue::new(value));
    }

    /// Stores an already wrapped value under `name`.
    pub fn set_value(&mut self, name: &str, value: ResourceValue) {
        self.values.insert(normalize_key(name), value);
    }

    /// Returns the stored names (lower-case) in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
