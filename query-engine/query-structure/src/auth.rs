use crate::{Value, ValueMap};
use std::fmt;

/// The caller on whose behalf an operation runs. Establishing who the caller
/// is happens outside the engine; it only decides what the caller may do.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub id: Value,
    pub name: String,
    pub attributes: ValueMap,
}

impl AuthenticatedUser {
    pub fn new(id: impl Into<Value>, name: impl Into<String>) -> Self {
        AuthenticatedUser {
            id: id.into(),
            name: name.into(),
            attributes: ValueMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl fmt::Display for AuthenticatedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
