use crate::{Model, Value, ValueMap};

/// A row as the executor sees it: field names to values. Eager-loaded foreign
/// objects are nested `Value::Object`s, eager-loaded collections are
/// `Value::List`s of objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: ValueMap,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.values.get_mut(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The primary key value, `Null` when the record was never persisted.
    pub fn id(&self, model: &Model) -> &Value {
        self.values.get(model.primary_key_name()).unwrap_or(&Value::Null)
    }

    pub fn into_map(self) -> ValueMap {
        self.values
    }

    pub fn as_map(&self) -> &ValueMap {
        &self.values
    }

    pub fn as_map_mut(&mut self) -> &mut ValueMap {
        &mut self.values
    }
}

impl From<ValueMap> for Record {
    fn from(values: ValueMap) -> Self {
        Record { values }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.values)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Record {
            values: iter.into_iter().map(|(key, value)| (key.into(), value)).collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
