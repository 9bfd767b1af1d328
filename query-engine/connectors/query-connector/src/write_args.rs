use indexmap::IndexMap;
use query_structure::{Record, Value};

/// Scalar values to be written, keyed by field name.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct WriteArgs {
    pub args: IndexMap<String, Value>,
}

impl WriteArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.args.insert(key.into(), value.into());
    }

    pub fn has_arg_for(&self, field: &str) -> bool {
        self.args.contains_key(field)
    }

    pub fn get_field_value(&self, field: &str) -> Option<&Value> {
        self.args.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.args.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }
}

impl From<IndexMap<String, Value>> for WriteArgs {
    fn from(args: IndexMap<String, Value>) -> Self {
        Self { args }
    }
}

impl FromIterator<(String, Value)> for WriteArgs {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            args: iter.into_iter().collect(),
        }
    }
}

impl From<&Record> for WriteArgs {
    fn from(record: &Record) -> Self {
        record
            .iter()
            .map(|(key, value)| (key.to_owned(), value.clone()))
            .collect()
    }
}
