use indexmap::IndexMap;

/// The shape a client asked for. Leaves are plain fields, objects carry the
/// selection for a linked or structured field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    fields: IndexMap<String, Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Leaf,
    Object(SelectionSet),
}

impl Selection {
    pub fn as_object(&self) -> Option<&SelectionSet> {
        match self {
            Selection::Leaf => None,
            Selection::Object(set) => Some(set),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Selection::Leaf)
    }
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf(mut self, name: impl Into<String>) -> Self {
        self.insert(name, Selection::Leaf);
        self
    }

    pub fn object(mut self, name: impl Into<String>, selection: SelectionSet) -> Self {
        self.insert(name, Selection::Object(selection));
        self
    }

    /// Adds a field, merging with what is already selected under that name.
    /// Selecting the same field twice, e.g. through aliases, yields the union
    /// of both sub-selections.
    pub fn insert(&mut self, name: impl Into<String>, selection: Selection) {
        let name = name.into();

        match self.fields.get_mut(&name) {
            None => {
                self.fields.insert(name, selection);
            }
            Some(existing) => {
                if let Selection::Object(set) = selection {
                    match existing {
                        Selection::Leaf => *existing = Selection::Object(set),
                        Selection::Object(current) => current.merge(set),
                    }
                }
            }
        }
    }

    pub fn merge(&mut self, other: SelectionSet) {
        for (name, selection) in other.fields {
            self.insert(name, selection);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Selection> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selection)> {
        self.fields.iter().map(|(name, selection)| (name.as_str(), selection))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn without(&self, name: &str) -> SelectionSet {
        let mut fields = self.fields.clone();
        fields.shift_remove(name);
        SelectionSet { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merging_unions_nested_selections() {
        let mut selection = SelectionSet::new()
            .leaf("id")
            .leaf("home")
            .object("tenants", SelectionSet::new().leaf("name"));

        selection.merge(
            SelectionSet::new()
                .object("home", SelectionSet::new().leaf("location"))
                .object("tenants", SelectionSet::new().leaf("id")),
        );

        assert_eq!(
            selection,
            SelectionSet::new()
                .leaf("id")
                .object("home", SelectionSet::new().leaf("location"))
                .object("tenants", SelectionSet::new().leaf("name").leaf("id"))
        );
    }
}
