use crate::{Choice, OnDelete, ScalarFieldData, TypeIdentifier, Value};

#[derive(Debug, Clone)]
pub struct ScalarFieldBuilder {
    pub name: String,
    pub db_name: Option<String>,
    pub type_identifier: TypeIdentifier,
    pub is_list: bool,
    pub is_nullable: bool,
    pub is_blank: bool,
    pub is_unique: bool,
    pub is_id: bool,
    pub is_autoincrement: bool,
    pub max_length: Option<usize>,
    pub choices: Option<Vec<Choice>>,
    pub default_value: Option<Value>,
}

impl ScalarFieldBuilder {
    pub fn new(name: impl Into<String>, type_identifier: TypeIdentifier) -> Self {
        ScalarFieldBuilder {
            name: name.into(),
            db_name: None,
            type_identifier,
            is_list: false,
            is_nullable: false,
            is_blank: false,
            is_unique: false,
            is_id: false,
            is_autoincrement: false,
            max_length: None,
            choices: None,
            default_value: None,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, TypeIdentifier::Int)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, TypeIdentifier::String)
    }

    /// An auto-incremented integer primary key.
    pub fn auto_id(name: impl Into<String>) -> Self {
        Self::int(name).id().autoincrement()
    }

    pub fn id(mut self) -> Self {
        self.is_id = true;
        self.is_unique = true;
        self
    }

    pub fn autoincrement(mut self) -> Self {
        self.is_autoincrement = true;
        self.is_blank = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn blank(mut self) -> Self {
        self.is_blank = true;
        self
    }

    /// Nullable and blank: the field may be left out entirely.
    pub fn optional(self) -> Self {
        self.nullable().blank()
    }

    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self.is_blank = true;
        self
    }

    pub fn choices<V, L>(mut self, choices: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<Value>,
        L: Into<String>,
    {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(value, label)| Choice {
                    value: value.into(),
                    label: label.into(),
                })
                .collect(),
        );
        self
    }

    pub fn build(self) -> ScalarFieldData {
        ScalarFieldData {
            db_name: self.db_name.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            type_identifier: self.type_identifier,
            is_list: self.is_list,
            is_nullable: self.is_nullable,
            is_blank: self.is_blank,
            is_unique: self.is_unique,
            is_id: self.is_id,
            is_autoincrement: self.is_autoincrement,
            max_length: self.max_length,
            choices: self.choices,
            default_value: self.default_value,
            foreign_field: None,
        }
    }
}

/// Declares a foreign key. Building it yields a value field (`<name>_id` by
/// default), the foreign field itself and a related field on the target.
#[derive(Debug, Clone)]
pub struct ForeignKeyBuilder {
    pub name: String,
    pub target: String,
    pub db_name: Option<String>,
    pub related_name: Option<String>,
    pub is_nullable: bool,
    pub is_blank: bool,
    pub is_unique: bool,
    pub on_delete: OnDelete,
}

impl ForeignKeyBuilder {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        ForeignKeyBuilder {
            name: name.into(),
            target: target.into(),
            db_name: None,
            related_name: None,
            is_nullable: false,
            is_blank: false,
            is_unique: false,
            on_delete: OnDelete::Restrict,
        }
    }

    pub fn related_name(mut self, related_name: impl Into<String>) -> Self {
        self.related_name = Some(related_name.into());
        self
    }

    pub fn db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn blank(mut self) -> Self {
        self.is_blank = true;
        self
    }

    pub fn optional(self) -> Self {
        self.nullable().blank()
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn on_delete(mut self, on_delete: OnDelete) -> Self {
        self.on_delete = on_delete;
        self
    }

    pub fn value_field_name(&self) -> String {
        format!("{}_id", self.name)
    }
}

#[derive(Debug, Clone)]
pub enum FieldBuilder {
    Scalar(ScalarFieldBuilder),
    Foreign(ForeignKeyBuilder),
}

impl From<ScalarFieldBuilder> for FieldBuilder {
    fn from(builder: ScalarFieldBuilder) -> Self {
        FieldBuilder::Scalar(builder)
    }
}

impl From<ForeignKeyBuilder> for FieldBuilder {
    fn from(builder: ForeignKeyBuilder) -> Self {
        FieldBuilder::Foreign(builder)
    }
}
