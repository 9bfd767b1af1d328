use crate::{Model, ModelId, Value, Zip, Zipper};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeIdentifier {
    Boolean,
    Int,
    Float,
    Decimal,
    String,
    Date,
    DateTime,
    Time,
    Json,
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    pub model: ModelId,
    pub(crate) index: usize,
}

/// A stored value and its human readable label.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub value: Value,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Restrict,
    Cascade,
    SetNull,
}

#[derive(Debug, Clone)]
pub struct ScalarFieldData {
    pub name: String,
    pub db_name: String,
    pub type_identifier: TypeIdentifier,
    pub is_list: bool,
    pub is_nullable: bool,
    /// Blank fields may be omitted on creation.
    pub is_blank: bool,
    pub is_unique: bool,
    pub is_id: bool,
    pub is_autoincrement: bool,
    pub max_length: Option<usize>,
    pub choices: Option<Vec<Choice>>,
    pub default_value: Option<Value>,
    /// Name of the foreign field this column backs, if any.
    pub foreign_field: Option<String>,
}

impl ScalarFieldData {
    pub fn is_mandatory(&self) -> bool {
        !self.is_blank
    }
}

#[derive(Debug, Clone)]
pub struct ForeignFieldData {
    pub name: String,
    /// The scalar field on the same model holding the referenced key.
    pub value_field: String,
    pub target: ModelId,
    pub target_field: String,
    /// The name of the reverse collection on the target model.
    pub related_name: String,
    pub is_nullable: bool,
    pub is_blank: bool,
    pub on_delete: OnDelete,
}

#[derive(Debug, Clone)]
pub struct RelatedFieldData {
    pub name: String,
    pub source: ModelId,
    /// The foreign field on the source model pointing back here.
    pub source_field: String,
    /// The column on the source model holding this model's key.
    pub value_field: String,
}

#[derive(Debug, Clone)]
pub enum FieldData {
    Scalar(ScalarFieldData),
    Foreign(ForeignFieldData),
    Related(RelatedFieldData),
}

impl FieldData {
    pub fn name(&self) -> &str {
        match self {
            FieldData::Scalar(sf) => &sf.name,
            FieldData::Foreign(ff) => &ff.name,
            FieldData::Related(rf) => &rf.name,
        }
    }
}

pub type Field = Zipper<FieldId>;

/// Both ends of a foreign key, seen from one of the two models.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedField {
    /// The model on the other side.
    pub model: Model,
    /// The field on the other model pointing back.
    pub field_name: String,
    /// The column holding the foreign key. It lives on this model for foreign
    /// fields and on the other model for related fields.
    pub value_field_name: String,
}

impl Field {
    pub fn data(&self) -> &FieldData {
        &self.dm.models[self.id.model.0].fields[self.id.index]
    }

    pub fn name(&self) -> &str {
        self.data().name()
    }

    pub fn model(&self) -> Model {
        self.dm.clone().zip(self.id.model)
    }

    pub fn as_scalar(&self) -> Option<&ScalarFieldData> {
        match self.data() {
            FieldData::Scalar(sf) => Some(sf),
            _ => None,
        }
    }

    pub fn as_foreign(&self) -> Option<&ForeignFieldData> {
        match self.data() {
            FieldData::Foreign(ff) => Some(ff),
            _ => None,
        }
    }

    pub fn as_related(&self) -> Option<&RelatedFieldData> {
        match self.data() {
            FieldData::Related(rf) => Some(rf),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.as_scalar().is_some()
    }

    pub fn is_linked(&self) -> bool {
        !self.is_scalar()
    }

    pub fn is_related(&self) -> bool {
        self.as_related().is_some()
    }

    /// Describes the relation this field takes part in, `None` for scalars.
    pub fn link(&self) -> Option<LinkedField> {
        match self.data() {
            FieldData::Scalar(_) => None,
            FieldData::Foreign(ff) => Some(LinkedField {
                model: self.dm.clone().zip(ff.target),
                field_name: ff.related_name.clone(),
                value_field_name: ff.value_field.clone(),
            }),
            FieldData::Related(rf) => Some(LinkedField {
                model: self.dm.clone().zip(rf.source),
                field_name: rf.source_field.clone(),
                value_field_name: rf.value_field.clone(),
            }),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model().name(), self.name())
    }
}
