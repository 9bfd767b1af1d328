use crate::{DomainError, Field, FieldData, FieldId, ScalarFieldData, Zip, Zipper};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub(crate) usize);

pub type Model = Zipper<ModelId>;

impl Model {
    pub fn name(&self) -> &str {
        &self.dm.models[self.id.0].name
    }

    /// The table backing the model.
    pub fn db_name(&self) -> &str {
        &self.dm.models[self.id.0].db_name
    }

    /// All fields in declaration order. Related fields come last, in the
    /// order their foreign keys were declared.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        (0..self.dm.models[self.id.0].fields.len()).map(move |index| self.field_at(index))
    }

    pub fn scalar_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields().filter(|field| field.is_scalar())
    }

    pub fn linked_fields(&self) -> impl Iterator<Item = Field> + '_ {
        let foreign = self.fields().filter(|field| field.as_foreign().is_some());
        let related = self.fields().filter(|field| field.is_related());

        foreign.chain(related)
    }

    pub fn find_field(&self, name: &str) -> Option<Field> {
        self.dm.models[self.id.0]
            .fields
            .iter()
            .position(|field| field.name() == name)
            .map(|index| self.field_at(index))
    }

    pub fn field(&self, name: &str) -> crate::Result<Field> {
        self.find_field(name).ok_or_else(|| DomainError::FieldNotFound {
            model: self.name().to_owned(),
            field: name.to_owned(),
        })
    }

    /// Scalar field lookup by its storage column.
    pub fn find_field_by_db_name(&self, db_name: &str) -> Option<Field> {
        self.scalar_fields()
            .find(|field| field.as_scalar().map(|sf| sf.db_name == db_name).unwrap_or(false))
    }

    pub fn primary_key(&self) -> Field {
        self.field_at(self.dm.models[self.id.0].primary_key)
    }

    pub fn primary_key_name(&self) -> &str {
        self.dm.models[self.id.0].fields[self.dm.models[self.id.0].primary_key].name()
    }

    pub fn primary_key_data(&self) -> &ScalarFieldData {
        match &self.dm.models[self.id.0].fields[self.dm.models[self.id.0].primary_key] {
            FieldData::Scalar(sf) => sf,
            // The builder only ever points the primary key at a scalar field.
            _ => unreachable!("primary key must be a scalar field"),
        }
    }

    fn field_at(&self, index: usize) -> Field {
        self.dm.clone().zip(FieldId { model: self.id, index })
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
