mod field_builders;

pub use field_builders::*;

use crate::{
    DomainError, FieldData, ForeignFieldData, InternalDataModel, InternalDataModelRef, ModelData, ModelId,
    RelatedFieldData, ScalarFieldData, TypeIdentifier,
};
use std::{collections::HashSet, sync::Arc};

#[derive(Debug, Clone)]
pub struct ModelBuilder {
    pub name: String,
    pub db_name: Option<String>,
    pub fields: Vec<FieldBuilder>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        ModelBuilder {
            name: name.into(),
            db_name: None,
            fields: Vec::new(),
        }
    }

    /// Overrides the table name, which defaults to the model name.
    pub fn table(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    pub fn field(mut self, field: impl Into<FieldBuilder>) -> Self {
        self.fields.push(field.into());
        self
    }

    fn primary_key_type(&self) -> Option<TypeIdentifier> {
        self.fields.iter().find_map(|field| match field {
            FieldBuilder::Scalar(sf) if sf.is_id => Some(sf.type_identifier),
            _ => None,
        })
    }

    fn primary_key_name(&self) -> Option<&str> {
        self.fields.iter().find_map(|field| match field {
            FieldBuilder::Scalar(sf) if sf.is_id => Some(sf.name.as_str()),
            _ => None,
        })
    }
}

/// Collects model declarations and turns them into an immutable
/// [InternalDataModel], deriving the reverse side of every foreign key.
#[derive(Debug, Default)]
pub struct DataModelBuilder {
    models: Vec<ModelBuilder>,
}

impl DataModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: ModelBuilder) -> Self {
        self.models.push(model);
        self
    }

    pub fn build(self) -> crate::Result<InternalDataModelRef> {
        let mut seen = HashSet::new();

        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                return Err(DomainError::DuplicateModel {
                    name: model.name.clone(),
                });
            }
        }

        let mut models: Vec<ModelData> = Vec::with_capacity(self.models.len());
        let mut related: Vec<(usize, RelatedFieldData)> = Vec::new();

        for (idx, model) in self.models.iter().enumerate() {
            let mut fields = Vec::with_capacity(model.fields.len());

            for field in &model.fields {
                match field {
                    FieldBuilder::Scalar(sf) => fields.push(FieldData::Scalar(sf.clone().build())),
                    FieldBuilder::Foreign(fk) => {
                        let target_idx = self
                            .models
                            .iter()
                            .position(|m| m.name == fk.target)
                            .ok_or_else(|| DomainError::DanglingForeignKey {
                                model: model.name.clone(),
                                field: fk.name.clone(),
                                target: fk.target.clone(),
                            })?;

                        let target = &self.models[target_idx];
                        let value_field = fk.value_field_name();
                        let related_name = fk
                            .related_name
                            .clone()
                            .unwrap_or_else(|| format!("{}_set", model.name.to_lowercase()));

                        fields.push(FieldData::Scalar(ScalarFieldData {
                            name: value_field.clone(),
                            db_name: fk.db_name.clone().unwrap_or_else(|| value_field.clone()),
                            type_identifier: target.primary_key_type().unwrap_or(TypeIdentifier::Int),
                            is_list: false,
                            is_nullable: fk.is_nullable,
                            is_blank: fk.is_blank,
                            is_unique: fk.is_unique,
                            is_id: false,
                            is_autoincrement: false,
                            max_length: None,
                            choices: None,
                            default_value: None,
                            foreign_field: Some(fk.name.clone()),
                        }));

                        fields.push(FieldData::Foreign(ForeignFieldData {
                            name: fk.name.clone(),
                            value_field: value_field.clone(),
                            target: ModelId(target_idx),
                            target_field: target.primary_key_name().unwrap_or("id").to_owned(),
                            related_name: related_name.clone(),
                            is_nullable: fk.is_nullable,
                            is_blank: fk.is_blank,
                            on_delete: fk.on_delete,
                        }));

                        related.push((
                            target_idx,
                            RelatedFieldData {
                                name: related_name,
                                source: ModelId(idx),
                                source_field: fk.name.clone(),
                                value_field,
                            },
                        ));
                    }
                }
            }

            let pk_positions: Vec<usize> = fields
                .iter()
                .enumerate()
                .filter(|(_, field)| matches!(field, FieldData::Scalar(sf) if sf.is_id))
                .map(|(position, _)| position)
                .collect();

            let primary_key = match pk_positions.as_slice() {
                [position] => *position,
                other => {
                    return Err(DomainError::InvalidPrimaryKey {
                        model: model.name.clone(),
                        count: other.len(),
                    })
                }
            };

            models.push(ModelData {
                name: model.name.clone(),
                db_name: model.db_name.clone().unwrap_or_else(|| model.name.clone()),
                fields,
                primary_key,
            });
        }

        for (target_idx, related_field) in related {
            models[target_idx].fields.push(FieldData::Related(related_field));
        }

        for model in &models {
            let mut names = HashSet::new();

            for field in &model.fields {
                if !names.insert(field.name()) {
                    return Err(DomainError::DuplicateField {
                        model: model.name.clone(),
                        field: field.name().to_owned(),
                    });
                }
            }
        }

        Ok(Arc::new(InternalDataModel { models }))
    }
}
