use crate::{CustomField, EnumDecl, EnumValueDecl, SchemaError, TypeDecl, TypeMapping};
use indexmap::IndexSet;
use query_structure::{FieldData, Model, ScalarFieldData, Value};

/// The field inventory of an exposed model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldsInfo {
    pub primary: String,
    /// Fields identifying a single record, primary key included.
    pub unique: TypeMapping,
    /// Stored fields, foreign key columns included.
    pub value: TypeMapping,
    pub foreign: Vec<String>,
    pub related: Vec<String>,
    /// Fields a client has to provide on creation. A mandatory foreign key
    /// lists both its foreign field and its value field.
    pub mandatory: IndexSet<String>,
    pub nullable: IndexSet<String>,
    pub custom: Vec<String>,
}

impl FieldsInfo {
    pub fn introspect(model: &Model, exposed_name: &str, custom_fields: &[CustomField]) -> Result<Self, SchemaError> {
        let mut info = FieldsInfo {
            primary: model.primary_key_name().to_owned(),
            unique: TypeMapping::new(),
            value: TypeMapping::new(),
            foreign: Vec::new(),
            related: Vec::new(),
            mandatory: IndexSet::new(),
            nullable: IndexSet::new(),
            custom: Vec::new(),
        };

        for field in model.fields() {
            match field.data() {
                FieldData::Scalar(sf) => {
                    let decl = scalar_decl(exposed_name, sf);

                    if sf.is_unique || sf.is_id {
                        info.unique.insert(sf.name.clone(), decl.clone());
                    }

                    if sf.is_nullable {
                        info.nullable.insert(sf.name.clone());
                    }

                    if sf.is_mandatory() {
                        info.mandatory.insert(sf.name.clone());
                        info.mandatory.extend(sf.foreign_field.clone());
                    }

                    info.value.insert(sf.name.clone(), decl);
                }
                FieldData::Foreign(ff) => {
                    if ff.is_nullable {
                        info.nullable.insert(ff.name.clone());
                    }

                    info.foreign.push(ff.name.clone());
                }
                FieldData::Related(rf) => info.related.push(rf.name.clone()),
            }
        }

        for custom_field in custom_fields {
            if model.find_field(&custom_field.name).is_some() {
                return Err(SchemaError::CustomFieldCollision {
                    model: model.name().to_owned(),
                    field: custom_field.name.clone(),
                });
            }

            info.custom.push(custom_field.name.clone());
        }

        Ok(info)
    }

    /// Foreign fields first, then related ones.
    pub fn linked(&self) -> impl Iterator<Item = &str> {
        self.foreign.iter().chain(self.related.iter()).map(String::as_str)
    }

    pub fn is_foreign(&self, name: &str) -> bool {
        self.foreign.iter().any(|field| field == name)
    }

    pub fn is_related(&self, name: &str) -> bool {
        self.related.iter().any(|field| field == name)
    }

    pub fn is_custom(&self, name: &str) -> bool {
        self.custom.iter().any(|field| field == name)
    }
}

fn scalar_decl(exposed_name: &str, field: &ScalarFieldData) -> TypeDecl {
    let base = match &field.choices {
        Some(choices) => TypeDecl::Enum(EnumDecl {
            name: format!("{exposed_name}__{}__enum_type", field.name),
            values: choices
                .iter()
                .map(|choice| EnumValueDecl {
                    key: enum_key(&choice.value),
                    value: choice.value.clone(),
                    description: Some(choice.label.clone()),
                })
                .collect(),
        }),
        None => TypeDecl::Scalar(field.type_identifier.into()),
    };

    if field.is_list {
        TypeDecl::list(base)
    } else {
        base
    }
}

/// Upper-cased stored value with everything but ASCII letters and digits
/// replaced by underscores. A leading digit is replaced too.
pub fn enum_key(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    raw.chars()
        .enumerate()
        .map(|(idx, c)| match c {
            c if idx == 0 && c.is_ascii_digit() => '_',
            c if c.is_ascii_alphanumeric() => c.to_ascii_uppercase(),
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_keys_are_sanitized() {
        assert_eq!(enum_key(&Value::from("in progress")), "IN_PROGRESS");
        assert_eq!(enum_key(&Value::from("1st")), "_ST");
        assert_eq!(enum_key(&Value::Int(42)), "_2");
    }
}
