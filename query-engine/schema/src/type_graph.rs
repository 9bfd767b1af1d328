//! Derives the type mapping of an exposed model for one operation.
//!
//! Linked fields expand into nested mappings of the model on the other side.
//! Every traversed relation adds both of its ends to the set of excluded
//! edges, so walking back through the same relation is impossible and the
//! recursion terminates on cyclic data models.

use crate::{ModelConfig, ModelConfigs, Settings, TypeDecl, TypeMapping};
use query_structure::Operation;
use std::collections::BTreeSet;

/// A `(model, field)` pair naming one end of a relation.
pub type Edge = (String, String);

pub struct TypeGraph<'a> {
    configs: &'a ModelConfigs,
    settings: &'a Settings,
    custom_fields: bool,
}

/// The mapping of `config` for `operation`, custom fields included.
pub fn build_type_mapping(
    configs: &ModelConfigs,
    settings: &Settings,
    config: &ModelConfig,
    operation: Operation,
) -> TypeMapping {
    TypeGraph::new(configs, settings).build(config, operation)
}

impl<'a> TypeGraph<'a> {
    pub fn new(configs: &'a ModelConfigs, settings: &'a Settings) -> Self {
        TypeGraph {
            configs,
            settings,
            custom_fields: true,
        }
    }

    /// Leaves computed fields out, e.g. for the filter catalog.
    pub fn without_custom_fields(mut self) -> Self {
        self.custom_fields = false;
        self
    }

    pub fn build(&self, config: &ModelConfig, operation: Operation) -> TypeMapping {
        self.build_nested(config, operation, &BTreeSet::new(), 0, None)
    }

    /// `parent_value_field` names the column of this model holding the key
    /// of the parent the mapping is nested under, if the parent provides it.
    fn build_nested(
        &self,
        config: &ModelConfig,
        operation: Operation,
        excluded: &BTreeSet<Edge>,
        depth: usize,
        parent_value_field: Option<&str>,
    ) -> TypeMapping {
        let mut mapping = TypeMapping::new();

        if operation == Operation::Delete {
            return mapping;
        }

        let info = &config.fields_info;
        let is_write = operation.is_write();

        for (name, decl) in &info.value {
            if !config.can_perform(operation, name) {
                continue;
            }

            if depth == 0 && is_write && name == &info.primary {
                continue;
            }

            mapping.insert(name.clone(), decl.clone());
        }

        for field in config.model.linked_fields() {
            let name = field.name();

            if !config.can_perform(operation, name) {
                continue;
            }

            let Some(link) = field.link() else { continue };

            let Some(other) = self.configs.for_model(&link.model) else {
                continue;
            };

            if !other.is_enabled(operation) || !other.can_expose_from_parent(&config.model) {
                continue;
            }

            let edge = (config.model.name().to_owned(), name.to_owned());
            let reverse = (link.model.name().to_owned(), link.field_name.clone());

            if excluded.contains(&edge) {
                continue;
            }

            let mut nested_excluded = excluded.clone();
            nested_excluded.insert(edge);
            nested_excluded.insert(reverse);

            let decl = if field.is_related() {
                let nested = self.build_nested(
                    other,
                    operation,
                    &nested_excluded,
                    depth + 1,
                    Some(&link.value_field_name),
                );

                TypeDecl::list(TypeDecl::Object(nested))
            } else {
                TypeDecl::Object(self.build_nested(other, operation, &nested_excluded, depth + 1, None))
            };

            mapping.insert(name.to_owned(), decl);
        }

        match operation {
            Operation::Create => {
                for name in &info.mandatory {
                    if Some(name.as_str()) == parent_value_field {
                        continue;
                    }

                    if let Some(decl) = mapping.get_mut(name) {
                        *decl = TypeDecl::required(decl.clone());
                    }
                }
            }
            Operation::Read if self.settings.strict_output => {
                for (name, decl) in mapping.iter_mut() {
                    if info.nullable.contains(name) {
                        continue;
                    }

                    *decl = match decl.clone() {
                        TypeDecl::List(inner) => TypeDecl::required(TypeDecl::list(TypeDecl::required(*inner))),
                        other => TypeDecl::required(other),
                    };
                }
            }
            _ => (),
        }

        if self.custom_fields {
            for custom_field in config.custom_fields() {
                if custom_field.supports(operation) && config.can_perform(operation, &custom_field.name) {
                    mapping.insert(custom_field.name.clone(), custom_field.type_decl.clone());
                }
            }
        }

        mapping
    }
}
