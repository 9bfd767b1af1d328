use crate::{
    Direction, EnumDecl, EnumType, EnumValue, ModelConfigs, ModelTypeDecl, ObjectType, SchemaError, Settings, TypeDecl,
    TypeGraph, TypeMapping, TypeNode,
};
use indexmap::IndexMap;
use query_structure::{Operation, PATH_SEPARATOR};
use std::sync::Arc;

/// Converts declarations into named type nodes for one schema build.
///
/// Objects are named after the path that leads to them and keyed by
/// `(prefix, direction)`; enums are keyed by name. Converting the same
/// declaration twice returns the shared node, converting a different one
/// under an existing name is an error.
pub(crate) struct TypeCache<'a> {
    configs: &'a ModelConfigs,
    settings: &'a Settings,
    objects: IndexMap<(String, Direction), (TypeMapping, Arc<ObjectType>)>,
    enums: IndexMap<String, (EnumDecl, Arc<EnumType>)>,
}

impl<'a> TypeCache<'a> {
    pub(crate) fn new(configs: &'a ModelConfigs, settings: &'a Settings) -> Self {
        TypeCache {
            configs,
            settings,
            objects: IndexMap::new(),
            enums: IndexMap::new(),
        }
    }

    pub(crate) fn convert(&mut self, decl: &TypeDecl, prefix: &str, direction: Direction) -> Result<TypeNode, SchemaError> {
        let node = match decl {
            TypeDecl::Scalar(scalar) => TypeNode::Scalar(*scalar),
            TypeDecl::Enum(enum_decl) => TypeNode::Enum(self.enum_type(enum_decl)?),
            TypeDecl::List(inner) => TypeNode::List(Box::new(self.convert(inner, prefix, direction)?)),
            TypeDecl::Required(inner) => TypeNode::Required(Box::new(self.convert(inner, prefix, direction)?)),
            TypeDecl::Object(mapping) => TypeNode::Object(self.object(mapping, prefix, direction)?),
            TypeDecl::Model(model_decl) => self.model(model_decl, prefix, direction)?,
        };

        Ok(node)
    }

    /// Converts every entry of a mapping, prefixing nested types with the
    /// entry name.
    pub(crate) fn convert_mapping(
        &mut self,
        mapping: &TypeMapping,
        prefix: &str,
        direction: Direction,
    ) -> Result<IndexMap<String, TypeNode>, SchemaError> {
        let mut nodes = IndexMap::with_capacity(mapping.len());

        for (name, decl) in mapping {
            let node = self.convert(decl, &format!("{prefix}{PATH_SEPARATOR}{name}"), direction)?;
            nodes.insert(name.clone(), node);
        }

        Ok(nodes)
    }

    pub(crate) fn object(&mut self, mapping: &TypeMapping, prefix: &str, direction: Direction) -> Result<Arc<ObjectType>, SchemaError> {
        let key = (prefix.to_owned(), direction);
        let name = format!("{prefix}{PATH_SEPARATOR}{}", direction.suffix());

        if let Some((existing, object)) = self.objects.get(&key) {
            return if existing == mapping {
                Ok(object.clone())
            } else {
                Err(SchemaError::ConflictingType { name })
            };
        }

        let fields = self.convert_mapping(mapping, prefix, direction)?;
        let object = Arc::new(ObjectType::new(name, direction, fields));

        self.objects.insert(key, (mapping.clone(), object.clone()));

        Ok(object)
    }

    fn enum_type(&mut self, decl: &EnumDecl) -> Result<Arc<EnumType>, SchemaError> {
        if let Some((existing, enum_type)) = self.enums.get(&decl.name) {
            return if existing == decl {
                Ok(enum_type.clone())
            } else {
                Err(SchemaError::ConflictingType {
                    name: decl.name.clone(),
                })
            };
        }

        let values = decl
            .values
            .iter()
            .map(|value| EnumValue {
                key: value.key.clone(),
                value: value.value.clone(),
                description: value.description.clone(),
            })
            .collect();

        let enum_type = Arc::new(EnumType::new(decl.name.clone(), values));
        self.enums.insert(decl.name.clone(), (decl.clone(), enum_type.clone()));

        Ok(enum_type)
    }

    /// An unmodified model type is shared with the root operations of that
    /// model. Modified ones are named after where they are declared.
    fn model(&mut self, decl: &ModelTypeDecl, prefix: &str, direction: Direction) -> Result<TypeNode, SchemaError> {
        let config = self
            .configs
            .find(&decl.model)
            .ok_or_else(|| SchemaError::UnknownExposedModel {
                name: decl.model.clone(),
            })?
            .clone();

        let mut mapping = TypeGraph::new(self.configs, self.settings).build(&config, decl.operation);

        if !decl.is_modified() {
            let prefix = self.model_prefix(&config.name, decl.operation);
            return Ok(TypeNode::Object(self.object(&mapping, &prefix, direction)?));
        }

        for excluded in &decl.exclude {
            mapping.shift_remove(excluded);
        }

        mapping.extend(decl.additional.clone());

        Ok(TypeNode::Object(self.object(&mapping, prefix, direction)?))
    }

    /// `person` for reads, `create_person` and the like otherwise.
    pub(crate) fn model_prefix(&self, name: &str, operation: Operation) -> String {
        match operation {
            Operation::Read => name.to_owned(),
            other => self.settings.casing.join(&[other.as_str().to_lowercase().as_str(), name]),
        }
    }

    pub(crate) fn into_types(self) -> (IndexMap<String, Arc<ObjectType>>, IndexMap<String, Arc<EnumType>>) {
        let objects = self
            .objects
            .into_values()
            .map(|(_, object)| (object.name().to_owned(), object))
            .collect();

        let enums = self
            .enums
            .into_values()
            .map(|(_, enum_type)| (enum_type.name().to_owned(), enum_type))
            .collect();

        (objects, enums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EnumValueDecl;
    use query_structure::Value;

    #[test]
    fn equal_declarations_share_one_node() {
        let configs = ModelConfigs::default();
        let settings = Settings::default();
        let mut cache = TypeCache::new(&configs, &settings);

        let decl = TypeDecl::object([("name", TypeDecl::string())]);
        let first = cache.convert(&decl, "person", Direction::Output).unwrap();
        let second = cache.convert(&decl, "person", Direction::Output).unwrap();

        assert!(Arc::ptr_eq(first.as_object().unwrap(), second.as_object().unwrap()));
        assert_eq!(first.name(), "person__output_type");

        let other = TypeDecl::object([("age", TypeDecl::int())]);
        assert_eq!(
            cache.convert(&other, "person", Direction::Output).unwrap_err(),
            SchemaError::ConflictingType {
                name: "person__output_type".into()
            }
        );
        assert!(cache.convert(&other, "person", Direction::Input).is_ok());
    }

    #[test]
    fn enums_with_the_same_name_must_agree() {
        let configs = ModelConfigs::default();
        let settings = Settings::default();
        let mut cache = TypeCache::new(&configs, &settings);

        let status = |label: &str| {
            TypeDecl::Enum(EnumDecl {
                name: "status".into(),
                values: vec![EnumValueDecl {
                    key: "OPEN".into(),
                    value: Value::from("open"),
                    description: Some(label.into()),
                }],
            })
        };

        cache.convert(&status("Open"), "a", Direction::Output).unwrap();
        cache.convert(&status("Open"), "b", Direction::Input).unwrap();
        assert!(cache.convert(&status("Opened"), "c", Direction::Output).is_err());
    }

    #[test]
    fn unknown_models_are_rejected() {
        let configs = ModelConfigs::default();
        let settings = Settings::default();
        let mut cache = TypeCache::new(&configs, &settings);

        let err = cache
            .convert(&TypeDecl::model("ghost", Operation::Read), "q", Direction::Output)
            .unwrap_err();

        assert_eq!(err, SchemaError::UnknownExposedModel { name: "ghost".into() });
    }
}
