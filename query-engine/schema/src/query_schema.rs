use crate::{EnumType, ModelConfig, ModelConfigs, ObjectType, Settings, TypeNode};
use futures::future::BoxFuture;
use indexmap::IndexMap;
use query_structure::{AuthenticatedUser, InternalDataModelRef, SelectionSet, Value, ValueMap};
use std::{fmt, sync::Arc};

/// The assembled schema: root fields, every named type and the policies of
/// the exposed models. Read-only once built.
#[derive(Debug)]
pub struct QuerySchema {
    query: IndexMap<String, RootField>,
    mutation: IndexMap<String, RootField>,
    objects: IndexMap<String, Arc<ObjectType>>,
    enums: IndexMap<String, Arc<EnumType>>,
    dm: InternalDataModelRef,
    configs: ModelConfigs,
    settings: Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryTag {
    Query,
    Mutation,
}

impl QueryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryTag::Query => "query",
            QueryTag::Mutation => "mutation",
        }
    }
}

impl fmt::Display for QueryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field of the query or mutation root.
#[derive(Debug, Clone)]
pub struct RootField {
    pub name: String,
    pub arguments: IndexMap<String, TypeNode>,
    pub output: TypeNode,
    pub resolver: Resolver,
    pub force_authenticated_user: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelAction {
    ReadOne,
    ReadMany,
    Create,
    Update,
    Delete,
}

/// Everything an exposed query or mutation resolver gets to see.
#[derive(Debug, Clone)]
pub struct MethodContext {
    pub arguments: ValueMap,
    pub user: Option<AuthenticatedUser>,
    pub selection: SelectionSet,
    pub path: user_facing_errors::Path,
}

pub type MethodFn = Arc<dyn Fn(MethodContext) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

#[derive(Clone)]
pub enum Resolver {
    /// A generated CRUD operation on the exposed model with this name.
    Model { model: String, action: ModelAction },
    Method(MethodFn),
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Model { model, action } => f
                .debug_struct("Model")
                .field("model", model)
                .field("action", action)
                .finish(),
            Resolver::Method(_) => f.write_str("Method"),
        }
    }
}

impl QuerySchema {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        query: IndexMap<String, RootField>,
        mutation: IndexMap<String, RootField>,
        objects: IndexMap<String, Arc<ObjectType>>,
        enums: IndexMap<String, Arc<EnumType>>,
        dm: InternalDataModelRef,
        configs: ModelConfigs,
        settings: Settings,
    ) -> Self {
        QuerySchema {
            query,
            mutation,
            objects,
            enums,
            dm,
            configs,
            settings,
        }
    }

    pub fn root_fields(&self, tag: QueryTag) -> &IndexMap<String, RootField> {
        match tag {
            QueryTag::Query => &self.query,
            QueryTag::Mutation => &self.mutation,
        }
    }

    pub fn find_root_field(&self, tag: QueryTag, name: &str) -> Option<&RootField> {
        self.root_fields(tag).get(name)
    }

    pub fn objects(&self) -> impl Iterator<Item = &Arc<ObjectType>> {
        self.objects.values()
    }

    pub fn find_object(&self, name: &str) -> Option<&Arc<ObjectType>> {
        self.objects.get(name)
    }

    pub fn enums(&self) -> impl Iterator<Item = &Arc<EnumType>> {
        self.enums.values()
    }

    pub fn find_enum(&self, name: &str) -> Option<&Arc<EnumType>> {
        self.enums.get(name)
    }

    pub fn internal_data_model(&self) -> &InternalDataModelRef {
        &self.dm
    }

    pub fn configs(&self) -> &ModelConfigs {
        &self.configs
    }

    /// Policy of an exposed model, by exposed name.
    pub fn config(&self, name: &str) -> Option<&Arc<ModelConfig>> {
        self.configs.find(name)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
