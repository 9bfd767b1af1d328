use crate::{
    build_filters, cache::TypeCache, Direction, EnumType, MethodContext, MethodFn, ModelAction, ModelConfig, ModelConfigs,
    ModelExposition, ObjectType, QuerySchema, QuerySchemaRef, QueryTag, Resolver, RootField, SchemaError, Settings, TypeDecl,
    TypeGraph, TypeMapping, TypeNode,
};
use futures::FutureExt;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use query_structure::{InternalDataModelExt, InternalDataModelRef, Operation, Value};
use regex::Regex;
use std::{fmt, future::Future, sync::Arc};

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").unwrap());

/// Name of the argument carrying the update payload.
pub const UPDATE_DATA_ARGUMENT: &str = "_";

/// An ad hoc query or mutation.
#[derive(Clone)]
pub struct ExposedMethod {
    pub name: String,
    pub input: TypeMapping,
    pub output: TypeDecl,
    pub force_authenticated_user: bool,
    resolver: Option<MethodFn>,
}

impl fmt::Debug for ExposedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExposedMethod")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("force_authenticated_user", &self.force_authenticated_user)
            .finish_non_exhaustive()
    }
}

impl ExposedMethod {
    pub fn new(name: impl Into<String>, output: impl Into<TypeDecl>) -> Self {
        ExposedMethod {
            name: name.into(),
            input: TypeMapping::new(),
            output: output.into(),
            force_authenticated_user: false,
            resolver: None,
        }
    }

    pub fn input(mut self, name: impl Into<String>, decl: impl Into<TypeDecl>) -> Self {
        self.input.insert(name.into(), decl.into());
        self
    }

    pub fn force_authenticated_user(mut self, force: bool) -> Self {
        self.force_authenticated_user = force;
        self
    }

    pub fn resolver<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(MethodContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.resolver = Some(Arc::new(move |ctx| f(ctx).boxed()));
        self
    }
}

struct State {
    dm: InternalDataModelRef,
    settings: Settings,
    expositions: Vec<ModelExposition>,
    methods: Vec<(QueryTag, ExposedMethod)>,
    schema: Option<QuerySchemaRef>,
}

/// Collects expositions and assembles them into a [QuerySchema].
///
/// Registration invalidates the last built schema. Building is serialized
/// and memoized: until the next registration every call to
/// [build](SchemaBuilder::build) returns the same `Arc`.
pub struct SchemaBuilder {
    inner: Mutex<State>,
}

impl SchemaBuilder {
    pub fn new(dm: InternalDataModelRef, settings: Settings) -> Self {
        SchemaBuilder {
            inner: Mutex::new(State {
                dm,
                settings,
                expositions: Vec::new(),
                methods: Vec::new(),
                schema: None,
            }),
        }
    }

    pub fn settings(&self) -> Settings {
        self.inner.lock().settings.clone()
    }

    pub fn expose_model(&self, exposition: ModelExposition) -> Result<(), SchemaError> {
        let mut state = self.inner.lock();

        let model = state.dm.find_model(exposition.model_name()).map_err(|_| {
            SchemaError::configuration(format!("cannot expose unknown model `{}`", exposition.model_name()))
        })?;

        if state
            .expositions
            .iter()
            .any(|existing| existing.model_name() == model.name())
        {
            return Err(SchemaError::DuplicateExposition {
                name: model.name().to_owned(),
            });
        }

        state.expositions.push(exposition);
        state.schema = None;

        Ok(())
    }

    pub fn expose_query(&self, method: ExposedMethod) -> Result<(), SchemaError> {
        self.expose_method(QueryTag::Query, method)
    }

    pub fn expose_mutation(&self, method: ExposedMethod) -> Result<(), SchemaError> {
        self.expose_method(QueryTag::Mutation, method)
    }

    fn expose_method(&self, tag: QueryTag, method: ExposedMethod) -> Result<(), SchemaError> {
        if method.resolver.is_none() {
            return Err(SchemaError::configuration(format!(
                "{tag} `{}` has no resolver",
                method.name
            )));
        }

        let mut state = self.inner.lock();

        state.methods.push((tag, method));
        state.schema = None;

        Ok(())
    }

    pub fn build(&self) -> Result<QuerySchemaRef, SchemaError> {
        let mut state = self.inner.lock();

        if let Some(schema) = &state.schema {
            return Ok(schema.clone());
        }

        let schema = Arc::new(assemble(&state)?);

        tracing::debug!(
            queries = schema.root_fields(QueryTag::Query).len(),
            mutations = schema.root_fields(QueryTag::Mutation).len(),
            "query schema built"
        );

        state.schema = Some(schema.clone());

        Ok(schema)
    }
}

fn assemble(state: &State) -> Result<QuerySchema, SchemaError> {
    let mut configs = ModelConfigs::default();

    for exposition in &state.expositions {
        configs.push(ModelConfig::new(exposition.clone(), &state.dm, &state.settings)?)?;
    }

    for config in configs.iter() {
        if let Some(parent) = &config.only_when_child_of {
            let exposed = configs.iter().any(|other| other.model.name() == parent);

            if !exposed {
                return Err(SchemaError::configuration(format!(
                    "model `{}` is only exposed under `{parent}`, which is not exposed",
                    config.model.name()
                )));
            }
        }
    }

    let mut roots = RootFields::default();

    {
        let mut cache = TypeCache::new(&configs, &state.settings);

        for config in configs.iter().filter(|config| config.is_root()) {
            model_root_fields(&mut cache, &configs, &state.settings, config, &mut roots)?;
        }

        for (tag, method) in &state.methods {
            let Some(resolver) = method.resolver.clone() else {
                continue;
            };

            let field = RootField {
                name: method.name.clone(),
                arguments: cache.convert_mapping(&method.input, &method.name, Direction::Input)?,
                output: cache.convert(&method.output, &method.name, Direction::Output)?,
                resolver: Resolver::Method(resolver),
                force_authenticated_user: method.force_authenticated_user,
            };

            roots.insert(*tag, field)?;
        }

        let (objects, enums) = cache.into_types();
        roots.objects = objects;
        roots.enums = enums;
    }

    let schema = QuerySchema::new(
        roots.query,
        roots.mutation,
        roots.objects,
        roots.enums,
        state.dm.clone(),
        configs,
        state.settings.clone(),
    );

    validate_names(&schema)?;

    Ok(schema)
}

#[derive(Default)]
struct RootFields {
    query: IndexMap<String, RootField>,
    mutation: IndexMap<String, RootField>,
    objects: IndexMap<String, Arc<ObjectType>>,
    enums: IndexMap<String, Arc<EnumType>>,
}

impl RootFields {
    fn insert(&mut self, tag: QueryTag, field: RootField) -> Result<(), SchemaError> {
        let fields = match tag {
            QueryTag::Query => &mut self.query,
            QueryTag::Mutation => &mut self.mutation,
        };

        if fields.contains_key(&field.name) {
            return Err(SchemaError::DuplicateRootField { name: field.name });
        }

        fields.insert(field.name.clone(), field);

        Ok(())
    }
}

fn model_root_fields(
    cache: &mut TypeCache<'_>,
    configs: &ModelConfigs,
    settings: &Settings,
    config: &Arc<ModelConfig>,
    roots: &mut RootFields,
) -> Result<(), SchemaError> {
    let graph = TypeGraph::new(configs, settings);
    let name = config.name.as_str();
    let resolver = |action| Resolver::Model {
        model: config.name.clone(),
        action,
    };
    let root = |field_name: String, arguments: IndexMap<String, TypeNode>, output: TypeNode, action: ModelAction| RootField {
        name: field_name,
        arguments,
        output,
        resolver: resolver(action),
        force_authenticated_user: config.force_authenticated_user,
    };

    // Mutations answer with the read type even when reads are disabled, in
    // which case only the primary key is shown.
    let read_mapping = if config.is_enabled(Operation::Read) {
        graph.build(config, Operation::Read)
    } else {
        let primary = &config.fields_info.primary;
        config
            .fields_info
            .value
            .get_key_value(primary)
            .map(|(key, decl)| TypeMapping::from([(key.clone(), decl.clone())]))
            .unwrap_or_default()
    };

    let output = TypeNode::Object(cache.object(&read_mapping, name, Direction::Output)?);

    let unique = cache.convert_mapping(&config.fields_info.unique, name, Direction::Input)?;

    if config.is_enabled(Operation::Read) {
        roots.insert(
            QueryTag::Query,
            root(name.to_owned(), unique.clone(), output.clone(), ModelAction::ReadOne),
        )?;

        let filter_mapping = TypeGraph::new(configs, settings)
            .without_custom_fields()
            .build(config, Operation::Read);
        let filters = build_filters(&filter_mapping, "");
        let arguments = cache.convert_mapping(&filters, &config.plural_name, Direction::Input)?;

        roots.insert(
            QueryTag::Query,
            root(
                config.plural_name.clone(),
                arguments,
                TypeNode::List(Box::new(output.clone())),
                ModelAction::ReadMany,
            ),
        )?;
    }

    if config.is_enabled(Operation::Create) {
        let prefix = cache.model_prefix(name, Operation::Create);
        let mapping = graph.build(config, Operation::Create);
        let arguments = cache.convert_mapping(&mapping, &prefix, Direction::Input)?;

        roots.insert(QueryTag::Mutation, root(prefix, arguments, output.clone(), ModelAction::Create))?;
    }

    if config.is_enabled(Operation::Update) {
        let prefix = cache.model_prefix(name, Operation::Update);
        let mapping = graph.build(config, Operation::Update);

        let mut arguments = unique.clone();
        arguments.insert(
            UPDATE_DATA_ARGUMENT.to_owned(),
            TypeNode::Required(Box::new(TypeNode::Object(cache.object(&mapping, &prefix, Direction::Input)?))),
        );

        roots.insert(QueryTag::Mutation, root(prefix, arguments, output.clone(), ModelAction::Update))?;
    }

    if config.is_enabled(Operation::Delete) {
        let prefix = cache.model_prefix(name, Operation::Delete);

        roots.insert(QueryTag::Mutation, root(prefix, unique, output, ModelAction::Delete))?;
    }

    Ok(())
}

fn validate_names(schema: &QuerySchema) -> Result<(), SchemaError> {
    let check = |name: &str| {
        if NAME_PATTERN.is_match(name) {
            Ok(())
        } else {
            Err(SchemaError::InvalidName { name: name.to_owned() })
        }
    };

    for tag in [QueryTag::Query, QueryTag::Mutation] {
        for field in schema.root_fields(tag).values() {
            check(&field.name)?;

            for argument in field.arguments.keys() {
                check(argument)?;
            }
        }
    }

    for object in schema.objects() {
        check(object.name())?;

        for field in object.fields().keys() {
            check(field)?;
        }
    }

    for enum_type in schema.enums() {
        check(enum_type.name())?;

        for value in enum_type.values() {
            check(&value.key)?;
        }
    }

    Ok(())
}
