//! Per-model exposition policy.
//!
//! A [ModelExposition] is what the embedding application registers. It is
//! resolved once, when the schema is assembled, into an immutable
//! [ModelConfig] that every other part of the engine consults.

use crate::{FieldsInfo, SchemaError, Settings, TypeDecl};
use indexmap::IndexMap;
use query_structure::{
    AuthenticatedUser, Filter, InternalDataModelExt, InternalDataModelRef, Model, Operation, Record, SelectionSet,
    Value, ValueMap,
};
use std::{collections::BTreeSet, fmt, sync::Arc};

/// A field rule: everything (`true`), nothing (`false`) or a list of field
/// names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    Bool(bool),
    Fields(Vec<String>),
}

impl From<bool> for FieldRule {
    fn from(b: bool) -> Self {
        FieldRule::Bool(b)
    }
}

impl From<Vec<String>> for FieldRule {
    fn from(fields: Vec<String>) -> Self {
        FieldRule::Fields(fields)
    }
}

impl From<Vec<&str>> for FieldRule {
    fn from(fields: Vec<&str>) -> Self {
        FieldRule::Fields(fields.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldRule {
    fn from(fields: [&str; N]) -> Self {
        FieldRule::Fields(fields.iter().map(|field| (*field).to_owned()).collect())
    }
}

pub struct PermissionRequest<'a> {
    pub operation: Operation,
    pub instance: &'a Record,
    pub user: Option<&'a AuthenticatedUser>,
    /// The write payload, for creations and updates.
    pub data: Option<&'a ValueMap>,
}

pub struct HookContext<'a> {
    pub operation: Operation,
    pub instance: &'a mut Record,
    pub user: Option<&'a AuthenticatedUser>,
    pub data: &'a ValueMap,
}

pub type PermissionFn = Arc<dyn Fn(&PermissionRequest<'_>) -> bool + Send + Sync>;
pub type RowFilterFn = Arc<dyn Fn(Option<&AuthenticatedUser>) -> Filter + Send + Sync>;
pub type HookFn = Arc<dyn Fn(&mut HookContext<'_>) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookKind {
    BeforeOperation,
    AfterOperation,
}

pub struct CustomFieldRead<'a> {
    pub instance: &'a Record,
    pub user: Option<&'a AuthenticatedUser>,
    pub selection: Option<&'a SelectionSet>,
}

pub struct CustomFieldReadMany<'a> {
    pub instances: &'a [Record],
    pub user: Option<&'a AuthenticatedUser>,
    pub selection: Option<&'a SelectionSet>,
}

pub struct CustomFieldWrite<'a> {
    pub instance: &'a mut Record,
    pub user: Option<&'a AuthenticatedUser>,
    pub value: &'a Value,
}

pub type ReadOneFn = Arc<dyn Fn(&CustomFieldRead<'_>) -> anyhow::Result<Value> + Send + Sync>;
pub type ReadManyFn = Arc<dyn Fn(&CustomFieldReadMany<'_>) -> anyhow::Result<Vec<Value>> + Send + Sync>;
pub type WriteOneFn = Arc<dyn Fn(&mut CustomFieldWrite<'_>) -> anyhow::Result<()> + Send + Sync>;

/// A computed field living next to the stored ones. Reads and writes go
/// through callables instead of storage.
#[derive(Clone)]
pub struct CustomField {
    pub name: String,
    pub type_decl: TypeDecl,
    read_one: Option<ReadOneFn>,
    read_many: Option<ReadManyFn>,
    create_one: Option<WriteOneFn>,
    update_one: Option<WriteOneFn>,
}

impl fmt::Debug for CustomField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomField")
            .field("name", &self.name)
            .field("type_decl", &self.type_decl)
            .finish_non_exhaustive()
    }
}

impl CustomField {
    pub fn new(name: impl Into<String>, type_decl: impl Into<TypeDecl>) -> Self {
        CustomField {
            name: name.into(),
            type_decl: type_decl.into(),
            read_one: None,
            read_many: None,
            create_one: None,
            update_one: None,
        }
    }

    pub fn read_one<F>(mut self, f: F) -> Self
    where
        F: Fn(&CustomFieldRead<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.read_one = Some(Arc::new(f));
        self
    }

    pub fn read_many<F>(mut self, f: F) -> Self
    where
        F: Fn(&CustomFieldReadMany<'_>) -> anyhow::Result<Vec<Value>> + Send + Sync + 'static,
    {
        self.read_many = Some(Arc::new(f));
        self
    }

    pub fn create_one<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut CustomFieldWrite<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.create_one = Some(Arc::new(f));
        self
    }

    pub fn update_one<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut CustomFieldWrite<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.update_one = Some(Arc::new(f));
        self
    }

    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Read => self.read_one.is_some() || self.read_many.is_some(),
            Operation::Create => self.create_one.is_some(),
            Operation::Update => self.update_one.is_some(),
            Operation::Delete => false,
        }
    }

    pub fn perform_read_one(
        &self,
        instance: &Record,
        user: Option<&AuthenticatedUser>,
        selection: Option<&SelectionSet>,
    ) -> anyhow::Result<Value> {
        if let Some(read_one) = &self.read_one {
            return read_one(&CustomFieldRead {
                instance,
                user,
                selection,
            });
        }

        let mut values = self.perform_read_many(std::slice::from_ref(instance), user, selection)?;

        Ok(if values.is_empty() { Value::Null } else { values.swap_remove(0) })
    }

    /// One value per instance, in order.
    pub fn perform_read_many(
        &self,
        instances: &[Record],
        user: Option<&AuthenticatedUser>,
        selection: Option<&SelectionSet>,
    ) -> anyhow::Result<Vec<Value>> {
        match (&self.read_many, &self.read_one) {
            (Some(read_many), _) => {
                let values = read_many(&CustomFieldReadMany {
                    instances,
                    user,
                    selection,
                })?;

                anyhow::ensure!(
                    values.len() == instances.len(),
                    "custom field `{}` returned {} values for {} records",
                    self.name,
                    values.len(),
                    instances.len()
                );

                Ok(values)
            }
            (None, Some(read_one)) => instances
                .iter()
                .map(|instance| {
                    read_one(&CustomFieldRead {
                        instance,
                        user,
                        selection,
                    })
                })
                .collect(),
            (None, None) => anyhow::bail!("custom field `{}` cannot be read", self.name),
        }
    }

    pub fn perform_write(
        &self,
        operation: Operation,
        instance: &mut Record,
        user: Option<&AuthenticatedUser>,
        value: &Value,
    ) -> anyhow::Result<()> {
        let callable = match operation {
            Operation::Create => self.create_one.as_ref(),
            Operation::Update => self.update_one.as_ref(),
            _ => None,
        };

        match callable {
            Some(f) => f(&mut CustomFieldWrite { instance, user, value }),
            None => anyhow::bail!("custom field `{}` does not support {}", self.name, operation),
        }
    }
}

/// Registration-time description of how a model is exposed.
#[derive(Clone, Default)]
pub struct ModelExposition {
    model: String,
    name: Option<String>,
    plural_name: Option<String>,
    can: IndexMap<RuleScope, FieldRule>,
    cannot: IndexMap<RuleScope, FieldRule>,
    only_when_child_of: Option<String>,
    force_authenticated_user: bool,
    permissions: Vec<PermissionFn>,
    row_filters: Vec<RowFilterFn>,
    hooks: Vec<(HookKind, HookFn)>,
    always_select: Vec<String>,
    custom_fields: Vec<CustomField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RuleScope {
    Expose,
    Create,
    Read,
    Write,
    Update,
    Delete,
}

impl RuleScope {
    /// The scopes whose rules apply to an operation.
    fn for_operation(operation: Operation) -> &'static [RuleScope] {
        match operation {
            Operation::Create => &[RuleScope::Expose, RuleScope::Write, RuleScope::Create],
            Operation::Read => &[RuleScope::Expose, RuleScope::Read],
            Operation::Update => &[RuleScope::Expose, RuleScope::Write, RuleScope::Update],
            Operation::Delete => &[RuleScope::Expose, RuleScope::Delete],
        }
    }
}

macro_rules! field_rules {
    ($($can:ident, $cannot:ident => $scope:ident;)*) => {
        $(
            pub fn $can(mut self, rule: impl Into<FieldRule>) -> Self {
                self.can.insert(RuleScope::$scope, rule.into());
                self
            }

            pub fn $cannot(mut self, rule: impl Into<FieldRule>) -> Self {
                self.cannot.insert(RuleScope::$scope, rule.into());
                self
            }
        )*
    };
}

impl ModelExposition {
    /// Exposes the data model's `model`.
    pub fn new(model: impl Into<String>) -> Self {
        ModelExposition {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn plural_name(mut self, plural_name: impl Into<String>) -> Self {
        self.plural_name = Some(plural_name.into());
        self
    }

    field_rules! {
        can_expose, cannot_expose => Expose;
        can_create, cannot_create => Create;
        can_read, cannot_read => Read;
        can_write, cannot_write => Write;
        can_update, cannot_update => Update;
        can_delete, cannot_delete => Delete;
    }

    pub fn only_when_child_of(mut self, model: impl Into<String>) -> Self {
        self.only_when_child_of = Some(model.into());
        self
    }

    pub fn force_authenticated_user(mut self, force: bool) -> Self {
        self.force_authenticated_user = force;
        self
    }

    pub fn ensure_permissions<F>(mut self, f: F) -> Self
    where
        F: Fn(&PermissionRequest<'_>) -> bool + Send + Sync + 'static,
    {
        self.permissions.push(Arc::new(f));
        self
    }

    pub fn filter_for_user<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&AuthenticatedUser>) -> Filter + Send + Sync + 'static,
    {
        self.row_filters.push(Arc::new(f));
        self
    }

    pub fn on_before_operation<F>(self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hook(HookKind::BeforeOperation, f)
    }

    pub fn on_after_operation<F>(self, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hook(HookKind::AfterOperation, f)
    }

    pub fn hook<F>(mut self, kind: HookKind, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks.push((kind, Arc::new(f)));
        self
    }

    pub fn always_select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_select.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn custom_field(mut self, field: CustomField) -> Self {
        self.custom_fields.push(field);
        self
    }

    fn rules<'a>(
        rules: &'a IndexMap<RuleScope, FieldRule>,
        operation: Operation,
    ) -> impl Iterator<Item = &'a FieldRule> + 'a {
        RuleScope::for_operation(operation)
            .iter()
            .filter_map(move |scope| rules.get(scope))
    }
}

/// Field names listed by the rules, `None` when a rule stops the
/// concatenation or nothing is listed. Boolean rules equal to `continue_if`
/// are neutral.
fn concatenate<'a>(rules: impl Iterator<Item = &'a FieldRule>, continue_if: bool) -> Option<BTreeSet<String>> {
    let mut fields = BTreeSet::new();

    for rule in rules {
        match rule {
            FieldRule::Bool(b) if *b == continue_if => continue,
            FieldRule::Bool(_) => return None,
            FieldRule::Fields(names) => fields.extend(names.iter().cloned()),
        }
    }

    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// The resolved, immutable policy of one exposed model.
pub struct ModelConfig {
    pub model: Model,
    pub name: String,
    pub plural_name: String,
    pub only_when_child_of: Option<String>,
    pub force_authenticated_user: bool,
    pub always_select: Vec<String>,
    pub fields_info: FieldsInfo,
    enabled: BTreeSet<Operation>,
    included: IndexMap<Operation, BTreeSet<String>>,
    excluded: IndexMap<Operation, BTreeSet<String>>,
    permissions: Vec<PermissionFn>,
    row_filters: Vec<RowFilterFn>,
    hooks: IndexMap<HookKind, Vec<HookFn>>,
    custom_fields: Vec<CustomField>,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("model", &self.model.name())
            .field("name", &self.name)
            .field("plural_name", &self.plural_name)
            .field("enabled", &self.enabled)
            .field("included", &self.included)
            .field("excluded", &self.excluded)
            .field("custom_fields", &self.custom_fields)
            .finish_non_exhaustive()
    }
}

impl ModelConfig {
    pub fn new(exposition: ModelExposition, dm: &InternalDataModelRef, settings: &Settings) -> Result<Self, SchemaError> {
        let model = dm
            .find_model(&exposition.model)
            .map_err(|_| SchemaError::configuration(format!("cannot expose unknown model `{}`", exposition.model)))?;

        let name = settings
            .casing
            .convert(exposition.name.as_deref().unwrap_or_else(|| model.name()));
        let plural_name = match &exposition.plural_name {
            Some(plural_name) => settings.casing.convert(plural_name),
            None => format!("{name}s"),
        };

        if let Some(parent) = &exposition.only_when_child_of {
            dm.find_model(parent).map_err(|_| {
                SchemaError::configuration(format!(
                    "model `{}` is only exposed under `{parent}`, which does not exist",
                    model.name()
                ))
            })?;
        }

        for field in &exposition.always_select {
            let is_stored = model.find_field(field).map(|f| !f.is_related()).unwrap_or(false);

            if !is_stored {
                return Err(SchemaError::configuration(format!(
                    "`{field}` cannot always be selected on model `{}`",
                    model.name()
                )));
            }
        }

        let fields_info = FieldsInfo::introspect(&model, &name, &exposition.custom_fields)?;

        let mut enabled = BTreeSet::new();
        let mut included = IndexMap::new();
        let mut excluded = IndexMap::new();

        for operation in Operation::ALL {
            let mut can = ModelExposition::rules(&exposition.can, operation);
            let mut cannot = ModelExposition::rules(&exposition.cannot, operation);

            let allowed = !can.any(|rule| rule == &FieldRule::Bool(false));
            let denied = cannot.any(|rule| rule == &FieldRule::Bool(true));

            if allowed && !denied {
                enabled.insert(operation);
            }

            if operation != Operation::Delete {
                if let Some(fields) = concatenate(ModelExposition::rules(&exposition.can, operation), true) {
                    included.insert(operation, fields);
                }

                if let Some(fields) = concatenate(ModelExposition::rules(&exposition.cannot, operation), false) {
                    excluded.insert(operation, fields);
                }
            }
        }

        let mut hooks: IndexMap<HookKind, Vec<HookFn>> = IndexMap::new();

        for (kind, hook) in exposition.hooks {
            hooks.entry(kind).or_default().push(hook);
        }

        Ok(ModelConfig {
            model,
            name,
            plural_name,
            only_when_child_of: exposition.only_when_child_of,
            force_authenticated_user: exposition.force_authenticated_user,
            always_select: exposition.always_select,
            fields_info,
            enabled,
            included,
            excluded,
            permissions: exposition.permissions,
            row_filters: exposition.row_filters,
            hooks,
            custom_fields: exposition.custom_fields,
        })
    }

    pub fn is_enabled(&self, operation: Operation) -> bool {
        self.enabled.contains(&operation)
    }

    /// Whether `field` takes part in `operation`.
    pub fn can_perform(&self, operation: Operation, field: &str) -> bool {
        if !self.is_enabled(operation) {
            return false;
        }

        if let Some(included) = self.included.get(&operation) {
            if !included.contains(field) {
                return false;
            }
        }

        match self.excluded.get(&operation) {
            Some(excluded) => !excluded.contains(field),
            None => true,
        }
    }

    /// Whether the model may appear below a field of `parent`.
    pub fn can_expose_from_parent(&self, parent: &Model) -> bool {
        match &self.only_when_child_of {
            Some(required) => required == parent.name(),
            None => true,
        }
    }

    /// Whether the model gets root operations.
    pub fn is_root(&self) -> bool {
        self.only_when_child_of.is_none()
    }

    pub fn check_permissions(&self, request: &PermissionRequest<'_>) -> bool {
        self.permissions.iter().all(|permission| permission(request))
    }

    /// Conjunction of the row filters for the caller.
    pub fn row_filter(&self, user: Option<&AuthenticatedUser>) -> Filter {
        self.row_filters
            .iter()
            .fold(Filter::empty(), |filter, row_filter| filter.conjoin(row_filter(user)))
    }

    pub fn run_hooks(&self, kind: HookKind, context: &mut HookContext<'_>) -> anyhow::Result<()> {
        for hook in self.hooks.get(&kind).into_iter().flatten() {
            hook(context)?;
        }

        Ok(())
    }

    pub fn custom_fields(&self) -> &[CustomField] {
        &self.custom_fields
    }

    pub fn custom_field(&self, name: &str) -> Option<&CustomField> {
        self.custom_fields.iter().find(|field| field.name == name)
    }
}

/// Every exposed model, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ModelConfigs {
    configs: Vec<Arc<ModelConfig>>,
}

impl ModelConfigs {
    pub fn push(&mut self, config: ModelConfig) -> Result<(), SchemaError> {
        let duplicate = self
            .configs
            .iter()
            .any(|existing| existing.model == config.model || existing.name == config.name);

        if duplicate {
            return Err(SchemaError::DuplicateExposition {
                name: config.model.name().to_owned(),
            });
        }

        self.configs.push(Arc::new(config));
        Ok(())
    }

    pub fn for_model(&self, model: &Model) -> Option<&Arc<ModelConfig>> {
        self.configs.iter().find(|config| &config.model == model)
    }

    /// Lookup by exposed name.
    pub fn find(&self, name: &str) -> Option<&Arc<ModelConfig>> {
        self.configs.iter().find(|config| config.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModelConfig>> {
        self.configs.iter()
    }
}
