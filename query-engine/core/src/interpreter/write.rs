use super::{child_path, QueryInterpreter};
use crate::{CoreError, CoreResult};
use futures::{future::BoxFuture, FutureExt};
use query_connector::{ReadPlan, WriteArgs};
use query_structure::{Field, FieldData, Filter, LinkedField, Model, Operation, Record, SelectionSet, Value, ValueMap};
use schema::{HookKind, ModelConfig};
use std::sync::Arc;
use user_facing_errors::{Path, PathSegment};

/// A write payload split by the kind of field each entry targets.
#[derive(Default)]
struct Payload {
    scalars: ValueMap,
    foreign: Vec<(Field, Value)>,
    related: Vec<(Field, Value)>,
    custom: Vec<(String, Value)>,
}

impl Payload {
    fn split(model: &Model, config: Option<&Arc<ModelConfig>>, data: ValueMap) -> CoreResult<Self> {
        let mut payload = Payload::default();

        for (name, value) in data {
            if config.map(|config| config.fields_info.is_custom(&name)).unwrap_or(false) {
                payload.custom.push((name, value));
                continue;
            }

            let field = model.find_field(&name).ok_or_else(|| CoreError::UnknownArgument {
                model: model.name().to_owned(),
                argument: name.clone(),
            })?;

            match field.data() {
                FieldData::Scalar(_) => {
                    payload.scalars.insert(name, value);
                }
                FieldData::Foreign(_) => payload.foreign.push((field, value)),
                FieldData::Related(_) => payload.related.push((field, value)),
            }
        }

        Ok(payload)
    }
}

impl QueryInterpreter<'_> {
    /// Creates a record from a nested payload and returns its identifier.
    ///
    /// Foreign objects are created first and linked; related children are
    /// created afterwards, pointing back at the new record.
    pub(crate) fn create_record<'a>(
        &'a mut self,
        model: &'a Model,
        data: ValueMap,
        path: Path,
    ) -> BoxFuture<'a, CoreResult<Value>> {
        let fut = async move {
            let config = self.config(model);
            let Payload {
                mut scalars,
                foreign,
                related,
                custom,
            } = Payload::split(model, config.as_ref(), data)?;

            for (field, value) in foreign {
                let link = linked(&field)?;
                let value_field = foreign_value_field(&field);

                let id = match value {
                    Value::Object(nested) => {
                        self.create_record(&link.model, nested, child_path(&path, [field.name()]))
                            .await?
                    }
                    other => other,
                };

                scalars.insert(value_field, id);
            }

            let mut instance = Record::from(scalars.clone());

            for field in model.scalar_fields() {
                let Some(sf) = field.as_scalar() else { continue };

                if let (false, Some(default)) = (instance.contains(&sf.name), &sf.default_value) {
                    instance.insert(sf.name.clone(), default.clone());
                }
            }

            self.write_custom_fields(config.as_deref(), Operation::Create, &mut instance, &custom)?;
            self.run_hooks(model, HookKind::BeforeOperation, Operation::Create, &mut instance, &scalars)?;
            self.ensure_permission(model, Operation::Create, &instance, Some(&scalars), &path)?;
            self.validate(model, &mut instance, &path, None).await?;

            let id = self
                .tx
                .create_record(model, write_args(model, &instance, true))
                .await
                .map_err(CoreError::write_error(&path))?;

            instance.insert(model.primary_key_name(), id.clone());
            tracing::debug!(model = model.name(), id = %id, "record created");

            for (field, value) in related {
                let link = linked(&field)?;

                for (idx, mut child) in children(&field, value)?.into_iter().enumerate() {
                    child.insert(link.value_field_name.clone(), id.clone());

                    let child_path = child_path(&path, [PathSegment::from(field.name()), PathSegment::from(idx)]);
                    self.create_record(&link.model, child, child_path).await?;
                }
            }

            self.run_hooks(model, HookKind::AfterOperation, Operation::Create, &mut instance, &scalars)?;

            Ok(id)
        };

        fut.boxed()
    }

    /// Updates the record matching `filter` and returns its identifier.
    ///
    /// A foreign object carrying a primary key updates that record, one
    /// without creates a new record, `null` clears the link. A related list
    /// replaces the current children: listed children with an identifier are
    /// updated, children without one are created and the omitted ones are
    /// deleted.
    pub(crate) fn update_record<'a>(
        &'a mut self,
        model: &'a Model,
        filter: Filter,
        arguments: ValueMap,
        data: ValueMap,
        path: Path,
    ) -> BoxFuture<'a, CoreResult<Value>> {
        let fut = async move {
            let config = self.config(model);
            let plan = ReadPlan::all_columns(model);
            let filter = self.row_filter(model).conjoin(filter);

            let mut instance = self.fetch_one(model, &plan, filter, &arguments).await?;
            let id = instance.id(model).clone();

            self.ensure_permission(model, Operation::Update, &instance, Some(&data), &path)?;
            self.run_hooks(model, HookKind::BeforeOperation, Operation::Update, &mut instance, &data)?;

            let Payload {
                scalars,
                foreign,
                related,
                custom,
            } = Payload::split(model, config.as_ref(), data.clone())?;

            for (field, value) in foreign {
                let link = linked(&field)?;
                let value_field = foreign_value_field(&field);
                let nested_path = child_path(&path, [field.name()]);

                let target = match value {
                    Value::Object(mut nested) => {
                        let pk = link.model.primary_key_name().to_owned();

                        match nested.shift_remove(&pk).filter(|id| !id.is_null()) {
                            Some(target_id) => {
                                let target_id = coerce_id(&link.model, target_id)?;
                                let arguments = ValueMap::from([(pk.clone(), target_id.clone())]);
                                let filter = Filter::equals(pk, target_id);

                                self.update_record(&link.model, filter, arguments, nested, nested_path)
                                    .await?
                            }
                            None => self.create_record(&link.model, nested, nested_path).await?,
                        }
                    }
                    other => other,
                };

                instance.insert(value_field, target);
            }

            self.write_custom_fields(config.as_deref(), Operation::Update, &mut instance, &custom)?;

            for (name, value) in scalars {
                instance.insert(name, value);
            }

            self.validate(model, &mut instance, &path, Some(&id)).await?;

            self.tx
                .update_record(model, &id, write_args(model, &instance, false))
                .await
                .map_err(CoreError::write_error(&path))?;

            tracing::debug!(model = model.name(), id = %id, "record updated");

            for (field, value) in related {
                self.replace_children(&field, &id, value, &path).await?;
            }

            self.run_hooks(model, HookKind::AfterOperation, Operation::Update, &mut instance, &data)?;

            Ok(id)
        };

        fut.boxed()
    }

    async fn replace_children(&mut self, field: &Field, parent_id: &Value, value: Value, path: &Path) -> CoreResult<()> {
        let link = linked(field)?;
        let child_model = link.model.clone();
        let pk = child_model.primary_key_name().to_owned();
        let incoming = children(field, value)?;

        let filter = Filter::equals(link.value_field_name.clone(), parent_id.clone());
        let existing = self
            .tx
            .get_many_records(&child_model, &ReadPlan::all_columns(&child_model), &filter)
            .await?;

        let mut kept = Vec::new();
        let mut created = Vec::new();

        for (idx, mut child) in incoming.into_iter().enumerate() {
            let child_path = child_path(path, [PathSegment::from(field.name()), PathSegment::from(idx)]);

            let Some(child_id) = child.shift_remove(&pk).filter(|id| !id.is_null()) else {
                child.insert(link.value_field_name.clone(), parent_id.clone());
                created.push((child, child_path));
                continue;
            };

            let child_id = coerce_id(&child_model, child_id)?;
            let arguments = ValueMap::from([(pk.clone(), child_id.clone())]);

            if !existing.iter().any(|record| record.id(&child_model) == &child_id) {
                return Err(CoreError::NotFound { filters: arguments });
            }

            let filter = Filter::equals(pk.clone(), child_id.clone());
            self.update_record(&child_model, filter, arguments, child, child_path)
                .await?;

            kept.push(child_id);
        }

        for record in existing {
            if !kept.contains(record.id(&child_model)) {
                self.delete_record(&child_model, record, &child_path(path, [field.name()]))
                    .await?;
            }
        }

        for (child, child_path) in created {
            self.create_record(&child_model, child, child_path).await?;
        }

        Ok(())
    }

    /// Deletes the record matching `filter` and returns its selected fields
    /// as they were before the deletion.
    pub(crate) async fn delete_one(
        &mut self,
        model: &Model,
        selection: &SelectionSet,
        filter: Filter,
        arguments: &ValueMap,
        path: &Path,
    ) -> CoreResult<Value> {
        let mut plan = self.planner().plan(model, selection);

        for column in ReadPlan::all_columns(model).columns {
            plan.add_column(column);
        }

        let filter = self.row_filter(model).conjoin(filter);
        let mut instance = self.fetch_one(model, &plan, filter, arguments).await?;
        let no_data = ValueMap::new();

        self.ensure_permission(model, Operation::Delete, &instance, None, path)?;
        self.run_hooks(model, HookKind::BeforeOperation, Operation::Delete, &mut instance, &no_data)?;

        let output = self.serialize(model, instance.clone(), selection, path, false)?;
        let id = instance.id(model).clone();

        self.tx
            .delete_record(model, &id)
            .await
            .map_err(CoreError::write_error(path))?;

        tracing::debug!(model = model.name(), id = %id, "record deleted");
        self.run_hooks(model, HookKind::AfterOperation, Operation::Delete, &mut instance, &no_data)?;

        Ok(output)
    }

    async fn delete_record(&mut self, model: &Model, mut instance: Record, path: &Path) -> CoreResult<()> {
        let no_data = ValueMap::new();

        self.ensure_permission(model, Operation::Delete, &instance, None, path)?;
        self.run_hooks(model, HookKind::BeforeOperation, Operation::Delete, &mut instance, &no_data)?;

        let id = instance.id(model).clone();

        self.tx
            .delete_record(model, &id)
            .await
            .map_err(CoreError::write_error(path))?;

        tracing::debug!(model = model.name(), id = %id, "record deleted");
        self.run_hooks(model, HookKind::AfterOperation, Operation::Delete, &mut instance, &no_data)
    }

    fn write_custom_fields(
        &self,
        config: Option<&ModelConfig>,
        operation: Operation,
        instance: &mut Record,
        values: &[(String, Value)],
    ) -> CoreResult<()> {
        let Some(config) = config else {
            return Ok(());
        };

        for (name, value) in values {
            if let Some(custom) = config.custom_field(name) {
                custom.perform_write(operation, instance, self.user(), value)?;
            }
        }

        Ok(())
    }
}

fn linked(field: &Field) -> CoreResult<LinkedField> {
    field
        .link()
        .ok_or_else(|| CoreError::ConfigurationError(format!("`{field}` is not a linked field")))
}

fn foreign_value_field(field: &Field) -> String {
    field
        .as_foreign()
        .map(|foreign| foreign.value_field.clone())
        .unwrap_or_else(|| field.name().to_owned())
}

fn children(field: &Field, value: Value) -> CoreResult<Vec<ValueMap>> {
    let invalid = |reason: String| CoreError::InvalidArgument {
        argument: field.name().to_owned(),
        reason,
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::List(values) => values
            .into_iter()
            .map(|value| match value {
                Value::Object(child) => Ok(child),
                other => Err(invalid(format!("expected an object, found {other}"))),
            })
            .collect(),
        other => Err(invalid(format!("expected a list, found {other}"))),
    }
}

fn coerce_id(model: &Model, id: Value) -> CoreResult<Value> {
    let pk = model.primary_key_data();

    id.coerce(pk.type_identifier).map_err(|err| CoreError::InvalidArgument {
        argument: pk.name.clone(),
        reason: err.to_string(),
    })
}

/// Scalar columns of `instance`. The primary key is only written on
/// creation, and only when one was given.
fn write_args(model: &Model, instance: &Record, with_primary_key: bool) -> WriteArgs {
    model
        .scalar_fields()
        .filter_map(|field| {
            let sf = field.as_scalar()?;
            let value = instance.get(&sf.name)?;

            if sf.is_id && (!with_primary_key || value.is_null()) {
                return None;
            }

            Some((sf.name.clone(), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use query_structure::{
        DataModelBuilder, ForeignKeyBuilder, InternalDataModelExt, InternalDataModelRef, ModelBuilder,
        ScalarFieldBuilder,
    };

    fn data_model() -> InternalDataModelRef {
        DataModelBuilder::new()
            .model(
                ModelBuilder::new("House")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("location")),
            )
            .model(
                ModelBuilder::new("Person")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("name"))
                    .field(ForeignKeyBuilder::new("home", "House").optional().related_name("tenants")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn payloads_are_split_by_field_kind() {
        let dm = data_model();
        let house = dm.find_model("House").unwrap();

        let data = ValueMap::from([
            ("location".to_owned(), Value::from("Paris")),
            ("tenants".to_owned(), Value::List(Vec::new())),
        ]);

        let payload = Payload::split(&house, None, data).unwrap();

        assert_eq!(payload.scalars.keys().collect::<Vec<_>>(), vec!["location"]);
        assert_eq!(payload.related.len(), 1);
        assert!(payload.foreign.is_empty());

        let err = Payload::split(&house, None, ValueMap::from([("roof".to_owned(), Value::Null)]))
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::UnknownArgument { .. }));
    }

    #[test]
    fn primary_keys_are_written_only_on_creation() {
        let dm = data_model();
        let person = dm.find_model("Person").unwrap();

        let instance: Record = [
            ("id", Value::Int(3)),
            ("name", Value::from("Ann")),
            ("home_id", Value::Null),
        ]
        .into_iter()
        .collect();

        let created = write_args(&person, &instance, true);
        let updated = write_args(&person, &instance, false);

        assert_eq!(created.iter().map(|(name, _)| name).collect::<Vec<_>>(), vec!["id", "name", "home_id"]);
        assert_eq!(updated.iter().map(|(name, _)| name).collect::<Vec<_>>(), vec!["name", "home_id"]);
    }

    #[test]
    fn related_payloads_must_be_lists_of_objects() {
        let dm = data_model();
        let house = dm.find_model("House").unwrap();
        let tenants = house.field("tenants").unwrap();

        assert!(children(&tenants, Value::Null).unwrap().is_empty());
        assert!(children(&tenants, Value::from("Ann")).is_err());
        assert!(children(&tenants, Value::List(vec![Value::Int(1)])).is_err());
    }
}
