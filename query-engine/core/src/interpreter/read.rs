use super::QueryInterpreter;
use crate::{CoreError, CoreResult};
use futures::{future::BoxFuture, FutureExt};
use itertools::Itertools;
use query_connector::{split_path, ReadPlan, PATH_SEPARATOR};
use query_structure::{Filter, Model, Operation, Record, SelectionSet, Value, ValueMap};
use std::collections::HashMap;
use user_facing_errors::Path;

impl QueryInterpreter<'_> {
    pub(crate) async fn read_one(
        &mut self,
        model: &Model,
        selection: &SelectionSet,
        filter: Filter,
        arguments: &ValueMap,
        path: &Path,
    ) -> CoreResult<Value> {
        let plan = self.planner().plan(model, selection);
        let filter = self.row_filter(model).conjoin(filter);
        let record = self.fetch_one(model, &plan, filter, arguments).await?;

        self.serialize(model, record, selection, path, true)
    }

    /// Records the caller may not read are left out of the result.
    pub(crate) async fn read_many(
        &mut self,
        model: &Model,
        selection: &SelectionSet,
        filter: Filter,
        path: &Path,
    ) -> CoreResult<Value> {
        let plan = self.planner().plan(model, selection);
        let filter = self.row_filter(model).conjoin(filter);
        let records = self.fetch_records(model, &plan, filter).await?;

        let fetched = records.len();
        let records: Vec<Record> = records
            .into_iter()
            .filter(|record| self.is_allowed(model, Operation::Read, record, None))
            .collect();

        if records.len() < fetched {
            tracing::debug!(
                model = model.name(),
                dropped = fetched - records.len(),
                "records hidden by read permissions"
            );
        }

        let values = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| self.serialize(model, record, selection, &super::child_path(path, [idx]), false))
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Value::List(values))
    }

    /// Reads a record written by this operation. Row filters do not apply:
    /// the caller just wrote it. Read permissions are only checked with
    /// `ensure_permission` set.
    pub(crate) async fn read_back(
        &mut self,
        model: &Model,
        id: Value,
        selection: &SelectionSet,
        path: &Path,
        ensure_permission: bool,
    ) -> CoreResult<Value> {
        let pk = model.primary_key_name().to_owned();
        let plan = self.planner().plan(model, selection);
        let arguments = ValueMap::from([(pk.clone(), id.clone())]);

        let record = self.fetch_one(model, &plan, Filter::equals(pk, id), &arguments).await?;

        self.serialize(model, record, selection, path, ensure_permission)
    }

    pub(crate) async fn fetch_one(
        &mut self,
        model: &Model,
        plan: &ReadPlan,
        filter: Filter,
        arguments: &ValueMap,
    ) -> CoreResult<Record> {
        let mut records = self.fetch_records(model, plan, filter).await?;

        match records.len() {
            0 => Err(CoreError::NotFound {
                filters: arguments.clone(),
            }),
            1 => Ok(records.remove(0)),
            count => Err(CoreError::MultipleRecords {
                model: model.name().to_owned(),
                count,
            }),
        }
    }

    /// Runs the plan: one query for the records and their joined foreign
    /// objects, then one query per batch, keyed by the ids of the parents.
    pub(crate) fn fetch_records<'a>(
        &'a mut self,
        model: &'a Model,
        plan: &'a ReadPlan,
        filter: Filter,
    ) -> BoxFuture<'a, CoreResult<Vec<Record>>> {
        let fut = async move {
            let mut records = self.tx.get_many_records(model, plan, &filter).await?;

            for batch in &plan.batches {
                let (prefix, name) = split_path(&batch.path);
                let parent = model_at(model, prefix)?;
                let field = parent.field(name)?;
                let link = field
                    .link()
                    .ok_or_else(|| CoreError::ConfigurationError(format!("`{field}` is not a linked field")))?;
                let parent_pk = parent.primary_key_name().to_owned();

                let ids: Vec<Value> = records
                    .iter()
                    .filter_map(|record| nested_map(record.as_map(), prefix))
                    .filter_map(|map| map.get(&parent_pk))
                    .filter(|id| !id.is_null())
                    .cloned()
                    .unique()
                    .collect();

                let mut children: HashMap<Value, Vec<Value>> = HashMap::new();

                if !ids.is_empty() {
                    let filter = self
                        .row_filter(&link.model)
                        .conjoin(Filter::is_in(link.value_field_name.clone(), ids));

                    for child in self.fetch_records(&link.model, &batch.plan, filter).await? {
                        let key = child.get(&link.value_field_name).cloned().unwrap_or_default();
                        children.entry(key).or_default().push(Value::from(child));
                    }
                }

                for record in records.iter_mut() {
                    if let Some(map) = nested_map_mut(record.as_map_mut(), prefix) {
                        let id = map.get(&parent_pk).cloned().unwrap_or_default();
                        let list = children.get(&id).cloned().unwrap_or_default();

                        map.insert(name.to_owned(), Value::List(list));
                    }
                }
            }

            Ok(records)
        };

        fut.boxed()
    }
}

/// The model reached by following the joined foreign fields of `prefix`.
fn model_at(model: &Model, prefix: &str) -> CoreResult<Model> {
    if prefix.is_empty() {
        return Ok(model.clone());
    }

    prefix.split(PATH_SEPARATOR).try_fold(model.clone(), |current, segment| {
        let field = current.field(segment)?;

        field
            .link()
            .map(|link| link.model)
            .ok_or_else(|| CoreError::ConfigurationError(format!("`{field}` is not a linked field")))
    })
}

fn nested_map<'r>(map: &'r ValueMap, prefix: &str) -> Option<&'r ValueMap> {
    if prefix.is_empty() {
        return Some(map);
    }

    prefix
        .split(PATH_SEPARATOR)
        .try_fold(map, |map, segment| map.get(segment)?.as_object())
}

fn nested_map_mut<'r>(map: &'r mut ValueMap, prefix: &str) -> Option<&'r mut ValueMap> {
    if prefix.is_empty() {
        return Some(map);
    }

    prefix
        .split(PATH_SEPARATOR)
        .try_fold(map, |map, segment| match map.get_mut(segment)? {
            Value::Object(inner) => Some(inner),
            _ => None,
        })
}
