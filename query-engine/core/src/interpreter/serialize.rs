use super::{child_path, QueryInterpreter};
use crate::CoreResult;
use query_structure::{FieldData, Model, Operation, Record, Selection, SelectionSet, Value, ValueMap};
use schema::HookKind;
use user_facing_errors::{Path, PathSegment};

impl QueryInterpreter<'_> {
    /// Shapes a fetched record into the selected output tree.
    ///
    /// Read hooks run around every instance. With `ensure_permission` set the
    /// caller must be allowed to read the instance and its foreign objects;
    /// related collections are never checked.
    pub(crate) fn serialize(
        &self,
        model: &Model,
        mut record: Record,
        selection: &SelectionSet,
        path: &Path,
        ensure_permission: bool,
    ) -> CoreResult<Value> {
        let config = self.config(model);
        let no_data = ValueMap::new();

        self.run_hooks(model, HookKind::BeforeOperation, Operation::Read, &mut record, &no_data)?;

        if ensure_permission {
            self.ensure_permission(model, Operation::Read, &record, None, path)?;
        }

        let mut output = ValueMap::with_capacity(selection.len());

        for (name, selected) in selection.iter() {
            if let Some(custom) = config.as_ref().and_then(|config| config.custom_field(name)) {
                let value = custom.perform_read_one(&record, self.user(), selected.as_object())?;
                output.insert(name.to_owned(), value);
                continue;
            }

            let Some(field) = model.find_field(name) else {
                continue;
            };

            let value = match (field.data(), selected, field.link()) {
                (FieldData::Foreign(_), Selection::Object(nested), Some(link)) => match record.get(name) {
                    Some(Value::Object(joined)) => self.serialize(
                        &link.model,
                        Record::from(joined.clone()),
                        nested,
                        &child_path(path, [name]),
                        ensure_permission,
                    )?,
                    _ => Value::Null,
                },

                (FieldData::Related(_), Selection::Object(nested), Some(link)) => {
                    let children = record.get(name).and_then(Value::as_list).unwrap_or_default();
                    let mut values = Vec::with_capacity(children.len());

                    for (idx, child) in children.iter().enumerate() {
                        if let Some(child) = child.as_object() {
                            values.push(self.serialize(
                                &link.model,
                                Record::from(child.clone()),
                                nested,
                                &child_path(path, [PathSegment::from(name), PathSegment::from(idx)]),
                                false,
                            )?);
                        }
                    }

                    Value::List(values)
                }

                _ => record.get(name).cloned().unwrap_or_default(),
            };

            output.insert(name.to_owned(), value);
        }

        self.run_hooks(model, HookKind::AfterOperation, Operation::Read, &mut record, &no_data)?;

        Ok(Value::Object(output))
    }
}
