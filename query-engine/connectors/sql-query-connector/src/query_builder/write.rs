use super::{
    ast::{Column, Comparable, Delete, Insert, Update},
    column_data, model_table,
    renderer::Renderer,
};
use crate::value::to_sql_value;
use query_connector::WriteArgs;
use query_structure::{Model, Value};
use rusqlite::types::Value as SqlValue;

pub(crate) fn insert(model: &Model, args: &WriteArgs) -> crate::Result<(String, Vec<SqlValue>)> {
    let mut insert = Insert::into_table(model_table(model));

    for (name, value) in args.iter() {
        insert = insert.value(Column::new(column_data(model, name)?.db_name), to_sql_value(value));
    }

    Ok(Renderer::build(insert))
}

/// `None` when there is nothing to set.
pub(crate) fn update(model: &Model, id: &Value, args: &WriteArgs) -> crate::Result<Option<(String, Vec<SqlValue>)>> {
    if args.is_empty() {
        return Ok(None);
    }

    let mut update = Update::table(model_table(model));

    for (name, value) in args.iter() {
        update = update.set(Column::new(column_data(model, name)?.db_name), to_sql_value(value));
    }

    let update = update.so_that(primary_key(model).equals(to_sql_value(id)));

    Ok(Some(Renderer::build(update)))
}

pub(crate) fn delete(model: &Model, id: &Value) -> (String, Vec<SqlValue>) {
    let delete = Delete::from_table(model_table(model)).so_that(primary_key(model).equals(to_sql_value(id)));

    Renderer::build(delete)
}

fn primary_key(model: &Model) -> Column {
    Column::new(model.primary_key_data().db_name.clone())
}
