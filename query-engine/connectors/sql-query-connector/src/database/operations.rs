use crate::{
    query_builder::{read, write},
    row::from_sql_value,
    QueryLog,
};
use indexmap::IndexMap;
use query_connector::{split_path, ReadPlan, WriteArgs};
use query_structure::{Filter, Model, Record, Value};
use rusqlite::{params_from_iter, types::Value as SqlValue, Connection};

fn execute(conn: &Connection, log: &QueryLog, sql: &str, params: Vec<SqlValue>) -> crate::Result<usize> {
    log.record(sql);

    let mut statement = conn.prepare_cached(sql)?;
    Ok(statement.execute(params_from_iter(params))?)
}

pub(crate) fn get_many_records(
    conn: &Connection,
    log: &QueryLog,
    model: &Model,
    plan: &ReadPlan,
    filter: &Filter,
) -> crate::Result<Vec<Record>> {
    let query = read::select(model, plan, filter)?;
    log.record(&query.sql);

    let mut statement = conn.prepare_cached(&query.sql)?;
    let mut rows = statement.query(params_from_iter(query.params))?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        let mut parts: IndexMap<&str, Record> = query
            .joined
            .iter()
            .map(|(path, _)| (path.as_str(), Record::new()))
            .collect();

        for (idx, column) in query.columns.iter().enumerate() {
            let value = from_sql_value(row.get_ref(idx)?, &column.data)?;

            if let Some(part) = parts.get_mut(column.prefix.as_str()) {
                part.insert(column.name.clone(), value);
            }
        }

        // Children come after their parents, so folding from the back nests
        // every joined record before its parent is folded in turn.
        for (path, joined) in query.joined.iter().skip(1).rev() {
            let part = parts.shift_remove(path.as_str()).unwrap_or_default();
            let value = match part.get(joined.primary_key_name()) {
                None | Some(Value::Null) => Value::Null,
                Some(_) => Value::from(part),
            };

            let (prefix, name) = split_path(path);

            if let Some(parent) = parts.get_mut(prefix) {
                parent.insert(name, value);
            }
        }

        records.push(parts.shift_remove("").unwrap_or_default());
    }

    Ok(records)
}

pub(crate) fn count_records(conn: &Connection, log: &QueryLog, model: &Model, filter: &Filter) -> crate::Result<usize> {
    let (sql, params) = read::count(model, filter)?;
    log.record(&sql);

    let mut statement = conn.prepare_cached(&sql)?;
    let count: i64 = statement.query_row(params_from_iter(params), |row| row.get(0))?;

    Ok(count.max(0) as usize)
}

pub(crate) fn create_record(conn: &Connection, log: &QueryLog, model: &Model, args: WriteArgs) -> crate::Result<Value> {
    let (sql, params) = write::insert(model, &args)?;
    execute(conn, log, &sql, params)?;

    match args.get_field_value(model.primary_key_name()) {
        Some(id) if !id.is_null() => Ok(id.clone()),
        _ => Ok(Value::Int(conn.last_insert_rowid())),
    }
}

pub(crate) fn update_record(
    conn: &Connection,
    log: &QueryLog,
    model: &Model,
    id: &Value,
    args: WriteArgs,
) -> crate::Result<usize> {
    match write::update(model, id, &args)? {
        Some((sql, params)) => execute(conn, log, &sql, params),
        None => Ok(0),
    }
}

pub(crate) fn delete_record(conn: &Connection, log: &QueryLog, model: &Model, id: &Value) -> crate::Result<usize> {
    let (sql, params) = write::delete(model, id);
    execute(conn, log, &sql, params)
}

pub(crate) fn execute_batch(conn: &Connection, log: &QueryLog, sql: &str) -> crate::Result<()> {
    log.record(sql);
    Ok(conn.execute_batch(sql)?)
}
