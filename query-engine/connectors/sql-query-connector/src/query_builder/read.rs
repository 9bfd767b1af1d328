use super::{
    aliased_column,
    ast::{Comparable, Expression, Select},
    column_data, model_table,
    renderer::Renderer,
};
use crate::{error::SqlError, filter::FilterVisitor};
use indexmap::IndexMap;
use query_connector::{join_path, split_path, ReadPlan, PATH_SEPARATOR};
use query_structure::{Filter, Model, ScalarFieldData};
use rusqlite::types::Value as SqlValue;

/// A rendered `SELECT` and the shape of its result rows.
pub(crate) struct SelectQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub columns: Vec<SelectedColumn>,
    /// Joined paths, parents first. The root model has the empty path.
    pub joined: Vec<(String, Model)>,
}

pub(crate) struct SelectedColumn {
    /// Path of the joined model owning the column.
    pub prefix: String,
    pub name: String,
    pub data: ScalarFieldData,
}

pub(crate) fn select(model: &Model, plan: &ReadPlan, filter: &Filter) -> crate::Result<SelectQuery> {
    let mut aliases: IndexMap<String, (String, Model)> = IndexMap::new();
    aliases.insert(String::new(), ("t0".to_owned(), model.clone()));

    let mut joins = plan.joins.clone();
    joins.sort_by_key(|path| path.matches(PATH_SEPARATOR).count());

    let mut select = Select::from_table(model_table(model).alias("t0"));

    for path in joins {
        let (prefix, name) = split_path(&path);

        let (parent_alias, parent) = aliases
            .get(prefix)
            .cloned()
            .ok_or_else(|| SqlError::ConversionError(format!("join {path} has no joined parent")))?;

        let field = parent.field(name)?;
        let foreign = field
            .as_foreign()
            .ok_or_else(|| SqlError::ConversionError(format!("join {path} is not a foreign field")))?;
        let target = field
            .link()
            .ok_or_else(|| SqlError::ConversionError(format!("join {path} is not a foreign field")))?
            .model;

        let alias = format!("t{}", aliases.len());
        let target_column = column_data(&target, &foreign.target_field)?;
        let value_column = column_data(&parent, &foreign.value_field)?;

        select = select.left_join(
            model_table(&target).alias(alias.clone()),
            aliased_column(&alias, &target_column.db_name).equals(aliased_column(&parent_alias, &value_column.db_name)),
        );

        aliases.insert(path, (alias, target));
    }

    // Primary keys tell a missing joined row apart from one with null columns.
    let mut paths = plan.columns.clone();

    for (prefix, (_, joined)) in aliases.iter() {
        let pk = join_path(prefix, joined.primary_key_name());

        if !paths.contains(&pk) {
            paths.push(pk);
        }
    }

    let mut columns = Vec::with_capacity(paths.len());

    for path in paths {
        let (prefix, name) = split_path(&path);

        let (alias, owner) = aliases
            .get(prefix)
            .ok_or_else(|| SqlError::ConversionError(format!("column {path} is outside of the joined models")))?;

        let field = owner.field(name)?;
        let data = field
            .as_scalar()
            .cloned()
            .ok_or_else(|| SqlError::ConversionError(format!("column {path} is not a scalar field")))?;

        select = select.column(aliased_column(alias, &data.db_name));
        columns.push(SelectedColumn {
            prefix: prefix.to_owned(),
            name: name.to_owned(),
            data,
        });
    }

    let mut visitor = FilterVisitor::new(aliases.len() - 1);
    let pk = column_data(model, model.primary_key_name())?;

    let select = select
        .so_that(visitor.visit(model, "t0", filter)?)
        .order_by(aliased_column("t0", &pk.db_name));

    let (sql, params) = Renderer::build(select);

    Ok(SelectQuery {
        sql,
        params,
        columns,
        joined: aliases
            .into_iter()
            .map(|(path, (_, model))| (path, model))
            .collect(),
    })
}

pub(crate) fn count(model: &Model, filter: &Filter) -> crate::Result<(String, Vec<SqlValue>)> {
    let conditions = FilterVisitor::new(0).visit(model, "t0", filter)?;
    let select = Select::from_table(model_table(model).alias("t0"))
        .column(Expression::CountAll)
        .so_that(conditions);

    Ok(Renderer::build(select))
}
