use crate::{
    error::SqlError,
    query_builder::{
        aliased_column,
        ast::{Comparable, Compare, ConditionTree, Expression, Select},
        column_data, model_table,
    },
    value::to_comparable_sql_value,
};
use query_structure::{
    FieldData, Filter, Lookup, Model, RelationFilter, ScalarFilter, TypeIdentifier, Value,
};
use rusqlite::types::Value as SqlValue;

/// Translates a [Filter] into a condition tree.
///
/// Relation filters become correlated `EXISTS` subqueries, each with a fresh
/// table alias taken from the same counter as the outer query.
pub(crate) struct FilterVisitor {
    last_alias: usize,
}

impl FilterVisitor {
    /// `last_alias` is the highest alias index already used by the caller.
    pub fn new(last_alias: usize) -> Self {
        Self { last_alias }
    }

    fn next_alias(&mut self) -> String {
        self.last_alias += 1;
        format!("t{}", self.last_alias)
    }

    pub fn visit(&mut self, model: &Model, alias: &str, filter: &Filter) -> crate::Result<ConditionTree> {
        if filter.is_empty() {
            return Ok(ConditionTree::NoCondition);
        }

        match filter {
            Filter::BoolFilter(true) => Ok(ConditionTree::NoCondition),
            Filter::BoolFilter(false) => Ok(ConditionTree::NegativeCondition),
            Filter::And(filters) => Ok(ConditionTree::And(self.visit_all(model, alias, filters)?)),
            Filter::Or(filters) => Ok(ConditionTree::Or(self.visit_all(model, alias, filters)?)),
            Filter::Not(inner) => Ok(self.visit(model, alias, inner)?.not()),
            Filter::Scalar(filter) => self.visit_scalar(model, alias, filter),
            Filter::Relation(filter) => self.visit_relation(model, alias, filter),
        }
    }

    fn visit_all(&mut self, model: &Model, alias: &str, filters: &[Filter]) -> crate::Result<Vec<ConditionTree>> {
        filters.iter().map(|filter| self.visit(model, alias, filter)).collect()
    }

    fn visit_relation(&mut self, model: &Model, alias: &str, filter: &RelationFilter) -> crate::Result<ConditionTree> {
        let field = model.field(&filter.field)?;
        let sub_alias = self.next_alias();
        let other = field
            .link()
            .ok_or_else(|| SqlError::ConversionError(format!("{} is not a linked field", filter.field)))?
            .model;

        let correlation = match field.data() {
            FieldData::Foreign(ff) => {
                let target_column = column_data(&other, &ff.target_field)?;
                let value_column = column_data(model, &ff.value_field)?;

                aliased_column(&sub_alias, &target_column.db_name).equals(aliased_column(alias, &value_column.db_name))
            }
            FieldData::Related(rf) => {
                let value_column = column_data(&other, &rf.value_field)?;
                let source_field = other.field(&rf.source_field)?;
                let target_field = source_field
                    .as_foreign()
                    .map(|ff| ff.target_field.clone())
                    .unwrap_or_else(|| model.primary_key_name().to_owned());
                let key_column = column_data(model, &target_field)?;

                aliased_column(&sub_alias, &value_column.db_name).equals(aliased_column(alias, &key_column.db_name))
            }
            FieldData::Scalar(_) => {
                return Err(SqlError::ConversionError(format!(
                    "{} is not a linked field of {}",
                    filter.field,
                    model.name()
                )))
            }
        };

        let nested = self.visit(&other, &sub_alias, &filter.nested)?;
        let conditions = match nested {
            ConditionTree::NoCondition => ConditionTree::from(correlation),
            nested => ConditionTree::from(correlation).and(nested),
        };

        let exists = Select::from_table(model_table(&other).alias(sub_alias))
            .column(Expression::One)
            .so_that(conditions);

        Ok(Compare::Exists(Box::new(exists)).into())
    }

    fn visit_scalar(&mut self, model: &Model, alias: &str, filter: &ScalarFilter) -> crate::Result<ConditionTree> {
        let data = column_data(model, &filter.field)?;
        let column = Expression::from(aliased_column(alias, &data.db_name));

        let column = match filter.transform {
            Some(part) => Expression::Function {
                name: "date_part",
                args: vec![Expression::Literal(part.as_str().to_owned()), column],
            },
            None if data.type_identifier == TypeIdentifier::Decimal => Expression::Cast {
                expr: Box::new(column),
                to: "REAL",
            },
            None => column,
        };

        let value = &filter.value;
        let param = |value: &Value| Expression::Parameter(to_comparable_sql_value(value));

        let compare = match filter.lookup {
            Lookup::Exact if value.is_null() => column.is_null(),
            Lookup::Exact => column.equals(param(value)),
            Lookup::Lt => column.less_than(param(value)),
            Lookup::Lte => column.less_than_or_equals(param(value)),
            Lookup::Gt => column.greater_than(param(value)),
            Lookup::Gte => column.greater_than_or_equals(param(value)),
            Lookup::IsNull => match value.as_bool() {
                Some(false) => column.is_not_null(),
                _ => column.is_null(),
            },
            Lookup::In => {
                let values = value.as_list().unwrap_or_default();
                column.in_selection(values.iter().map(param).collect())
            }
            Lookup::IExact => like(column, string_value(filter)?, "", ""),
            Lookup::IContains => like(column, string_value(filter)?, "%", "%"),
            Lookup::IStartsWith => like(column, string_value(filter)?, "", "%"),
            Lookup::IEndsWith => like(column, string_value(filter)?, "%", ""),
            Lookup::Contains => glob(column, string_value(filter)?, "*", "*"),
            Lookup::StartsWith => glob(column, string_value(filter)?, "", "*"),
            Lookup::EndsWith => glob(column, string_value(filter)?, "*", ""),
            Lookup::Regex => {
                let pattern = string_value(filter)?.to_owned();
                column.regexp(SqlValue::Text(pattern))
            }
            Lookup::IRegex => {
                let pattern = format!("(?i){}", string_value(filter)?);
                column.regexp(SqlValue::Text(pattern))
            }
        };

        Ok(compare.into())
    }
}

/// Case-insensitive match. `LIKE` folds ASCII case only.
fn like(column: Expression, needle: &str, before: &str, after: &str) -> Compare {
    let escaped: String = needle
        .chars()
        .flat_map(|c| match c {
            '%' | '_' | '\\' => vec!['\\', c],
            c => vec![c],
        })
        .collect();

    column.like(SqlValue::Text(format!("{before}{escaped}{after}")))
}

/// Case-sensitive match.
fn glob(column: Expression, needle: &str, before: &str, after: &str) -> Compare {
    let escaped: String = needle
        .chars()
        .map(|c| match c {
            '*' | '?' | '[' => format!("[{c}]"),
            c => c.to_string(),
        })
        .collect();

    column.glob(SqlValue::Text(format!("{before}{escaped}{after}")))
}

fn string_value(filter: &ScalarFilter) -> crate::Result<&str> {
    match &filter.value {
        Value::String(s) => Ok(s),
        other => Err(SqlError::ConversionError(format!(
            "{} expects a string, got {other}",
            filter.lookup
        ))),
    }
}
