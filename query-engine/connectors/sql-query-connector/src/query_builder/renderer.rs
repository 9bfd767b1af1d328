use super::ast::*;
use rusqlite::types::Value as SqlValue;

/// Renders a statement tree into SQLite text. Parameters are collected in
/// the order their placeholders appear.
#[derive(Default)]
pub(crate) struct Renderer {
    sql: String,
    params: Vec<SqlValue>,
}

impl Renderer {
    pub fn build(query: impl Into<Query>) -> (String, Vec<SqlValue>) {
        let mut renderer = Renderer::default();

        match query.into() {
            Query::Select(select) => renderer.visit_select(&select),
            Query::Insert(insert) => renderer.visit_insert(&insert),
            Query::Update(update) => renderer.visit_update(&update),
            Query::Delete(delete) => renderer.visit_delete(&delete),
        }

        (renderer.sql, renderer.params)
    }

    fn write(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn delimited(&mut self, identifier: &str) {
        self.write("\"");
        self.write(&identifier.replace('"', "\"\""));
        self.write("\"");
    }

    fn visit_table(&mut self, table: &Table) {
        self.delimited(&table.name);

        if let Some(alias) = &table.alias {
            self.write(" AS ");
            self.write(alias);
        }
    }

    fn visit_column(&mut self, column: &Column) {
        if let Some(table) = &column.table {
            self.write(table);
            self.write(".");
        }

        self.delimited(&column.name);
    }

    fn visit_expressions(&mut self, expressions: &[Expression]) {
        for (idx, expression) in expressions.iter().enumerate() {
            if idx > 0 {
                self.write(", ");
            }

            self.visit_expression(expression);
        }
    }

    fn visit_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Column(column) => self.visit_column(column),
            Expression::Parameter(value) => {
                self.params.push(value.clone());
                self.write("?");
            }
            Expression::Literal(text) => {
                self.write("'");
                self.write(&text.replace('\'', "''"));
                self.write("'");
            }
            Expression::Function { name, args } => {
                self.write(name);
                self.write("(");
                self.visit_expressions(args);
                self.write(")");
            }
            Expression::Cast { expr, to } => {
                self.write("CAST(");
                self.visit_expression(expr);
                self.write(" AS ");
                self.write(to);
                self.write(")");
            }
            Expression::One => self.write("1"),
            Expression::CountAll => self.write("COUNT(*)"),
        }
    }

    fn visit_binary(&mut self, left: &Expression, operator: &str, right: &Expression) {
        self.visit_expression(left);
        self.write(operator);
        self.visit_expression(right);
    }

    fn visit_compare(&mut self, compare: &Compare) {
        match compare {
            Compare::Equals(left, right) => self.visit_binary(left, " = ", right),
            Compare::LessThan(left, right) => self.visit_binary(left, " < ", right),
            Compare::LessThanOrEquals(left, right) => self.visit_binary(left, " <= ", right),
            Compare::GreaterThan(left, right) => self.visit_binary(left, " > ", right),
            Compare::GreaterThanOrEquals(left, right) => self.visit_binary(left, " >= ", right),
            Compare::Null(expression) => {
                self.visit_expression(expression);
                self.write(" IS NULL");
            }
            Compare::NotNull(expression) => {
                self.visit_expression(expression);
                self.write(" IS NOT NULL");
            }
            Compare::In(_, values) if values.is_empty() => self.write("1=0"),
            Compare::In(expression, values) => {
                self.visit_expression(expression);
                self.write(" IN (");
                self.visit_expressions(values);
                self.write(")");
            }
            Compare::Like(left, right) => {
                self.visit_binary(left, " LIKE ", right);
                self.write(" ESCAPE '\\'");
            }
            Compare::Glob(left, right) => self.visit_binary(left, " GLOB ", right),
            Compare::Regexp(left, right) => self.visit_binary(left, " REGEXP ", right),
            Compare::Exists(select) => {
                self.write("EXISTS (");
                self.visit_select(select);
                self.write(")");
            }
        }
    }

    fn visit_junction(&mut self, conditions: &[ConditionTree], separator: &str, when_empty: &str) {
        if conditions.is_empty() {
            self.write(when_empty);
            return;
        }

        for (idx, condition) in conditions.iter().enumerate() {
            if idx > 0 {
                self.write(separator);
            }

            self.write("(");
            self.visit_conditions(condition);
            self.write(")");
        }
    }

    fn visit_conditions(&mut self, tree: &ConditionTree) {
        match tree {
            ConditionTree::And(conditions) => self.visit_junction(conditions, " AND ", "1=1"),
            ConditionTree::Or(conditions) => self.visit_junction(conditions, " OR ", "1=0"),
            ConditionTree::Not(inner) => {
                self.write("NOT (");
                self.visit_conditions(inner);
                self.write(")");
            }
            ConditionTree::Single(compare) => self.visit_compare(compare),
            ConditionTree::NoCondition => self.write("1=1"),
            ConditionTree::NegativeCondition => self.write("1=0"),
        }
    }

    fn visit_where(&mut self, conditions: &ConditionTree) {
        if *conditions != ConditionTree::NoCondition {
            self.write(" WHERE ");
            self.visit_conditions(conditions);
        }
    }

    fn visit_select(&mut self, select: &Select) {
        self.write("SELECT ");
        self.visit_expressions(&select.columns);
        self.write(" FROM ");
        self.visit_table(&select.table);

        for join in &select.joins {
            self.write(" LEFT JOIN ");
            self.visit_table(&join.table);
            self.write(" ON ");
            self.visit_conditions(&join.on);
        }

        self.visit_where(&select.conditions);

        if !select.ordering.is_empty() {
            self.write(" ORDER BY ");
            self.visit_expressions(&select.ordering);
        }
    }

    fn visit_insert(&mut self, insert: &Insert) {
        self.write("INSERT INTO ");
        self.visit_table(&insert.table);

        if insert.columns.is_empty() {
            self.write(" DEFAULT VALUES");
            return;
        }

        self.write(" (");

        for (idx, column) in insert.columns.iter().enumerate() {
            if idx > 0 {
                self.write(", ");
            }

            self.visit_column(column);
        }

        self.write(") VALUES (");
        self.visit_expressions(&insert.values);
        self.write(")");
    }

    fn visit_update(&mut self, update: &Update) {
        self.write("UPDATE ");
        self.visit_table(&update.table);
        self.write(" SET ");

        for (idx, (column, value)) in update.assignments.iter().enumerate() {
            if idx > 0 {
                self.write(", ");
            }

            self.visit_column(column);
            self.write(" = ");
            self.visit_expression(value);
        }

        self.visit_where(&update.conditions);
    }

    fn visit_delete(&mut self, delete: &Delete) {
        self.write("DELETE FROM ");
        self.visit_table(&delete.table);
        self.visit_where(&delete.conditions);
    }
}
