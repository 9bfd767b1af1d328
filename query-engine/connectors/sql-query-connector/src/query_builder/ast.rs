//! A small statement tree for the queries this connector runs. Values only
//! ever enter it as parameters; the renderer decides their position.

use rusqlite::types::Value as SqlValue;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Table {
    pub name: String,
    pub alias: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Column {
    /// Alias of the table owning the column, if the statement needs one.
    pub table: Option<String>,
    pub name: String,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn table(mut self, alias: impl Into<String>) -> Self {
        self.table = Some(alias.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expression {
    Column(Column),
    Parameter(SqlValue),
    /// A quoted string literal, for function arguments fixed by the builder.
    Literal(String),
    Function { name: &'static str, args: Vec<Expression> },
    Cast { expr: Box<Expression>, to: &'static str },
    /// `1`, for subqueries that only test for existence.
    One,
    CountAll,
}

impl From<Column> for Expression {
    fn from(column: Column) -> Self {
        Expression::Column(column)
    }
}

impl From<SqlValue> for Expression {
    fn from(value: SqlValue) -> Self {
        Expression::Parameter(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Compare {
    Equals(Expression, Expression),
    LessThan(Expression, Expression),
    LessThanOrEquals(Expression, Expression),
    GreaterThan(Expression, Expression),
    GreaterThanOrEquals(Expression, Expression),
    Null(Expression),
    NotNull(Expression),
    In(Expression, Vec<Expression>),
    /// `LIKE` with `\` as the escape character.
    Like(Expression, Expression),
    Glob(Expression, Expression),
    Regexp(Expression, Expression),
    Exists(Box<Select>),
}

/// Building comparisons from either side of a condition, the way quaint's
/// `Comparable` does.
pub(crate) trait Comparable: Into<Expression> {
    fn equals(self, other: impl Into<Expression>) -> Compare {
        Compare::Equals(self.into(), other.into())
    }

    fn less_than(self, other: impl Into<Expression>) -> Compare {
        Compare::LessThan(self.into(), other.into())
    }

    fn less_than_or_equals(self, other: impl Into<Expression>) -> Compare {
        Compare::LessThanOrEquals(self.into(), other.into())
    }

    fn greater_than(self, other: impl Into<Expression>) -> Compare {
        Compare::GreaterThan(self.into(), other.into())
    }

    fn greater_than_or_equals(self, other: impl Into<Expression>) -> Compare {
        Compare::GreaterThanOrEquals(self.into(), other.into())
    }

    fn is_null(self) -> Compare {
        Compare::Null(self.into())
    }

    fn is_not_null(self) -> Compare {
        Compare::NotNull(self.into())
    }

    fn in_selection(self, values: Vec<Expression>) -> Compare {
        Compare::In(self.into(), values)
    }

    fn like(self, pattern: impl Into<Expression>) -> Compare {
        Compare::Like(self.into(), pattern.into())
    }

    fn glob(self, pattern: impl Into<Expression>) -> Compare {
        Compare::Glob(self.into(), pattern.into())
    }

    fn regexp(self, pattern: impl Into<Expression>) -> Compare {
        Compare::Regexp(self.into(), pattern.into())
    }
}

impl Comparable for Expression {}
impl Comparable for Column {}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConditionTree {
    And(Vec<ConditionTree>),
    Or(Vec<ConditionTree>),
    Not(Box<ConditionTree>),
    Single(Box<Compare>),
    /// Always true.
    NoCondition,
    /// Always false.
    NegativeCondition,
}

impl ConditionTree {
    pub fn not(self) -> Self {
        ConditionTree::Not(Box::new(self))
    }

    pub fn and(self, other: impl Into<ConditionTree>) -> Self {
        match self {
            ConditionTree::NoCondition => other.into(),
            ConditionTree::And(mut conditions) => {
                conditions.push(other.into());
                ConditionTree::And(conditions)
            }
            this => ConditionTree::And(vec![this, other.into()]),
        }
    }
}

impl From<Compare> for ConditionTree {
    fn from(compare: Compare) -> Self {
        ConditionTree::Single(Box::new(compare))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Join {
    pub table: Table,
    pub on: ConditionTree,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Select {
    pub table: Table,
    pub columns: Vec<Expression>,
    pub joins: Vec<Join>,
    pub conditions: ConditionTree,
    pub ordering: Vec<Expression>,
}

impl Select {
    pub fn from_table(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            joins: Vec::new(),
            conditions: ConditionTree::NoCondition,
            ordering: Vec::new(),
        }
    }

    pub fn column(mut self, column: impl Into<Expression>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn left_join(mut self, table: Table, on: impl Into<ConditionTree>) -> Self {
        self.joins.push(Join { table, on: on.into() });
        self
    }

    pub fn so_that(mut self, conditions: impl Into<ConditionTree>) -> Self {
        self.conditions = conditions.into();
        self
    }

    pub fn order_by(mut self, expression: impl Into<Expression>) -> Self {
        self.ordering.push(expression.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Insert {
    pub table: Table,
    pub columns: Vec<Column>,
    pub values: Vec<Expression>,
}

impl Insert {
    pub fn into_table(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, column: Column, value: impl Into<Expression>) -> Self {
        self.columns.push(column);
        self.values.push(value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Update {
    pub table: Table,
    pub assignments: Vec<(Column, Expression)>,
    pub conditions: ConditionTree,
}

impl Update {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            conditions: ConditionTree::NoCondition,
        }
    }

    pub fn set(mut self, column: Column, value: impl Into<Expression>) -> Self {
        self.assignments.push((column, value.into()));
        self
    }

    pub fn so_that(mut self, conditions: impl Into<ConditionTree>) -> Self {
        self.conditions = conditions.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Delete {
    pub table: Table,
    pub conditions: ConditionTree,
}

impl Delete {
    pub fn from_table(table: Table) -> Self {
        Self {
            table,
            conditions: ConditionTree::NoCondition,
        }
    }

    pub fn so_that(mut self, conditions: impl Into<ConditionTree>) -> Self {
        self.conditions = conditions.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Query {
    Select(Box<Select>),
    Insert(Box<Insert>),
    Update(Box<Update>),
    Delete(Box<Delete>),
}

impl From<Select> for Query {
    fn from(select: Select) -> Self {
        Query::Select(Box::new(select))
    }
}

impl From<Insert> for Query {
    fn from(insert: Insert) -> Self {
        Query::Insert(Box::new(insert))
    }
}

impl From<Update> for Query {
    fn from(update: Update) -> Self {
        Query::Update(Box::new(update))
    }
}

impl From<Delete> for Query {
    fn from(delete: Delete) -> Self {
        Query::Delete(Box::new(delete))
    }
}
