//! Filtering types to select records from storage.
//!
//! A filter is expressed in terms of model field names. Relation filters
//! descend into the model on the other side of a linked field and match when
//! at least one related record satisfies the nested filter.

mod lookup;

pub use lookup::*;

use crate::Value;

/// Separates the segments of a field path, e.g. `home__location` or
/// `name__icontains`.
pub const PATH_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Scalar(ScalarFilter),
    Relation(RelationFilter),
    BoolFilter(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarFilter {
    pub field: String,
    /// Extracts part of a date or time before comparing.
    pub transform: Option<DatePart>,
    pub lookup: Lookup,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationFilter {
    /// A foreign or related field of the filtered model.
    pub field: String,
    pub nested: Box<Filter>,
}

impl Filter {
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    pub fn empty() -> Self {
        Filter::BoolFilter(true)
    }

    /// Matches nothing.
    pub fn none() -> Self {
        Filter::BoolFilter(false)
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(field, Lookup::Exact, value)
    }

    pub fn scalar(field: impl Into<String>, lookup: Lookup, value: impl Into<Value>) -> Self {
        Filter::Scalar(ScalarFilter {
            field: field.into(),
            transform: None,
            lookup,
            value: value.into(),
        })
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::scalar(field, Lookup::In, Value::List(values))
    }

    pub fn relation(field: impl Into<String>, nested: Filter) -> Self {
        Filter::Relation(RelationFilter {
            field: field.into(),
            nested: Box::new(nested),
        })
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Filter::BoolFilter(b) => *b,
            Filter::And(filters) => filters.iter().all(Filter::is_empty),
            _ => false,
        }
    }

    /// Conjunction that drops trivially true members and flattens nested
    /// conjunctions.
    pub fn conjoin(self, other: Filter) -> Filter {
        let mut filters = Vec::new();

        for filter in [self, other] {
            match filter {
                filter if filter.is_empty() => (),
                Filter::And(inner) => filters.extend(inner.into_iter().filter(|f| !f.is_empty())),
                filter => filters.push(filter),
            }
        }

        match filters.len() {
            0 => Filter::empty(),
            1 => filters.pop().unwrap_or_else(Filter::empty),
            _ => Filter::And(filters),
        }
    }
}

impl From<bool> for Filter {
    fn from(b: bool) -> Self {
        Filter::BoolFilter(b)
    }
}

impl From<ScalarFilter> for Filter {
    fn from(sf: ScalarFilter) -> Self {
        Filter::Scalar(sf)
    }
}

impl From<RelationFilter> for Filter {
    fn from(rf: RelationFilter) -> Self {
        Filter::Relation(rf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjoin_skips_empty_filters_and_flattens() {
        let filter = Filter::empty()
            .conjoin(Filter::equals("name", "A"))
            .conjoin(Filter::and(vec![Filter::equals("age", 3), Filter::empty()]));

        assert_eq!(
            filter,
            Filter::And(vec![Filter::equals("name", "A"), Filter::equals("age", 3)])
        );
        assert!(Filter::empty().conjoin(Filter::empty()).is_empty());
    }
}
