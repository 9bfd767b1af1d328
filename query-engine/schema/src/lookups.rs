use crate::ScalarType;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The argument type a lookup expects, relative to the filtered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupArgument {
    /// Same type as the field.
    Same,
    /// A list of the field type.
    ListOfSame,
    Scalar(ScalarType),
}

impl LookupArgument {
    /// Part lookups yielding integers accept the integer comparisons as a
    /// further suffix, e.g. `created__year__gte`.
    pub fn is_composable(&self) -> bool {
        matches!(self, LookupArgument::Scalar(ScalarType::Int))
    }
}

pub type LookupTable = Vec<(&'static str, LookupArgument)>;

const STRING_LOOKUPS: [&str; 9] = [
    "iexact",
    "contains",
    "icontains",
    "startswith",
    "istartswith",
    "endswith",
    "iendswith",
    "regex",
    "iregex",
];

const DATE_PARTS: [&str; 8] = [
    "year",
    "iso_year",
    "quarter",
    "month",
    "week",
    "iso_week_day",
    "week_day",
    "day",
];

const TIME_PARTS: [&str; 3] = ["hour", "minute", "second"];

fn comparisons() -> LookupTable {
    vec![
        ("lt", LookupArgument::Same),
        ("lte", LookupArgument::Same),
        ("gt", LookupArgument::Same),
        ("gte", LookupArgument::Same),
        ("in", LookupArgument::ListOfSame),
        ("isnull", LookupArgument::Scalar(ScalarType::Boolean)),
    ]
}

fn parts(names: &[&'static str]) -> LookupTable {
    names
        .iter()
        .map(|name| (*name, LookupArgument::Scalar(ScalarType::Int)))
        .collect()
}

static LOOKUPS: Lazy<HashMap<ScalarType, LookupTable>> = Lazy::new(|| {
    let mut lookups = HashMap::new();

    lookups.insert(ScalarType::Boolean, Vec::new());

    for numeric in [ScalarType::Int, ScalarType::Float, ScalarType::Decimal] {
        lookups.insert(numeric, comparisons());
    }

    let mut string: LookupTable = STRING_LOOKUPS
        .iter()
        .map(|name| (*name, LookupArgument::Same))
        .collect();
    string.extend(comparisons());
    lookups.insert(ScalarType::String, string);

    let mut date = parts(&DATE_PARTS);
    date.extend(comparisons());
    lookups.insert(ScalarType::Date, date);

    let mut time = parts(&TIME_PARTS);
    time.extend(comparisons());
    lookups.insert(ScalarType::Time, time);

    let mut datetime = vec![
        ("date", LookupArgument::Scalar(ScalarType::Date)),
        ("time", LookupArgument::Scalar(ScalarType::Time)),
    ];
    datetime.extend(parts(&DATE_PARTS));
    datetime.extend(parts(&TIME_PARTS));
    datetime.extend(comparisons());
    lookups.insert(ScalarType::DateTime, datetime);

    lookups
});

/// Lookups available on a scalar, in the order filters are emitted. `None`
/// when the scalar cannot be filtered on at all.
pub fn lookups_for(scalar: ScalarType) -> Option<&'static [(&'static str, LookupArgument)]> {
    LOOKUPS.get(&scalar).map(Vec::as_slice)
}

/// Lookups for enum fields.
pub fn enum_lookups() -> &'static [(&'static str, LookupArgument)] {
    &[
        ("in", LookupArgument::ListOfSame),
        ("isnull", LookupArgument::Scalar(ScalarType::Boolean)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(scalar: ScalarType) -> Vec<&'static str> {
        lookups_for(scalar).unwrap().iter().map(|(name, _)| *name).collect()
    }

    #[test]
    fn datetime_lookups_combine_date_and_time_parts() {
        assert_eq!(
            names(ScalarType::DateTime),
            vec![
                "date",
                "time",
                "year",
                "iso_year",
                "quarter",
                "month",
                "week",
                "iso_week_day",
                "week_day",
                "day",
                "hour",
                "minute",
                "second",
                "lt",
                "lte",
                "gt",
                "gte",
                "in",
                "isnull"
            ]
        );
    }

    #[test]
    fn booleans_and_json_have_no_lookups() {
        assert!(names(ScalarType::Boolean).is_empty());
        assert!(lookups_for(ScalarType::Json).is_none());
    }
}
