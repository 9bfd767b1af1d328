use crate::{CoreError, CoreResult};
use query_structure::{
    DatePart, Field, Filter, Lookup, Model, ScalarFilter, TypeIdentifier, Value, ValueMap, PATH_SEPARATOR,
};

/// Extracts a filter for a unique selector, i.e. a filter that selects at
/// most one record.
pub fn extract_unique_filter(model: &Model, arguments: &ValueMap) -> CoreResult<Filter> {
    arguments.iter().try_fold(Filter::empty(), |filter, (name, value)| {
        let field = model
            .find_field(name)
            .filter(Field::is_scalar)
            .ok_or_else(|| unknown_argument(model, name))?;

        let value = coerce(&field, None, Lookup::Exact, value.clone()).map_err(|reason| CoreError::InvalidArgument {
            argument: name.clone(),
            reason,
        })?;

        Ok(filter.conjoin(Filter::equals(name.clone(), value)))
    })
}

/// Extracts a filter from collection arguments.
///
/// Argument names are paths: linked fields first, then a scalar field, an
/// optional date part and an optional lookup, e.g. `home__location`,
/// `name__icontains` or `birth_date__year__gte`. All arguments must hold.
pub fn extract_filter(model: &Model, arguments: &ValueMap) -> CoreResult<Filter> {
    arguments.iter().try_fold(Filter::empty(), |filter, (name, value)| {
        Ok(filter.conjoin(extract_argument(model, name, value.clone())?))
    })
}

fn extract_argument(model: &Model, name: &str, value: Value) -> CoreResult<Filter> {
    let segments: Vec<&str> = name.split(PATH_SEPARATOR).collect();
    let mut relations = Vec::new();
    let mut current = model.clone();

    for (idx, segment) in segments.iter().enumerate() {
        let field = current
            .find_field(segment)
            .ok_or_else(|| unknown_argument(model, name))?;

        if let Some(link) = field.link() {
            relations.push(*segment);
            current = link.model;
            continue;
        }

        let (transform, lookup) = parse_suffix(&field, &segments[idx + 1..]).ok_or_else(|| unknown_argument(model, name))?;

        let value = coerce(&field, transform, lookup, value).map_err(|reason| CoreError::InvalidArgument {
            argument: name.to_owned(),
            reason,
        })?;

        let scalar = Filter::Scalar(ScalarFilter {
            field: (*segment).to_owned(),
            transform,
            lookup,
            value,
        });

        return Ok(relations
            .into_iter()
            .rev()
            .fold(scalar, |nested, relation| Filter::relation(relation, nested)));
    }

    Err(unknown_argument(model, name))
}

/// Splits what follows the field name into an optional date part and a
/// lookup, `exact` when omitted.
fn parse_suffix(field: &Field, suffix: &[&str]) -> Option<(Option<DatePart>, Lookup)> {
    let temporal = field
        .as_scalar()
        .map(|sf| {
            matches!(
                sf.type_identifier,
                TypeIdentifier::Date | TypeIdentifier::DateTime | TypeIdentifier::Time
            )
        })
        .unwrap_or(false);

    let part = |name: &str| DatePart::parse(name).filter(|_| temporal);

    match suffix {
        [] => Some((None, Lookup::Exact)),
        [single] => match part(single) {
            Some(part) => Some((Some(part), Lookup::Exact)),
            None => Lookup::parse(single).map(|lookup| (None, lookup)),
        },
        [transform, lookup] => Some((Some(part(transform)?), Lookup::parse(lookup)?)),
        _ => None,
    }
}

fn coerce(field: &Field, transform: Option<DatePart>, lookup: Lookup, value: Value) -> Result<Value, String> {
    let field_type = field
        .as_scalar()
        .map(|sf| sf.type_identifier)
        .ok_or_else(|| format!("`{}` is not a scalar field", field.name()))?;

    let target = match transform {
        Some(DatePart::Date) => TypeIdentifier::Date,
        Some(DatePart::Time) => TypeIdentifier::Time,
        Some(_) => TypeIdentifier::Int,
        None => field_type,
    };

    let target = match lookup {
        Lookup::IsNull => TypeIdentifier::Boolean,
        lookup if is_pattern(lookup) => TypeIdentifier::String,
        _ => target,
    };

    let coerced = match (lookup, value) {
        (Lookup::In, Value::List(values)) => Value::List(
            values
                .into_iter()
                .map(|value| value.coerce(target))
                .collect::<Result<_, _>>()
                .map_err(|err| err.to_string())?,
        ),
        (Lookup::In, other) => return Err(format!("expected a list, found {other}")),
        (_, value) => value.coerce(target).map_err(|err| err.to_string())?,
    };

    Ok(coerced)
}

fn is_pattern(lookup: Lookup) -> bool {
    matches!(
        lookup,
        Lookup::IExact
            | Lookup::Contains
            | Lookup::IContains
            | Lookup::StartsWith
            | Lookup::IStartsWith
            | Lookup::EndsWith
            | Lookup::IEndsWith
            | Lookup::Regex
            | Lookup::IRegex
    )
}

fn unknown_argument(model: &Model, name: &str) -> CoreError {
    CoreError::UnknownArgument {
        model: model.name().to_owned(),
        argument: name.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use query_structure::{
        DataModelBuilder, ForeignKeyBuilder, InternalDataModelExt, InternalDataModelRef, ModelBuilder,
        ScalarFieldBuilder,
    };

    fn data_model() -> InternalDataModelRef {
        DataModelBuilder::new()
            .model(
                ModelBuilder::new("House")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("location")),
            )
            .model(
                ModelBuilder::new("Person")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("name"))
                    .field(ScalarFieldBuilder::new("birth_date", TypeIdentifier::Date).optional())
                    .field(ForeignKeyBuilder::new("home", "House").optional().related_name("tenants")),
            )
            .build()
            .unwrap()
    }

    fn arguments<const N: usize>(entries: [(&str, Value); N]) -> ValueMap {
        entries.into_iter().map(|(key, value)| (key.to_owned(), value)).collect()
    }

    #[test]
    fn arguments_are_parsed_into_lookups_and_date_parts() {
        let dm = data_model();
        let person = dm.find_model("Person").unwrap();

        let filter = extract_filter(
            &person,
            &arguments([
                ("name__icontains", Value::from("al")),
                ("birth_date__year__gte", Value::Int(1990)),
                ("id__in", Value::List(vec![Value::Int(1), Value::from("2")])),
            ]),
        )
        .unwrap();

        assert_eq!(
            filter,
            Filter::And(vec![
                Filter::scalar("name", Lookup::IContains, "al"),
                Filter::Scalar(ScalarFilter {
                    field: "birth_date".into(),
                    transform: Some(DatePart::Year),
                    lookup: Lookup::Gte,
                    value: Value::Int(1990),
                }),
                Filter::is_in("id", vec![Value::Int(1), Value::Int(2)]),
            ])
        );
    }

    #[test]
    fn linked_fields_become_relation_filters() {
        let dm = data_model();
        let house = dm.find_model("House").unwrap();

        let filter = extract_filter(&house, &arguments([("tenants__home__location", Value::from("Paris"))])).unwrap();

        assert_eq!(
            filter,
            Filter::relation("tenants", Filter::relation("home", Filter::equals("location", "Paris")))
        );
    }

    #[test]
    fn unknown_paths_are_rejected() {
        let dm = data_model();
        let person = dm.find_model("Person").unwrap();

        for name in ["nickname", "name__year", "home", "name__icontains__gte"] {
            let err = extract_filter(&person, &arguments([(name, Value::from("x"))])).unwrap_err();
            assert!(matches!(err, CoreError::UnknownArgument { .. }), "{name}: {err}");
        }
    }

    #[test]
    fn unique_filters_only_accept_scalars() {
        let dm = data_model();
        let person = dm.find_model("Person").unwrap();

        assert_eq!(
            extract_unique_filter(&person, &arguments([("id", Value::from("4"))])).unwrap(),
            Filter::equals("id", 4)
        );
        assert!(extract_unique_filter(&person, &arguments([("home", Value::Int(1))])).is_err());
        assert!(extract_unique_filter(&person, &ValueMap::new()).unwrap().is_empty());
    }
}
