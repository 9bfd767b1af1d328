use crate::{enum_lookups, lookups_for, LookupArgument, ScalarType, TypeDecl, TypeMapping};
use query_structure::PATH_SEPARATOR;

/// Filter arguments accepted by collection reads over a read mapping.
///
/// Every scalar or enum field gets an equality filter under its own name and
/// one filter per lookup, `field__lookup`. Nested objects contribute their
/// filters under `field__`. Boolean fields only get equality, JSON and list
/// fields get nothing.
pub fn build_filters(mapping: &TypeMapping, prefix: &str) -> TypeMapping {
    let mut filters = TypeMapping::new();

    for (name, decl) in mapping {
        let path = format!("{prefix}{name}");

        match strip_required(decl) {
            TypeDecl::Scalar(ScalarType::Json) => (),
            TypeDecl::Scalar(ScalarType::Boolean) => {
                filters.insert(path, TypeDecl::boolean());
            }
            TypeDecl::Scalar(scalar) => add_lookups(&mut filters, &path, &TypeDecl::Scalar(scalar), lookups_for(scalar)),
            enum_decl @ TypeDecl::Enum(_) => add_lookups(&mut filters, &path, &enum_decl, Some(enum_lookups())),
            TypeDecl::Object(nested) => {
                filters.extend(build_filters(&nested, &format!("{path}{PATH_SEPARATOR}")));
            }
            TypeDecl::List(inner) => {
                if let TypeDecl::Object(nested) = *inner {
                    filters.extend(build_filters(&nested, &format!("{path}{PATH_SEPARATOR}")));
                }
            }
            TypeDecl::Required(_) | TypeDecl::Model(_) => (),
        }
    }

    filters
}

fn add_lookups(
    filters: &mut TypeMapping,
    path: &str,
    field_type: &TypeDecl,
    lookups: Option<&'static [(&'static str, LookupArgument)]>,
) {
    filters.insert(path.to_owned(), field_type.clone());

    for (lookup, argument) in lookups.unwrap_or_default() {
        let lookup_path = format!("{path}{PATH_SEPARATOR}{lookup}");

        filters.insert(lookup_path.clone(), argument_type(field_type, *argument));

        if argument.is_composable() {
            let int = TypeDecl::int();

            for (int_lookup, int_argument) in lookups_for(ScalarType::Int).unwrap_or_default() {
                filters.insert(
                    format!("{lookup_path}{PATH_SEPARATOR}{int_lookup}"),
                    argument_type(&int, *int_argument),
                );
            }
        }
    }
}

fn argument_type(field_type: &TypeDecl, argument: LookupArgument) -> TypeDecl {
    match argument {
        LookupArgument::Same => field_type.clone(),
        LookupArgument::ListOfSame => TypeDecl::list(field_type.clone()),
        LookupArgument::Scalar(scalar) => TypeDecl::Scalar(scalar),
    }
}

/// Filters are optional arguments, whatever the output strictness.
fn strip_required(decl: &TypeDecl) -> TypeDecl {
    match decl {
        TypeDecl::Required(inner) => strip_required(inner),
        TypeDecl::List(inner) => TypeDecl::list(strip_required(inner)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn booleans_only_get_equality_and_lists_nothing() {
        let mapping = TypeMapping::from([
            ("active".to_owned(), TypeDecl::required(TypeDecl::boolean())),
            ("tags".to_owned(), TypeDecl::list(TypeDecl::string())),
            ("data".to_owned(), TypeDecl::json()),
        ]);

        let filters = build_filters(&mapping, "");

        assert_eq!(filters.keys().collect::<Vec<_>>(), vec!["active"]);
        assert_eq!(filters["active"], TypeDecl::boolean());
    }

    #[test]
    fn date_parts_compose_with_integer_lookups() {
        let mapping = TypeMapping::from([("born".to_owned(), TypeDecl::date())]);

        let filters = build_filters(&mapping, "");

        assert_eq!(filters["born__year"], TypeDecl::int());
        assert_eq!(filters["born__year__in"], TypeDecl::list(TypeDecl::int()));
        assert_eq!(filters["born__gte"], TypeDecl::date());
        assert_eq!(filters["born__isnull"], TypeDecl::boolean());
        assert!(!filters.contains_key("born__date"));
    }
}
