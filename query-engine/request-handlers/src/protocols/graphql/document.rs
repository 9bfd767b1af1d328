//! Turns a parsed GraphQL document into the tree of fields to execute.
//!
//! The operation to run is picked, variables are coerced with their
//! defaults, fragments are inlined, `@skip` / `@include` are applied and
//! fields sharing a response key are merged. Every field is checked against
//! the type it is selected on, so a tree that comes out of here only names
//! existing fields and has sub-selections exactly where objects are
//! returned. Root field arguments are checked separately, against their
//! declared input types.

use crate::{HandlerError, Result};
use graphql_parser::query::{
    Definition, Directive, Document, Field, FragmentDefinition, OperationDefinition, Selection as GqlSelection,
    SelectionSet as GqlSelectionSet, Type, TypeCondition, Value as GqlValue, VariableDefinition,
};
use indexmap::IndexMap;
use query_structure::{Selection, SelectionSet};
use schema::{ObjectType, QuerySchema, QueryTag, RootField, TypeNode};
use std::collections::{HashMap, HashSet};

pub(crate) const TYPENAME: &str = "__typename";

type Json = serde_json::Value;
type Variables = serde_json::Map<String, Json>;

/// A field of the response, after fragments and directives are resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldNode {
    /// The alias, or the field name when there is none.
    pub response_key: String,
    pub name: String,
    /// Argument values with variables substituted. Arguments bound to a
    /// variable that was not provided are left out.
    pub arguments: IndexMap<String, Json>,
    pub selection: Vec<FieldNode>,
    pub leaf: bool,
}

impl FieldNode {
    pub fn is_typename(&self) -> bool {
        self.name == TYPENAME
    }
}

#[derive(Debug)]
pub(crate) struct ResolvedOperation {
    pub tag: QueryTag,
    pub fields: Vec<FieldNode>,
}

/// The selection as the executor sees it: by field name, aliases merged.
pub(crate) fn selection_set(fields: &[FieldNode]) -> SelectionSet {
    let mut set = SelectionSet::new();

    for field in fields.iter().filter(|field| !field.is_typename()) {
        let selection = if field.leaf {
            Selection::Leaf
        } else {
            Selection::Object(selection_set(&field.selection))
        };

        set.insert(field.name.clone(), selection);
    }

    set
}

pub(crate) fn root_type_name(tag: QueryTag) -> &'static str {
    match tag {
        QueryTag::Query => "Query",
        QueryTag::Mutation => "Mutation",
    }
}

pub(crate) fn resolve_operation(
    document: &Document<'_, String>,
    operation_name: Option<&str>,
    variables: &Variables,
    query_schema: &QuerySchema,
) -> Result<ResolvedOperation> {
    let operation = select_operation(document, operation_name)?;

    let fragments = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
            Definition::Operation(_) => None,
        })
        .collect();

    let mut resolver = DocumentResolver {
        fragments,
        defined: operation
            .variable_definitions
            .iter()
            .map(|definition| definition.name.as_str())
            .collect(),
        variables: coerce_variables(operation.variable_definitions, variables)?,
        spreading: Vec::new(),
    };

    let parent = Parent::Root(operation.tag, query_schema.root_fields(operation.tag));
    let fields = resolver.fields(&[operation.selection_set], parent)?;

    Ok(ResolvedOperation {
        tag: operation.tag,
        fields,
    })
}

struct Operation<'d, 's> {
    tag: QueryTag,
    variable_definitions: &'d [VariableDefinition<'s, String>],
    selection_set: &'d GqlSelectionSet<'s, String>,
}

fn select_operation<'d, 's>(document: &'d Document<'s, String>, operation_name: Option<&str>) -> Result<Operation<'d, 's>> {
    let mut operations = document.definitions.iter().filter_map(|definition| match definition {
        Definition::Operation(operation) => Some(operation),
        Definition::Fragment(_) => None,
    });

    let operation = match operation_name {
        Some(wanted) => operations
            .find(|operation| name_of(operation) == Some(wanted))
            .ok_or_else(|| HandlerError::malformed(format!("Unknown operation named \"{wanted}\".")))?,
        None => {
            let first = operations
                .next()
                .ok_or_else(|| HandlerError::malformed("Must provide an operation."))?;

            if operations.next().is_some() {
                return Err(HandlerError::malformed(
                    "Must provide operation name if query contains multiple operations.",
                ));
            }

            first
        }
    };

    match operation {
        OperationDefinition::SelectionSet(selection_set) => Ok(Operation {
            tag: QueryTag::Query,
            variable_definitions: &[],
            selection_set,
        }),
        OperationDefinition::Query(query) => Ok(Operation {
            tag: QueryTag::Query,
            variable_definitions: &query.variable_definitions,
            selection_set: &query.selection_set,
        }),
        OperationDefinition::Mutation(mutation) => Ok(Operation {
            tag: QueryTag::Mutation,
            variable_definitions: &mutation.variable_definitions,
            selection_set: &mutation.selection_set,
        }),
        OperationDefinition::Subscription(subscription) => Err(HandlerError::unsupported_feature(
            "Subscription query",
            format!("At position {}.", subscription.position),
        )),
    }
}

fn name_of<'d>(operation: &'d OperationDefinition<'_, String>) -> Option<&'d str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(query) => query.name.as_deref(),
        OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
    }
}

fn coerce_variables(definitions: &[VariableDefinition<'_, String>], provided: &Variables) -> Result<Variables> {
    let mut variables = Variables::new();

    for definition in definitions {
        let name = &definition.name;
        let required = matches!(definition.var_type, Type::NonNullType(_));

        match (provided.get(name), &definition.default_value) {
            (Some(Json::Null), _) if required => {
                return Err(HandlerError::malformed(format!(
                    "Variable \"${name}\" of non-null type \"{}\" must not be null.",
                    type_notation(&definition.var_type)
                )));
            }
            (Some(value), _) => {
                variables.insert(name.clone(), value.clone());
            }
            (None, Some(default)) => {
                if let Some(value) = to_json(default, &|variable: &str| Err(undefined_variable(variable)))? {
                    variables.insert(name.clone(), value);
                }
            }
            (None, None) if required => {
                return Err(HandlerError::malformed(format!(
                    "Variable \"${name}\" of required type \"{}\" was not provided.",
                    type_notation(&definition.var_type)
                )));
            }
            (None, None) => (),
        }
    }

    Ok(variables)
}

/// What fields are selected on: a root operation type or an output object.
#[derive(Clone, Copy)]
enum Parent<'q> {
    Root(QueryTag, &'q IndexMap<String, RootField>),
    Object(&'q ObjectType),
}

impl<'q> Parent<'q> {
    fn type_name(&self) -> &'q str {
        match self {
            Parent::Root(tag, _) => root_type_name(*tag),
            Parent::Object(object) => object.name(),
        }
    }

    fn field_type(&self, name: &str) -> Option<&'q TypeNode> {
        match self {
            Parent::Root(_, fields) => fields.get(name).map(|field| &field.output),
            Parent::Object(object) => object.find_field(name),
        }
    }

    /// Only root fields take arguments.
    fn accepts_arguments(&self) -> bool {
        matches!(self, Parent::Root(..))
    }
}

struct DocumentResolver<'d, 's> {
    fragments: HashMap<&'d str, &'d FragmentDefinition<'s, String>>,
    defined: HashSet<&'d str>,
    variables: Variables,
    /// Fragments currently being inlined, to reject cycles.
    spreading: Vec<&'d str>,
}

impl<'d, 's> DocumentResolver<'d, 's> {
    fn fields(&mut self, sets: &[&'d GqlSelectionSet<'s, String>], parent: Parent<'_>) -> Result<Vec<FieldNode>> {
        let mut grouped: IndexMap<String, Vec<&'d Field<'s, String>>> = IndexMap::new();

        for set in sets.iter().copied() {
            self.collect(set, parent.type_name(), &mut grouped)?;
        }

        grouped
            .into_iter()
            .map(|(response_key, fields)| self.field(response_key, &fields, parent))
            .collect()
    }

    fn collect(
        &mut self,
        set: &'d GqlSelectionSet<'s, String>,
        type_name: &str,
        grouped: &mut IndexMap<String, Vec<&'d Field<'s, String>>>,
    ) -> Result<()> {
        for item in &set.items {
            match item {
                GqlSelection::Field(field) => {
                    if self.included(&field.directives)? {
                        let response_key = field.alias.clone().unwrap_or_else(|| field.name.clone());
                        grouped.entry(response_key).or_default().push(field);
                    }
                }

                GqlSelection::FragmentSpread(spread) => {
                    if !self.included(&spread.directives)? {
                        continue;
                    }

                    let name = spread.fragment_name.as_str();
                    let fragment = *self
                        .fragments
                        .get(name)
                        .ok_or_else(|| HandlerError::malformed(format!("Unknown fragment \"{name}\".")))?;

                    if self.spreading.contains(&name) {
                        return Err(HandlerError::malformed(format!(
                            "Cannot spread fragment \"{name}\" within itself."
                        )));
                    }

                    check_type_condition(&fragment.type_condition, type_name)?;

                    self.spreading.push(name);
                    self.collect(&fragment.selection_set, type_name, grouped)?;
                    self.spreading.pop();
                }

                GqlSelection::InlineFragment(inline) => {
                    if !self.included(&inline.directives)? {
                        continue;
                    }

                    if let Some(condition) = &inline.type_condition {
                        check_type_condition(condition, type_name)?;
                    }

                    self.collect(&inline.selection_set, type_name, grouped)?;
                }
            }
        }

        Ok(())
    }

    /// Builds one response field out of every field selected under the same
    /// response key. Arguments are taken from the first of them.
    fn field(&mut self, response_key: String, fields: &[&'d Field<'s, String>], parent: Parent<'_>) -> Result<FieldNode> {
        let first = fields[0];
        let name = first.name.clone();

        let sets: Vec<&'d GqlSelectionSet<'s, String>> = fields
            .iter()
            .copied()
            .map(|field| &field.selection_set)
            .filter(|set| !set.items.is_empty())
            .collect();

        if name == TYPENAME {
            if !sets.is_empty() {
                return Err(unexpected_subselection(&name, "String!"));
            }

            return Ok(FieldNode {
                response_key,
                name,
                arguments: IndexMap::new(),
                selection: Vec::new(),
                leaf: true,
            });
        }

        let field_type = parent.field_type(&name).ok_or_else(|| {
            HandlerError::malformed(format!(
                "Cannot query field \"{name}\" on type \"{}\".",
                parent.type_name()
            ))
        })?;

        let mut arguments = IndexMap::new();

        for (argument, value) in &first.arguments {
            if !parent.accepts_arguments() {
                return Err(HandlerError::malformed(format!(
                    "Unknown argument \"{argument}\" on field \"{}.{name}\".",
                    parent.type_name()
                )));
            }

            if let Some(value) = self.value(value)? {
                arguments.insert(argument.clone(), value);
            }
        }

        let (selection, leaf) = match field_type.as_object() {
            Some(_) if sets.is_empty() => {
                return Err(HandlerError::malformed(format!(
                    "Field \"{name}\" of type \"{field_type}\" must have a selection of subfields. Did you mean \"{name} {{ ... }}\"?"
                )));
            }
            Some(object) => (self.fields(&sets, Parent::Object(object.as_ref()))?, false),
            None if !sets.is_empty() => return Err(unexpected_subselection(&name, &field_type.to_string())),
            None => (Vec::new(), true),
        };

        Ok(FieldNode {
            response_key,
            name,
            arguments,
            selection,
            leaf,
        })
    }

    /// Applies `@skip(if:)` and `@include(if:)`.
    fn included(&self, directives: &[Directive<'s, String>]) -> Result<bool> {
        for directive in directives {
            let skip_when = match directive.name.as_str() {
                "skip" => true,
                "include" => false,
                other => return Err(HandlerError::malformed(format!("Unknown directive \"@{other}\"."))),
            };

            let condition = directive
                .arguments
                .iter()
                .find(|(name, _)| name == "if")
                .map(|(_, value)| self.value(value))
                .transpose()?
                .flatten();

            match condition {
                Some(Json::Bool(flag)) if flag == skip_when => return Ok(false),
                Some(Json::Bool(_)) => (),
                _ => {
                    return Err(HandlerError::malformed(format!(
                        "Directive \"@{}\" argument \"if\" of type \"Boolean!\" is required, but it was not provided.",
                        directive.name
                    )))
                }
            }
        }

        Ok(true)
    }

    fn value(&self, value: &GqlValue<'s, String>) -> Result<Option<Json>> {
        to_json(value, &|name| self.variable(name))
    }

    fn variable(&self, name: &str) -> Result<Option<Json>> {
        if !self.defined.contains(name) {
            return Err(undefined_variable(name));
        }

        Ok(self.variables.get(name).cloned())
    }
}

fn check_type_condition(condition: &TypeCondition<'_, String>, type_name: &str) -> Result<()> {
    let TypeCondition::On(condition) = condition;

    if condition == type_name {
        Ok(())
    } else {
        Err(HandlerError::malformed(format!(
            "Fragment cannot be spread here as objects of type \"{type_name}\" can never be of type \"{condition}\"."
        )))
    }
}

/// Converts a literal to JSON, the representation variables arrive in, so
/// both are coerced the same way. `None` stands for a variable that was not
/// provided.
fn to_json(value: &GqlValue<'_, String>, variable: &dyn Fn(&str) -> Result<Option<Json>>) -> Result<Option<Json>> {
    let json = match value {
        GqlValue::Variable(name) => return variable(name),
        GqlValue::Int(number) => match number.as_i64() {
            Some(i) => Json::from(i),
            None => {
                return Err(HandlerError::malformed(
                    "Int cannot represent an integer outside of the 64-bit range.",
                ))
            }
        },
        GqlValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| HandlerError::malformed(format!("Float cannot represent non numeric value: {f}")))?,
        GqlValue::String(s) => Json::String(s.clone()),
        GqlValue::Boolean(b) => Json::Bool(*b),
        GqlValue::Null => Json::Null,
        GqlValue::Enum(key) => Json::String(key.clone()),
        GqlValue::List(values) => {
            let mut items = Vec::with_capacity(values.len());

            for value in values {
                items.push(to_json(value, variable)?.unwrap_or(Json::Null));
            }

            Json::Array(items)
        }
        GqlValue::Object(fields) => {
            let mut map = serde_json::Map::new();

            for (key, value) in fields {
                if let Some(value) = to_json(value, variable)? {
                    map.insert(key.clone(), value);
                }
            }

            Json::Object(map)
        }
    };

    Ok(Some(json))
}

fn type_notation(ty: &Type<'_, String>) -> String {
    match ty {
        Type::NamedType(name) => name.clone(),
        Type::ListType(inner) => format!("[{}]", type_notation(inner)),
        Type::NonNullType(inner) => format!("{}!", type_notation(inner)),
    }
}

fn undefined_variable(name: &str) -> HandlerError {
    HandlerError::malformed(format!("Variable \"${name}\" is not defined."))
}

fn unexpected_subselection(name: &str, type_name: &str) -> HandlerError {
    HandlerError::malformed(format!(
        "Field \"{name}\" must not have a selection since type \"{type_name}\" has no subfields."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_parser::query::parse_query;
    use pretty_assertions::assert_eq;
    use query_structure::{DataModelBuilder, ForeignKeyBuilder, ModelBuilder, ScalarFieldBuilder};
    use schema::{ModelExposition, QuerySchemaRef, SchemaBuilder, Settings};
    use serde_json::json;

    fn query_schema() -> QuerySchemaRef {
        let dm = DataModelBuilder::new()
            .model(
                ModelBuilder::new("House")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("location")),
            )
            .model(
                ModelBuilder::new("Person")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("name"))
                    .field(ForeignKeyBuilder::new("home", "House").optional().related_name("tenants")),
            )
            .build()
            .unwrap();

        let builder = SchemaBuilder::new(dm, Settings::default());
        builder.expose_model(ModelExposition::new("House")).unwrap();
        builder.expose_model(ModelExposition::new("Person")).unwrap();
        builder.build().unwrap()
    }

    fn resolve(query: &str, operation_name: Option<&str>, variables: Json) -> Result<ResolvedOperation> {
        let document = parse_query::<String>(query).unwrap();
        let variables = variables.as_object().cloned().unwrap_or_default();

        resolve_operation(&document, operation_name, &variables, &query_schema())
    }

    fn error(query: &str) -> String {
        resolve(query, None, json!({})).unwrap_err().to_string()
    }

    #[test]
    fn fragments_and_aliases_are_merged_by_response_key() {
        let operation = resolve(
            r#"
            query People {
                people: persons { ...Names home { location } }
                people: persons { home { id } }
                first: person(id: 1) { __typename id }
            }

            fragment Names on person__output_type { name }
            "#,
            None,
            json!({}),
        )
        .unwrap();

        assert_eq!(operation.tag, QueryTag::Query);

        let keys: Vec<_> = operation.fields.iter().map(|field| field.response_key.as_str()).collect();
        assert_eq!(keys, vec!["people", "first"]);

        assert_eq!(
            selection_set(&operation.fields[0].selection),
            SelectionSet::new()
                .leaf("name")
                .object("home", SelectionSet::new().leaf("location").leaf("id"))
        );

        assert_eq!(operation.fields[1].arguments, IndexMap::from([("id".to_owned(), json!(1))]));
        assert_eq!(selection_set(&operation.fields[1].selection), SelectionSet::new().leaf("id"));
    }

    #[test]
    fn directives_and_variables_are_applied() {
        let operation = resolve(
            r#"
            query ($withHome: Boolean!, $id: Int = 7, $name: String) {
                person(id: $id, name: $name) {
                    id
                    home @include(if: $withHome) { id }
                    ... on person__output_type @skip(if: true) { name }
                }
            }
            "#,
            None,
            json!({ "withHome": false }),
        )
        .unwrap();

        let person = &operation.fields[0];
        assert_eq!(person.arguments, IndexMap::from([("id".to_owned(), json!(7))]));
        assert_eq!(selection_set(&person.selection), SelectionSet::new().leaf("id"));
    }

    #[test]
    fn operations_are_picked_by_name() {
        let query = "query A { persons { id } } mutation B { delete_person(id: 1) { id } }";

        let operation = resolve(query, Some("B"), json!({})).unwrap();
        assert_eq!(operation.tag, QueryTag::Mutation);

        assert_eq!(
            resolve(query, Some("C"), json!({})).unwrap_err().to_string(),
            "Unknown operation named \"C\"."
        );
        assert_eq!(
            resolve(query, None, json!({})).unwrap_err().to_string(),
            "Must provide operation name if query contains multiple operations."
        );
    }

    #[test]
    fn selections_are_checked_against_their_types() {
        assert_eq!(
            error("{ persons { id age } }"),
            "Cannot query field \"age\" on type \"person__output_type\"."
        );
        assert_eq!(
            error("{ persons }"),
            "Field \"persons\" of type \"[person__output_type]\" must have a selection of subfields. Did you mean \"persons { ... }\"?"
        );
        assert_eq!(
            error("{ persons { name { first } } }"),
            "Field \"name\" must not have a selection since type \"String\" has no subfields."
        );
        assert_eq!(
            error("{ persons { home(id: 1) { id } } }"),
            "Unknown argument \"id\" on field \"person__output_type.home\"."
        );
    }

    #[test]
    fn variables_must_be_declared_and_provided() {
        assert_eq!(error("{ person(id: $id) { id } }"), "Variable \"$id\" is not defined.");
        assert_eq!(
            error("query ($id: Int!) { person(id: $id) { id } }"),
            "Variable \"$id\" of required type \"Int!\" was not provided."
        );
    }

    #[test]
    fn fragment_cycles_are_rejected() {
        assert_eq!(
            error("{ persons { ...A } } fragment A on person__output_type { ...A }"),
            "Cannot spread fragment \"A\" within itself."
        );
    }
}
