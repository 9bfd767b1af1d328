use pretty_assertions::assert_eq;
use query_structure::{
    DataModelBuilder, ForeignKeyBuilder, InternalDataModelRef, ModelBuilder, Operation, ScalarFieldBuilder, Value,
};
use schema::*;
use std::sync::Arc;

fn people() -> InternalDataModelRef {
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
                .field(ScalarFieldBuilder::int("age"))
                .field(ForeignKeyBuilder::new("home", "House").related_name("tenants").optional()),
        )
        .build()
        .unwrap()
}

fn rivals() -> InternalDataModelRef {
    DataModelBuilder::new()
        .model(
            ModelBuilder::new("A")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ForeignKeyBuilder::new("partner", "B").related_name("admirers")),
        )
        .model(
            ModelBuilder::new("B")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ForeignKeyBuilder::new("rival", "A").related_name("rivals")),
        )
        .build()
        .unwrap()
}

fn names<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    keys.map(String::as_str).collect()
}

#[test]
fn cyclic_relations_terminate() {
    let builder = SchemaBuilder::new(rivals(), Settings::default());
    builder.expose_model(ModelExposition::new("A")).unwrap();
    builder.expose_model(ModelExposition::new("B")).unwrap();

    let schema = builder.build().unwrap();
    let a = schema.config("a").unwrap();
    let mapping = build_type_mapping(schema.configs(), schema.settings(), a, Operation::Read);

    assert_eq!(names(mapping.keys()), vec!["id", "partner_id", "partner", "rivals"]);

    let partner = mapping["partner"].as_object().unwrap();
    assert_eq!(names(partner.keys()), vec!["id", "rival_id", "rival"]);
    assert_eq!(names(partner["rival"].as_object().unwrap().keys()), vec!["id", "partner_id"]);

    let rivals = mapping["rivals"].as_object().unwrap();
    assert_eq!(names(rivals.keys()), vec!["id", "rival_id", "admirers"]);
    assert_eq!(names(rivals["admirers"].as_object().unwrap().keys()), vec!["id", "partner_id"]);

    assert!(schema.find_object("a__partner__rival__output_type").is_some());
    assert!(schema.find_object("a__partner__rival__partner__output_type").is_none());
}

#[test]
fn collection_reads_accept_every_lookup_of_every_field() {
    let dm = DataModelBuilder::new()
        .model(
            ModelBuilder::new("Person")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ScalarFieldBuilder::string("name"))
                .field(ScalarFieldBuilder::int("age")),
        )
        .build()
        .unwrap();

    let builder = SchemaBuilder::new(dm, Settings::default());
    builder.expose_model(ModelExposition::new("Person")).unwrap();

    let schema = builder.build().unwrap();
    let persons = schema.find_root_field(QueryTag::Query, "persons").unwrap();

    let comparisons = ["lt", "lte", "gt", "gte", "in", "isnull"];
    let strings = [
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

    let mut expected = vec!["id".to_owned()];
    expected.extend(comparisons.iter().map(|lookup| format!("id__{lookup}")));
    expected.push("name".to_owned());
    expected.extend(strings.iter().chain(comparisons.iter()).map(|lookup| format!("name__{lookup}")));
    expected.push("age".to_owned());
    expected.extend(comparisons.iter().map(|lookup| format!("age__{lookup}")));

    let arguments: Vec<String> = persons.arguments.keys().cloned().collect();
    assert_eq!(arguments, expected);

    assert_eq!(persons.arguments["age__in"].to_string(), "[Int]");
    assert_eq!(persons.arguments["name__isnull"].to_string(), "Boolean");
}

#[test]
fn nested_filters_follow_linked_fields() {
    let builder = SchemaBuilder::new(people(), Settings::default());
    builder.expose_model(ModelExposition::new("House")).unwrap();
    builder.expose_model(ModelExposition::new("Person")).unwrap();

    let schema = builder.build().unwrap();
    let houses = schema.find_root_field(QueryTag::Query, "houses").unwrap();

    assert!(houses.arguments.contains_key("tenants__name__icontains"));
    assert!(houses.arguments.contains_key("tenants__age__gte"));
    assert!(!houses.arguments.contains_key("tenants__home__location"));
}

#[test]
fn building_twice_returns_the_same_schema() {
    let builder = SchemaBuilder::new(people(), Settings::default());
    builder.expose_model(ModelExposition::new("House")).unwrap();

    let first = builder.build().unwrap();
    let second = builder.build().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    builder.expose_model(ModelExposition::new("Person")).unwrap();

    let third = builder.build().unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(third.find_root_field(QueryTag::Query, "person").is_some());
}

#[test]
fn generated_operations_follow_the_casing() {
    let settings = Settings {
        casing: Casing::Pascal,
        ..Default::default()
    };

    let builder = SchemaBuilder::new(people(), settings);
    builder.expose_model(ModelExposition::new("Person").cannot_delete(true)).unwrap();

    let schema = builder.build().unwrap();

    assert_eq!(
        names(schema.root_fields(QueryTag::Query).keys()),
        vec!["Person", "Persons"]
    );
    assert_eq!(
        names(schema.root_fields(QueryTag::Mutation).keys()),
        vec!["CreatePerson", "UpdatePerson"]
    );

    let update = schema.find_root_field(QueryTag::Mutation, "UpdatePerson").unwrap();
    assert_eq!(names(update.arguments.keys()), vec!["id", UPDATE_DATA_ARGUMENT]);
    assert_eq!(update.arguments["_"].to_string(), "UpdatePerson__input_type!");
    assert!(matches!(
        update.resolver,
        Resolver::Model {
            action: ModelAction::Update,
            ..
        }
    ));
}

#[test]
fn mutations_share_the_read_output_type() {
    let builder = SchemaBuilder::new(people(), Settings::default());
    builder.expose_model(ModelExposition::new("House")).unwrap();
    builder.expose_model(ModelExposition::new("Person")).unwrap();

    let schema = builder.build().unwrap();
    let read = schema.find_root_field(QueryTag::Query, "person").unwrap();
    let create = schema.find_root_field(QueryTag::Mutation, "create_person").unwrap();

    assert!(Arc::ptr_eq(
        read.output.as_object().unwrap(),
        create.output.as_object().unwrap()
    ));
    assert_eq!(create.arguments["name"].to_string(), "String!");
    assert_eq!(create.arguments["age"].to_string(), "Int!");
    assert_eq!(create.arguments["home_id"].to_string(), "Int");
    assert_eq!(create.arguments["home"].to_string(), "create_person__home__input_type");
}

#[test]
fn exposed_methods_can_reuse_model_types() {
    let builder = SchemaBuilder::new(people(), Settings::default());
    builder.expose_model(ModelExposition::new("Person")).unwrap();
    builder
        .expose_query(
            ExposedMethod::new("oldest", TypeDecl::model("person", Operation::Read))
                .input("limit", TypeDecl::required(TypeDecl::int()))
                .resolver(|_| async { Ok(Value::Null) }),
        )
        .unwrap();
    builder
        .expose_mutation(
            ExposedMethod::new(
                "rename",
                ModelTypeDecl::new("person", Operation::Read)
                    .exclude(["age"])
                    .add("previous_name", TypeDecl::string()),
            )
            .resolver(|_| async { Ok(Value::Null) }),
        )
        .unwrap();

    let schema = builder.build().unwrap();
    let person = schema.find_root_field(QueryTag::Query, "person").unwrap();
    let oldest = schema.find_root_field(QueryTag::Query, "oldest").unwrap();

    assert!(Arc::ptr_eq(
        person.output.as_object().unwrap(),
        oldest.output.as_object().unwrap()
    ));
    assert_eq!(oldest.arguments["limit"].to_string(), "Int!");

    let rename = schema.find_root_field(QueryTag::Mutation, "rename").unwrap();
    let output = rename.output.as_object().unwrap();
    assert_eq!(output.name(), "rename__output_type");
    assert!(output.find_field("previous_name").is_some());
    assert!(output.find_field("age").is_none());
}

#[test]
fn configuration_errors_are_reported_eagerly() {
    let builder = SchemaBuilder::new(people(), Settings::default());

    assert!(matches!(
        builder.expose_model(ModelExposition::new("Ghost")),
        Err(SchemaError::Configuration(_))
    ));

    builder.expose_model(ModelExposition::new("Person")).unwrap();
    assert_eq!(
        builder.expose_model(ModelExposition::new("Person")).unwrap_err(),
        SchemaError::DuplicateExposition { name: "Person".into() }
    );

    assert!(matches!(
        builder.expose_query(ExposedMethod::new("noop", TypeDecl::int())),
        Err(SchemaError::Configuration(_))
    ));
}

#[test]
fn unknown_models_in_method_types_fail_the_build() {
    let builder = SchemaBuilder::new(people(), Settings::default());
    builder
        .expose_query(
            ExposedMethod::new("ghost", TypeDecl::model("ghost", Operation::Read))
                .resolver(|_| async { Ok(Value::Null) }),
        )
        .unwrap();

    assert_eq!(
        builder.build().unwrap_err(),
        SchemaError::UnknownExposedModel { name: "ghost".into() }
    );
}

#[test]
fn root_field_names_must_be_unique_and_valid() {
    let builder = SchemaBuilder::new(people(), Settings::default());
    builder.expose_model(ModelExposition::new("Person")).unwrap();
    builder
        .expose_query(ExposedMethod::new("persons", TypeDecl::int()).resolver(|_| async { Ok(Value::Int(1)) }))
        .unwrap();

    assert_eq!(
        builder.build().unwrap_err(),
        SchemaError::DuplicateRootField {
            name: "persons".into()
        }
    );

    let builder = SchemaBuilder::new(people(), Settings::default());
    builder
        .expose_query(ExposedMethod::new("not-valid", TypeDecl::int()).resolver(|_| async { Ok(Value::Int(1)) }))
        .unwrap();

    assert_eq!(
        builder.build().unwrap_err(),
        SchemaError::InvalidName {
            name: "not-valid".into()
        }
    );
}

#[test]
fn nested_only_models_have_no_root_operations() {
    let builder = SchemaBuilder::new(people(), Settings::default());
    builder.expose_model(ModelExposition::new("House").only_when_child_of("Person")).unwrap();
    builder.expose_model(ModelExposition::new("Person")).unwrap();

    let schema = builder.build().unwrap();

    assert!(schema.find_root_field(QueryTag::Query, "house").is_none());
    assert!(schema.find_object("person__home__output_type").is_some());

    let builder = SchemaBuilder::new(people(), Settings::default());
    builder.expose_model(ModelExposition::new("Person").only_when_child_of("House")).unwrap();

    assert!(matches!(builder.build(), Err(SchemaError::Configuration(_))));
}
