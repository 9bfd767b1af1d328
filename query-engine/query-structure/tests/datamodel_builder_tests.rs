use pretty_assertions::assert_eq;
use query_structure::*;

fn person_and_house() -> InternalDataModelRef {
    DataModelBuilder::new()
        .model(
            ModelBuilder::new("House")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ScalarFieldBuilder::string("location").max_length(255)),
        )
        .model(
            ModelBuilder::new("Person")
                .table("people")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ScalarFieldBuilder::string("name").unique())
                .field(
                    ForeignKeyBuilder::new("home", "House")
                        .optional()
                        .related_name("tenants")
                        .on_delete(OnDelete::SetNull),
                ),
        )
        .build()
        .unwrap()
}

#[test]
fn foreign_keys_expand_into_value_foreign_and_related_fields() {
    let dm = person_and_house();
    let person = dm.find_model("Person").unwrap();
    let house = dm.find_model("House").unwrap();

    let person_fields: Vec<_> = person.fields().map(|f| f.name().to_owned()).collect();
    assert_eq!(person_fields, vec!["id", "name", "home_id", "home"]);

    let house_fields: Vec<_> = house.fields().map(|f| f.name().to_owned()).collect();
    assert_eq!(house_fields, vec!["id", "location", "tenants"]);

    let home_id = person.field("home_id").unwrap();
    let home_id = home_id.as_scalar().unwrap();
    assert_eq!(home_id.type_identifier, TypeIdentifier::Int);
    assert_eq!(home_id.foreign_field.as_deref(), Some("home"));
    assert!(home_id.is_nullable);

    let home = person.field("home").unwrap();
    let link = home.link().unwrap();
    assert_eq!(link.model, house);
    assert_eq!(link.field_name, "tenants");
    assert_eq!(link.value_field_name, "home_id");

    let tenants = house.field("tenants").unwrap();
    let link = tenants.link().unwrap();
    assert_eq!(link.model, person);
    assert_eq!(link.field_name, "home");
    assert_eq!(link.value_field_name, "home_id");
}

#[test]
fn tables_default_to_model_names() {
    let dm = person_and_house();

    assert_eq!(dm.find_model("House").unwrap().db_name(), "House");
    assert_eq!(dm.find_model("Person").unwrap().db_name(), "people");
    assert_eq!(dm.find_model("Person").unwrap().primary_key_name(), "id");
}

#[test]
fn linked_fields_list_foreign_before_related() {
    let dm = DataModelBuilder::new()
        .model(ModelBuilder::new("A").field(ScalarFieldBuilder::auto_id("id")))
        .model(
            ModelBuilder::new("B")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ForeignKeyBuilder::new("a", "A")),
        )
        .model(
            ModelBuilder::new("C")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ForeignKeyBuilder::new("b", "B").related_name("cs")),
        )
        .build()
        .unwrap();

    let b = dm.find_model("B").unwrap();
    let linked: Vec<_> = b.linked_fields().map(|f| f.name().to_owned()).collect();

    assert_eq!(linked, vec!["a", "cs"]);
    assert!(dm.find_model("A").unwrap().find_field("b_set").is_some());
}

#[test]
fn dangling_foreign_keys_are_rejected() {
    let err = DataModelBuilder::new()
        .model(
            ModelBuilder::new("Person")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ForeignKeyBuilder::new("home", "House")),
        )
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        DomainError::DanglingForeignKey {
            model: "Person".into(),
            field: "home".into(),
            target: "House".into(),
        }
    );
}

#[test]
fn models_need_exactly_one_primary_key() {
    let err = DataModelBuilder::new()
        .model(ModelBuilder::new("Thing").field(ScalarFieldBuilder::string("name")))
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        DomainError::InvalidPrimaryKey {
            model: "Thing".into(),
            count: 0
        }
    );
}

#[test]
fn related_names_must_not_collide_with_fields() {
    let err = DataModelBuilder::new()
        .model(
            ModelBuilder::new("House")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ScalarFieldBuilder::string("tenants")),
        )
        .model(
            ModelBuilder::new("Person")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ForeignKeyBuilder::new("home", "House").related_name("tenants")),
        )
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        DomainError::DuplicateField {
            model: "House".into(),
            field: "tenants".into()
        }
    );
}
