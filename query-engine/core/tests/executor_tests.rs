use indoc::indoc;
use pretty_assertions::assert_eq;
use query_core::{CoreError, InterpretingExecutor, ModelRequest, QueryExecutor};
use query_structure::*;
use schema::{
    CustomField, ModelAction, ModelExposition, QuerySchemaRef, SchemaBuilder, Settings, TypeDecl, UPDATE_DATA_ARGUMENT,
};
use serde_json::json;
use sql_query_connector::Sqlite;
use tracing_test::traced_test;

const DDL: &str = indoc! {r#"
    CREATE TABLE house (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        location TEXT NOT NULL
    );

    CREATE TABLE person (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        age INTEGER NULL,
        home_id INTEGER NULL REFERENCES house (id)
    );
"#};

fn data_model() -> InternalDataModelRef {
    DataModelBuilder::new()
        .model(
            ModelBuilder::new("House")
                .table("house")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ScalarFieldBuilder::string("location")),
        )
        .model(
            ModelBuilder::new("Person")
                .table("person")
                .field(ScalarFieldBuilder::auto_id("id"))
                .field(ScalarFieldBuilder::string("name").unique().max_length(10))
                .field(ScalarFieldBuilder::int("age").optional())
                .field(ForeignKeyBuilder::new("home", "House").optional().related_name("tenants")),
        )
        .build()
        .unwrap()
}

struct TestApi {
    executor: InterpretingExecutor<Sqlite>,
    schema: QuerySchemaRef,
}

impl TestApi {
    async fn new() -> Self {
        Self::with_person(ModelExposition::new("Person")).await
    }

    async fn with_person(person: ModelExposition) -> Self {
        let sqlite = Sqlite::open_in_memory().unwrap();
        sqlite.execute_raw(DDL).await.unwrap();

        let builder = SchemaBuilder::new(data_model(), Settings::default());
        builder.expose_model(ModelExposition::new("House")).unwrap();
        builder.expose_model(person).unwrap();

        TestApi {
            executor: InterpretingExecutor::new(sqlite),
            schema: builder.build().unwrap(),
        }
    }

    fn sqlite(&self) -> &Sqlite {
        self.executor.connector()
    }

    async fn run(
        &self,
        model: &str,
        action: ModelAction,
        arguments: serde_json::Value,
        selection: SelectionSet,
        user: Option<AuthenticatedUser>,
    ) -> std::result::Result<serde_json::Value, CoreError> {
        let request = ModelRequest {
            model: model.to_owned(),
            action,
            arguments: Value::from_json(arguments).into_object().unwrap_or_default(),
            selection,
            user,
            path: vec![format!("{action:?}_{model}").to_lowercase().into()],
        };

        let value = self.executor.execute(request, self.schema.clone()).await?;

        Ok(value.to_json())
    }

    async fn create(&self, model: &str, data: serde_json::Value, selection: SelectionSet) -> serde_json::Value {
        self.run(model, ModelAction::Create, data, selection, None).await.unwrap()
    }

    async fn read_many(&self, model: &str, selection: SelectionSet) -> serde_json::Value {
        self.run(model, ModelAction::ReadMany, json!({}), selection, None)
            .await
            .unwrap()
    }
}

fn user_facing(err: CoreError) -> serde_json::Value {
    serde_json::to_value(user_facing_errors::Error::from(err)).unwrap()
}

fn names() -> SelectionSet {
    SelectionSet::new().leaf("name")
}

#[tokio::test]
async fn created_records_read_back() {
    let api = TestApi::new().await;
    let selection = SelectionSet::new().leaf("id").leaf("name").leaf("age");

    let created = api
        .create("person", json!({ "name": "Ann", "age": "30" }), selection.clone())
        .await;
    assert_eq!(created, json!({ "id": 1, "name": "Ann", "age": 30 }));

    let read = api
        .run("person", ModelAction::ReadOne, json!({ "id": 1 }), selection, None)
        .await
        .unwrap();
    assert_eq!(read, created);
}

#[tokio::test]
async fn foreign_objects_are_created_before_their_owner() {
    let api = TestApi::new().await;

    let created = api
        .create(
            "person",
            json!({ "name": "A", "home": { "location": "X" } }),
            SelectionSet::new()
                .leaf("name")
                .object("home", SelectionSet::new().leaf("location")),
        )
        .await;

    assert_eq!(created, json!({ "name": "A", "home": { "location": "X" } }));

    let houses = api
        .read_many(
            "house",
            SelectionSet::new().leaf("location").object("tenants", names()),
        )
        .await;

    assert_eq!(houses, json!([{ "location": "X", "tenants": [{ "name": "A" }] }]));
}

#[tokio::test]
async fn related_children_are_loaded_in_one_query_per_collection() {
    let api = TestApi::new().await;

    for (location, tenants) in [("X", json!([{ "name": "A" }, { "name": "B" }])), ("Y", json!([]))] {
        api.create(
            "house",
            json!({ "location": location, "tenants": tenants }),
            SelectionSet::new().leaf("id"),
        )
        .await;
    }

    api.sqlite().enable_query_log();

    let houses = api
        .read_many(
            "house",
            SelectionSet::new().leaf("location").object("tenants", names()),
        )
        .await;

    assert_eq!(
        houses,
        json!([
            { "location": "X", "tenants": [{ "name": "A" }, { "name": "B" }] },
            { "location": "Y", "tenants": [] },
        ])
    );

    let selects = api
        .sqlite()
        .query_log()
        .entries()
        .into_iter()
        .filter(|sql| sql.starts_with("SELECT"))
        .count();

    assert_eq!(selects, 2);
}

#[tokio::test]
async fn updates_reconcile_related_children() {
    let api = TestApi::new().await;

    api.create(
        "house",
        json!({ "location": "X", "tenants": [{ "name": "Ann" }, { "name": "Bob" }] }),
        SelectionSet::new().leaf("id"),
    )
    .await;

    let arguments = json!({
        "id": 1,
        UPDATE_DATA_ARGUMENT: {
            "location": "Y",
            "tenants": [{ "id": 1, "name": "Ann2" }, { "name": "Cid" }],
        },
    });

    let updated = api
        .run(
            "house",
            ModelAction::Update,
            arguments,
            SelectionSet::new().leaf("location").object("tenants", names()),
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        updated,
        json!({ "location": "Y", "tenants": [{ "name": "Ann2" }, { "name": "Cid" }] })
    );

    assert_eq!(
        api.read_many("person", names()).await,
        json!([{ "name": "Ann2" }, { "name": "Cid" }])
    );
}

#[tokio::test]
async fn updating_a_child_of_another_parent_is_not_found() {
    let api = TestApi::new().await;

    api.create("house", json!({ "location": "X" }), SelectionSet::new().leaf("id"))
        .await;
    api.create("person", json!({ "name": "Eve" }), SelectionSet::new().leaf("id"))
        .await;

    let err = api
        .run(
            "house",
            ModelAction::Update,
            json!({ "id": 1, UPDATE_DATA_ARGUMENT: { "tenants": [{ "id": 1, "name": "Mallory" }] } }),
            SelectionSet::new().leaf("id"),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NotFound { .. }), "{err}");
    assert_eq!(api.read_many("person", names()).await, json!([{ "name": "Eve" }]));
}

#[tokio::test]
async fn forbidden_nested_writes_roll_back_the_whole_operation() {
    let person = ModelExposition::new("Person").ensure_permissions(|request| {
        request.operation != Operation::Create || request.instance.get("name") != Some(&Value::from("Mallory"))
    });

    let api = TestApi::with_person(person).await;

    let err = api
        .run(
            "house",
            ModelAction::Create,
            json!({ "location": "X", "tenants": [{ "name": "Ann" }, { "name": "Mallory" }] }),
            SelectionSet::new().leaf("id"),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(
        user_facing(err),
        json!({
            "kind": "FORBIDDEN",
            "payload": {
                "operation": "CREATE",
                "authenticated_user": "None",
                "path": ["create_house", "tenants", 1],
            }
        })
    );

    assert_eq!(api.read_many("house", SelectionSet::new().leaf("id")).await, json!([]));
    assert_eq!(api.read_many("person", names()).await, json!([]));
}

#[tokio::test]
#[traced_test]
async fn unreadable_records_are_dropped_from_collections() {
    let person = ModelExposition::new("Person")
        .always_select(["name"])
        .ensure_permissions(|request| {
            request.operation != Operation::Read || request.instance.get("name") != Some(&Value::from("Bob"))
        });

    let api = TestApi::with_person(person).await;

    for name in ["Ann", "Bob"] {
        api.create("person", json!({ "name": name }), SelectionSet::new().leaf("id"))
            .await;
    }

    let people = api.read_many("person", SelectionSet::new().leaf("id")).await;
    assert_eq!(people, json!([{ "id": 1 }]));
    assert!(logs_contain("records hidden by read permissions"));

    let err = api
        .run(
            "person",
            ModelAction::ReadOne,
            json!({ "id": 2 }),
            SelectionSet::new().leaf("id"),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Forbidden { .. }), "{err}");
}

#[tokio::test]
async fn row_filters_scope_reads_to_the_caller() {
    let person = ModelExposition::new("Person").filter_for_user(|user| match user {
        Some(user) => Filter::equals("name", user.name.clone()),
        None => Filter::equals("id", -1),
    });

    let api = TestApi::with_person(person).await;

    for name in ["Ann", "Bob"] {
        api.create("person", json!({ "name": name }), SelectionSet::new().leaf("id"))
            .await;
    }

    let bob = AuthenticatedUser::new(2, "Bob");
    let people = api
        .run("person", ModelAction::ReadMany, json!({}), names(), Some(bob))
        .await
        .unwrap();

    assert_eq!(people, json!([{ "name": "Bob" }]));
    assert_eq!(api.read_many("person", names()).await, json!([]));
}

#[tokio::test]
async fn anonymous_callers_are_rejected_when_authentication_is_forced() {
    let api = TestApi::with_person(ModelExposition::new("Person").force_authenticated_user(true)).await;

    let err = api
        .run("person", ModelAction::ReadMany, json!({}), names(), None)
        .await
        .unwrap_err();

    assert_eq!(user_facing(err), json!({ "kind": "UNAUTHENTICATED", "payload": {} }));
}

#[tokio::test]
async fn validation_reports_every_failing_field() {
    let api = TestApi::new().await;

    api.create("person", json!({ "name": "Ann" }), SelectionSet::new().leaf("id"))
        .await;

    let err = api
        .run(
            "person",
            ModelAction::Create,
            json!({ "name": "Ann", "age": "old" }),
            SelectionSet::new().leaf("id"),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(
        user_facing(err)["payload"],
        json!([
            {
                "path": ["create_person", "age"],
                "message": "'old' is not a valid Int value.",
                "params": { "value": "old" },
                "code": "invalid",
            },
            {
                "path": ["create_person", "name"],
                "message": "Person with this name already exists.",
                "params": { "model_name": "Person", "field_label": "name" },
                "code": "unique",
            },
        ])
    );

    let err = api
        .run(
            "person",
            ModelAction::Create,
            json!({ "name": "Bartholomew Jr" }),
            SelectionSet::new().leaf("id"),
            None,
        )
        .await
        .unwrap_err();

    let issues = user_facing(err)["payload"].clone();
    assert_eq!(issues[0]["code"], "max_length");
    assert_eq!(issues[0]["params"], json!({ "limit_value": 10, "show_value": 14 }));
}

#[tokio::test]
async fn hooks_can_rewrite_instances_before_they_are_saved() {
    let person = ModelExposition::new("Person").on_before_operation(|ctx| {
        if ctx.operation == Operation::Create {
            let name = ctx.instance.get("name").and_then(Value::as_str).unwrap_or_default().to_uppercase();
            ctx.instance.insert("name", name);
        }

        Ok(())
    });

    let api = TestApi::with_person(person).await;
    let created = api.create("person", json!({ "name": "ann" }), names()).await;

    assert_eq!(created, json!({ "name": "ANN" }));
}

#[tokio::test]
async fn deletes_return_the_removed_record() {
    let api = TestApi::new().await;

    api.create(
        "house",
        json!({ "location": "X", "tenants": [{ "name": "Ann" }] }),
        SelectionSet::new().leaf("id"),
    )
    .await;
    api.create("house", json!({ "location": "Y" }), SelectionSet::new().leaf("id"))
        .await;

    let deleted = api
        .run(
            "house",
            ModelAction::Delete,
            json!({ "id": 2 }),
            SelectionSet::new().leaf("location"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(deleted, json!({ "location": "Y" }));

    let err = api
        .run("house", ModelAction::ReadOne, json!({ "id": 2 }), SelectionSet::new().leaf("id"), None)
        .await
        .unwrap_err();
    assert_eq!(user_facing(err)["kind"], "NOT_FOUND");

    // Ann still lives in house 1.
    let err = api
        .run("house", ModelAction::Delete, json!({ "id": 1 }), SelectionSet::new().leaf("id"), None)
        .await
        .unwrap_err();
    assert_eq!(
        user_facing(err),
        json!({ "kind": "INTEGRITY", "payload": { "path": ["delete_house"] } })
    );
}

#[tokio::test]
async fn updates_follow_foreign_links() {
    let api = TestApi::new().await;
    let selection = SelectionSet::new()
        .leaf("name")
        .object("home", SelectionSet::new().leaf("id").leaf("location"));

    api.create(
        "person",
        json!({ "name": "A", "home": { "location": "X" } }),
        SelectionSet::new().leaf("id"),
    )
    .await;

    let update = |home: serde_json::Value| json!({ "id": 1, UPDATE_DATA_ARGUMENT: { "home": home } });

    // An identifier updates the linked record in place.
    let updated = api
        .run(
            "person",
            ModelAction::Update,
            update(json!({ "id": 1, "location": "Y" })),
            selection.clone(),
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated, json!({ "name": "A", "home": { "id": 1, "location": "Y" } }));

    let updated = api
        .run(
            "person",
            ModelAction::Update,
            update(json!({ "location": "Z" })),
            selection.clone(),
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated, json!({ "name": "A", "home": { "id": 2, "location": "Z" } }));

    let updated = api
        .run("person", ModelAction::Update, update(json!(null)), selection, None)
        .await
        .unwrap();
    assert_eq!(updated, json!({ "name": "A", "home": null }));

    assert_eq!(
        api.read_many("house", SelectionSet::new().leaf("location")).await,
        json!([{ "location": "Y" }, { "location": "Z" }])
    );
}

#[tokio::test]
async fn custom_fields_write_through_their_callables() {
    let nickname = CustomField::new("nickname", TypeDecl::string())
        .create_one(|write| {
            let name = write.value.as_str().unwrap_or_default().to_uppercase();
            write.instance.insert("name", name);
            Ok(())
        })
        .update_one(|write| {
            let length = write.value.as_str().map(str::len).unwrap_or_default();
            write.instance.insert("age", length as i64);
            Ok(())
        });

    let api = TestApi::with_person(ModelExposition::new("Person").custom_field(nickname)).await;
    let selection = SelectionSet::new().leaf("name").leaf("age");

    let created = api.create("person", json!({ "nickname": "ann" }), selection.clone()).await;
    assert_eq!(created, json!({ "name": "ANN", "age": null }));

    let updated = api
        .run(
            "person",
            ModelAction::Update,
            json!({ "id": 1, UPDATE_DATA_ARGUMENT: { "nickname": "annie" } }),
            selection,
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated, json!({ "name": "ANN", "age": 5 }));
}

#[tokio::test]
async fn updated_records_must_stay_readable() {
    let person = ModelExposition::new("Person").ensure_permissions(|request| {
        request.operation != Operation::Read || request.instance.get("age") != Some(&Value::Int(3))
    });

    let api = TestApi::with_person(person).await;

    api.create("person", json!({ "name": "Ann" }), SelectionSet::new().leaf("id"))
        .await;

    let err = api
        .run(
            "person",
            ModelAction::Update,
            json!({ "id": 1, UPDATE_DATA_ARGUMENT: { "age": 3 } }),
            SelectionSet::new().leaf("id"),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(
        user_facing(err),
        json!({
            "kind": "FORBIDDEN",
            "payload": {
                "operation": "READ",
                "authenticated_user": "None",
                "path": ["update_person"],
            }
        })
    );

    let people = api
        .read_many("person", SelectionSet::new().leaf("name").leaf("age"))
        .await;
    assert_eq!(people, json!([{ "name": "Ann", "age": null }]));
}

#[tokio::test]
async fn created_records_are_returned_even_when_unreadable() {
    let person = ModelExposition::new("Person").ensure_permissions(|request| request.operation != Operation::Read);
    let api = TestApi::with_person(person).await;

    let created = api.create("person", json!({ "name": "Ann" }), names()).await;

    assert_eq!(created, json!({ "name": "Ann" }));
}
