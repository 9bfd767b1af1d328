use super::QueryInterpreter;
use crate::{error::issue, CoreError, CoreResult};
use query_structure::{Filter, Model, Record, ScalarFieldData, Value};
use serde_json::{json, Map};
use std::collections::HashSet;
use user_facing_errors::{query_engine::ValidationIssue, Path};

impl QueryInterpreter<'_> {
    /// Cleans every scalar field of `instance` in place and checks unique
    /// fields against the other stored records of `model`.
    pub(crate) async fn validate(
        &mut self,
        model: &Model,
        instance: &mut Record,
        path: &Path,
        own_id: Option<&Value>,
    ) -> CoreResult<()> {
        let mut issues = clean_fields(model, instance, path);
        let invalid: HashSet<String> = issues
            .iter()
            .filter_map(|issue| issue.path.last())
            .map(ToString::to_string)
            .collect();

        for field in model.scalar_fields() {
            let Some(sf) = field.as_scalar() else { continue };

            if !sf.is_unique || sf.is_id || invalid.contains(label(sf)) {
                continue;
            }

            let Some(value) = instance.get(&sf.name).filter(|value| !value.is_null()).cloned() else {
                continue;
            };

            let mut filter = Filter::equals(sf.name.clone(), value);

            if let Some(id) = own_id {
                filter = filter.conjoin(Filter::not(Filter::equals(model.primary_key_name(), id.clone())));
            }

            if self.tx.count_records(model, &filter).await? > 0 {
                let params = params([("model_name", json!(model.name())), ("field_label", json!(label(sf)))]);
                let message = format!("{} with this {} already exists.", model.name(), label(sf));

                issues.push(issue(path, label(sf), "unique", message, params));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            tracing::debug!(model = model.name(), issues = issues.len(), "validation failed");
            Err(CoreError::Validation(issues))
        }
    }
}

/// Coerces the scalar fields of `instance` to their declared types and
/// reports the values their constraints reject.
pub(crate) fn clean_fields(model: &Model, instance: &mut Record, path: &Path) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for field in model.scalar_fields() {
        let Some(sf) = field.as_scalar() else { continue };
        let value = instance.get(&sf.name).cloned().unwrap_or_default();

        if value.is_null() {
            if !sf.is_nullable && !sf.is_autoincrement {
                issues.push(issue(path, label(sf), "null", "This field cannot be null.", Map::new()));
            }

            continue;
        }

        let value = match coerce(sf, value.clone()) {
            Ok(value) => value,
            Err(_) => {
                let message = format!("'{value}' is not a valid {} value.", sf.type_identifier);
                issues.push(issue(path, label(sf), "invalid", message, params([("value", value.to_json())])));
                continue;
            }
        };

        if !sf.is_blank && value.is_blank() {
            issues.push(issue(path, label(sf), "blank", "This field cannot be blank.", Map::new()));
            continue;
        }

        if let (Some(limit), Value::String(s)) = (sf.max_length, &value) {
            let length = s.chars().count();

            if length > limit {
                let message = format!("Ensure this value has at most {limit} characters (it has {length}).");
                let params = params([("limit_value", json!(limit)), ("show_value", json!(length))]);

                issues.push(issue(path, label(sf), "max_length", message, params));
            }
        }

        if let Some(choices) = &sf.choices {
            if !choices.iter().any(|choice| choice.value == value) {
                let message = format!("Value {value} is not a valid choice.");
                issues.push(issue(path, label(sf), "invalid_choice", message, params([("value", value.to_json())])));
            }
        }

        instance.insert(sf.name.clone(), value);
    }

    issues
}

fn coerce(sf: &ScalarFieldData, value: Value) -> query_structure::Result<Value> {
    match value {
        Value::List(values) if sf.is_list => values
            .into_iter()
            .map(|value| value.coerce(sf.type_identifier))
            .collect::<query_structure::Result<Vec<_>>>()
            .map(Value::List),
        value => value.coerce(sf.type_identifier),
    }
}

/// Issues on foreign key columns are reported under the foreign field.
fn label(sf: &ScalarFieldData) -> &str {
    sf.foreign_field.as_deref().unwrap_or(&sf.name)
}

fn params<const N: usize>(entries: [(&str, serde_json::Value); N]) -> Map<String, serde_json::Value> {
    entries.into_iter().map(|(key, value)| (key.to_owned(), value)).collect()
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
                    .field(ScalarFieldBuilder::string("location").max_length(5)),
            )
            .model(
                ModelBuilder::new("Person")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("name"))
                    .field(ScalarFieldBuilder::int("age").choices([(18, "adult"), (12, "child")]))
                    .field(ForeignKeyBuilder::new("home", "House")),
            )
            .build()
            .unwrap()
    }

    fn codes(issues: &[ValidationIssue]) -> Vec<(String, String)> {
        issues
            .iter()
            .map(|issue| (issue.path.last().unwrap().to_string(), issue.code.clone()))
            .collect()
    }

    #[test]
    fn constraint_violations_are_reported_per_field() {
        let dm = data_model();
        let person = dm.find_model("Person").unwrap();
        let path: Path = vec!["create_person".into()];

        let mut instance: Record = [("name", Value::from("")), ("age", Value::from("forty"))]
            .into_iter()
            .collect();

        assert_eq!(
            codes(&clean_fields(&person, &mut instance, &path)),
            vec![
                ("name".to_owned(), "blank".to_owned()),
                ("age".to_owned(), "invalid".to_owned()),
                ("home".to_owned(), "null".to_owned()),
            ]
        );
    }

    #[test]
    fn values_are_coerced_in_place() {
        let dm = data_model();
        let person = dm.find_model("Person").unwrap();

        let mut instance: Record = [
            ("name", Value::from("Ann")),
            ("age", Value::from("18")),
            ("home_id", Value::Int(1)),
        ]
        .into_iter()
        .collect();

        assert!(clean_fields(&person, &mut instance, &Path::new()).is_empty());
        assert_eq!(instance.get("age"), Some(&Value::Int(18)));
    }

    #[test]
    fn length_and_choice_issues_carry_params() {
        let dm = data_model();
        let house = dm.find_model("House").unwrap();
        let person = dm.find_model("Person").unwrap();

        let mut instance: Record = [("location", Value::from("Barcelona"))].into_iter().collect();
        let issues = clean_fields(&house, &mut instance, &Path::new());

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "max_length");
        assert_eq!(issues[0].params, params([("limit_value", json!(5)), ("show_value", json!(9))]));

        let mut instance: Record = [
            ("name", Value::from("Ann")),
            ("age", Value::Int(30)),
            ("home_id", Value::Int(1)),
        ]
        .into_iter()
        .collect();
        let issues = clean_fields(&person, &mut instance, &Path::new());

        assert_eq!(codes(&issues), vec![("age".to_owned(), "invalid_choice".to_owned())]);
        assert_eq!(issues[0].params, params([("value", json!(30))]));
    }
}
