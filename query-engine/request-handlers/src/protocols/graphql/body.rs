use serde::{Deserialize, Deserializer, Serialize};

type Variables = serde_json::Map<String, serde_json::Value>;

/// The body of a GraphQL request, as sent by clients over HTTP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlBody {
    pub query: String,

    #[serde(default)]
    pub operation_name: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub variables: Variables,
}

impl GraphqlBody {
    pub fn new(query: impl Into<String>) -> Self {
        GraphqlBody {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Replaces the variables with the entries of a JSON object. Anything
    /// else clears them.
    pub fn variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = match variables {
            serde_json::Value::Object(map) => map,
            _ => Variables::new(),
        };
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Variables, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Variables>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_variables_are_accepted() {
        let body: GraphqlBody = serde_json::from_value(json!({
            "query": "{ people { id } }",
            "operationName": null,
            "variables": null,
        }))
        .unwrap();

        assert_eq!(body, GraphqlBody::new("{ people { id } }"));
    }
}
