use crate::SchemaError;
use heck::{ToSnakeCase, ToUpperCamelCase};
use serde::Deserialize;
use std::env;

/// Naming convention for model and operation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Casing {
    #[default]
    Snake,
    Pascal,
}

impl Casing {
    pub fn convert(&self, name: &str) -> String {
        match self {
            Casing::Snake => name.to_snake_case(),
            Casing::Pascal => name.to_upper_camel_case(),
        }
    }

    /// Joins already converted names, e.g. `create` and `person`.
    pub fn join(&self, names: &[&str]) -> String {
        match self {
            Casing::Snake => names.join("_"),
            Casing::Pascal => names
                .iter()
                .map(|name| {
                    let mut chars = name.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect(),
        }
    }

    pub fn convert_and_join(&self, names: &[&str]) -> String {
        let converted: Vec<String> = names.iter().map(|name| self.convert(name)).collect();
        let borrowed: Vec<&str> = converted.iter().map(String::as_str).collect();

        self.join(&borrowed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub casing: Casing,
    /// Marks every field that cannot be null in storage as non-null in the
    /// output types.
    pub strict_output: bool,
    /// Only fetch the columns a request selects.
    pub restrict_queried_fields: bool,
    /// Keep internal error details in responses.
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            casing: Casing::Snake,
            strict_output: false,
            restrict_queried_fields: true,
            debug: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SchemaError> {
        let mut settings = Settings::default();

        if let Some(casing) = read_env("QUERY_ENGINE_CASING") {
            settings.casing = match casing.to_lowercase().as_str() {
                "snake" => Casing::Snake,
                "pascal" => Casing::Pascal,
                other => {
                    return Err(SchemaError::configuration(format!(
                        "QUERY_ENGINE_CASING must be `snake` or `pascal`, got `{other}`"
                    )))
                }
            };
        }

        if let Some(value) = read_env("QUERY_ENGINE_STRICT_OUTPUT") {
            settings.strict_output = parse_flag("QUERY_ENGINE_STRICT_OUTPUT", &value)?;
        }

        if let Some(value) = read_env("QUERY_ENGINE_RESTRICT_QUERIED_FIELDS") {
            settings.restrict_queried_fields = parse_flag("QUERY_ENGINE_RESTRICT_QUERIED_FIELDS", &value)?;
        }

        if let Some(value) = read_env("QUERY_ENGINE_DEBUG") {
            settings.debug = parse_flag("QUERY_ENGINE_DEBUG", &value)?;
        }

        tracing::debug!(?settings, "settings loaded from the environment");

        Ok(settings)
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_flag(key: &str, value: &str) -> Result<bool, SchemaError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SchemaError::configuration(format!("{key} must be a boolean, got `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_conventions() {
        assert_eq!(Casing::Snake.convert("HouseTenant"), "house_tenant");
        assert_eq!(Casing::Pascal.convert("house_tenant"), "HouseTenant");
        assert_eq!(Casing::Snake.join(&["create", "person"]), "create_person");
        assert_eq!(Casing::Pascal.join(&["create", "Person"]), "CreatePerson");
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"casing": "pascal"}"#).unwrap();

        assert_eq!(settings.casing, Casing::Pascal);
        assert!(settings.restrict_queried_fields);
        assert!(!settings.strict_output);
    }

    #[test]
    fn flags_must_be_booleans() {
        assert_eq!(parse_flag("X", "TRUE"), Ok(true));
        assert!(parse_flag("X", "maybe").is_err());
    }
}
