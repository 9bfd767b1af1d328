//! Best-effort classification of malformed requests.
//!
//! GraphQL implementations only report problems with a document as
//! messages. The table below recognizes the messages produced while
//! validating a request and turns them into a machine-readable reason. Named
//! captures end up in the payload next to the reason.

use once_cell::sync::Lazy;
use regex::Regex;
use user_facing_errors::query_engine::{MalformedRequest, MalformedRequestKind};

static PATTERNS: Lazy<Vec<(MalformedRequestKind, Regex)>> = Lazy::new(|| {
    use MalformedRequestKind::*;

    [
        (SyntaxError, r"(?s)^Syntax Error: (?P<details>.*)$"),
        (
            MissingArgument,
            r#"^(?:Field|Directive) "@?(?P<field_name>[^"]+)" argument "(?P<argument_name>[^"]+)" of type "(?P<expected_type>[^"]+)" is required, but it was not provided\.$"#,
        ),
        (
            MissingArgument,
            r#"^Field "(?P<type_name>[^".]+)\.(?P<argument_name>[^"]+)" of required type "(?P<expected_type>[^"]+)" was not provided\.$"#,
        ),
        (
            UnknownArgument,
            r#"^Unknown argument "(?P<argument_name>[^"]+)" on field "(?P<type_name>[^".]+)\.(?P<field_name>[^"]+)"\.$"#,
        ),
        (
            UnknownArgument,
            r#"^Field "(?P<argument_name>[^"]+)" is not defined by type "(?P<type_name>[^"]+)"\."#,
        ),
        (
            UnknownField,
            r#"^Cannot query field "(?P<field_name>[^"]+)" on type "(?P<type_name>[^"]+)"\."#,
        ),
        (
            MissingSubselection,
            r#"^Field "(?P<field_name>[^"]+)" of type "(?P<type_name>[^"]+)" must have a selection of subfields\."#,
        ),
        (
            UnexpectedSubselection,
            r#"^Field "(?P<field_name>[^"]+)" must not have a selection since type "(?P<type_name>[^"]+)" has no subfields\.$"#,
        ),
        (UnknownOperation, r#"^Unknown operation named "(?P<operation_name>[^"]+)"\.$"#),
        (
            UnknownOperation,
            r"^Must provide (?:an operation|operation name if query contains multiple operations)\.$",
        ),
        (
            MissingVariable,
            r#"^Variable "\$(?P<variable_name>[^"]+)" of (?:required|non-null) type "(?P<expected_type>[^"]+)" (?:was not provided|must not be null)\.$"#,
        ),
        (MissingVariable, r#"^Variable "\$(?P<variable_name>[^"]+)" is not defined\.$"#),
        (
            WrongType,
            r#"^Value "(?P<value>[^"]*)" does not exist in "(?P<expected_type>[^"]+)" enum\.$"#,
        ),
        (
            WrongType,
            r#"^Expected value of type "(?P<expected_type>[^"]+)", found (?P<value>.*)\.$"#,
        ),
        (
            WrongType,
            r#"^(?:Enum "(?P<enum_type>[^"]+)"|(?P<expected_type>\w+)) cannot represent [^:]*?(?:: (?P<value>.*?))?\.?$"#,
        ),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).unwrap()))
    .collect()
});

/// Maps a validation message to a malformed request error. Messages nothing
/// matches are classified as `Unknown`.
pub fn classify(message: &str) -> MalformedRequest {
    for (kind, pattern) in PATTERNS.iter() {
        let Some(captures) = pattern.captures(message) else {
            continue;
        };

        let mut error = MalformedRequest::new(*kind, message);

        for name in pattern.capture_names().flatten() {
            if let Some(capture) = captures.name(name) {
                error = error.with_meta(name, capture.as_str());
            }
        }

        return error;
    }

    MalformedRequest::new(MalformedRequestKind::Unknown, message)
}
