//! Select the JSON documents a query matches

use serde_json::Value as JsonValue;

use super::{CliError, documents};
use crate::{compile, json::infer_schema};

/// Options for the filter command
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub query: String,
    /// JSON input string; an array is filtered element by element
    pub input: Option<String>,
}

pub fn execute_filter(options: &FilterOptions) -> Result<JsonValue, CliError> {
    let documents = documents(options.input.as_deref())?;
    let schema = infer_schema(&documents);
    let predicate = compile(&options.query, &schema)?;

    let matching = predicate.filter(&documents).into_iter().cloned().collect();
    Ok(JsonValue::Array(matching))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_keeps_matching_elements() {
        let options = FilterOptions {
            query: r#"name =? "a*" || tags any { $ == "x" }"#.to_string(),
            input: Some(
                r#"[
                    {"name": "ada", "tags": []},
                    {"name": "bob", "tags": ["x"]},
                    {"name": "cy", "tags": ["y"]}
                ]"#
                .to_string(),
            ),
        };
        let output = execute_filter(&options).unwrap();
        assert_eq!(output, json!([{"name": "ada", "tags": []}, {"name": "bob", "tags": ["x"]}]));
    }
}
