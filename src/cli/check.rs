//! Compile a query against the type inferred from JSON input

use super::{CliError, documents};
use crate::{ValueType, compile, json::infer_schema};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub query: String,
    /// JSON input string
    pub input: Option<String>,
}

/// Compile the query, returning the input type it was checked against.
pub fn execute_check(options: &CheckOptions) -> Result<ValueType, CliError> {
    let documents = documents(options.input.as_deref())?;
    let schema = infer_schema(&documents);
    let predicate = compile(&options.query, &schema)?;
    Ok(predicate.schema().value_type().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(query: &str, input: &str) -> Result<ValueType, CliError> {
        execute_check(&CheckOptions {
            query: query.to_string(),
            input: Some(input.to_string()),
        })
    }

    #[test]
    fn test_check_reports_compile_errors() {
        assert!(check("id > 1", r#"[{"id": 1}]"#).is_ok());
        assert!(matches!(check("idx > 1", r#"[{"id": 1}]"#), Err(CliError::Compile(_))));
        assert!(matches!(check("id > 1", "[{"), Err(CliError::Json(_))));
    }

    #[test]
    fn test_check_requires_input() {
        let options = CheckOptions {
            query: "true".to_string(),
            input: None,
        };
        assert!(matches!(execute_check(&options), Err(CliError::NoInput)));
    }
}
