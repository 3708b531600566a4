// tests/json_tests.rs

use serde_json::{Value as JsonValue, json};
use sift_lang::cli::{CheckOptions, CliError, FilterOptions, execute_check, execute_filter};
use sift_lang::json::{infer_schema, to_value};
use sift_lang::{ErrorKind, Value, ValueType, compile};

fn users() -> Vec<JsonValue> {
    vec![
        json!({
            "name": "ada",
            "attempts": 1,
            "score": 9,
            "joined": "2021-05-01 09:00",
            "roles": ["admin", "dev"],
            "address": {"city": "London", "zip": "N1"},
            "orders": [{"total": 12.5}, {"total": 80}]
        }),
        json!({
            "name": "bob",
            "attempts": 4,
            "score": 7.5,
            "joined": "2023-01-15",
            "roles": [],
            "address": {"city": "Paris"},
            "orders": []
        }),
        json!({
            "name": "cy",
            "attempts": null,
            "nickname": "c",
            "joined": "2022-11-30T18:45:00",
            "roles": ["dev"],
            "address": null,
            "orders": [{"total": 3}]
        }),
    ]
}

fn names(matches: &[&JsonValue]) -> Vec<String> {
    matches
        .iter()
        .filter_map(|user| user["name"].as_str())
        .map(str::to_string)
        .collect()
}

fn query(text: &str) -> Vec<String> {
    let users = users();
    let schema = infer_schema(&users);
    let predicate = match compile(text, &schema) {
        Ok(predicate) => predicate,
        Err(err) => panic!("{:?} failed to compile:\n{}", text, err),
    };
    names(&predicate.filter(&users))
}

fn member_type(value_type: &ValueType, name: &str) -> ValueType {
    value_type
        .members()
        .iter()
        .find(|m| m.name() == name)
        .map(|m| m.value_type().clone())
        .unwrap_or_else(|| panic!("no member {}", name))
}

// ============================================================================
// Inference
// ============================================================================

#[test]
fn test_inferred_member_types() {
    let schema = infer_schema(&users());
    let root = schema.value_type();

    assert_eq!(member_type(root, "name"), ValueType::String);
    assert_eq!(member_type(root, "attempts"), ValueType::Integer);
    assert_eq!(member_type(root, "score"), ValueType::Float);
    assert_eq!(member_type(root, "joined"), ValueType::DateTime);
    assert_eq!(
        member_type(root, "roles"),
        ValueType::Sequence(Box::new(ValueType::String))
    );

    let address = member_type(root, "address");
    assert_eq!(member_type(&address, "city"), ValueType::String);
    assert_eq!(member_type(&address, "zip"), ValueType::String);

    let orders = member_type(root, "orders");
    let order = orders.element_type().unwrap();
    assert_eq!(member_type(order, "total"), ValueType::Float);
}

#[test]
fn test_keys_are_unioned() {
    let schema = infer_schema(&users());
    let mut keys: Vec<&str> = schema.value_type().members().iter().map(|m| m.name()).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["address", "attempts", "joined", "name", "nickname", "orders", "roles", "score"]
    );
}

#[test]
fn test_scalar_documents() {
    let numbers = vec![json!(1), json!(5), json!(12)];
    let schema = infer_schema(&numbers);
    assert_eq!(schema.value_type(), &ValueType::Integer);

    let predicate = compile("$ > 3", &schema).unwrap();
    assert_eq!(predicate.filter(&numbers), vec![&numbers[1], &numbers[2]]);
}

#[test]
fn test_to_value_mismatch_is_null() {
    assert!(to_value(&json!("x"), &ValueType::Integer).is_null());
    assert!(to_value(&json!(1.5), &ValueType::Integer).is_null());
    assert_eq!(to_value(&json!(2), &ValueType::Float), Value::Float(2.0));
    assert_eq!(to_value(&json!("x"), &ValueType::String), Value::from("x"));
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_simple_queries() {
    assert_eq!(query("attempts > 3"), vec!["bob"]);
    assert_eq!(query("score >= 7.5"), vec!["ada", "bob"]);
    assert_eq!(query(r#"name =? "?o?""#), vec!["bob"]);
    assert_eq!(query(r#"nick == "c""#), vec!["cy"]);
}

#[test]
fn test_missing_values_are_null() {
    assert_eq!(query("attempts < 100"), vec!["ada", "bob"]);
    assert_eq!(query(r#"address.city =~ "^L""#), vec!["ada"]);
    assert_eq!(query(r#"address.zip != "N1""#), vec!["bob", "cy"]);
}

#[test]
fn test_nested_sequences() {
    assert_eq!(query(r#"roles any { $ == "dev" }"#), vec!["ada", "cy"]);
    assert_eq!(query(r#"roles all { $ == "dev" }"#), vec!["bob", "cy"]);
    assert_eq!(query("orders count { total > 10 } == 2"), vec!["ada"]);
    assert_eq!(query("orders any { total > $$.score * 5 }"), vec!["ada"]);
}

#[test]
fn test_dates_from_strings() {
    assert_eq!(query("joined < 2022-01-01"), vec!["ada"]);
    assert_eq!(query("joined > 2022-11-30 12:00"), vec!["bob", "cy"]);
}

#[test]
fn test_unknown_key_fails_to_compile() {
    let users = users();
    let err = compile("email =? \"*\"", &infer_schema(&users)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MemberNotFound);
}

// ============================================================================
// CLI
// ============================================================================

#[test]
fn test_cli_filter() {
    let options = FilterOptions {
        query: "n =? \"a*\" || attempts > 3".to_string(),
        input: Some(r#"[{"n": "ann", "attempts": 0}, {"n": "ben", "attempts": 5}, {"n": "cat", "attempts": 1}]"#.to_string()),
    };
    let output = execute_filter(&options).unwrap();
    assert_eq!(
        output,
        json!([{"n": "ann", "attempts": 0}, {"n": "ben", "attempts": 5}])
    );
}

#[test]
fn test_cli_filter_single_document() {
    let options = FilterOptions {
        query: "a == 1".to_string(),
        input: Some(r#"{"a": 1}"#.to_string()),
    };
    assert_eq!(execute_filter(&options).unwrap(), json!([{"a": 1}]));
}

#[test]
fn test_cli_check() {
    let options = CheckOptions {
        query: "a == 1 && b any { $ > 2 }".to_string(),
        input: Some(r#"[{"a": 1, "b": [1, 2, 3]}]"#.to_string()),
    };
    let input_type = execute_check(&options).unwrap();
    assert_eq!(input_type.to_string(), "Document");

    let options = CheckOptions {
        query: "a ==".to_string(),
        input: Some(r#"[{"a": 1}]"#.to_string()),
    };
    match execute_check(&options) {
        Err(CliError::Compile(err)) => assert_eq!(err.kind(), ErrorKind::UnexpectedToken),
        other => panic!("expected a compile error, got {:?}", other),
    }
}

#[test]
fn test_leading_null_samples() {
    let samples = vec![
        json!({"name": null, "badge": null}),
        json!({"name": "cy", "badge": 7}),
    ];
    let schema = infer_schema(&samples);
    assert_eq!(member_type(schema.value_type(), "name"), ValueType::String);
    assert_eq!(member_type(schema.value_type(), "badge"), ValueType::Integer);

    let predicate = compile("badge > 5", &schema).unwrap();
    assert_eq!(predicate.filter(&samples), vec![&samples[1]]);
}
