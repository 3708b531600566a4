// tests/parser_tests.rs

use sift_lang::ast::{BinaryOperator, Expr, ExprKind, LiteralValue};
use sift_lang::{CompileError, ErrorKind, Schema, ValueType, parse};

struct Flags {
    a: bool,
    b: bool,
    c: bool,
    d: bool,
    e: bool,
}

struct Item {
    number: i32,
}

struct Shortcuts {
    apples: i32,
    apricots: i32,
    bananas: f64,
    password: String,
    items: Vec<Item>,
}

fn flags() -> ValueType {
    Schema::<Flags>::builder("Flags")
        .field("A", |r| r.a)
        .field("B", |r| r.b)
        .field("C", |r| r.c)
        .field("D", |r| r.d)
        .field("E", |r| r.e)
        .build()
        .value_type()
        .clone()
}

fn shortcuts() -> ValueType {
    let item = Schema::<Item>::builder("Item").field("Number", |i| i.number).build();
    Schema::<Shortcuts>::builder("Shortcuts")
        .field("Apples", |r| r.apples)
        .field("Apricots", |r| r.apricots)
        .field("Bananas", |r| r.bananas)
        .text("Password", |r| r.password.as_str())
        .records("Items", &item, |r| r.items.as_slice())
        .build()
        .value_type()
        .clone()
}

/// Render a tree as an s-expression, members by name.
fn shape(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::MemberAccess { base, member } => match base.kind {
            ExprKind::IteratorRef(0) => member.name().to_string(),
            ExprKind::IteratorRef(depth) => format!("{}@{}", member.name(), depth),
            _ => format!("{}.{}", shape(base), member.name()),
        },
        ExprKind::IteratorRef(depth) => format!("${}", depth),
        ExprKind::Literal(value) => format!("{:?}", value),
        ExprKind::UnaryOp { op, operand } => format!("({:?} {})", op, shape(operand)),
        ExprKind::BinaryOp { op, left, right } => {
            let symbol = match op {
                BinaryOperator::Native(op) => op.symbol(),
                BinaryOperator::Pattern { op, .. } => op.name(),
            };
            format!("({} {} {})", symbol, shape(left), shape(right))
        }
        ExprKind::FunctionCall { function, args } => {
            let args: Vec<String> = args.iter().map(shape).collect();
            format!("({} {})", function.name(), args.join(" "))
        }
        ExprKind::NestedQuery {
            kind,
            source,
            predicate,
            ..
        } => format!("({:?} {} {})", kind, shape(source), shape(predicate)),
    }
}

fn parse_flags(query: &str) -> String {
    shape(&parse(query, &flags()).unwrap())
}

fn parse_shortcuts(query: &str) -> String {
    shape(&parse(query, &shortcuts()).unwrap())
}

fn error(query: &str) -> CompileError {
    match parse(query, &shortcuts()) {
        Ok(expr) => panic!("{:?} should not compile, got {}", query, shape(&expr)),
        Err(err) => err,
    }
}

// ============================================================================
// Precedence and associativity
// ============================================================================

#[test]
fn test_binary_operator() {
    assert_eq!(parse_flags("a && b"), "(&& A B)");
}

#[test]
fn test_and_binds_tighter_than_or() {
    assert_eq!(parse_flags("a && b || c"), "(|| (&& A B) C)");
    assert_eq!(parse_flags("a || b && c"), "(|| A (&& B C))");
}

#[test]
fn test_same_precedence_is_left_associative() {
    assert_eq!(parse_flags("a || b || c"), "(|| (|| A B) C)");
}

#[test]
fn test_complex_expression_trees() {
    assert_eq!(parse_flags("a && b && c || d && e"), "(|| (&& (&& A B) C) (&& D E))");
    assert_eq!(parse_flags("a || b && c || d || e"), "(|| (|| (|| A (&& B C)) D) E)");
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(parse_flags("(a || b) && c"), "(&& (|| A B) C)");
    assert_eq!(parse_flags("a && (b || c)"), "(&& A (|| B C))");
}

#[test]
fn test_equality_binds_tighter_than_and() {
    assert_eq!(parse_flags("a == b && c != d"), "(&& (== A B) (!= C D))");
    assert_eq!(parse_flags("a | b ^ c & d"), "(| A (^ B (& C D)))");
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(
        parse_shortcuts("apples + 2 * 3 > bananas"),
        "(> (+ Apples (* Integer(2) Integer(3))) Bananas)"
    );
    assert_eq!(
        parse_shortcuts("apples - 1 - 2 == 0"),
        "(== (- (- Apples Integer(1)) Integer(2)) Integer(0))"
    );
    assert_eq!(
        parse_shortcuts("apples << 1 + 1 < 8"),
        "(< (<< Apples (+ Integer(1) Integer(1))) Integer(8))"
    );
}

#[test]
fn test_pattern_operators_share_equality_precedence() {
    assert_eq!(
        parse_shortcuts(r#"password =? "x*" && apples > 1"#),
        r#"(&& (Like Password String("x*")) (> Apples Integer(1)))"#
    );
    assert_eq!(
        parse_shortcuts(r#"password !~ "^a" || password =~ "b""#),
        r#"(|| (DoesNotMatchRegex Password String("^a")) (MatchesRegex Password String("b")))"#
    );
}

#[test]
fn test_regex_literal_is_compiled_ahead() {
    let expr = parse(r#"password =~ "^[a-z]+$""#, &shortcuts()).unwrap();
    assert!(matches!(
        expr.kind,
        ExprKind::BinaryOp {
            op: BinaryOperator::Pattern { regex: Some(_), .. },
            ..
        }
    ));

    let expr = parse("password =~ password", &shortcuts()).unwrap();
    assert!(matches!(
        expr.kind,
        ExprKind::BinaryOp {
            op: BinaryOperator::Pattern { regex: None, .. },
            ..
        }
    ));
}

// ============================================================================
// Unary operators
// ============================================================================

#[test]
fn test_unary_operand_extends_to_the_end() {
    assert_eq!(parse_flags("!a && b"), "(Not (&& A B))");
    assert_eq!(parse_flags("!(a == b)"), "(Not (== A B))");
    assert_eq!(parse_flags("(!a) && b"), "(&& (Not A) B)");
}

#[test]
fn test_negative_literals() {
    assert_eq!(parse_shortcuts("apples > -100"), "(> Apples (Negate Integer(100)))");
    assert_eq!(parse_shortcuts("~apples == 0"), "(BitwiseNot (== Apples Integer(0)))");
}

// ============================================================================
// Member resolution
// ============================================================================

#[test]
fn test_case_insensitive_shortcuts() {
    assert_eq!(parse_shortcuts("apP != 0"), "(!= Apples Integer(0))");
    assert_eq!(parse_shortcuts("BAN > 1.5"), "(> Bananas Float(1.5))");
    assert_eq!(parse_shortcuts("PASSWORD == \"\""), r#"(== Password String(""))"#);
}

#[test]
fn test_exact_name_beats_prefix() {
    struct Names {
        name: String,
        name_suffix: String,
    }
    let schema = Schema::<Names>::builder("Names")
        .text("Name", |n| n.name.as_str())
        .text("NameSuffix", |n| n.name_suffix.as_str())
        .build();

    let expr = parse("name == \"x\"", schema.value_type()).unwrap();
    assert_eq!(shape(&expr), r#"(== Name String("x"))"#);
}

#[test]
fn test_ambiguous_shortcut_lists_candidates() {
    let err = error("ap > 1");
    assert_eq!(err.kind(), ErrorKind::AmbiguousMember);
    assert!(err.message().contains("Apples"));
    assert!(err.message().contains("Apricots"));
}

#[test]
fn test_unknown_member() {
    let err = error("zebra > 1");
    assert_eq!(err.kind(), ErrorKind::MemberNotFound);
    assert_eq!(err.span(), 0..5);

    let err = error("items.size > 1");
    assert_eq!(err.kind(), ErrorKind::MemberNotFound);
}

#[test]
fn test_iterator_at_root_is_the_input() {
    assert_eq!(parse_flags("$.a && b"), "(&& A B)");
    assert_eq!(parse_flags("$.a && b"), parse_flags("a && b"));
}

#[test]
fn test_iterator_beyond_root() {
    let err = error("$$.apples == 1");
    assert_eq!(err.kind(), ErrorKind::IteratorDepth);
    assert!(err.message().contains("depth"));
}

// ============================================================================
// Nested queries
// ============================================================================

#[test]
fn test_nested_query() {
    assert_eq!(
        parse_shortcuts("items any { number > 3 }"),
        "(Any Items (> Number@1 Integer(3)))"
    );
    assert_eq!(
        parse_shortcuts("items count { number == 420 } == 2"),
        "(== (Count Items (== Number@1 Integer(420))) Integer(2))"
    );
}

#[test]
fn test_nested_query_reaches_outer_input() {
    assert_eq!(
        parse_shortcuts("items all { $.number < $$.apples }"),
        "(All Items (< Number@1 Apples))"
    );
}

#[test]
fn test_nested_query_inside_binary_operator() {
    assert_eq!(
        parse_shortcuts("apples > 1 && items any { number > 3 }"),
        "(&& (> Apples Integer(1)) (Any Items (> Number@1 Integer(3))))"
    );
}

#[test]
fn test_nested_query_requires_sequence() {
    let err = error("apples any { true }");
    assert_eq!(err.kind(), ErrorKind::NotASequence);
    assert!(err.message().contains("integer"));
}

#[test]
fn test_nested_query_requires_boolean() {
    assert_eq!(error("items any { number }").kind(), ErrorKind::NotBoolean);
    assert_eq!(error("items count { number > 1 }").kind(), ErrorKind::NotBoolean);
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_literal_function_calls_are_folded() {
    struct Login {
        at: chrono::NaiveDateTime,
        raw: String,
    }
    let schema = Schema::<Login>::builder("Login")
        .field("At", |l| l.at)
        .text("Raw", |l| l.raw.as_str())
        .build();

    let expr = parse(r#"at > DateTime("2023-04-01")"#, schema.value_type()).unwrap();
    let ExprKind::BinaryOp { right, .. } = &expr.kind else {
        panic!("Expected a comparison");
    };
    assert!(matches!(right.kind, ExprKind::Literal(LiteralValue::DateTime(_))));

    let expr = parse("at > DateTime(raw)", schema.value_type()).unwrap();
    assert_eq!(shape(&expr), "(> At (DateTime Raw))");
}

#[test]
fn test_function_errors() {
    assert_eq!(error(r#"Nope("x") == 1"#).kind(), ErrorKind::UnknownFunction);
    assert_eq!(error(r#"TimeSpan("x", "y") == 1"#).kind(), ErrorKind::UnknownFunction);
    assert_eq!(error("TimeSpan(apples) > 00:10").kind(), ErrorKind::TypeMismatch);
    assert_eq!(error(r#"TimeSpan("soon") > 00:10"#).kind(), ErrorKind::InvalidLiteral);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_malformed_queries() {
    for query in ["(apples != 1", "apples == 1)", "==", "apples > 1 ||", "apples 1", "", "items any number > 1 }"] {
        let err = error(query);
        assert_eq!(err.kind(), ErrorKind::UnexpectedToken, "Failed for query: {:?}", query);
    }
}

#[test]
fn test_type_mismatches() {
    for query in ["apples && true", "password > 1", "password =? 1", "-password == \"x\"", "!apples"] {
        let err = error(query);
        assert_eq!(err.kind(), ErrorKind::TypeMismatch, "Failed for query: {:?}", query);
    }
}

#[test]
fn test_query_must_be_boolean() {
    assert_eq!(error("apples + 1").kind(), ErrorKind::NotBoolean);
}

#[test]
fn test_invalid_regex_literal() {
    assert_eq!(error(r#"password =~ "(""#).kind(), ErrorKind::InvalidPattern);
}

#[test]
fn test_error_report() {
    let err = error("apples > 1 && zebra");
    let report = err.to_string();
    assert!(report.starts_with("Query compilation failed, error at position 14:"));
    assert!(report.contains("Member 'zebra' not found on Shortcuts"));
    assert!(report.contains("Surrounding text:"));
    assert!(report.contains("apples > 1 && zebra"));
    assert!(report.contains("^^^^^"));
}

#[test]
fn test_error_report_is_bounded_for_long_queries() {
    let query = format!("apples{}", " + 1".repeat(5000));
    let err = error(&query);
    assert_eq!(err.kind(), ErrorKind::NotBoolean);
    assert!(err.to_string().len() < 300, "report grew to {} bytes", err.to_string().len());

    let query = format!("password == \"{}", "x".repeat(5000));
    let err = error(&query);
    assert_eq!(err.kind(), ErrorKind::UnterminatedString);
    assert!(err.to_string().len() < 300, "report grew to {} bytes", err.to_string().len());
}

#[test]
fn test_error_report_keeps_to_one_line() {
    let report = error("apples +\n 1").to_string();
    assert!(report.ends_with("Surrounding text:\n  apples +\n  ^^^^^^^^"));
}
