//! Behaviour of the public query API against whole documents.
use jpslice::Error;
use jpslice::lexer::EvalError;
use jpslice::query::{
    JsonPath, ParseError, PathBuilder, QueryEngine, ScanQueryEngine,
};

const SCENARIO: &[u8] = br#"{"x":[{"id":"A"},{"id":"B"}]}"#;

/// A handful of differently shaped documents.
const DOCUMENTS: &[&str] = &[
    r#"{"k": 1}"#,
    "  [1, 2, 3]\n",
    r#""just a string""#,
    "-12.5e3",
    "true",
    "null",
    r#"{"a": {"b": [{"c": "}"}, [], {}]}, "d": "x\"y"}"#,
    "\n\t{ \"spaced\" : [ 1 , 2 ] }  ",
];

fn query(doc: &[u8], path: &str) -> Vec<u8> {
    jpslice::query(doc, path).unwrap()
}

#[test]
fn scenario() {
    assert_eq!(query(SCENARIO, "$.x[1].id"), br#""B""#);
    assert_eq!(query(SCENARIO, "$.x[*].id"), br#"["A","B"]"#);
    assert_eq!(query(SCENARIO, r#"$.x[?(@.id=="A")].id"#), br#""A""#);
}

#[test]
fn root_is_whole_value() {
    for doc in DOCUMENTS {
        assert_eq!(query(doc.as_bytes(), "$"), doc.trim().as_bytes(), "{doc}");
    }
}

#[test]
fn member_value_is_raw() {
    let cases: &[(&str, &str)] = &[
        (r#"{"k": 1}"#, "1"),
        (r#"{"k":"aA"}"#, r#""aA""#),
        (r#"{"z": 0, "k": [1,  2 ]}"#, "[1,  2 ]"),
        (r#"{"k": {"k": null}}"#, r#"{"k": null}"#),
        (r#"{"k": -0.5E+2 }"#, "-0.5E+2"),
    ];
    for (doc, expected) in cases {
        assert_eq!(query(doc.as_bytes(), "$.k"), expected.as_bytes(), "{doc}");
    }
}

#[test]
fn negative_index_equivalence() {
    let doc = br#"[10, "b", {"c": 3}, [4], null]"#;
    let n = 5;
    for i in 0..n {
        assert_eq!(
            query(doc, &format!("$[{i}]")),
            query(doc, &format!("$[{}]", i - n)),
        );
    }
}

#[test]
fn repeated_queries_are_identical() {
    let doc = br#"{"a": [{"b": 1}, {"b": 2}], "c": {"b": 3}}"#;
    for path in ["$..b", "$.a[?(@.b > 1)]", "$.a[::-1]", "$.*"] {
        assert_eq!(query(doc, path), query(doc, path));
    }
}

#[test]
fn full_slice_equals_wildcard() {
    let doc = br#"[{"a": 1}, 2, "three", [4]]"#;
    assert_eq!(query(doc, "$[0:4]"), query(doc, "$[*]"));
    assert_eq!(query(doc, "$[0:4]"), br#"[{"a": 1},2,"three",[4]]"#);
}

#[test]
fn no_match_is_not_an_error() {
    assert!(query(br#"{"a":1}"#, "$.b").is_empty());
    assert_eq!(
        jpslice::query(br#"{"a":1}"#, "$["),
        Err(Error::Parse(ParseError::UnterminatedBracket(1)))
    );
}

#[test]
fn error_families_stay_distinct() {
    assert!(matches!(
        jpslice::query(br#"{"a":1}"#, "$.a["),
        Err(Error::Parse(_))
    ));
    assert_eq!(
        jpslice::query(b"", "$.a"),
        Err(Error::Eval(EvalError::UnexpectedEndOfInput(0)))
    );
    assert!(matches!(
        jpslice::query(br#"{"a": tru}"#, "$.a"),
        Err(Error::Eval(EvalError::InvalidByte { .. }))
    ));
}

#[test]
fn parse_errors() {
    let cases: &[(&str, ParseError)] = &[
        ("$[", ParseError::UnterminatedBracket(1)),
        ("$.a[?(@.b == 1)", ParseError::UnterminatedBracket(3)),
        ("$.a[?(@.b == 1]", ParseError::UnterminatedFilter(3)),
        ("$[1:2:0]", ParseError::EmptyStep),
    ];
    for (path, expected) in cases {
        assert_eq!(JsonPath::parse(path).as_ref(), Err(expected), "{path}");
    }
    assert!(matches!(
        JsonPath::parse("$.bad-name"),
        Err(ParseError::InvalidFieldName(_))
    ));
    assert!(matches!(
        JsonPath::parse("a.b"),
        Err(ParseError::UnexpectedToken(_))
    ));
}

#[test]
fn escaped_keys_are_compared_raw() {
    let doc = br#"{"na\u006de": 1, "name": 2}"#;
    assert_eq!(query(doc, "$.name"), b"2");
    assert!(query(br#"{"na\u006de": 1}"#, "$.name").is_empty());
    assert_eq!(query(br#"{"na\u006de": 1}"#, "$.*"), b"1");
}

#[test]
fn duplicate_keys_first_wins() {
    let doc = br#"{"a": 1, "a": 2}"#;
    assert_eq!(query(doc, "$.a"), b"1");
    assert_eq!(query(doc, "$.*"), b"[1,2]");
}

#[test]
fn recursive_descent_order() {
    let doc = br#"{"name": 0, "a": {"name": 1, "b": [{"name": 2}]}, "c": {"name": 3}}"#;
    assert_eq!(query(doc, "$..name"), b"[0,1,2,3]");
}

#[test]
fn unions_keep_duplicates_in_order() {
    let doc = br#"{"a": [0, 1, 2, 3]}"#;
    assert_eq!(query(doc, "$.a[3,0,3]"), b"[3,0,3]");
}

#[test]
fn built_paths_match_parsed_paths() {
    let doc = br#"{"store": {"book": [{"title": "A"}, {"title": "B"}]}}"#;
    let built = PathBuilder::new()
        .field("store")
        .field("book")
        .index(-1)
        .field("title")
        .build();
    let parsed: JsonPath = "$.store.book[-1].title".parse().unwrap();
    assert_eq!(built, parsed);
    let matches = ScanQueryEngine.find(doc, &built).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches.values(doc).next(), Some(&br#""B""#[..]));
}

#[test]
fn canonical_form_reparses_to_same_matches() {
    let doc = br#"{"a b": [1, 2, 3], "c": [{"d": true}, {"d": false}]}"#;
    for path in [
        r#"$['a b'][1:]"#,
        "$.c[?(@.d == true || !@.d)].d",
        "$..[0]",
    ] {
        let parsed: JsonPath = path.parse().unwrap();
        let reparsed: JsonPath = parsed.to_string().parse().unwrap();
        assert_eq!(parsed, reparsed);
        assert_eq!(parsed.select(doc).unwrap(), reparsed.select(doc).unwrap());
    }
}
