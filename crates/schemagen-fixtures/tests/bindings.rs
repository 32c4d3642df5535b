//! Drive the generated fixture modules through their bindings.
//!
//! Each validator keeps a single "last errors" slot, so everything touching
//! one schema's validator lives in one test.

use schemagen_common::{Outcome, SchemaBinding, ValidationError};
use schemagen_fixtures::cycle::{ChildSchema, ParentSchema};
use schemagen_fixtures::schemas::{Account1Schema, HolderSchema, TokenSchema, account, holder, token};
use serde_json::{Value, json};

#[test]
fn token_validate_get_and_errors() {
    let value = json!({ "mint": "So11111111111111111111111111111111111111112", "amount": 5, "decimals": null });
    assert!(token::validate(&value));
    assert_eq!(token::last_errors(), None);

    let decoded = TokenSchema::get(value).expect("valid token decodes");
    assert_eq!(decoded.mint, "So11111111111111111111111111111111111111112");
    assert_eq!(decoded.amount.as_i64(), Some(5));
    assert_eq!(decoded.decimals, None);

    // `integer` accepts integral floats and the full u64 range
    for amount in [json!(1.0), json!(u64::MAX)] {
        let value = json!({ "mint": "m", "amount": amount });
        assert!(TokenSchema::validate(&value), "{value} should validate");
        let decoded = token::get(value.clone()).unwrap_or_else(|e| panic!("{value} should decode: {e}"));
        assert!(decoded.amount.as_u64().is_some());
    }

    let missing = json!({ "mint": "m" });
    assert!(!token::validate(&missing));
    let issues = token::last_errors().expect("failure recorded");
    assert_eq!(issues[0].keyword, "required");

    let err = TokenSchema::get(missing).expect_err("missing amount");
    match &err {
        ValidationError::Invalid { schema_id, message, issues } => {
            assert_eq!(schema_id, "token");
            assert_eq!(issues[0].keyword, "required");
            let parsed: Vec<Value> = serde_json::from_str(message).expect("message is the issue list");
            assert_eq!(parsed.len(), issues.len());
        }
        other => panic!("unexpected error: {other}"),
    }
    let rendered: Vec<Value> = serde_json::from_str(&err.to_string()).expect("display is the issue list");
    assert_eq!(rendered[0]["keyword"], "required");

    assert!(!token::validate(&json!({ "mint": "m", "amount": -1 })));
    assert!(!token::validate(&json!({ "mint": "m", "amount": 1.5 })));
}

#[test]
fn account_decodes_nested_types_across_modules() {
    let value = json!({
        "address": "acct",
        "state": "initialized",
        "tokens": [{ "mint": "m", "amount": 2 }],
        "owner": { "pubkey": "pk" },
        "lamports": { "rent": 890880 }
    });
    let decoded = Account1Schema::get(value).expect("valid account decodes");
    assert_eq!(decoded.state, account::Account::Initialized);
    assert_eq!(decoded.state.as_str(), "initialized");

    let tokens = decoded.tokens.expect("tokens present");
    assert_eq!(tokens[0].amount.as_i64(), Some(2));
    let owner = decoded.owner.expect("owner present");
    assert_eq!(owner.pubkey, "pk");
    assert_eq!(owner.label, None);
    let lamports = decoded.lamports.expect("lamports present");
    assert_eq!(lamports["rent"].as_u64(), Some(890880));

    // closed object
    assert!(!account::validate(&json!({ "address": "a", "state": "frozen", "extra": 1 })));
    // enum membership
    assert!(!account::validate(&json!({ "address": "a", "state": "melted" })));
    // token items are checked through the embedded related schema
    assert!(!account::validate(&json!({
        "address": "a",
        "state": "frozen",
        "tokens": [{ "mint": "m" }]
    })));
}

#[test]
fn holder_union_and_error_checks() {
    let decoded = HolderSchema::get(json!({
        "name": "alice",
        "primary": { "address": "acct", "state": "frozen" },
        "state": "uninitialized",
        "result": "done"
    }))
    .expect("valid holder decodes");
    assert_eq!(decoded.name, "alice");
    assert_eq!(decoded.primary.expect("primary").state, account::Account::Frozen);
    assert_eq!(decoded.state, Some(account::Account::Uninitialized));
    assert_eq!(decoded.result, Some(holder::HolderResult::String("done".into())));

    let failed = holder::get(json!({ "name": "bob", "result": { "error": "timeout" } })).expect("object variant");
    match failed.result {
        Some(holder::HolderResult::HolderResultVariant2(variant)) => assert_eq!(variant.error, "timeout"),
        other => panic!("unexpected result: {other:?}"),
    }

    assert!(holder::is_error(&json!({ "error": "x" })));
    assert!(HolderSchema::is_error(&json!({ "error": { "code": 1 } })));
    assert!(!holder::is_error(&json!({})));
    assert!(!HolderSchema::is_error(&json!({ "error": null })));
    assert!(!holder::is_error(&json!("error")));

    match HolderSchema::outcome(json!({ "error": "unreachable" })).expect("error payload") {
        Outcome::Err(detail) => assert_eq!(detail.error, json!("unreachable")),
        Outcome::Ok(value) => panic!("expected an error outcome, got {value:?}"),
    }
    assert!(HolderSchema::outcome(json!({ "name": "carol" })).expect("record").is_ok());

    assert!(!holder::validate(&json!({ "name": "dave", "primary": { "address": "a" } })));
}

#[test]
fn mutually_recursive_modules_decode_through_boxes() {
    let decoded = ParentSchema::get(json!({
        "name": "p1",
        "child": {
            "name": "c1",
            "parent": { "name": "p2", "child": { "name": "c2" } }
        }
    }))
    .expect("nested parents decode");

    let child = decoded.child.expect("child");
    assert_eq!(child.name, "c1");
    let parent = child.parent.expect("parent");
    assert_eq!(parent.name, "p2");
    let grandchild = parent.child.expect("grandchild");
    assert_eq!(grandchild.name, "c2");
    assert!(grandchild.parent.is_none());

    assert!(ChildSchema::validate(&json!({ "name": "c", "parent": { "name": "p" } })));
    assert!(!ChildSchema::validate(&json!({ "name": "c", "parent": {} })));
}
