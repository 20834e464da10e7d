/// Record export tests
///
/// Map-like access, iteration and JSON conversion of records.
/// Run with: cargo test --test record_export_tests
use rowmodel::{Attribute, FieldKind, MemoryGateway, ModelMeta, Record, Value};
use serde_json::json;
use std::sync::Arc;

fn account_meta() -> Arc<ModelMeta> {
    ModelMeta::builder("Billing\\AccountModel")
        .field("first", FieldKind::Text)
        .field("last", FieldKind::Text)
        .field("password", FieldKind::Text)
        .field("balance", FieldKind::Float)
        .export("+full_name")
        .export("-password")
        .accessor("full_name", |r| {
            Value::Text(format!("{} {}", r.get("first").to_text(), r.get("last").to_text()))
        })
        .mutator("full_name", |r, value| {
            let text = value.to_text();
            let (first, last) = text.split_once(' ').unwrap_or((text.as_str(), ""));
            let (first, last) = (first.to_string(), last.to_string());
            r.set("first", first).set("last", last);
        })
        .build()
}

fn account() -> Record {
    let mut record = Record::new(account_meta(), Arc::new(MemoryGateway::with_tables(["account"])));
    record
        .set_field("first", "Ada")
        .set_field("last", "Lovelace")
        .set_field("password", "secret")
        .set_field("balance", 12.5);
    record
}

#[test]
fn test_json_follows_projection() {
    let record = account();

    assert_eq!(
        record.exported_fields(),
        vec!["first", "last", "balance", "full_name"]
    );
    assert_eq!(
        record.to_json(),
        json!({
            "first": "Ada",
            "last": "Lovelace",
            "balance": 12.5,
            "full_name": "Ada Lovelace",
        })
    );
    assert_eq!(
        record.to_string(),
        r#"{"first":"Ada","last":"Lovelace","balance":12.5,"full_name":"Ada Lovelace"}"#
    );
}

#[test]
fn test_plain_record_json() {
    let meta = ModelMeta::builder("ThingModel").build();
    let mut record = Record::new(meta, Arc::new(MemoryGateway::new()));
    record.set_field("a", 1).set_field("b", "x");

    assert_eq!(record.to_string(), r#"{"a":1,"b":"x"}"#);
    assert_eq!(serde_json::to_value(&record).unwrap(), json!({"a": 1, "b": "x"}));
}

#[test]
fn test_hidden_field_still_readable() {
    let record = account();

    assert!(record.contains("password"));
    assert_eq!(record.get("password"), Value::from("secret"));
    assert!(record.iter().all(|(name, _)| name != "password"));
}

#[test]
fn test_computed_attribute_access() {
    let mut record = account();

    assert_eq!(
        record.attribute("full_name"),
        Attribute::Computed(Value::from("Ada Lovelace"))
    );
    assert!(record.contains("full_name"));
    assert!(record.field("full_name").is_none());

    record.set("full_name", "Grace Hopper");
    assert_eq!(record.get("first"), Value::from("Grace"));
    assert_eq!(record.get("last"), Value::from("Hopper"));
    assert_eq!(record.get("full_name"), Value::from("Grace Hopper"));
}

#[test]
fn test_iteration_resolves_values_lazily() {
    let mut record = account();

    let first_pass: Vec<(String, Value)> = record.iter().collect();
    record.set("first", "Augusta");
    let second_pass: Vec<(String, Value)> = record.iter().collect();

    assert_eq!(first_pass.len(), 4);
    assert_eq!(first_pass[3].1, Value::from("Ada Lovelace"));
    assert_eq!(second_pass[3].1, Value::from("Augusta Lovelace"));

    let mut count = 0;
    for (name, _) in &record {
        assert!(!name.is_empty());
        count += 1;
    }
    assert_eq!(count, record.iter().len());
}

#[test]
fn test_remove_is_noop() {
    let mut record = account();
    record.remove("balance");
    assert_eq!(record.get("balance"), Value::Float(12.5));
    assert!(record.contains("balance"));
}

#[test]
fn test_unknown_attribute() {
    let record = account();
    assert_eq!(record.attribute("nickname"), Attribute::Absent);
    assert!(record.get("nickname").is_null());
    assert!(!record.contains("nickname"));
}
