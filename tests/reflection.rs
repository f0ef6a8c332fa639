//! End-to-end reflection scenarios.
//!
//! Options are built as dynamic records (via `json!`) the way an embedding
//! application passing untyped configuration would.
//!
//! Run with: cargo test --test reflection

use object_reflector::{ConfigError, Record, Reflector, ReflectorConfig, Value};
use serde_json::json;

// =============================================================================
// HELPERS
// =============================================================================

fn options(parent: &Record, properties: &[&str], reflect_back: bool) -> Value {
    let options = Record::new();
    options.set("object", parent);
    options.set("properties", Value::array(properties.iter().copied()));
    options.set("enableChildReflection", reflect_back);
    Value::from(options)
}

fn reflect(parent: &Record, properties: &[&str]) -> Reflector {
    Reflector::from_options(Some(&options(parent, properties, false))).unwrap()
}

fn reflect_back(parent: &Record, properties: &[&str]) -> Reflector {
    Reflector::from_options(Some(&options(parent, properties, true))).unwrap()
}

fn point(x: i32, y: i32) -> Record {
    Record::from_pairs([("x", x), ("y", y)])
}

fn record_at(record: &Record, key: &str) -> Record {
    record.get(key).as_record().cloned().unwrap()
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

#[test]
fn test_empty_instantiation_fails() {
    assert_eq!(Reflector::from_options(None).unwrap_err(), ConfigError::MissingParent);
}

#[test]
fn test_instantiation_without_parent_fails() {
    let opts = Value::from(json!({}));
    assert_eq!(Reflector::from_options(Some(&opts)).unwrap_err(), ConfigError::MissingParent);
}

#[test]
fn test_instantiation_with_null_parent_fails() {
    let opts = Value::from(json!({ "object": null }));
    assert_eq!(Reflector::from_options(Some(&opts)).unwrap_err(), ConfigError::NullParent);
}

#[test]
fn test_instantiation_with_scalar_parent_fails() {
    let opts = Value::from(json!({ "parent": 3 }));
    assert_eq!(
        Reflector::from_options(Some(&opts)).unwrap_err(),
        ConfigError::InvalidParent { found: "number" }
    );
}

#[test]
fn test_instantiation_with_valid_parent() {
    let opts = Value::from(json!({ "object": {} }));
    let reflector = Reflector::from_options(Some(&opts)).unwrap();
    assert!(reflector.properties().is_empty());
    assert_eq!(reflector.child_count(), 0);
    assert!(!reflector.reflects_back());
}

#[test]
fn test_instantiation_with_invalid_property_list_fails() {
    let opts = Value::from(json!({ "object": { "x": 1 }, "properties": 2 }));
    let err = Reflector::from_options(Some(&opts)).unwrap_err();
    assert_eq!(err, ConfigError::InvalidProperties { found: "number" });
}

#[test]
fn test_failed_instantiation_leaves_parent_untouched() {
    let parent = Record::from_pairs([("x", 1)]);
    let opts = Record::new();
    opts.set("parent", &parent);
    opts.set("propertyNames", Value::array([Value::from("x"), Value::from(false)]));

    let err = Reflector::from_options(Some(&Value::from(opts))).unwrap_err();
    assert_eq!(err, ConfigError::InvalidPropertyName { found: "boolean" });
    assert!(!parent.is_instrumented("x"));
}

#[test]
fn test_parent_with_static_property() {
    let parent = Record::from_pairs([("test", 1)]);
    let _reflector = reflect(&parent, &["test"]);
    assert_eq!(parent.get("test"), Value::from(1));
}

#[test]
fn test_parent_with_missing_property_and_later_edit() {
    let parent = Record::new();
    let _reflector = reflect(&parent, &["test"]);
    parent.set("test", 42);
    assert_eq!(parent.get("test"), Value::from(42));
}

// =============================================================================
// FORWARD PROPAGATION
// =============================================================================

#[test]
fn test_registration_copies_parent_value() {
    let parent = Record::from_pairs([("x", 1)]);
    let child = Record::new();
    let reflector = reflect(&parent, &["x"]);
    reflector.create_reflection(&child);
    assert_eq!(child.get("x"), Value::from(1));
}

#[test]
fn test_dynamic_property_reaches_later_child() {
    let parent = Record::new();
    let child = Record::new();
    let reflector = reflect(&parent, &["test"]);
    parent.set("test", 42);
    reflector.create_reflection(&child);
    assert_eq!(parent.get("test"), Value::from(42));
    assert_eq!(child.get("test"), Value::from(42));
}

#[test]
fn test_parent_overwrites_child_value_on_registration() {
    let parent = Record::from_pairs([("test", 42)]);
    let child = Record::from_pairs([("test", 666)]);
    let reflector = reflect(&parent, &["test"]);
    reflector.create_reflection(&child);
    assert_eq!(parent.get("test"), Value::from(42));
    assert_eq!(parent.get("test"), child.get("test"));
}

#[test]
fn test_parent_write_propagates_without_reflect_back() {
    let parent = Record::new();
    let child = Record::new();
    let reflector = reflect(&parent, &["x"]);
    reflector.create_reflection(&child);

    parent.set("x", 42);
    assert_eq!(child.get("x"), Value::from(42));
    assert_eq!(parent.get("x"), Value::from(42));
}

#[test]
fn test_child_write_is_isolated_until_next_parent_write() {
    let parent = Record::new();
    let child = Record::new();
    let reflector = reflect(&parent, &["x"]);
    reflector.create_reflection(&child);
    parent.set("x", 42);

    child.set("x", 7);
    assert_eq!(parent.get("x"), Value::from(42));
    assert_eq!(child.get("x"), Value::from(7));

    parent.set("x", 100);
    assert_eq!(child.get("x"), Value::from(100));
}

#[test]
fn test_null_update_propagates() {
    let parent = Record::new();
    let child = Record::new();
    let reflector = reflect(&parent, &["test"]);
    reflector.create_reflection(&child);
    parent.set("test", Value::Null);
    assert!(parent.get("test").is_null());
    assert_eq!(parent.get("test"), child.get("test"));
}

#[test]
fn test_three_records() {
    let parent = Record::new();
    let b = Record::new();
    let c = Record::new();
    let reflector = reflect(&parent, &["test"]);
    reflector.create_reflection(&b);
    reflector.create_reflection(&c);

    parent.set("test", point(0, 1));
    assert_eq!(b.get("test"), parent.get("test"));
    assert_eq!(c.get("test"), parent.get("test"));
}

// =============================================================================
// IDENTITY
// =============================================================================

#[test]
fn test_object_property_is_shared_by_reference() {
    let parent = Record::from_pairs([("test", point(0, 1))]);
    let child = Record::new();
    let reflector = reflect(&parent, &["test"]);
    reflector.create_reflection(&child);
    assert_eq!(parent.get("test"), child.get("test"));

    record_at(&parent, "test").set("x", 666);
    assert_eq!(record_at(&parent, "test").get("x"), Value::from(666));
    assert_eq!(record_at(&child, "test").get("x"), Value::from(666));
}

#[test]
fn test_parent_reference_change_reaches_child() {
    let parent = Record::from_pairs([("test", point(0, 1))]);
    let child = Record::new();
    let reflector = reflect(&parent, &["test"]);
    reflector.create_reflection(&child);

    parent.set("test", Record::from_pairs([("z", 42), ("w", 666)]));
    assert_eq!(parent.get("test"), child.get("test"));
    assert_eq!(record_at(&child, "test").get("z"), Value::from(42));
    assert_eq!(record_at(&child, "test").get("w"), Value::from(666));
}

#[test]
fn test_child_reference_change_diverges_without_reflect_back() {
    let parent = Record::from_pairs([("test", point(0, 1))]);
    let child = Record::new();
    let reflector = reflect(&parent, &["test"]);
    reflector.create_reflection(&child);

    child.set("test", Record::from_pairs([("z", 42), ("w", 666)]));
    assert_ne!(parent.get("test"), child.get("test"));
}

#[test]
fn test_structurally_equal_records_are_not_equal() {
    let parent = Record::from_pairs([("test", point(0, 1))]);
    let child = Record::new();
    let reflector = reflect(&parent, &["test"]);
    reflector.create_reflection(&child);

    child.set("test", point(0, 1));
    assert_ne!(parent.get("test"), child.get("test"));
}

// =============================================================================
// REFLECT-BACK
// =============================================================================

#[test]
fn test_child_write_reaches_parent_and_siblings() {
    let parent = Record::new();
    let a = Record::new();
    let b = Record::new();
    let reflector = reflect_back(&parent, &["x"]);
    reflector.create_reflection(&a);
    reflector.create_reflection(&b);

    b.set("x", 9);
    assert_eq!(parent.get("x"), Value::from(9));
    assert_eq!(a.get("x"), Value::from(9));
}

#[test]
fn test_child_reference_change_with_reflect_back() {
    let parent = Record::from_pairs([("test", point(0, 1))]);
    let child = Record::new();
    let reflector = reflect_back(&parent, &["test"]);
    reflector.create_reflection(&child);

    child.set("test", Record::from_pairs([("z", 42), ("w", 666)]));
    assert_eq!(parent.get("test"), child.get("test"));
    assert_eq!(record_at(&parent, "test").get("z"), Value::from(42));
}

#[test]
fn test_parent_reference_change_with_reflect_back() {
    let parent = Record::from_pairs([("test", point(0, 1))]);
    let child = Record::new();
    let reflector = reflect_back(&parent, &["test"]);
    reflector.create_reflection(&child);

    parent.set("test", Record::from_pairs([("z", 42), ("w", 666)]));
    assert_eq!(parent.get("test"), child.get("test"));
    assert_eq!(record_at(&child, "test").get("z"), Value::from(42));
}

#[test]
fn test_null_child_write_with_reflect_back() {
    let parent = Record::new();
    let child = Record::new();
    let reflector = reflect_back(&parent, &["test"]);
    reflector.create_reflection(&child);

    child.set("test", Value::Null);
    assert!(parent.get("test").is_null());
    assert!(child.get("test").is_null());
}

#[test]
fn test_property_created_dynamically_through_child() {
    let parent = Record::from_pairs([("test", Record::from_pairs([("x", 42)]))]);
    let child = Record::new();
    let reflector = reflect_back(&parent, &["test", "color"]);
    reflector.create_reflection(&child);

    record_at(&child, "test").set("x", 666);
    assert_eq!(record_at(&parent, "test").get("x"), Value::from(666));

    child.set("color", Value::array([255, 128, 255]));
    assert_eq!(parent.get("color").as_array().unwrap()[0], Value::from(255));
    assert_eq!(parent.get("color"), child.get("color"));
}

// =============================================================================
// TEARDOWN
// =============================================================================

#[test]
fn test_clear_with_static_property() {
    let parent = Record::from_pairs([("test", Record::new())]);
    let child = Record::new();
    let reflector = reflect(&parent, &["test"]);
    reflector.create_reflection(&child);
    reflector.clear();
    assert_eq!(reflector.child_count(), 0);
}

#[test]
fn test_clear_with_dynamic_property() {
    let parent = Record::new();
    let child = Record::new();
    let reflector = reflect(&parent, &["test"]);
    reflector.create_reflection(&child);
    parent.set("test", Record::new());
    reflector.clear();
    assert_eq!(reflector.child_count(), 0);
    assert!(parent.get("test").as_record().is_some());
}

#[test]
fn test_clear_with_missing_property() {
    let parent = Record::new();
    let child = Record::new();
    let reflector = reflect(&parent, &["test"]);
    reflector.create_reflection(&child);
    reflector.clear();
    assert_eq!(reflector.child_count(), 0);
    assert!(parent.get("test").is_undefined());
}

#[test]
fn test_clear_stops_propagation() {
    let parent = Record::from_pairs([("x", 1)]);
    let a = Record::new();
    let b = Record::new();
    let reflector = reflect_back(&parent, &["x"]);
    reflector.create_reflection(&a);
    reflector.create_reflection(&b);

    reflector.clear();
    assert!(reflector.children().is_empty());

    parent.set("x", 2);
    assert_eq!(a.get("x"), Value::from(1));
    assert_eq!(b.get("x"), Value::from(1));

    a.set("x", 3);
    assert_eq!(parent.get("x"), Value::from(2));
    assert_eq!(b.get("x"), Value::from(1));
}

#[test]
fn test_unregister_is_order_independent_and_idempotent() {
    let parent = Record::new();
    let (a, b, c) = (Record::new(), Record::new(), Record::new());
    let reflector = reflect(&parent, &["x"]);
    for child in [&a, &b, &c] {
        reflector.create_reflection(child);
    }

    reflector.unreflect_child(&b);
    assert_eq!(reflector.child_count(), 2);
    assert!(!reflector.is_child_registered(&b));
    let remaining = reflector.children();
    assert!(remaining[0].ptr_eq(&a));
    assert!(remaining[1].ptr_eq(&c));

    reflector.unreflect_child(&b);
    assert_eq!(reflector.child_count(), 2);
}

#[test]
fn test_unreflect_and_clear_multiple_children() {
    let parent = Record::new();
    let b = Record::new();
    let c = Record::new();
    let reflector = reflect_back(&parent, &["test"]);
    reflector.create_reflection(&b);
    reflector.create_reflection(&c);
    parent.set("test", point(0, 1));
    assert_eq!(reflector.child_count(), 2);

    reflector.unreflect_child(&b);
    assert_eq!(reflector.child_count(), 1);

    parent.set("test", 42);
    assert_eq!(parent.get("test"), Value::from(42));
    assert_ne!(b.get("test"), parent.get("test"));

    b.set("test", 666);
    assert_ne!(b.get("test"), parent.get("test"));
    assert_eq!(c.get("test"), parent.get("test"));

    reflector.unreflect_child(&c);
    assert_eq!(reflector.child_count(), 0);
}

#[test]
fn test_reactivated_reflector_matches_fresh_one() {
    let parent = Record::from_pairs([("x", 1)]);
    let config = ReflectorConfig::new(&parent).with_properties(["x"]);
    let reflector = Reflector::create(config).unwrap();
    reflector.clear();
    assert!(!parent.is_instrumented("x"));

    reflector.link_properties(["x"]).unwrap();
    let child = Record::new();
    reflector.create_reflection(&child);
    parent.set("x", 5);
    assert_eq!(child.get("x"), Value::from(5));
}
