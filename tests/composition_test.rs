//! Schema resolution and flattening through the public API.

use mcpforge_core::{
    Schema, SchemaRegistry, extract_direct_properties, extract_schema_properties, normalize,
    resolve_composition, resolve_reference,
};
use serde_json::json;

fn registry() -> SchemaRegistry {
    let spec = normalize(&json!({
        "swagger": "2.0",
        "info": {"title": "Zoo", "version": "1"},
        "paths": {},
        "definitions": {
            "Base": {"type": "object", "required": ["id"], "properties": {
                "id": {"type": "integer"},
                "note": {"type": "string", "description": "from Base"}
            }},
            "Pet": {"allOf": [
                {"$ref": "#/definitions/Base"},
                {"required": ["name"], "properties": {"name": {"type": "string"}}}
            ]},
            "Dog": {"allOf": [
                {"$ref": "#/definitions/Pet"},
                {"properties": {"breed": {"type": "string"}, "note": {"type": "string", "description": "from Dog"}}}
            ]},
            "Tree": {"type": "object", "properties": {
                "label": {"type": "string"},
                "children": {"type": "array", "items": {"$ref": "#/definitions/Tree"}},
                "parent": {"$ref": "#/definitions/Tree"}
            }}
        }
    }))
    .unwrap();
    spec.schemas
}

#[test]
fn test_reference_lookup() {
    let reg = registry();
    assert!(resolve_reference("#/definitions/Pet", &reg).is_some());
    assert!(resolve_reference("#/components/schemas/Pet", &reg).is_some());
    assert!(resolve_reference("#/definitions/Cat", &reg).is_none());
    assert!(resolve_reference("https://example.com/schemas/Pet", &reg).is_none());
}

#[test]
fn test_inheritance_chain_is_fully_resolved() {
    let reg = registry();
    let dog = resolve_composition(resolve_reference("#/definitions/Dog", &reg).unwrap(), &reg);

    let names: Vec<_> = dog.properties().unwrap().keys().cloned().collect();
    assert_eq!(names, ["id", "note", "name", "breed"]);
    assert_eq!(dog.required(), ["id", "name"]);
    assert_eq!(dog.type_name(), Some("object"));
    assert_eq!(
        dog.properties().unwrap()["note"].description.as_deref(),
        Some("from Dog")
    );
}

#[test]
fn test_all_of_precedence_is_order_dependent() {
    let reg = SchemaRegistry::new();
    let a = json!({"type": "object", "required": ["x"], "properties": {"v": {"type": "string"}, "x": {"type": "string"}}});
    let b = json!({"type": "object", "required": ["y"], "properties": {"v": {"type": "integer"}, "y": {"type": "string"}}});

    let ab = resolve_composition(&Schema::from_value(&json!({"allOf": [a, b]})), &reg);
    let ba = resolve_composition(&Schema::from_value(&json!({"allOf": [b, a]})), &reg);

    assert_eq!(ab.properties().unwrap()["v"].type_name(), Some("integer"));
    assert_eq!(ba.properties().unwrap()["v"].type_name(), Some("string"));
    assert_eq!(ab.required(), ["x", "y"]);
    assert_eq!(ba.required(), ["y", "x"]);
}

#[test]
fn test_recursive_schema_terminates() {
    let reg = registry();
    let body = Schema::from_value(&json!({
        "type": "object",
        "properties": {"tree": {"$ref": "#/definitions/Tree"}}
    }));
    let flat = extract_schema_properties(&body, &reg);

    let names: Vec<_> = flat.properties.keys().cloned().collect();
    assert_eq!(names, ["tree_label", "tree_children", "tree_parent"]);
    assert_eq!(
        flat.properties["tree_parent"].origin.as_ref().unwrap().original_path,
        "tree.parent"
    );
}

#[test]
fn test_flat_body_matches_direct_properties() {
    let reg = registry();
    let body = Schema::from_value(&json!({
        "type": "object",
        "required": ["name"],
        "properties": {
            "name": {"type": "string"},
            "age": {"type": "integer", "maximum": 40},
            "tags": {"type": "array", "items": {"type": "string"}}
        }
    }));
    assert_eq!(
        extract_schema_properties(&body, &reg),
        extract_direct_properties(&body, &reg)
    );
}
