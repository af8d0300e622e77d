//! Flattening engine: collapses nested object schemas into one flat map of
//! directly settable parameters.
//!
//! Every object property with at least one property of its own is replaced
//! by its leaves, named `parent_child` (`grandparent_parent_child`, ...), with
//! an origin recording the dotted path needed to rebuild the nested body.
//! There is no depth limit and no opt-out. The only stop is a recursive
//! type: re-entering a schema already on the active path yields one opaque
//! `object` property.

use crate::resolver::{ResolutionPath, Resolved, SchemaResolver};
use crate::schema::{Schema, SchemaKind, SchemaRegistry};
use crate::tool::{FlatProperty, FlattenOrigin, ParamRole, PropertyFacets, PropertyType};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Flat properties plus the names that must be supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedSchema {
    pub properties: IndexMap<String, FlatProperty>,
    pub required: Vec<String>,
}

/// Flatten the properties of a (request body) schema.
///
/// All produced properties carry the body role. A descendant is required
/// only if it and every ancestor on its path are required in their parent.
pub fn extract_schema_properties(schema: &Schema, registry: &SchemaRegistry) -> FlattenedSchema {
    Flattener::new(registry).flatten(schema, true)
}

/// The direct properties of `schema`, converted one-to-one without flattening.
pub fn extract_direct_properties(schema: &Schema, registry: &SchemaRegistry) -> FlattenedSchema {
    Flattener::new(registry).flatten(schema, false)
}

/// Convert a single resolved schema into a flat property.
pub fn flat_property(schema: &Schema, description: Option<&str>, role: ParamRole) -> FlatProperty {
    let description = description
        .or(schema.description.as_deref())
        .unwrap_or_default();
    let mut property = FlatProperty::new(
        PropertyType::from_type_name(schema.type_name()),
        description,
        role,
    );
    property.facets = facets_of(schema);
    property
}

/// Where the walk currently is, relative to the flattening root.
struct Cursor<'a> {
    /// Underscore-joined output name
    name: String,
    /// Dotted path from the root property
    dotted: String,
    /// Root property name
    root: &'a str,
    /// Whether every step so far was required
    required: bool,
}

struct Flattener<'r> {
    resolver: SchemaResolver<'r>,
    path: ResolutionPath,
    out: FlattenedSchema,
}

impl<'r> Flattener<'r> {
    fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            resolver: SchemaResolver::new(registry),
            path: ResolutionPath::default(),
            out: FlattenedSchema::default(),
        }
    }

    fn flatten(mut self, schema: &Schema, recurse: bool) -> FlattenedSchema {
        let root = match self.resolver.resolve(schema, &mut self.path) {
            Resolved::Schema { schema, .. } => schema,
            Resolved::Missing | Resolved::Cycle { .. } => {
                warn!("Body schema reference does not resolve; no body properties produced");
                return self.out;
            }
        };

        let Some(properties) = root.properties() else {
            debug!("Body schema is not an object with properties");
            return self.out;
        };

        for (name, property) in properties {
            let cursor = Cursor {
                name: name.clone(),
                dotted: name.clone(),
                root: name,
                required: root.is_required(name),
            };
            if recurse {
                self.walk(property, cursor);
            } else {
                let resolved = match self.resolver.resolve(property, &mut self.path) {
                    Resolved::Schema { schema, entered } => {
                        if entered {
                            self.path.leave();
                        }
                        schema
                    }
                    Resolved::Missing => Schema::string(),
                    Resolved::Cycle { .. } => Schema::of_kind(SchemaKind::Object(Default::default())),
                };
                let prop = self.leaf(&resolved);
                self.emit(&cursor, prop);
            }
        }
        self.out
    }

    fn walk(&mut self, property: &Schema, cursor: Cursor<'_>) {
        let (resolved, entered) = match self.resolver.resolve(property, &mut self.path) {
            Resolved::Schema { schema, entered } => (schema, entered),
            Resolved::Missing => {
                // Degrade to an opaque string rather than losing the field.
                let mut prop = FlatProperty::new(
                    PropertyType::String,
                    property.description.clone().unwrap_or_default(),
                    ParamRole::Body,
                );
                prop.origin = origin(&cursor);
                self.emit(&cursor, prop);
                return;
            }
            Resolved::Cycle { name } => {
                debug!("Recursive reference to '{}' at '{}'; not flattening further", name, cursor.dotted);
                let description = property
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("{name} object (recursive type, passed as JSON)"));
                let mut prop = FlatProperty::new(PropertyType::Object, description, ParamRole::Body);
                prop.origin = origin(&cursor);
                self.emit(&cursor, prop);
                return;
            }
        };

        match resolved.properties() {
            Some(children) if !children.is_empty() => {
                for (child_name, child) in children {
                    let child_cursor = Cursor {
                        name: format!("{}_{}", cursor.name, child_name),
                        dotted: format!("{}.{}", cursor.dotted, child_name),
                        root: cursor.root,
                        required: cursor.required && resolved.is_required(child_name),
                    };
                    self.walk(child, child_cursor);
                }
            }
            _ => {
                let mut prop = self.leaf(&resolved);
                prop.origin = origin(&cursor);
                self.emit(&cursor, prop);
            }
        }

        if entered {
            self.path.leave();
        }
    }

    /// Body property for a non-flattened node, with array items dereferenced.
    fn leaf(&self, schema: &Schema) -> FlatProperty {
        let mut prop = flat_property(schema, None, ParamRole::Body);
        if let Some(SchemaKind::Array(facets)) = &schema.kind {
            if let Some(found) = facets
                .items
                .as_ref()
                .and_then(|items| items.reference.as_deref())
                .and_then(|reference| self.resolver.resolve_reference(reference))
            {
                prop.facets.items = Some(found.to_value());
            }
        }
        prop
    }

    /// On a name clash the earlier property wins, like tool input schemas.
    fn emit(&mut self, cursor: &Cursor<'_>, property: FlatProperty) {
        if self.out.properties.contains_key(&cursor.name) {
            warn!("Flattened property '{}' collides with an existing property; keeping the earlier one", cursor.name);
            return;
        }
        self.out.properties.insert(cursor.name.clone(), property);
        if cursor.required && !self.out.required.contains(&cursor.name) {
            self.out.required.push(cursor.name.clone());
        }
    }
}

/// Nested leaves get an origin; top-level properties do not.
fn origin(cursor: &Cursor<'_>) -> Option<FlattenOrigin> {
    (cursor.dotted != cursor.root).then(|| FlattenOrigin {
        original_path: cursor.dotted.clone(),
        parent_object: cursor.root.to_string(),
    })
}

fn facets_of(schema: &Schema) -> PropertyFacets {
    let mut facets = PropertyFacets {
        enum_values: schema.enum_values.clone(),
        default: schema.default.clone(),
        example: schema.example.clone(),
        nullable: schema.nullable,
        ..Default::default()
    };
    match &schema.kind {
        Some(SchemaKind::String(f)) => {
            facets.format = f.format.clone();
            facets.pattern = f.pattern.clone();
            facets.min_length = f.min_length;
            facets.max_length = f.max_length;
        }
        Some(SchemaKind::Integer(f) | SchemaKind::Number(f)) => {
            facets.format = f.format.clone();
            facets.minimum = f.minimum;
            facets.maximum = f.maximum;
        }
        Some(SchemaKind::Array(f)) => {
            facets.min_items = f.min_items;
            facets.max_items = f.max_items;
            facets.items = f.items.as_ref().map(|items| items.to_value());
        }
        Some(SchemaKind::Object(_) | SchemaKind::Boolean | SchemaKind::Null) | None => {}
    }
    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> Schema {
        Schema::from_value(&value)
    }

    fn registry(value: serde_json::Value) -> SchemaRegistry {
        value
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), Schema::from_value(v)))
            .collect()
    }

    #[test]
    fn test_nested_owner_is_flattened() {
        let body = schema(json!({
            "type": "object",
            "properties": {
                "owner": {"type": "object", "properties": {"name": {"type": "string"}}}
            }
        }));
        let flat = extract_schema_properties(&body, &SchemaRegistry::new());

        assert!(!flat.properties.contains_key("owner"));
        let owner_name = &flat.properties["owner_name"];
        let origin = owner_name.origin.as_ref().unwrap();
        assert_eq!(origin.original_path, "owner.name");
        assert_eq!(origin.parent_object, "owner");
        assert!(owner_name.is_body_param());
        assert!(owner_name.is_flattened());
    }

    #[test]
    fn test_deep_nesting_and_transitive_required() {
        let body = schema(json!({
            "type": "object",
            "required": ["a", "x"],
            "properties": {
                "a": {"type": "object", "required": ["b"], "properties": {
                    "b": {"type": "object", "required": ["c"], "properties": {
                        "c": {"type": "string"},
                        "d": {"type": "string"}
                    }}
                }},
                "x": {"type": "object", "properties": {"y": {"type": "integer"}}},
                "z": {"type": "object", "required": ["w"], "properties": {"w": {"type": "boolean"}}}
            }
        }));
        let flat = extract_schema_properties(&body, &SchemaRegistry::new());

        let names: Vec<_> = flat.properties.keys().cloned().collect();
        assert_eq!(names, ["a_b_c", "a_b_d", "x_y", "z_w"]);
        assert_eq!(flat.required, ["a_b_c"]);

        let origin = flat.properties["a_b_c"].origin.as_ref().unwrap();
        assert_eq!(origin.original_path, "a.b.c");
        assert_eq!(origin.parent_object, "a");
    }

    #[test]
    fn test_flattened_origin_starts_with_parent() {
        let body = schema(json!({
            "type": "object",
            "properties": {
                "shipping": {"type": "object", "properties": {
                    "address": {"type": "object", "properties": {
                        "city": {"type": "string"},
                        "zip": {"type": "string"}
                    }},
                    "method": {"type": "string"}
                }},
                "note": {"type": "string"}
            }
        }));
        let flat = extract_schema_properties(&body, &SchemaRegistry::new());
        for prop in flat.properties.values().filter(|p| p.is_flattened()) {
            let origin = prop.origin.as_ref().unwrap();
            assert!(!origin.original_path.is_empty());
            assert_eq!(origin.original_path.split('.').next(), Some(origin.parent_object.as_str()));
        }
        assert!(!flat.properties["note"].is_flattened());
    }

    #[test]
    fn test_idempotent_without_nested_objects() {
        let body = schema(json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "integer", "minimum": 1},
                "tags": {"type": "array", "items": {"type": "string"}},
                "meta": {"type": "object"}
            }
        }));
        let reg = SchemaRegistry::new();
        assert_eq!(
            extract_schema_properties(&body, &reg),
            extract_direct_properties(&body, &reg)
        );
    }

    #[test]
    fn test_refs_and_composition_inside_properties() {
        let reg = registry(json!({
            "Address": {"type": "object", "required": ["city"], "properties": {"city": {"type": "string"}}},
            "Named": {"type": "object", "properties": {"name": {"type": "string"}}}
        }));
        let body = schema(json!({
            "type": "object",
            "required": ["home"],
            "properties": {
                "home": {"$ref": "#/components/schemas/Address"},
                "contact": {"allOf": [{"$ref": "#/components/schemas/Named"}, {"properties": {"email": {"type": "string"}}}]},
                "ghost": {"$ref": "#/components/schemas/Ghost", "description": "gone"}
            }
        }));
        let flat = extract_schema_properties(&body, &reg);
        assert_eq!(flat.required, ["home_city"]);
        assert!(flat.properties.contains_key("contact_name"));
        assert!(flat.properties.contains_key("contact_email"));

        let ghost = &flat.properties["ghost"];
        assert_eq!(ghost.property_type, PropertyType::String);
        assert_eq!(ghost.description, "gone");
    }

    #[test]
    fn test_recursive_schema_is_truncated() {
        let reg = registry(json!({
            "Node": {"type": "object", "properties": {
                "value": {"type": "string"},
                "child": {"$ref": "#/components/schemas/Node"}
            }}
        }));
        let body = schema(json!({
            "type": "object",
            "properties": {"root": {"$ref": "#/components/schemas/Node"}}
        }));
        let flat = extract_schema_properties(&body, &reg);
        let names: Vec<_> = flat.properties.keys().cloned().collect();
        assert_eq!(names, ["root_value", "root_child"]);
        let child = &flat.properties["root_child"];
        assert_eq!(child.property_type, PropertyType::Object);
        assert_eq!(child.origin.as_ref().unwrap().original_path, "root.child");
    }

    #[test]
    fn test_top_level_ref_body() {
        let reg = registry(json!({
            "Pet": {"type": "object", "required": ["name"], "properties": {
                "name": {"type": "string"},
                "status": {"type": "string", "enum": ["available", "sold"]}
            }}
        }));
        let flat = extract_schema_properties(&Schema::reference("#/definitions/Pet"), &reg);
        assert_eq!(flat.required, ["name"]);
        assert_eq!(flat.properties["status"].facets.enum_values, vec![json!("available"), json!("sold")]);
    }

    #[test]
    fn test_array_items_are_dereferenced() {
        let reg = registry(json!({
            "Tag": {"type": "object", "properties": {"label": {"type": "string"}}}
        }));
        let body = schema(json!({
            "type": "object",
            "properties": {"tags": {"type": "array", "items": {"$ref": "#/components/schemas/Tag"}}}
        }));
        let flat = extract_schema_properties(&body, &reg);
        let items = flat.properties["tags"].facets.items.as_ref().unwrap();
        assert_eq!(items["type"], "object");
        assert_eq!(items["properties"]["label"]["type"], "string");
    }

    #[test]
    fn test_non_object_body_yields_nothing() {
        let flat = extract_schema_properties(&Schema::string(), &SchemaRegistry::new());
        assert!(flat.properties.is_empty());
        let flat = extract_schema_properties(&Schema::reference("#/definitions/Nope"), &SchemaRegistry::new());
        assert!(flat.properties.is_empty());
    }

    #[test]
    fn test_flattened_name_collision_keeps_earlier_property() {
        let body = schema(json!({
            "type": "object",
            "properties": {
                "owner_name": {"type": "string"},
                "owner": {"type": "object", "required": ["name"], "properties": {
                    "name": {"type": "integer"}
                }}
            }
        }));
        let flat = extract_schema_properties(&body, &SchemaRegistry::new());

        let names: Vec<_> = flat.properties.keys().cloned().collect();
        assert_eq!(names, ["owner_name"]);
        let kept = &flat.properties["owner_name"];
        assert_eq!(kept.property_type, PropertyType::String);
        assert!(!kept.is_flattened());
        assert!(flat.required.is_empty());
    }
}
