//! Typed JSON Schema model shared by every pipeline stage.
//!
//! Schemas are read leniently from decoded documents: a malformed facet is
//! dropped rather than failing the whole document, so one sloppy property
//! never costs the caller an entire API.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Named, reusable schemas from `components.schemas` or `definitions`.
pub type SchemaRegistry = IndexMap<String, Schema>;

/// A schema node. Forms a (possibly cyclic) graph through `reference` and
/// the composition lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Raw `$ref` pointer, e.g. `#/components/schemas/Pet`
    pub reference: Option<String>,
    /// Declared (or inferred) kind with its facets; `None` means untyped
    pub kind: Option<SchemaKind>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub enum_values: Vec<Value>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub nullable: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub all_of: Vec<Schema>,
    pub one_of: Vec<Schema>,
    pub any_of: Vec<Schema>,
}

/// The closed set of JSON Schema kinds, each with only its own facets.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String(StringFacets),
    Integer(NumericFacets),
    Number(NumericFacets),
    Boolean,
    Array(ArrayFacets),
    Object(ObjectFacets),
    Null,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringFacets {
    pub format: Option<String>,
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericFacets {
    pub format: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub multiple_of: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayFacets {
    pub items: Option<Box<Schema>>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectFacets {
    pub properties: IndexMap<String, Schema>,
    pub required: Vec<String>,
    pub additional_properties: Option<bool>,
}

impl SchemaKind {
    /// The JSON Schema `type` keyword for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaKind::String(_) => "string",
            SchemaKind::Integer(_) => "integer",
            SchemaKind::Number(_) => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array(_) => "array",
            SchemaKind::Object(_) => "object",
            SchemaKind::Null => "null",
        }
    }
}

impl Schema {
    /// Shorthand for an untyped schema that only carries a `$ref`.
    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Default::default()
        }
    }

    /// Shorthand for a schema of the given kind.
    pub fn of_kind(kind: SchemaKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// Object schema built from `(name, schema)` pairs.
    pub fn object<I, S>(properties: I, required: &[&str]) -> Self
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        Self::of_kind(SchemaKind::Object(ObjectFacets {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
            required: required.iter().map(|r| r.to_string()).collect(),
            additional_properties: None,
        }))
    }

    pub fn string() -> Self {
        Self::of_kind(SchemaKind::String(StringFacets::default()))
    }

    pub fn integer() -> Self {
        Self::of_kind(SchemaKind::Integer(NumericFacets::default()))
    }

    pub fn type_name(&self) -> Option<&'static str> {
        self.kind.as_ref().map(SchemaKind::type_name)
    }

    /// Declared properties, when this is an object schema.
    pub fn properties(&self) -> Option<&IndexMap<String, Schema>> {
        match &self.kind {
            Some(SchemaKind::Object(facets)) => Some(&facets.properties),
            _ => None,
        }
    }

    /// Required property names, empty unless this is an object schema.
    pub fn required(&self) -> &[String] {
        match &self.kind {
            Some(SchemaKind::Object(facets)) => &facets.required,
            _ => &[],
        }
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required().iter().any(|r| r == property)
    }

    /// Whether this node uses `allOf`, `oneOf` or `anyOf`.
    pub fn has_composition(&self) -> bool {
        !(self.all_of.is_empty() && self.one_of.is_empty() && self.any_of.is_empty())
    }

    /// Object schema with at least one property, i.e. a flattening candidate.
    pub fn is_non_empty_object(&self) -> bool {
        self.properties().is_some_and(|props| !props.is_empty())
    }

    /// Read a schema node from a decoded document value.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            // `true`/`false` schemas and junk both mean "anything goes".
            return Self::default();
        };

        let (kind_name, nullable_from_type) = declared_type(obj);
        let kind = kind_name
            .as_deref()
            .or_else(|| {
                if obj.contains_key("properties") {
                    Some("object")
                } else if obj.contains_key("items") {
                    Some("array")
                } else {
                    None
                }
            })
            .and_then(|name| read_kind(name, obj));

        Self {
            reference: str_field(obj, "$ref"),
            kind,
            title: str_field(obj, "title"),
            description: str_field(obj, "description"),
            enum_values: obj
                .get("enum")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            default: obj.get("default").cloned(),
            example: obj.get("example").cloned(),
            nullable: nullable_from_type || bool_field(obj, "nullable") || bool_field(obj, "x-nullable"),
            read_only: bool_field(obj, "readOnly"),
            write_only: bool_field(obj, "writeOnly"),
            all_of: schema_list(obj, "allOf"),
            one_of: schema_list(obj, "oneOf"),
            any_of: schema_list(obj, "anyOf"),
        }
    }

    /// Render this node back into JSON Schema form.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        if let Some(reference) = &self.reference {
            out.insert("$ref".into(), Value::String(reference.clone()));
        }
        if let Some(kind) = &self.kind {
            out.insert("type".into(), Value::String(kind.type_name().into()));
            write_facets(kind, &mut out);
        }
        if let Some(title) = &self.title {
            out.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(description) = &self.description {
            out.insert("description".into(), Value::String(description.clone()));
        }
        if !self.enum_values.is_empty() {
            out.insert("enum".into(), Value::Array(self.enum_values.clone()));
        }
        if let Some(default) = &self.default {
            out.insert("default".into(), default.clone());
        }
        if let Some(example) = &self.example {
            out.insert("example".into(), example.clone());
        }
        if self.nullable {
            out.insert("nullable".into(), Value::Bool(true));
        }
        for (key, list) in [("allOf", &self.all_of), ("oneOf", &self.one_of), ("anyOf", &self.any_of)] {
            if !list.is_empty() {
                out.insert(key.into(), Value::Array(list.iter().map(Schema::to_value).collect()));
            }
        }
        Value::Object(out)
    }
}

/// `type` may be a string or, in OpenAPI 3.1, an array including `"null"`.
fn declared_type(obj: &Map<String, Value>) -> (Option<String>, bool) {
    match obj.get("type") {
        Some(Value::String(name)) => (Some(name.clone()), false),
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            let nullable = names.contains(&"null");
            let first = names.iter().find(|n| **n != "null").or(names.first());
            (first.map(|n| n.to_string()), nullable)
        }
        _ => (None, false),
    }
}

fn read_kind(name: &str, obj: &Map<String, Value>) -> Option<SchemaKind> {
    let kind = match name {
        "string" => SchemaKind::String(StringFacets {
            format: str_field(obj, "format"),
            pattern: str_field(obj, "pattern"),
            min_length: obj.get("minLength").and_then(Value::as_u64),
            max_length: obj.get("maxLength").and_then(Value::as_u64),
        }),
        "integer" => SchemaKind::Integer(read_numeric(obj)),
        "number" => SchemaKind::Number(read_numeric(obj)),
        "boolean" => SchemaKind::Boolean,
        "null" => SchemaKind::Null,
        "array" => SchemaKind::Array(ArrayFacets {
            items: obj.get("items").map(|items| Box::new(Schema::from_value(items))),
            min_items: obj.get("minItems").and_then(Value::as_u64),
            max_items: obj.get("maxItems").and_then(Value::as_u64),
            unique_items: bool_field(obj, "uniqueItems"),
        }),
        "object" => SchemaKind::Object(ObjectFacets {
            properties: obj
                .get("properties")
                .and_then(Value::as_object)
                .map(|props| {
                    props
                        .iter()
                        .map(|(name, schema)| (name.clone(), Schema::from_value(schema)))
                        .collect()
                })
                .unwrap_or_default(),
            required: obj
                .get("required")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).map(String::from).collect())
                .unwrap_or_default(),
            additional_properties: obj.get("additionalProperties").map(|v| match v {
                Value::Bool(allowed) => *allowed,
                // A schema for extra properties still allows them.
                _ => true,
            }),
        }),
        _ => return None,
    };
    Some(kind)
}

fn read_numeric(obj: &Map<String, Value>) -> NumericFacets {
    let mut facets = NumericFacets {
        format: str_field(obj, "format"),
        minimum: obj.get("minimum").and_then(Value::as_f64),
        maximum: obj.get("maximum").and_then(Value::as_f64),
        exclusive_minimum: bool_field(obj, "exclusiveMinimum"),
        exclusive_maximum: bool_field(obj, "exclusiveMaximum"),
        multiple_of: obj.get("multipleOf").and_then(Value::as_f64),
    };
    // OpenAPI 3.1 spells exclusive bounds as numbers.
    if let Some(min) = obj.get("exclusiveMinimum").and_then(Value::as_f64) {
        facets.minimum = Some(min);
        facets.exclusive_minimum = true;
    }
    if let Some(max) = obj.get("exclusiveMaximum").and_then(Value::as_f64) {
        facets.maximum = Some(max);
        facets.exclusive_maximum = true;
    }
    facets
}

fn write_facets(kind: &SchemaKind, out: &mut Map<String, Value>) {
    match kind {
        SchemaKind::String(f) => {
            put(out, "format", f.format.clone().map(Value::String));
            put(out, "pattern", f.pattern.clone().map(Value::String));
            put(out, "minLength", f.min_length.map(Value::from));
            put(out, "maxLength", f.max_length.map(Value::from));
        }
        SchemaKind::Integer(f) | SchemaKind::Number(f) => {
            put(out, "format", f.format.clone().map(Value::String));
            put(out, "minimum", f.minimum.map(Value::from));
            put(out, "maximum", f.maximum.map(Value::from));
            if f.exclusive_minimum {
                out.insert("exclusiveMinimum".into(), Value::Bool(true));
            }
            if f.exclusive_maximum {
                out.insert("exclusiveMaximum".into(), Value::Bool(true));
            }
            put(out, "multipleOf", f.multiple_of.map(Value::from));
        }
        SchemaKind::Array(f) => {
            put(out, "items", f.items.as_ref().map(|items| items.to_value()));
            put(out, "minItems", f.min_items.map(Value::from));
            put(out, "maxItems", f.max_items.map(Value::from));
            if f.unique_items {
                out.insert("uniqueItems".into(), Value::Bool(true));
            }
        }
        SchemaKind::Object(f) => {
            if !f.properties.is_empty() {
                let props = f
                    .properties
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.to_value()))
                    .collect();
                out.insert("properties".into(), Value::Object(props));
            }
            if !f.required.is_empty() {
                out.insert("required".into(), Value::from(f.required.clone()));
            }
            put(out, "additionalProperties", f.additional_properties.map(Value::Bool));
        }
        SchemaKind::Boolean | SchemaKind::Null => {}
    }
}

fn put(out: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        out.insert(key.into(), value);
    }
}

fn schema_list(obj: &Map<String, Value>, key: &str) -> Vec<Schema> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(Schema::from_value).collect())
        .unwrap_or_default()
}

pub(crate) fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

pub(crate) fn bool_field(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_object_with_facets() {
        let schema = Schema::from_value(&json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string", "minLength": 1, "pattern": "^[a-z]+$"},
                "age": {"type": "integer", "minimum": 0, "format": "int32"},
                "tags": {"type": "array", "items": {"type": "string"}}
            }
        }));

        assert_eq!(schema.type_name(), Some("object"));
        assert!(schema.is_required("name"));
        let props = schema.properties().unwrap();
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["name", "age", "tags"]);
        assert!(matches!(
            &props["name"].kind,
            Some(SchemaKind::String(StringFacets { min_length: Some(1), .. }))
        ));
        assert!(matches!(
            &props["tags"].kind,
            Some(SchemaKind::Array(ArrayFacets { items: Some(_), .. }))
        ));
    }

    #[test]
    fn test_infers_object_and_array_without_type() {
        let obj = Schema::from_value(&json!({"properties": {"a": {"type": "string"}}}));
        assert_eq!(obj.type_name(), Some("object"));

        let arr = Schema::from_value(&json!({"items": {"type": "integer"}}));
        assert_eq!(arr.type_name(), Some("array"));

        let untyped = Schema::from_value(&json!({"description": "anything"}));
        assert!(untyped.kind.is_none());
    }

    #[test]
    fn test_type_array_with_null_is_nullable() {
        let schema = Schema::from_value(&json!({"type": ["null", "string"]}));
        assert_eq!(schema.type_name(), Some("string"));
        assert!(schema.nullable);
    }

    #[test]
    fn test_malformed_facets_are_dropped() {
        let schema = Schema::from_value(&json!({
            "type": "object",
            "properties": "not-a-map",
            "required": "nope",
            "allOf": {"also": "wrong"}
        }));
        assert!(schema.properties().unwrap().is_empty());
        assert!(schema.required().is_empty());
        assert!(schema.all_of.is_empty());
    }

    #[test]
    fn test_reads_reference_and_composition() {
        let schema = Schema::from_value(&json!({
            "allOf": [{"$ref": "#/components/schemas/Pet"}, {"type": "object"}]
        }));
        assert!(schema.has_composition());
        assert_eq!(schema.all_of[0].reference.as_deref(), Some("#/components/schemas/Pet"));
    }

    #[test]
    fn test_to_value_renders_facets() {
        let value = Schema::from_value(&json!({
            "type": "integer",
            "minimum": 1,
            "maximum": 10,
            "enum": [1, 2, 3]
        }))
        .to_value();
        assert_eq!(value["type"], "integer");
        assert_eq!(value["minimum"], 1.0);
        assert_eq!(value["enum"], json!([1, 2, 3]));
    }
}
