//! Tool descriptors handed to the code generator.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{ApiKeyLocation, HttpMethod};

/// A synthesized, invocable tool for one API operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
    pub method: HttpMethod,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthenticationSpec>,
    pub response_handling: ResponseHandling,
    pub error_handling: ErrorHandling,
}

/// Flat input schema of a tool: always an object of named parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: &'static str,
    pub properties: IndexMap<String, FlatProperty>,
    pub required: Vec<String>,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            schema_type: "object",
            properties: IndexMap::new(),
            required: Vec::new(),
        }
    }
}

/// Primitive kind of a flat property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl PropertyType {
    /// Map a JSON Schema type keyword. `null` and unknown kinds fall back to string.
    pub fn from_type_name(name: Option<&str>) -> Self {
        match name {
            Some("integer") => PropertyType::Integer,
            Some("number") => PropertyType::Number,
            Some("boolean") => PropertyType::Boolean,
            Some("array") => PropertyType::Array,
            Some("object") => PropertyType::Object,
            _ => PropertyType::String,
        }
    }
}

/// Where the value of a flat property is sent at invocation time.
///
/// Serialized as the four `is*Param` flags, exactly one of them true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    Path,
    Query,
    Header,
    Body,
}

impl Serialize for ParamRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("isPathParam", &(*self == ParamRole::Path))?;
        map.serialize_entry("isQueryParam", &(*self == ParamRole::Query))?;
        map.serialize_entry("isHeaderParam", &(*self == ParamRole::Header))?;
        map.serialize_entry("isBodyParam", &(*self == ParamRole::Body))?;
        map.end()
    }
}

/// Where a flattened property came from in the original nested body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenOrigin {
    /// Dotted field path from the flattening root, e.g. `owner.address.city`
    pub original_path: String,
    /// Name of the flattening root property, e.g. `owner`
    pub parent_object: String,
}

impl Serialize for FlattenOrigin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("isFlattened", &true)?;
        map.serialize_entry("originalPath", &self.original_path)?;
        map.serialize_entry("parentObject", &self.parent_object)?;
        map.end()
    }
}

/// Validation facets carried over from the source schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFacets {
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// JSON Schema of array elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
}

/// One directly settable tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatProperty {
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub description: String,
    #[serde(flatten)]
    pub facets: PropertyFacets,
    #[serde(flatten)]
    pub role: ParamRole,
    #[serde(flatten)]
    pub origin: Option<FlattenOrigin>,
}

impl FlatProperty {
    pub fn new(property_type: PropertyType, description: impl Into<String>, role: ParamRole) -> Self {
        Self {
            property_type,
            description: description.into(),
            facets: PropertyFacets::default(),
            role,
            origin: None,
        }
    }

    pub fn is_path_param(&self) -> bool {
        self.role == ParamRole::Path
    }

    pub fn is_query_param(&self) -> bool {
        self.role == ParamRole::Query
    }

    pub fn is_header_param(&self) -> bool {
        self.role == ParamRole::Header
    }

    pub fn is_body_param(&self) -> bool {
        self.role == ParamRole::Body
    }

    pub fn is_flattened(&self) -> bool {
        self.origin.is_some()
    }
}

/// How a tool obtains credentials at runtime.
///
/// Each variant names the environment variable expected to hold the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthenticationSpec {
    #[serde(rename_all = "camelCase")]
    ApiKey {
        /// Header, query parameter or cookie name carrying the key
        name: String,
        location: ApiKeyLocation,
        env_var: String,
    },
    #[serde(rename_all = "camelCase")]
    Bearer {
        #[serde(skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
        env_var: String,
    },
    #[serde(rename_all = "camelCase")]
    Basic { env_var: String },
    #[serde(rename = "oauth2", rename_all = "camelCase")]
    OAuth2 {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        scopes: Vec<String>,
        env_var: String,
    },
}

impl AuthenticationSpec {
    pub fn env_var(&self) -> &str {
        match self {
            AuthenticationSpec::ApiKey { env_var, .. }
            | AuthenticationSpec::Bearer { env_var, .. }
            | AuthenticationSpec::Basic { env_var }
            | AuthenticationSpec::OAuth2 { env_var, .. } => env_var,
        }
    }
}

/// Fixed success-response contract of every tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseHandling {
    pub success_codes: Vec<u16>,
    pub response_type: &'static str,
}

impl Default for ResponseHandling {
    fn default() -> Self {
        Self {
            success_codes: vec![200, 201, 204],
            response_type: "json",
        }
    }
}

/// Fixed failure contract of every tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandling {
    pub retry_count: u32,
    pub timeout_ms: u64,
    pub error_codes: BTreeMap<u16, &'static str>,
}

impl Default for ErrorHandling {
    fn default() -> Self {
        Self {
            retry_count: 3,
            timeout_ms: 30_000,
            error_codes: BTreeMap::from([
                (400, "Bad Request"),
                (401, "Unauthorized"),
                (403, "Forbidden"),
                (404, "Not Found"),
                (500, "Internal Server Error"),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_property_serializes_role_flags() {
        let prop = FlatProperty::new(PropertyType::String, "Pet id", ParamRole::Path);
        let value = serde_json::to_value(&prop).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "string",
                "description": "Pet id",
                "isPathParam": true,
                "isQueryParam": false,
                "isHeaderParam": false,
                "isBodyParam": false
            })
        );
    }

    #[test]
    fn test_flattened_property_serializes_origin() {
        let mut prop = FlatProperty::new(PropertyType::String, "", ParamRole::Body);
        prop.origin = Some(FlattenOrigin {
            original_path: "owner.name".into(),
            parent_object: "owner".into(),
        });
        prop.facets.min_length = Some(1);
        let value = serde_json::to_value(&prop).unwrap();
        assert_eq!(value["isFlattened"], true);
        assert_eq!(value["originalPath"], "owner.name");
        assert_eq!(value["parentObject"], "owner");
        assert_eq!(value["minLength"], 1);
        assert_eq!(value["isBodyParam"], true);
    }

    #[test]
    fn test_authentication_tagging() {
        let auth = AuthenticationSpec::OAuth2 {
            scopes: vec![],
            env_var: "PETSTORE_AUTH_ACCESS_TOKEN".into(),
        };
        assert_eq!(
            serde_json::to_value(&auth).unwrap(),
            json!({"type": "oauth2", "envVar": "PETSTORE_AUTH_ACCESS_TOKEN"})
        );
        assert_eq!(auth.env_var(), "PETSTORE_AUTH_ACCESS_TOKEN");
    }

    #[test]
    fn test_fixed_policies() {
        let errors = serde_json::to_value(ErrorHandling::default()).unwrap();
        assert_eq!(errors["retryCount"], 3);
        assert_eq!(errors["timeoutMs"], 30000);
        assert_eq!(errors["errorCodes"]["404"], "Not Found");

        let responses = ResponseHandling::default();
        assert_eq!(responses.success_codes, vec![200, 201, 204]);
    }
}
