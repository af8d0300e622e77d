//! Version-agnostic model of a parsed API specification.

use crate::schema::{Schema, SchemaRegistry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which document dialect the spec was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dialect", content = "version", rename_all = "camelCase")]
pub enum SpecVersion {
    /// OpenAPI 3.x, carrying the declared `openapi` string
    OpenApi3(String),
    /// Swagger 2.0
    Swagger2(String),
}

impl SpecVersion {
    pub fn is_swagger2(&self) -> bool {
        matches!(self, SpecVersion::Swagger2(_))
    }
}

/// The seven standard HTTP methods recognized under a path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpMethod {
    /// Document order used when walking a path item.
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
    ];

    /// Lowercase key as it appears in a path item.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == key)
    }

    /// Methods that normally carry a request body.
    pub fn expects_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Location where a parameter appears in the request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Path parameter (e.g., /users/{id})
    Path,
    /// Query parameter (e.g., ?search=value)
    Query,
    /// Header parameter (e.g., X-Custom-Header)
    Header,
    /// Cookie parameter
    Cookie,
    /// Request body parameter (Swagger `body` and `formData`)
    Body,
}

impl ParameterLocation {
    /// Parse an `in` value. Swagger's `formData` is folded into `Body`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            "body" | "formData" => Some(ParameterLocation::Body),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Cookie => write!(f, "cookie"),
            ParameterLocation::Body => write!(f, "body"),
        }
    }
}

/// A parameter of an operation.
///
/// `name`, `location` and `schema` stay optional so the validator can report
/// them missing instead of the normalizer silently dropping the parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameter {
    pub name: Option<String>,
    pub location: Option<ParameterLocation>,
    pub required: bool,
    pub schema: Option<Schema>,
    pub description: Option<String>,
    /// True for Swagger `formData`, which is folded into the body location
    pub form_data: bool,
}

/// A single media type entry of a request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaType {
    pub schema: Option<Schema>,
}

/// OpenAPI 3.x request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBody {
    pub description: Option<String>,
    pub required: bool,
    pub content: IndexMap<String, MediaType>,
}

impl RequestBody {
    /// The JSON schema of the body: `application/json` first, then any `+json` type.
    pub fn json_schema(&self) -> Option<&Schema> {
        self.content
            .get("application/json")
            .or_else(|| {
                self.content
                    .iter()
                    .find(|(media, _)| media.ends_with("+json"))
                    .map(|(_, media)| media)
            })
            .and_then(|media| media.schema.as_ref())
    }
}

/// A declared response. Only kept for structural validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    pub description: Option<String>,
}

/// One security requirement object: scheme name to scopes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityRequirement {
    pub schemes: IndexMap<String, Vec<String>>,
}

impl SecurityRequirement {
    /// First scheme named by this requirement, with its scopes.
    pub fn first_scheme(&self) -> Option<(&String, &Vec<String>)> {
        self.schemes.first()
    }
}

/// Where an API key is sent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

/// A security scheme as declared by the document.
#[derive(Debug, Clone, PartialEq)]
pub enum SecurityScheme {
    ApiKey {
        name: Option<String>,
        location: Option<ApiKeyLocation>,
    },
    /// OpenAPI 3.x `http` scheme (bearer, basic, digest, ...)
    Http {
        scheme: Option<String>,
        bearer_format: Option<String>,
    },
    /// Swagger 2.0 `basic`
    Basic,
    OAuth2 {
        /// Names of the declared flows (3.x `flows` keys, or the 2.0 `flow`)
        flows: Vec<String>,
        /// Scopes declared across all flows
        scopes: Vec<String>,
    },
    OpenIdConnect {
        url: Option<String>,
    },
    /// A `type` this crate does not know about
    Unknown(String),
}

/// Document-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An OpenAPI 3.x server entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Variable name to its default value
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, String>,
}

/// Swagger 2.0 `host`, `basePath` and `schemes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwaggerHost {
    pub host: Option<String>,
    pub base_path: Option<String>,
    pub schemes: Vec<String>,
}

/// One (method, path) operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEndpoint {
    pub path: String,
    pub method: HttpMethod,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    /// `None` when the operation declares no `responses` at all
    pub responses: Option<IndexMap<String, ApiResponse>>,
    /// `None` inherits the global requirement; `Some(vec![])` opts out
    pub security: Option<Vec<SecurityRequirement>>,
}

impl ApiEndpoint {
    /// `GET /pets/{id}` style label used in logs and reports.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Whether the endpoint carries a body, in either dialect.
    pub fn has_body(&self) -> bool {
        self.request_body.is_some()
            || self
                .parameters
                .iter()
                .any(|p| p.location == Some(ParameterLocation::Body))
    }
}

/// The normalized result of one specification document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedApiSpec {
    pub version: SpecVersion,
    pub info: ApiInfo,
    pub servers: Vec<Server>,
    pub swagger_host: Option<SwaggerHost>,
    pub endpoints: Vec<ApiEndpoint>,
    pub schemas: SchemaRegistry,
    pub security_schemes: IndexMap<String, SecurityScheme>,
    /// Global requirements inherited by endpoints without their own
    pub security: Option<Vec<SecurityRequirement>>,
}

impl ParsedApiSpec {
    /// Security requirements that apply to `endpoint`.
    pub fn effective_security<'a>(&'a self, endpoint: &'a ApiEndpoint) -> &'a [SecurityRequirement] {
        endpoint
            .security
            .as_deref()
            .or(self.security.as_deref())
            .unwrap_or(&[])
    }

    /// Whether the document declares anywhere to send requests to.
    pub fn declares_server(&self) -> bool {
        !self.servers.is_empty()
            || self
                .swagger_host
                .as_ref()
                .is_some_and(|h| h.host.as_deref().is_some_and(|host| !host.is_empty()))
    }
}
