//! Normalizer: turns a decoded OpenAPI 3.x or Swagger 2.0 document into a
//! [`ParsedApiSpec`].
//!
//! The dialect is detected from the document itself, so callers never need
//! to know which version they are handing over. Individual malformed
//! operations are skipped with a warning; only a missing `paths` object is
//! fatal.

use crate::error::{ForgeError, Result};
use crate::schema::{Schema, SchemaRegistry, bool_field, str_field};
use crate::types::{
    ApiEndpoint, ApiInfo, ApiKeyLocation, ApiResponse, HttpMethod, MediaType, Parameter,
    ParameterLocation, ParsedApiSpec, RequestBody, SecurityRequirement, SecurityScheme, Server,
    SpecVersion, SwaggerHost,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Parse a specification from raw text.
///
/// Tries JSON first, then YAML, and normalizes the decoded value.
pub fn parse_document(content: &str) -> Result<ParsedApiSpec> {
    let value = decode_document(content)?;
    normalize(&value)
}

/// Decode JSON or YAML text into a document value without normalizing it.
pub fn decode_document(content: &str) -> Result<Value> {
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(json_err) => {
            debug!("Document is not JSON ({}), trying YAML", json_err);
            Ok(serde_yaml::from_str(content)?)
        }
    }
}

/// Normalize a decoded specification document.
pub fn normalize(document: &Value) -> Result<ParsedApiSpec> {
    let root = document
        .as_object()
        .ok_or_else(|| ForgeError::parse("document root is not an object"))?;

    let paths = match root.get("paths") {
        Some(Value::Object(paths)) => paths,
        Some(_) => return Err(ForgeError::parse("'paths' is not an object")),
        None => return Err(ForgeError::parse("document has no 'paths'")),
    };

    let version = detect_version(root);
    debug!("Normalizing {:?} document", version);

    let components = root.get("components").and_then(Value::as_object);
    let reader = DocumentReader {
        version: &version,
        components,
        root,
    };

    let schemas = reader.schema_registry();
    let security_schemes = reader.security_schemes();
    let security = root.get("security").map(read_security);

    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            warn!("Skipping path '{}': path item is not an object", path);
            continue;
        };

        for (key, operation) in item {
            let Some(method) = HttpMethod::from_key(key) else {
                // Shared `parameters`, `summary`, vendor extensions, ...
                continue;
            };
            match reader.read_operation(path, method, operation) {
                Some(endpoint) => endpoints.push(endpoint),
                None => warn!("Skipping operation {} {}: not an object", method, path),
            }
        }
    }

    debug!(
        "Normalized {} endpoints, {} schemas, {} security schemes",
        endpoints.len(),
        schemas.len(),
        security_schemes.len()
    );

    Ok(ParsedApiSpec {
        info: read_info(root),
        servers: read_servers(root),
        swagger_host: version.is_swagger2().then(|| read_swagger_host(root)),
        version,
        endpoints,
        schemas,
        security_schemes,
        security,
    })
}

fn detect_version(root: &Map<String, Value>) -> SpecVersion {
    if let Some(v) = root.get("openapi") {
        SpecVersion::OpenApi3(version_string(v))
    } else if let Some(v) = root.get("swagger") {
        SpecVersion::Swagger2(version_string(v))
    } else if root.contains_key("components") {
        SpecVersion::OpenApi3("3.0.0".to_string())
    } else {
        SpecVersion::Swagger2("2.0".to_string())
    }
}

fn version_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Borrowed view over the parts of a document needed while reading operations.
struct DocumentReader<'a> {
    version: &'a SpecVersion,
    components: Option<&'a Map<String, Value>>,
    root: &'a Map<String, Value>,
}

impl<'a> DocumentReader<'a> {
    /// `components.<section>` for 3.x, the top-level `<legacy>` for 2.0.
    fn section(&self, section: &str, legacy: &str) -> Option<&'a Map<String, Value>> {
        if self.version.is_swagger2() {
            self.root.get(legacy).and_then(Value::as_object)
        } else {
            self.components
                .and_then(|c| c.get(section))
                .and_then(Value::as_object)
        }
    }

    fn schema_registry(&self) -> SchemaRegistry {
        self.section("schemas", "definitions")
            .map(|defs| {
                defs.iter()
                    .map(|(name, schema)| (name.clone(), Schema::from_value(schema)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn security_schemes(&self) -> IndexMap<String, SecurityScheme> {
        self.section("securitySchemes", "securityDefinitions")
            .map(|defs| {
                defs.iter()
                    .filter_map(|(name, scheme)| {
                        scheme
                            .as_object()
                            .map(|scheme| (name.clone(), read_security_scheme(scheme)))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Follow a local `$ref` into a named section, e.g. `#/components/parameters/Limit`.
    fn follow(&self, value: &'a Value, section: &str, legacy: &str) -> Option<&'a Value> {
        let Some(reference) = value.get("$ref").and_then(Value::as_str) else {
            return Some(value);
        };
        let name = reference
            .strip_prefix(&format!("#/components/{section}/"))
            .or_else(|| reference.strip_prefix(&format!("#/{legacy}/")));
        let target = name.and_then(|name| self.section(section, legacy)?.get(name));
        if target.is_none() {
            warn!("Unresolvable reference '{}'", reference);
        }
        target
    }

    fn read_operation(&self, path: &str, method: HttpMethod, operation: &'a Value) -> Option<ApiEndpoint> {
        let op = operation.as_object()?;

        let parameters = op
            .get("parameters")
            .and_then(Value::as_array)
            .map(|params| {
                params
                    .iter()
                    .filter_map(|p| self.follow(p, "parameters", "parameters"))
                    .filter_map(Value::as_object)
                    .map(read_parameter)
                    .collect()
            })
            .unwrap_or_default();

        let request_body = op
            .get("requestBody")
            .and_then(|body| self.follow(body, "requestBodies", "requestBodies"))
            .and_then(Value::as_object)
            .map(read_request_body);

        let responses = op.get("responses").and_then(Value::as_object).map(|responses| {
            responses
                .iter()
                .map(|(status, response)| {
                    let response = self.follow(response, "responses", "responses");
                    (
                        status.clone(),
                        ApiResponse {
                            description: response
                                .and_then(|r| r.get("description"))
                                .and_then(Value::as_str)
                                .map(String::from),
                        },
                    )
                })
                .collect()
        });

        Some(ApiEndpoint {
            path: path.to_string(),
            method,
            operation_id: str_field(op, "operationId"),
            summary: str_field(op, "summary"),
            description: str_field(op, "description"),
            tags: op
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| tags.iter().filter_map(Value::as_str).map(String::from).collect())
                .unwrap_or_default(),
            parameters,
            request_body,
            responses,
            security: op.get("security").map(read_security),
        })
    }
}

fn read_parameter(param: &Map<String, Value>) -> Parameter {
    let raw_location = param.get("in").and_then(Value::as_str);
    let location = raw_location.and_then(ParameterLocation::from_key);

    let schema = match param.get("schema") {
        Some(schema) => Some(Schema::from_value(schema)),
        // Swagger 2.0 non-body parameters describe their type inline.
        None if param.contains_key("type") => Some(inline_parameter_schema(param)),
        None => None,
    };

    Parameter {
        name: str_field(param, "name"),
        location,
        required: bool_field(param, "required"),
        schema,
        description: str_field(param, "description"),
        form_data: raw_location == Some("formData"),
    }
}

/// Build a schema out of the type keywords a Swagger 2.0 parameter carries.
fn inline_parameter_schema(param: &Map<String, Value>) -> Schema {
    const SCHEMA_KEYS: &[&str] = &[
        "type",
        "format",
        "items",
        "enum",
        "default",
        "minimum",
        "maximum",
        "exclusiveMinimum",
        "exclusiveMaximum",
        "minLength",
        "maxLength",
        "pattern",
        "minItems",
        "maxItems",
        "uniqueItems",
        "multipleOf",
    ];
    let subset: Map<String, Value> = param
        .iter()
        .filter(|(key, _)| SCHEMA_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let mut schema = Schema::from_value(&Value::Object(subset));
    // Swagger's `file` type has no JSON Schema counterpart.
    if param.get("type").and_then(Value::as_str) == Some("file") {
        schema = Schema::string();
    }
    schema
}

fn read_request_body(body: &Map<String, Value>) -> RequestBody {
    RequestBody {
        description: str_field(body, "description"),
        required: bool_field(body, "required"),
        content: body
            .get("content")
            .and_then(Value::as_object)
            .map(|content| {
                content
                    .iter()
                    .map(|(media, entry)| {
                        (
                            media.clone(),
                            MediaType {
                                schema: entry.get("schema").map(Schema::from_value),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn read_security(value: &Value) -> Vec<SecurityRequirement> {
    value
        .as_array()
        .map(|reqs| {
            reqs.iter()
                .filter_map(Value::as_object)
                .map(|req| SecurityRequirement {
                    schemes: req
                        .iter()
                        .map(|(name, scopes)| {
                            let scopes = scopes
                                .as_array()
                                .map(|s| s.iter().filter_map(Value::as_str).map(String::from).collect())
                                .unwrap_or_default();
                            (name.clone(), scopes)
                        })
                        .collect(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn read_security_scheme(scheme: &Map<String, Value>) -> SecurityScheme {
    let kind = scheme.get("type").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "apiKey" => SecurityScheme::ApiKey {
            name: str_field(scheme, "name"),
            location: match scheme.get("in").and_then(Value::as_str) {
                Some("header") => Some(ApiKeyLocation::Header),
                Some("query") => Some(ApiKeyLocation::Query),
                Some("cookie") => Some(ApiKeyLocation::Cookie),
                _ => None,
            },
        },
        "http" => SecurityScheme::Http {
            scheme: str_field(scheme, "scheme").map(|s| s.to_lowercase()),
            bearer_format: str_field(scheme, "bearerFormat"),
        },
        "basic" => SecurityScheme::Basic,
        "oauth2" => {
            let mut flows = Vec::new();
            let mut scopes = Vec::new();
            if let Some(declared) = scheme.get("flows").and_then(Value::as_object) {
                for (flow, body) in declared {
                    flows.push(flow.clone());
                    collect_scopes(body.get("scopes"), &mut scopes);
                }
            } else if let Some(flow) = str_field(scheme, "flow") {
                flows.push(flow);
                collect_scopes(scheme.get("scopes"), &mut scopes);
            }
            SecurityScheme::OAuth2 { flows, scopes }
        }
        "openIdConnect" => SecurityScheme::OpenIdConnect {
            url: str_field(scheme, "openIdConnectUrl"),
        },
        other => SecurityScheme::Unknown(other.to_string()),
    }
}

fn collect_scopes(value: Option<&Value>, scopes: &mut Vec<String>) {
    if let Some(map) = value.and_then(Value::as_object) {
        for scope in map.keys() {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }
    }
}

fn read_info(root: &Map<String, Value>) -> ApiInfo {
    root.get("info")
        .and_then(Value::as_object)
        .map(|info| ApiInfo {
            title: str_field(info, "title"),
            version: info.get("version").map(version_string),
            description: str_field(info, "description"),
        })
        .unwrap_or_default()
}

fn read_servers(root: &Map<String, Value>) -> Vec<Server> {
    root.get("servers")
        .and_then(Value::as_array)
        .map(|servers| {
            servers
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|server| {
                    Some(Server {
                        url: str_field(server, "url")?,
                        description: str_field(server, "description"),
                        variables: server
                            .get("variables")
                            .and_then(Value::as_object)
                            .map(|vars| {
                                vars.iter()
                                    .filter_map(|(name, var)| {
                                        let default = var.get("default")?;
                                        Some((name.clone(), version_string(default)))
                                    })
                                    .collect()
                            })
                            .unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn read_swagger_host(root: &Map<String, Value>) -> SwaggerHost {
    SwaggerHost {
        host: str_field(root, "host"),
        base_path: str_field(root, "basePath"),
        schemes: root
            .get("schemes")
            .and_then(Value::as_array)
            .map(|s| s.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default(),
    }
}
