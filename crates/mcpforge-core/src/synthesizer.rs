//! Tool synthesizer: one [`McpToolSpec`] per non-authentication endpoint.

use crate::auth::derive_authentication;
use crate::base_url::derive_base_url;
use crate::error::{ForgeError, Result};
use crate::flatten::{extract_schema_properties, flat_property};
use crate::naming::{is_auth_endpoint, tool_description, tool_name};
use crate::resolver::{ResolutionPath, Resolved, SchemaResolver};
use crate::schema::Schema;
use crate::tool::{
    ErrorHandling, FlatProperty, InputSchema, McpToolSpec, ParamRole, PropertyType,
    ResponseHandling,
};
use crate::types::{ApiEndpoint, Parameter, ParameterLocation, ParsedApiSpec, RequestBody};
use tracing::{debug, info, warn};

/// Knobs for tool synthesis.
#[derive(Debug, Clone, Default)]
pub struct SynthesisOptions {
    /// Base URL written into every tool instead of the document's own
    pub base_url_override: Option<String>,
}

impl SynthesisOptions {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }
}

/// Synthesize tools for every endpoint of `spec`, in document order.
///
/// Authentication endpoints are skipped. An endpoint whose tool cannot be
/// built is dropped with a warning; the rest of the document still yields
/// its tools.
pub fn synthesize_tools(spec: &ParsedApiSpec, options: &SynthesisOptions) -> Vec<McpToolSpec> {
    let synthesizer = ToolSynthesizer::new(spec, options);
    let mut tools = Vec::with_capacity(spec.endpoints.len());

    for endpoint in &spec.endpoints {
        if is_auth_endpoint(endpoint) {
            debug!("Skipping authentication endpoint {}", endpoint.label());
            continue;
        }
        match synthesizer.synthesize(endpoint) {
            Ok(tool) => tools.push(tool),
            Err(e) => warn!("Dropping endpoint: {}", e),
        }
    }

    info!(
        "Synthesized {} tools from {} endpoints",
        tools.len(),
        spec.endpoints.len()
    );
    tools
}

/// Builds tools for the endpoints of one parsed document.
pub struct ToolSynthesizer<'a> {
    spec: &'a ParsedApiSpec,
    resolver: SchemaResolver<'a>,
    base_url: Option<String>,
}

impl<'a> ToolSynthesizer<'a> {
    pub fn new(spec: &'a ParsedApiSpec, options: &SynthesisOptions) -> Self {
        let base_url = options
            .base_url_override
            .clone()
            .unwrap_or_else(|| derive_base_url(spec));
        Self {
            spec,
            resolver: SchemaResolver::new(&spec.schemas),
            base_url: (!base_url.is_empty()).then_some(base_url),
        }
    }

    /// Build the tool for a single endpoint.
    pub fn synthesize(&self, endpoint: &ApiEndpoint) -> Result<McpToolSpec> {
        let input_schema = self.input_schema(endpoint)?;
        let name = tool_name(endpoint);
        debug!(
            "{} -> tool '{}' with {} parameters",
            endpoint.label(),
            name,
            input_schema.properties.len()
        );

        Ok(McpToolSpec {
            name,
            description: tool_description(endpoint),
            input_schema,
            method: endpoint.method,
            path: endpoint.path.clone(),
            base_url: self.base_url.clone(),
            authentication: derive_authentication(self.spec, endpoint),
            response_handling: ResponseHandling::default(),
            error_handling: ErrorHandling::default(),
        })
    }

    fn input_schema(&self, endpoint: &ApiEndpoint) -> Result<InputSchema> {
        let mut schema = InputSchema::default();

        for param in &endpoint.parameters {
            if param.name.is_none() || param.location.is_none() {
                return Err(ForgeError::synthesis(
                    endpoint.label(),
                    "parameter without a name or location",
                ));
            }
        }

        // Path, query and header first, in that order; then the body.
        for location in [
            ParameterLocation::Path,
            ParameterLocation::Query,
            ParameterLocation::Header,
        ] {
            for param in endpoint
                .parameters
                .iter()
                .filter(|p| p.location == Some(location))
            {
                self.add_parameter(&mut schema, endpoint, param, location);
            }
        }

        for param in &endpoint.parameters {
            if param.location == Some(ParameterLocation::Cookie) {
                debug!(
                    "{}: cookie parameter '{}' is not exposed",
                    endpoint.label(),
                    param.name.as_deref().unwrap_or_default()
                );
            }
        }

        if let Some(request_body) = &endpoint.request_body {
            if let Some(body) = request_body.json_schema() {
                self.add_request_body(&mut schema, endpoint, request_body, body);
            }
        }
        for param in endpoint
            .parameters
            .iter()
            .filter(|p| p.location == Some(ParameterLocation::Body))
        {
            self.add_body_parameter(&mut schema, endpoint, param);
        }

        Ok(schema)
    }

    fn add_parameter(
        &self,
        schema: &mut InputSchema,
        endpoint: &ApiEndpoint,
        param: &Parameter,
        location: ParameterLocation,
    ) {
        let Some(name) = param.name.as_deref() else {
            return;
        };
        let role = match location {
            ParameterLocation::Path => ParamRole::Path,
            ParameterLocation::Query => ParamRole::Query,
            ParameterLocation::Header => {
                if name.to_lowercase().contains("signature") {
                    debug!(
                        "{}: header '{}' is computed, not user supplied",
                        endpoint.label(),
                        name
                    );
                    return;
                }
                ParamRole::Header
            }
            ParameterLocation::Cookie | ParameterLocation::Body => return,
        };

        let property = self.parameter_property(param, role);
        let required = role == ParamRole::Path || param.required;
        insert(schema, endpoint, name, property, required);
    }

    fn parameter_property(&self, param: &Parameter, role: ParamRole) -> FlatProperty {
        let resolved = match &param.schema {
            Some(schema) => self.resolve_leaf(schema),
            None => Schema::string(),
        };
        flat_property(&resolved, param.description.as_deref(), role)
    }

    /// Resolve a parameter schema to a concrete node; dangling refs become strings.
    fn resolve_leaf(&self, schema: &Schema) -> Schema {
        match self.resolver.resolve(schema, &mut ResolutionPath::default()) {
            Resolved::Schema { schema, .. } => schema,
            Resolved::Missing | Resolved::Cycle { .. } => Schema::string(),
        }
    }

    fn add_body_schema(&self, schema: &mut InputSchema, endpoint: &ApiEndpoint, body: &Schema) {
        let flattened = extract_schema_properties(body, &self.spec.schemas);
        for (name, property) in flattened.properties {
            let required = flattened.required.contains(&name);
            insert(schema, endpoint, &name, property, required);
        }
    }

    /// Object bodies are flattened; anything else becomes a single `body` property.
    fn add_request_body(
        &self,
        schema: &mut InputSchema,
        endpoint: &ApiEndpoint,
        request_body: &RequestBody,
        body: &Schema,
    ) {
        let resolved = self.resolve_leaf(body);
        if resolved.is_non_empty_object() {
            self.add_body_schema(schema, endpoint, body);
            return;
        }

        let property = flat_property(&resolved, request_body.description.as_deref(), ParamRole::Body);
        insert(schema, endpoint, "body", property, request_body.required);
    }

    /// Swagger `body` parameters are flattened; `formData` fields and
    /// non-object bodies become a single body property.
    fn add_body_parameter(&self, schema: &mut InputSchema, endpoint: &ApiEndpoint, param: &Parameter) {
        let Some(name) = param.name.as_deref() else {
            return;
        };
        let object_body = param
            .schema
            .as_ref()
            .filter(|body| !param.form_data && self.resolve_leaf(body).is_non_empty_object());
        if let Some(body) = object_body {
            self.add_body_schema(schema, endpoint, body);
            return;
        }

        let property = self.parameter_property(param, ParamRole::Body);
        insert(schema, endpoint, name, property, param.required);
    }
}

/// Add a property; on a name clash the earlier property wins.
fn insert(
    schema: &mut InputSchema,
    endpoint: &ApiEndpoint,
    name: &str,
    property: FlatProperty,
    required: bool,
) {
    if schema.properties.contains_key(name) {
        warn!(
            "{}: parameter '{}' already defined; ignoring the later definition",
            endpoint.label(),
            name
        );
        return;
    }
    schema.properties.insert(name.to_string(), property);
    if required {
        schema.required.push(name.to_string());
    }
}
