//! # mcpforge core
//!
//! Turns OpenAPI 3.x and Swagger 2.0 documents into normalized MCP tool
//! descriptors.
//!
//! ## Pipeline
//!
//! 1. [`normalize`] reads either dialect into one [`ParsedApiSpec`]
//! 2. [`validate`] reports structural errors, warnings and suggestions
//! 3. [`synthesize_tools`] builds one [`McpToolSpec`] per endpoint, resolving
//!    `$ref`s and `allOf`/`oneOf`/`anyOf` and flattening nested bodies
//!
//! Every stage is synchronous and free of I/O. Loading documents and writing
//! results belong to the caller.
//!
//! ## Example
//!
//! ```
//! use mcpforge_core::{SynthesisOptions, parse_document, synthesize_tools, validate};
//!
//! # fn main() -> mcpforge_core::Result<()> {
//! let spec = parse_document(r#"
//! openapi: 3.0.0
//! info: {title: Pet Store, version: "1.0"}
//! servers: [{url: "https://petstore.example.com"}]
//! paths:
//!   /pets/{id}:
//!     get:
//!       operationId: getPetById
//!       parameters:
//!         - {name: id, in: path, required: true, schema: {type: string}}
//!       responses: {"200": {description: ok}}
//! "#)?;
//!
//! assert!(validate(&spec).is_valid);
//! let tools = synthesize_tools(&spec, &SynthesisOptions::default());
//! assert_eq!(tools[0].name, "get_pet_by_id");
//! # Ok(())
//! # }
//! ```

mod auth;
mod base_url;
mod error;
mod flatten;
mod naming;
mod normalizer;
mod pipeline;
mod resolver;
mod schema;
mod synthesizer;
mod tool;
mod types;
mod validator;

pub use auth::{authentication_for, derive_authentication, env_var_name};
pub use base_url::{derive_base_url, expand_server_url};
pub use error::{ForgeError, Result};
pub use flatten::{FlattenedSchema, extract_direct_properties, extract_schema_properties};
pub use naming::{document_slug, is_auth_endpoint, tool_description, tool_name};
pub use normalizer::{decode_document, normalize, parse_document};
pub use pipeline::{CollisionPolicy, DocumentOutput, merge_tool_sets, process_document};
pub use resolver::{
    Dereferenced, ResolutionPath, Resolved, SchemaResolver, reference_name, resolve_composition,
    resolve_reference,
};
pub use schema::{
    ArrayFacets, NumericFacets, ObjectFacets, Schema, SchemaKind, SchemaRegistry, StringFacets,
};
pub use synthesizer::{SynthesisOptions, ToolSynthesizer, synthesize_tools};
pub use tool::{
    AuthenticationSpec, ErrorHandling, FlatProperty, FlattenOrigin, InputSchema, McpToolSpec,
    ParamRole, PropertyFacets, PropertyType, ResponseHandling,
};
pub use types::{
    ApiEndpoint, ApiInfo, ApiKeyLocation, ApiResponse, HttpMethod, MediaType, Parameter,
    ParameterLocation, ParsedApiSpec, RequestBody, SecurityRequirement, SecurityScheme, Server,
    SpecVersion, SwaggerHost,
};
pub use validator::{ValidationReport, validate};
