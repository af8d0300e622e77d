//! Authentication descriptors derived from a document's security schemes.
//!
//! Supported mappings:
//! - `apiKey` (header, query or cookie) → [`AuthenticationSpec::ApiKey`]
//! - `http` bearer → [`AuthenticationSpec::Bearer`]
//! - `http` basic and Swagger `basic` → [`AuthenticationSpec::Basic`]
//! - `oauth2` and `openIdConnect` → [`AuthenticationSpec::OAuth2`]
//!
//! Credentials are never read here; each descriptor only names the
//! environment variable the generated code will read at runtime.

use crate::tool::AuthenticationSpec;
use crate::types::{ApiEndpoint, ApiKeyLocation, ParsedApiSpec, SecurityScheme};
use tracing::{debug, warn};

/// Derive the authentication descriptor for `endpoint`.
///
/// Uses the endpoint's own requirement if present, else the document's
/// global one, and looks up the first scheme it names.
pub fn derive_authentication(spec: &ParsedApiSpec, endpoint: &ApiEndpoint) -> Option<AuthenticationSpec> {
    let (scheme_name, scopes) = spec
        .effective_security(endpoint)
        .iter()
        .find_map(|req| req.first_scheme())?;

    let Some(scheme) = spec.security_schemes.get(scheme_name) else {
        warn!(
            "{} references unknown security scheme '{}'",
            endpoint.label(),
            scheme_name
        );
        return None;
    };

    let auth = authentication_for(scheme_name, scheme, scopes);
    if auth.is_none() {
        warn!(
            "Security scheme '{}' of {} cannot be expressed as a tool credential",
            scheme_name,
            endpoint.label()
        );
    } else {
        debug!("{} authenticates with scheme '{}'", endpoint.label(), scheme_name);
    }
    auth
}

/// Map one declared scheme to a descriptor. `scopes` are the scopes requested
/// by the security requirement.
pub fn authentication_for(
    scheme_name: &str,
    scheme: &SecurityScheme,
    scopes: &[String],
) -> Option<AuthenticationSpec> {
    match scheme {
        SecurityScheme::ApiKey { name, location } => Some(AuthenticationSpec::ApiKey {
            name: name.clone().unwrap_or_else(|| scheme_name.to_string()),
            location: location.unwrap_or(ApiKeyLocation::Header),
            env_var: env_var_name(scheme_name, "API_KEY"),
        }),
        SecurityScheme::Http { scheme, bearer_format } => match scheme.as_deref() {
            Some("bearer") => Some(AuthenticationSpec::Bearer {
                bearer_format: bearer_format.clone(),
                env_var: env_var_name(scheme_name, "TOKEN"),
            }),
            Some("basic") => Some(AuthenticationSpec::Basic {
                env_var: env_var_name(scheme_name, "CREDENTIALS"),
            }),
            _ => None,
        },
        SecurityScheme::Basic => Some(AuthenticationSpec::Basic {
            env_var: env_var_name(scheme_name, "CREDENTIALS"),
        }),
        SecurityScheme::OAuth2 { .. } | SecurityScheme::OpenIdConnect { .. } => {
            Some(AuthenticationSpec::OAuth2 {
                scopes: scopes.to_vec(),
                env_var: env_var_name(scheme_name, "ACCESS_TOKEN"),
            })
        }
        SecurityScheme::Unknown(_) => None,
    }
}

/// `{SCHEME_NAME_UPPERCASED}_{suffix}`, with non-alphanumerics turned into `_`.
pub fn env_var_name(scheme_name: &str, suffix: &str) -> String {
    let stem: String = scheme_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}_{suffix}")
}
