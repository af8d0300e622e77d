//! Structural validator.
//!
//! Produces a [`ValidationReport`] separating blocking errors from advisory
//! warnings and suggestions. The report is always returned in full; whether
//! an invalid document stops generation is the caller's decision.

use crate::error::{ForgeError, Result};
use crate::types::{ApiEndpoint, ParameterLocation, ParsedApiSpec, SecurityScheme};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Outcome of structural validation, one display-ready string per finding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    /// Turn a failed report into [`ForgeError::Validation`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_valid {
            Ok(self)
        } else {
            Err(ForgeError::Validation {
                errors: self.errors,
            })
        }
    }
}

/// Validate the structure of a normalized document.
pub fn validate(spec: &ParsedApiSpec) -> ValidationReport {
    let mut report = ValidationReport::default();

    if spec.info.title.as_deref().is_none_or(str::is_empty) {
        report.errors.push("info.title is required".to_string());
    }
    if spec.info.version.as_deref().is_none_or(str::is_empty) {
        report.errors.push("info.version is required".to_string());
    }
    if spec.endpoints.is_empty() {
        report.errors.push("document defines no paths".to_string());
    }
    if !spec.declares_server() {
        report
            .warnings
            .push("no servers declared; a base URL must be supplied at generation time".to_string());
    }

    check_security_schemes(spec, &mut report);

    let mut reported_paths = HashSet::new();
    for endpoint in &spec.endpoints {
        if !endpoint.path.starts_with('/') && reported_paths.insert(endpoint.path.as_str()) {
            report
                .errors
                .push(format!("path '{}' must start with '/'", endpoint.path));
        }
        check_endpoint(endpoint, &mut report);
    }

    report.is_valid = report.errors.is_empty();
    debug!(
        "Validation finished: {} errors, {} warnings, {} suggestions",
        report.errors.len(),
        report.warnings.len(),
        report.suggestions.len()
    );
    report
}

fn check_endpoint(endpoint: &ApiEndpoint, report: &mut ValidationReport) {
    let label = endpoint.label();

    if endpoint.responses.is_none() {
        report.errors.push(format!("{label}: responses are required"));
    }

    let mut seen = HashSet::new();
    for (index, param) in endpoint.parameters.iter().enumerate() {
        let display = param
            .name
            .as_deref()
            .map(|name| format!("parameter '{name}'"))
            .unwrap_or_else(|| format!("parameter #{}", index + 1));

        if param.name.is_none() {
            report.errors.push(format!("{label}: {display} is missing a name"));
        }
        match param.location {
            None => report.errors.push(format!("{label}: {display} is missing a location")),
            Some(ParameterLocation::Path) if !param.required => report.errors.push(format!(
                "{label}: {display} (path) must be marked required"
            )),
            _ => {}
        }
        if param.schema.is_none() {
            report.errors.push(format!("{label}: {display} is missing a schema"));
        }

        if let (Some(name), Some(location)) = (param.name.as_deref(), param.location) {
            if !seen.insert((name, location)) {
                report.errors.push(format!(
                    "{label}: duplicate parameter '{name}' in {location}"
                ));
            }
        }
    }

    if endpoint.summary.is_none() && endpoint.description.is_none() {
        report
            .warnings
            .push(format!("{label}: no summary or description"));
    }
    if endpoint.method.expects_body() && !endpoint.has_body() {
        report.warnings.push(format!("{label}: no request body"));
    }

    if endpoint.operation_id.is_none() {
        report
            .suggestions
            .push(format!("{label}: add an operationId for a stable tool name"));
    }
    if endpoint.tags.is_empty() {
        report.suggestions.push(format!("{label}: add tags to group the operation"));
    }
}

fn check_security_schemes(spec: &ParsedApiSpec, report: &mut ValidationReport) {
    for (name, scheme) in &spec.security_schemes {
        match scheme {
            SecurityScheme::ApiKey { name: key, location } => {
                if key.is_none() {
                    report
                        .errors
                        .push(format!("security scheme '{name}': apiKey requires 'name'"));
                }
                if location.is_none() {
                    report
                        .errors
                        .push(format!("security scheme '{name}': apiKey requires 'in'"));
                }
            }
            SecurityScheme::Http { scheme: None, .. } => report
                .errors
                .push(format!("security scheme '{name}': http requires 'scheme'")),
            SecurityScheme::OAuth2 { flows, .. } if flows.is_empty() => report
                .errors
                .push(format!("security scheme '{name}': oauth2 declares no flows")),
            _ => {}
        }
    }
}
