//! Tool names, fallback descriptions and the authentication-endpoint heuristic.

use crate::types::{ApiEndpoint, HttpMethod};
use heck::ToSnakeCase;

/// Path fragments that mark an endpoint as a credential exchange.
const AUTH_PATH_MARKERS: &[&str] = &["/auth/login", "/auth/token", "/oauth/token", "/token"];

/// Fragments of an `operationId` that mark a credential exchange.
const AUTH_OPERATION_MARKERS: &[&str] = &["token", "auth", "login", "authenticate"];

/// Fragments of a description that mark a credential exchange.
const AUTH_DESCRIPTION_MARKERS: &[&str] = &["access token", "authentication", "login", "auth"];

/// Whether `endpoint` obtains credentials rather than exposing API functionality.
///
/// Such endpoints are handled by the generated client's auth layer and never
/// become tools. Markers match case-insensitive substrings; the one exception
/// is `author` (as in `getAuthor`), which is not read as `auth` unless it is
/// the start of `authorize`/`authorise`.
pub fn is_auth_endpoint(endpoint: &ApiEndpoint) -> bool {
    let path = endpoint.path.to_lowercase();
    if AUTH_PATH_MARKERS.iter().any(|marker| path.contains(marker)) {
        return true;
    }

    if let Some(operation_id) = &endpoint.operation_id {
        if contains_marker(operation_id, AUTH_OPERATION_MARKERS) {
            return true;
        }
    }

    endpoint
        .description
        .as_deref()
        .is_some_and(|description| contains_marker(description, AUTH_DESCRIPTION_MARKERS))
}

/// Canonical tool name: snake-cased `operationId`, else method plus literal path segments.
pub fn tool_name(endpoint: &ApiEndpoint) -> String {
    if let Some(operation_id) = endpoint.operation_id.as_deref().filter(|id| !id.trim().is_empty()) {
        let name = operation_id.to_snake_case();
        if !name.is_empty() {
            return name;
        }
    }

    let segments: Vec<String> = literal_segments(&endpoint.path)
        .map(|segment| segment.chars().filter(char::is_ascii_alphanumeric).collect::<String>())
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        format!("{}_root", endpoint.method.as_str())
    } else {
        format!("{}_{}", endpoint.method.as_str(), segments.join("_"))
    }
}

/// `description`, else `summary`, else a sentence built from method and path.
pub fn tool_description(endpoint: &ApiEndpoint) -> String {
    let declared = endpoint
        .description
        .as_deref()
        .or(endpoint.summary.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty());
    if let Some(text) = declared {
        return text.to_string();
    }

    let resource = literal_segments(&endpoint.path).last().unwrap_or("resource");
    format!("{} {}", action_verb(endpoint.method), resource)
}

/// Verb used in synthesized descriptions.
pub fn action_verb(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "Retrieve",
        HttpMethod::Post => "Create",
        HttpMethod::Put => "Update",
        HttpMethod::Patch => "Modify",
        HttpMethod::Delete => "Delete",
        _ => "Process",
    }
}

/// Lowercase slug for prefixing tool names of one document.
pub fn document_slug(title: &str) -> String {
    let slug = title.to_snake_case();
    if slug.is_empty() { "api".to_string() } else { slug }
}

/// Non-empty path segments that are not `{parameters}`.
fn literal_segments(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && !(segment.starts_with('{') && segment.ends_with('}')))
}

fn contains_marker(text: &str, markers: &[&str]) -> bool {
    let text = without_author(&text.to_lowercase());
    markers.iter().any(|marker| text.contains(marker))
}

/// Drops `author` occurrences that do not continue into `authoriz`/`authoris`.
fn without_author(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(index) = rest.find("author") {
        let after = &rest[index + "author".len()..];
        kept.push_str(&rest[..index]);
        if after.starts_with("iz") || after.starts_with("is") {
            kept.push_str("author");
        }
        rest = after;
    }
    kept.push_str(rest);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(method: HttpMethod, path: &str) -> ApiEndpoint {
        ApiEndpoint {
            path: path.to_string(),
            method,
            operation_id: None,
            summary: None,
            description: None,
            tags: vec![],
            parameters: vec![],
            request_body: None,
            responses: None,
            security: None,
        }
    }

    #[test]
    fn test_tool_name_from_operation_id() {
        let mut ep = endpoint(HttpMethod::Get, "/pets/{id}");
        ep.operation_id = Some("getPetById".into());
        assert_eq!(tool_name(&ep), "get_pet_by_id");

        ep.operation_id = Some("HTTPResponse".into());
        assert_eq!(tool_name(&ep), "http_response");

        ep.operation_id = Some("list-users".into());
        assert_eq!(tool_name(&ep), "list_users");
    }

    #[test]
    fn test_tool_name_from_path() {
        let ep = endpoint(HttpMethod::Get, "/pets/{id}/owner-info");
        assert_eq!(tool_name(&ep), "get_pets_ownerinfo");

        let ep = endpoint(HttpMethod::Delete, "/v1/store/orders/{orderId}");
        assert_eq!(tool_name(&ep), "delete_v1_store_orders");

        let ep = endpoint(HttpMethod::Get, "/");
        assert_eq!(tool_name(&ep), "get_root");
    }

    #[test]
    fn test_description_fallbacks() {
        let mut ep = endpoint(HttpMethod::Post, "/pets/{id}/vaccinations");
        assert_eq!(tool_description(&ep), "Create vaccinations");

        ep.summary = Some("Add a vaccination".into());
        assert_eq!(tool_description(&ep), "Add a vaccination");

        ep.description = Some("Records a vaccination for a pet".into());
        assert_eq!(tool_description(&ep), "Records a vaccination for a pet");

        let ep = endpoint(HttpMethod::Head, "/pets/{id}");
        assert_eq!(tool_description(&ep), "Process pets");
    }

    #[test]
    fn test_auth_endpoint_by_path() {
        assert!(is_auth_endpoint(&endpoint(HttpMethod::Post, "/auth/login")));
        assert!(is_auth_endpoint(&endpoint(HttpMethod::Post, "/v2/oauth/token")));
        assert!(!is_auth_endpoint(&endpoint(HttpMethod::Get, "/pets")));
    }

    #[test]
    fn test_auth_endpoint_by_operation_id() {
        let mut ep = endpoint(HttpMethod::Post, "/session");
        ep.operation_id = Some("userLogin".into());
        assert!(is_auth_endpoint(&ep));

        ep.operation_id = Some("getAuthorById".into());
        assert!(!is_auth_endpoint(&ep));

        let mut ep = endpoint(HttpMethod::Get, "/oauth2/authorize");
        ep.operation_id = Some("oauthAuthorize".into());
        assert!(is_auth_endpoint(&ep));

        ep.operation_id = Some("refreshAccessToken".into());
        assert!(is_auth_endpoint(&ep));
    }

    #[test]
    fn test_auth_endpoint_by_description() {
        let mut ep = endpoint(HttpMethod::Post, "/session");
        ep.description = Some("Exchange credentials for an access token.".into());
        assert!(is_auth_endpoint(&ep));

        ep.description = Some("Lists the authors of a book".into());
        assert!(!is_auth_endpoint(&ep));

        let mut ep = endpoint(HttpMethod::Post, "/session");
        ep.operation_id = Some("signIn".into());
        ep.description = Some("Authenticates a user and returns a JWT".into());
        assert!(is_auth_endpoint(&ep));

        ep.description = Some("Requires the author's authorization".into());
        assert!(is_auth_endpoint(&ep));
    }

    #[test]
    fn test_document_slug() {
        assert_eq!(document_slug("Pet Store"), "pet_store");
        assert_eq!(document_slug("!!!"), "api");
    }
}
