//! Where generated tools send their requests.

use crate::types::{ParsedApiSpec, Server};

/// Base URL declared by the document, or an empty string if it declares none.
///
/// OpenAPI 3.x uses the first server with its `{variables}` replaced by their
/// defaults. Swagger 2.0 joins the first scheme (default `https`), `host` and
/// `basePath`, with any trailing `/` trimmed.
pub fn derive_base_url(spec: &ParsedApiSpec) -> String {
    if let Some(server) = spec.servers.first() {
        return expand_server_url(server);
    }

    let Some(swagger) = &spec.swagger_host else {
        return String::new();
    };
    let Some(host) = swagger.host.as_deref().filter(|h| !h.is_empty()) else {
        return String::new();
    };

    let scheme = swagger.schemes.first().map(String::as_str).unwrap_or("https");
    let base_path = swagger.base_path.as_deref().unwrap_or_default();
    let url = format!("{scheme}://{host}{base_path}");
    url.trim_end_matches('/').to_string()
}

/// Substitute `{name}` placeholders with the server's variable defaults.
///
/// Placeholders without a declared default are left in place.
pub fn expand_server_url(server: &Server) -> String {
    server
        .variables
        .iter()
        .fold(server.url.clone(), |url, (name, default)| {
            url.replace(&format!("{{{name}}}"), default)
        })
}
