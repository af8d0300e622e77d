//! Loading documents over HTTP against a mock server.

use mcpforge_cli::{DocumentLoader, HttpLoader, SourceLoader};
use std::time::Duration;

const PETSTORE_YAML: &str = r#"
openapi: 3.0.0
info:
  title: Pet Store
  version: "1.0"
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        "200":
          description: ok
"#;

#[tokio::test]
async fn test_http_loader_fetches_yaml() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/specs/petstore.yaml")
        .with_status(200)
        .with_header("content-type", "application/yaml")
        .with_body(PETSTORE_YAML)
        .create_async()
        .await;

    let loader = HttpLoader::new(Duration::from_secs(5)).unwrap();
    let url = format!("{}/specs/petstore.yaml", server.url());
    let document = loader.load_document(&url).await.unwrap();

    assert_eq!(document["info"]["title"], "Pet Store");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_loader_reports_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/missing.json")
        .with_status(404)
        .create_async()
        .await;

    let loader = HttpLoader::new(Duration::from_secs(5)).unwrap();
    let err = loader
        .load(&format!("{}/missing.json", server.url()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_source_loader_dispatches_on_scheme() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/openapi.json")
        .with_status(200)
        .with_body(r#"{"openapi": "3.0.0", "paths": {}}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("swagger.json");
    std::fs::write(&path, r#"{"swagger": "2.0", "paths": {}}"#).unwrap();

    let loader = SourceLoader::new(Duration::from_secs(5)).unwrap();
    let remote = loader
        .load_document(&format!("{}/openapi.json", server.url()))
        .await
        .unwrap();
    let local = loader.load_document(path.to_str().unwrap()).await.unwrap();

    assert_eq!(remote["openapi"], "3.0.0");
    assert_eq!(local["swagger"], "2.0");
}

#[tokio::test]
async fn test_undecodable_body_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/broken")
        .with_status(200)
        .with_body("openapi: [unclosed")
        .create_async()
        .await;

    let loader = HttpLoader::new(Duration::from_secs(5)).unwrap();
    let err = loader
        .load_document(&format!("{}/broken", server.url()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to decode document"));
}
